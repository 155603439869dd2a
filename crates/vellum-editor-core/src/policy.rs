//! The allowed-tag sanitization policy.
//!
//! A policy is a set of names drawn from two namespaces: structural tags
//! that may appear in markup, and pseudo-tags gating non-markup actions
//! (clipboard, case transforms, alignment). Membership is the single gate
//! for both toolbar affordances and sanitization. Sanitizing unwraps
//! disallowed elements in place - children survive, the shell goes - and
//! strips attributes outside a fixed allow-list.

use indexmap::IndexSet;
use smol_str::SmolStr;
use vellum_dom::{DomTree, NodeId};

/// Structural tags the editor can emit.
pub const STRUCTURAL_TAGS: &[&str] = &[
    "p", "h1", "h2", "h3", "h4", "h5", "h6", "strong", "em", "u", "s", "sup", "sub",
    "blockquote", "cite", "pre", "code", "ul", "ol", "li", "a", "img", "table", "thead",
    "tbody", "tr", "th", "td", "br", "hr", "span", "div",
];

/// Pseudo-tags gating actions that never appear in markup.
pub const ACTION_TAGS: &[&str] = &[
    "cut",
    "copy",
    "paste",
    "remove",
    "text-color",
    "highlight-color",
    "emoji",
    "select",
    "uppercase",
    "lowercase",
    "align-left",
    "align-center",
    "align-right",
    "remove-link",
];

/// Attributes sanitization lets through on any element.
pub const ALLOWED_ATTRS: &[&str] = &[
    "href", "src", "alt", "style", "class", "target", "rel", "width", "height",
];

/// An allow-list over tags and actions.
///
/// An empty policy is inactive: everything passes, nothing is stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPolicy {
    allowed: IndexSet<SmolStr>,
}

impl Default for TagPolicy {
    /// The full vocabulary: every structural tag and every action.
    fn default() -> Self {
        Self::from_tags(STRUCTURAL_TAGS.iter().chain(ACTION_TAGS).copied())
    }
}

impl TagPolicy {
    pub fn empty() -> Self {
        Self {
            allowed: IndexSet::new(),
        }
    }

    pub fn from_tags<I, T>(tags: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<SmolStr>,
    {
        Self {
            allowed: tags.into_iter().map(Into::into).collect(),
        }
    }

    pub fn allows(&self, tag: &str) -> bool {
        self.allowed.is_empty() || self.allowed.contains(tag)
    }

    pub fn insert(&mut self, tag: impl Into<SmolStr>) {
        self.allowed.insert(tag.into());
    }

    pub fn remove(&mut self, tag: &str) {
        self.allowed.shift_remove(tag);
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(|t| t.as_str())
    }

    pub fn len(&self) -> usize {
        self.allowed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty()
    }

    /// Serialize the allow-list for persistence.
    pub fn to_json(&self) -> String {
        let tags: Vec<&str> = self.tags().collect();
        serde_json::to_string(&tags).unwrap_or_else(|_| "[]".to_string())
    }

    /// Parse a persisted allow-list. Empty or malformed input yields None.
    pub fn from_json(json: &str) -> Option<Self> {
        let tags: Vec<String> = serde_json::from_str(json).ok()?;
        if tags.is_empty() {
            return None;
        }
        Some(Self::from_tags(tags))
    }

    /// True iff every element tag in the tree is allowed.
    pub fn is_compliant(&self, tree: &DomTree) -> bool {
        self.first_violation(tree).is_none()
    }

    fn first_violation(&self, tree: &DomTree) -> Option<NodeId> {
        if self.allowed.is_empty() {
            return None;
        }
        tree.descendants(tree.root())
            .find(|id| tree.tag(*id).is_some_and(|tag| !self.allows(tag)))
    }

    /// Rewrite the tree to comply: unwrap disallowed elements (children
    /// splice into the parent in place) and drop disallowed attributes.
    /// Idempotent - a compliant tree passes through untouched.
    pub fn sanitize_tree(&self, tree: &mut DomTree) {
        if self.allowed.is_empty() {
            return;
        }
        while let Some(bad) = self.first_violation(tree) {
            tree.unwrap_node(bad);
        }
        let elements: Vec<NodeId> = tree
            .descendants(tree.root())
            .filter(|id| tree.element(*id).is_some())
            .collect();
        for id in elements {
            if let Some(el) = tree.element_mut(id) {
                el.retain_attrs(|name| ALLOWED_ATTRS.contains(&name));
            }
        }
    }

    /// Parse, sanitize, and reserialize a markup string.
    pub fn sanitize_markup(&self, markup: &str) -> String {
        if self.allowed.is_empty() {
            return markup.to_string();
        }
        let mut tree = DomTree::from_markup(markup);
        self.sanitize_tree(&mut tree);
        tree.to_html()
    }
}
