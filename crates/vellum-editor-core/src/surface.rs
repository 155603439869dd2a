//! The Text Surface abstraction.
//!
//! `TextSurface` is the seam between command logic and whatever actually
//! hosts the editable document (a browser contentEditable region, a test
//! harness). It owns the tree, the live selection, focus, and the ambient
//! "next typed character" formatting state; the provided methods implement
//! the selection-aware mutations every command builds on, so an
//! implementation only supplies storage.
//!
//! `MemorySurface` is the in-process implementation used both for unit
//! tests and as the canonical model the change pipeline serializes from.

use smol_str::SmolStr;
use vellum_dom::{DomTree, NodeData, NodeId};

use crate::types::{Anchor, SelectionRange};

/// Inline wrapper tags with an ambient toggle, outermost first.
pub const INLINE_FORMAT_TAGS: &[&str] = &["strong", "em", "u", "s", "sup", "sub"];

pub trait TextSurface {
    fn tree(&self) -> &DomTree;
    fn tree_mut(&mut self) -> &mut DomTree;

    fn selection(&self) -> Option<SelectionRange>;
    fn set_selection(&mut self, selection: Option<SelectionRange>);

    fn is_focused(&self) -> bool;
    fn focus(&mut self);

    /// Ambient formatting applies to subsequently typed text when the
    /// caret is collapsed (the platform's queryCommandState equivalent).
    fn ambient_format(&self, tag: &str) -> bool;
    fn set_ambient_format(&mut self, tag: &str, on: bool);

    fn toggle_ambient_format(&mut self, tag: &str) {
        let current = self.ambient_format(tag);
        self.set_ambient_format(tag, !current);
    }

    /// Whether structural mutations from the current tick are observable.
    /// In-memory trees settle synchronously; an asynchronous host returns
    /// false until its render pass confirms the new structure.
    fn structure_settled(&self) -> bool;

    /// Bring a node into view. Presentation concern; may be a no-op.
    fn scroll_into_view(&mut self, node: NodeId);

    // === Provided: selection-aware operations ===

    /// The plain text currently selected, empty when collapsed or absent.
    fn selected_text(&self) -> String {
        let Some(sel) = self.selection() else {
            return String::new();
        };
        if sel.is_collapsed() {
            return String::new();
        }
        let text = self.tree().text_content(self.tree().root());
        text.chars()
            .skip(sel.text_start)
            .take(sel.text_end - sel.text_start)
            .collect()
    }

    /// Collapse the caret to the end of the document.
    fn caret_to_end(&mut self) {
        let caret = {
            let tree = self.tree();
            match tree.last_text_node() {
                Some((node, len)) => SelectionRange::caret(tree, Anchor::new(node, len)),
                None => {
                    let root = tree.root();
                    SelectionRange::caret(tree, Anchor::new(root, tree.children(root).len()))
                }
            }
        };
        self.set_selection(Some(caret));
    }

    fn select_all(&mut self) {
        let range = {
            let tree = self.tree();
            let len = tree.subtree_char_len(tree.root());
            SelectionRange::from_text_range(tree, 0, len)
        };
        match range {
            Some(range) => self.set_selection(Some(range)),
            None => self.caret_to_end(),
        }
    }

    /// Delete the selected content, collapsing the caret to the deletion
    /// point. Returns false for a collapsed or absent selection.
    fn delete_selection(&mut self) -> bool {
        let Some(sel) = self.selection() else {
            return false;
        };
        if sel.is_collapsed() {
            return false;
        }
        delete_text_range(self.tree_mut(), sel.text_start, sel.text_end);
        let caret = {
            let tree = self.tree();
            SelectionRange::from_text_range(tree, sel.text_start, sel.text_start)
        };
        match caret {
            Some(caret) => self.set_selection(Some(caret)),
            None => self.caret_to_end(),
        }
        true
    }

    /// Insert a detached node at the caret (deleting any selected span
    /// first), then place the caret just after it.
    fn insert_node_at_caret(&mut self, node: NodeId) {
        if self.selection().is_some_and(|s| !s.is_collapsed()) {
            self.delete_selection();
        }
        let caret = self.selection();
        let tree = self.tree_mut();
        match caret {
            Some(sel)
                if sel.revision == tree.revision() && tree.is_attached(sel.start.node) =>
            {
                let anchor = sel.start;
                if let Some(text) = tree.text(anchor.node).map(str::to_owned) {
                    let len = text.chars().count();
                    if anchor.offset == 0 {
                        tree.insert_before(anchor.node, node);
                    } else if anchor.offset >= len {
                        tree.insert_after(anchor.node, node);
                    } else {
                        // Split the text node around the caret.
                        let byte = byte_of_char(&text, anchor.offset);
                        let suffix = text[byte..].to_owned();
                        if let Some(buf) = tree.text_mut(anchor.node) {
                            buf.truncate(byte);
                        }
                        tree.insert_after(anchor.node, node);
                        let tail = tree.create_text(suffix);
                        tree.insert_after(node, tail);
                    }
                } else {
                    tree.insert_child(anchor.node, anchor.offset, node);
                }
            }
            _ => {
                let root = tree.root();
                tree.append_child(root, node);
            }
        }
        let caret = {
            let tree = self.tree();
            tree.parent(node).map(|parent| {
                let idx = tree.child_index(node).unwrap_or(0) + 1;
                SelectionRange::caret(tree, Anchor::new(parent, idx))
            })
        };
        if let Some(caret) = caret {
            self.set_selection(Some(caret));
        }
    }

    /// Insert typed text at the caret. Active ambient formats wrap the
    /// text in their tags, the way a live surface formats the next typed
    /// character; otherwise the text splices into the caret's text node.
    fn insert_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if self.selection().is_some_and(|s| !s.is_collapsed()) {
            self.delete_selection();
        }

        // Ambient tags already wrapping the caret are satisfied by the
        // existing run; only the missing ones need fresh wrappers.
        let anchor_node = self.selection().and_then(|sel| {
            let tree = self.tree();
            (sel.revision == tree.revision() && tree.is_attached(sel.start.node))
                .then_some(sel.start.node)
        });
        let ambient: Vec<&str> = INLINE_FORMAT_TAGS
            .iter()
            .copied()
            .filter(|tag| self.ambient_format(tag))
            .filter(|tag| match anchor_node {
                Some(node) => self.tree().closest_tag(node, tag).is_none(),
                None => true,
            })
            .collect();

        if !ambient.is_empty() {
            let (outer, text_node, char_len) = {
                let tree = self.tree_mut();
                let mut outer = None;
                let mut innermost = None;
                for tag in &ambient {
                    let el = tree.create_element(*tag);
                    match innermost {
                        Some(prev) => tree.append_child(prev, el),
                        None => outer = Some(el),
                    }
                    innermost = Some(el);
                }
                let text_node = tree.create_text(text);
                if let Some(inner) = innermost {
                    tree.append_child(inner, text_node);
                }
                (outer.unwrap_or(text_node), text_node, text.chars().count())
            };
            self.insert_node_at_caret(outer);
            let caret = SelectionRange::caret(self.tree(), Anchor::new(text_node, char_len));
            self.set_selection(Some(caret));
            return;
        }

        let caret = self.selection();
        let spliced = match caret {
            Some(sel)
                if sel.revision == self.tree().revision()
                    && self.tree().text(sel.start.node).is_some() =>
            {
                let anchor = sel.start;
                let tree = self.tree_mut();
                if let Some(buf) = tree.text_mut(anchor.node) {
                    let byte = byte_of_char(buf, anchor.offset);
                    buf.insert_str(byte, text);
                }
                let caret = SelectionRange::caret(
                    self.tree(),
                    Anchor::new(anchor.node, anchor.offset + text.chars().count()),
                );
                self.set_selection(Some(caret));
                true
            }
            _ => false,
        };
        if !spliced {
            let node = self.tree_mut().create_text(text);
            self.insert_node_at_caret(node);
            let caret =
                SelectionRange::caret(self.tree(), Anchor::new(node, text.chars().count()));
            self.set_selection(Some(caret));
        }
    }
}

/// Remove the characters in `[start, end)` of the document's text,
/// detaching nodes whose content falls entirely inside the range and
/// trimming the boundary text nodes, then merging what remains.
pub(crate) fn delete_text_range(tree: &mut DomTree, start: usize, end: usize) {
    if start >= end {
        return;
    }

    enum Kind {
        Text,
        Element,
    }
    struct Span {
        id: NodeId,
        kind: Kind,
        start: usize,
        len: usize,
    }

    let mut spans = Vec::new();
    let mut acc = 0usize;
    let root = tree.root();
    for id in tree.descendants(root) {
        match tree.data(id) {
            Some(NodeData::Text(t)) => {
                let len = t.chars().count();
                spans.push(Span {
                    id,
                    kind: Kind::Text,
                    start: acc,
                    len,
                });
                acc += len;
            }
            Some(NodeData::Element(_)) => {
                spans.push(Span {
                    id,
                    kind: Kind::Element,
                    start: acc,
                    len: tree.subtree_char_len(id),
                });
            }
            None => {}
        }
    }

    // Detach wholly-contained nodes first (preorder, so ancestors go
    // before their descendants and take the subtree with them).
    for span in &spans {
        if !matches!(span.kind, Kind::Element) || !tree.is_attached(span.id) {
            continue;
        }
        let contained = if span.len > 0 {
            start <= span.start && span.start + span.len <= end
        } else {
            // Zero-width nodes (br, hr, img) only go when strictly inside.
            start < span.start && span.start < end
        };
        if contained {
            tree.detach(span.id);
        }
    }

    // Trim the boundary text nodes that survive.
    for span in &spans {
        if !matches!(span.kind, Kind::Text) || !tree.is_attached(span.id) {
            continue;
        }
        let lo = start.max(span.start);
        let hi = end.min(span.start + span.len);
        if lo >= hi {
            continue;
        }
        if let Some(buf) = tree.text_mut(span.id) {
            let byte_lo = byte_of_char(buf, lo - span.start);
            let byte_hi = byte_of_char(buf, hi - span.start);
            buf.replace_range(byte_lo..byte_hi, "");
        }
    }

    tree.normalize();
}

pub(crate) fn byte_of_char(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(b, _)| b)
        .unwrap_or(s.len())
}

/// Field-based surface used in tests and as the canonical model.
#[derive(Debug, Default)]
pub struct MemorySurface {
    tree: DomTree,
    selection: Option<SelectionRange>,
    focused: bool,
    ambient: Vec<SmolStr>,
    /// Last node a command asked to scroll to, for test observability.
    pub scrolled_to: Option<NodeId>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_markup(markup: &str) -> Self {
        Self {
            tree: DomTree::from_markup(markup),
            ..Self::default()
        }
    }
}

impl TextSurface for MemorySurface {
    fn tree(&self) -> &DomTree {
        &self.tree
    }

    fn tree_mut(&mut self) -> &mut DomTree {
        &mut self.tree
    }

    fn selection(&self) -> Option<SelectionRange> {
        self.selection
    }

    fn set_selection(&mut self, selection: Option<SelectionRange>) {
        self.selection = selection;
    }

    fn is_focused(&self) -> bool {
        self.focused
    }

    fn focus(&mut self) {
        self.focused = true;
    }

    fn ambient_format(&self, tag: &str) -> bool {
        self.ambient.iter().any(|t| t == tag)
    }

    fn set_ambient_format(&mut self, tag: &str, on: bool) {
        if on {
            if !self.ambient_format(tag) {
                self.ambient.push(SmolStr::new(tag));
            }
        } else {
            self.ambient.retain(|t| t != tag);
        }
    }

    fn structure_settled(&self) -> bool {
        true
    }

    fn scroll_into_view(&mut self, node: NodeId) {
        self.scrolled_to = Some(node);
    }
}
