//! Node payloads: elements with ordered attributes, and text runs.

use smol_str::SmolStr;

/// Handle to a node in a `DomTree` arena.
///
/// Ids are only meaningful against the tree that produced them. A tree
/// rebuilt from markup invalidates all prior ids; the tree's revision
/// stamp lets holders detect that.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Payload of a single tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeData {
    Element(ElementData),
    Text(String),
}

impl NodeData {
    pub fn is_text(&self) -> bool {
        matches!(self, NodeData::Text(_))
    }

    pub fn is_element(&self) -> bool {
        matches!(self, NodeData::Element(_))
    }
}

/// An element: lowercase tag name plus ordered attribute pairs.
///
/// Attributes keep insertion order so serialization is stable; lookup is
/// linear, which is fine for the handful of attributes real elements carry.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementData {
    pub tag: SmolStr,
    attrs: Vec<(SmolStr, String)>,
}

impl ElementData {
    pub fn new(tag: impl Into<SmolStr>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Vec::new(),
        }
    }

    pub fn attrs(&self) -> &[(SmolStr, String)] {
        &self.attrs
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set an attribute, replacing any existing value in place.
    pub fn set_attr(&mut self, name: impl Into<SmolStr>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn remove_attr(&mut self, name: &str) -> Option<String> {
        let idx = self.attrs.iter().position(|(n, _)| n == name)?;
        Some(self.attrs.remove(idx).1)
    }

    /// Keep only attributes whose names pass the predicate.
    pub fn retain_attrs(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.attrs.retain(|(n, _)| keep(n));
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|v| v.split_ascii_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    pub fn add_class(&mut self, class: &str) {
        if self.has_class(class) {
            return;
        }
        match self.attr("class") {
            Some(existing) if !existing.is_empty() => {
                let joined = format!("{existing} {class}");
                self.set_attr("class", joined);
            }
            _ => self.set_attr("class", class),
        }
    }

    pub fn remove_class(&mut self, class: &str) {
        let Some(existing) = self.attr("class") else {
            return;
        };
        let remaining: Vec<&str> = existing
            .split_ascii_whitespace()
            .filter(|c| *c != class)
            .collect();
        if remaining.is_empty() {
            self.remove_attr("class");
        } else {
            self.set_attr("class", remaining.join(" "));
        }
    }
}

/// Tags that never take children and serialize without a close tag.
pub fn is_void_tag(tag: &str) -> bool {
    matches!(
        tag,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "source"
            | "track"
            | "wbr"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_set_and_replace() {
        let mut el = ElementData::new("a");
        el.set_attr("href", "https://one.example");
        el.set_attr("target", "_blank");
        el.set_attr("href", "https://two.example");

        assert_eq!(el.attr("href"), Some("https://two.example"));
        // Replacement keeps the original position.
        assert_eq!(el.attrs()[0].0.as_str(), "href");
        assert_eq!(el.attrs().len(), 2);
    }

    #[test]
    fn test_class_handling() {
        let mut el = ElementData::new("span");
        el.add_class("search-highlight");
        el.add_class("search-highlight-current");
        el.add_class("search-highlight"); // no duplicate

        assert!(el.has_class("search-highlight"));
        assert!(el.has_class("search-highlight-current"));
        assert_eq!(el.attr("class"), Some("search-highlight search-highlight-current"));

        el.remove_class("search-highlight");
        assert_eq!(el.attr("class"), Some("search-highlight-current"));

        el.remove_class("search-highlight-current");
        assert_eq!(el.attr("class"), None);
    }

    #[test]
    fn test_void_tags() {
        assert!(is_void_tag("br"));
        assert!(is_void_tag("img"));
        assert!(is_void_tag("hr"));
        assert!(!is_void_tag("p"));
        assert!(!is_void_tag("table"));
    }
}
