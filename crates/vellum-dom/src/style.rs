//! Typed view over an element's inline `style` attribute.
//!
//! Properties keep declaration order, matching how a live surface reports
//! `style.cssText`. Setting a property to an empty value removes it.

use smol_str::SmolStr;

use crate::node::NodeId;
use crate::tree::DomTree;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineStyle {
    props: Vec<(SmolStr, String)>,
}

impl InlineStyle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a `style` attribute value. Malformed declarations (no colon)
    /// are dropped.
    pub fn parse(input: &str) -> Self {
        let mut style = Self::new();
        for decl in input.split(';') {
            let Some((name, value)) = decl.split_once(':') else {
                continue;
            };
            let name = name.trim();
            let value = value.trim();
            if !name.is_empty() && !value.is_empty() {
                style.set(name, value);
            }
        }
        style
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.props
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Set a property, replacing in place. An empty value removes it.
    pub fn set(&mut self, name: impl Into<SmolStr>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if value.is_empty() {
            self.remove(&name);
            return;
        }
        match self.props.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.props.push((name, value)),
        }
    }

    pub fn remove(&mut self, name: &str) {
        self.props.retain(|(n, _)| n != name);
    }

    pub fn is_empty(&self) -> bool {
        self.props.is_empty()
    }

    pub fn to_css(&self) -> String {
        let mut out = String::new();
        for (name, value) in &self.props {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value);
            out.push(';');
        }
        out
    }
}

impl DomTree {
    /// The parsed inline style of an element (empty for text nodes).
    pub fn style(&self, id: NodeId) -> InlineStyle {
        self.element(id)
            .and_then(|el| el.attr("style"))
            .map(InlineStyle::parse)
            .unwrap_or_default()
    }

    /// Write an inline style back; an empty style drops the attribute.
    pub fn set_style(&mut self, id: NodeId, style: &InlineStyle) {
        let Some(el) = self.element_mut(id) else {
            return;
        };
        if style.is_empty() {
            el.remove_attr("style");
        } else {
            el.set_attr("style", style.to_css());
        }
    }

    /// Convenience: tweak one style property on an element.
    pub fn set_style_property(&mut self, id: NodeId, name: &str, value: &str) {
        let mut style = self.style(id);
        style.set(name, value);
        self.set_style(id, &style);
    }
}
