//! HTML emission for the document tree.

use std::fmt::Write;

use crate::node::{NodeData, NodeId, is_void_tag};
use crate::tree::DomTree;

/// Serialize the whole tree (children of the synthetic root).
pub fn to_html(tree: &DomTree) -> String {
    let mut out = String::new();
    for child in tree.children(tree.root()) {
        write_node(tree, *child, &mut out);
    }
    out
}

/// Serialize the subtree rooted at `id`, including `id` itself.
pub fn node_to_html(tree: &DomTree, id: NodeId) -> String {
    let mut out = String::new();
    write_node(tree, id, &mut out);
    out
}

fn write_node(tree: &DomTree, id: NodeId, out: &mut String) {
    match tree.data(id) {
        Some(NodeData::Text(text)) => escape_text_into(text, out),
        Some(NodeData::Element(el)) => {
            out.push('<');
            out.push_str(&el.tag);
            for (name, value) in el.attrs() {
                out.push(' ');
                out.push_str(name);
                if !value.is_empty() {
                    out.push_str("=\"");
                    escape_attr_into(value, out);
                    out.push('"');
                }
            }
            out.push('>');
            if is_void_tag(&el.tag) {
                return;
            }
            for child in tree.children(id) {
                write_node(tree, *child, out);
            }
            let _ = write!(out, "</{}>", el.tag);
        }
        None => {}
    }
}

/// Escape text-node content: `&`, `<`, `>` and non-breaking space.
pub fn escape_text_into(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{a0}' => out.push_str("&nbsp;"),
            _ => out.push(c),
        }
    }
}

/// Escape attribute values: quotes and brackets must not leak through.
pub fn escape_attr_into(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
}
