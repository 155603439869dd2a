//! Permissive HTML fragment parsing.
//!
//! This is a structural fragment parser, not a browser parser: it knows
//! tags, attributes, void elements, comments, and a small entity set. It
//! never fails - malformed input degrades to literal text or ignored
//! close tags, the same way a live editing surface absorbs hand-edited
//! markup.

use crate::node::{ElementData, NodeId, is_void_tag};
use crate::tree::DomTree;

/// Parse an HTML fragment into a fresh tree.
pub fn parse_fragment(markup: &str) -> DomTree {
    let mut tree = DomTree::new();
    parse_into(&mut tree, markup);
    tree
}

/// Parse `markup` and append the resulting nodes under `tree`'s root.
pub(crate) fn parse_into(tree: &mut DomTree, markup: &str) {
    let mut open_stack: Vec<NodeId> = vec![tree.root()];
    let mut text_buf = String::new();
    let mut pos = 0;

    while pos < markup.len() {
        let rest = &markup[pos..];

        if let Some(stripped) = rest.strip_prefix("<!--") {
            flush_text(tree, &mut open_stack, &mut text_buf);
            pos += 4 + stripped.find("-->").map(|i| i + 3).unwrap_or(stripped.len());
            continue;
        }
        if rest.starts_with("<!") {
            // Doctype or other declaration: skip to the closing bracket.
            flush_text(tree, &mut open_stack, &mut text_buf);
            pos += rest.find('>').map(|i| i + 1).unwrap_or(rest.len());
            continue;
        }
        if rest.starts_with("</") {
            let end = rest.find('>').map(|i| i + 1).unwrap_or(rest.len());
            let name = tag_name(&rest[2..end.saturating_sub(1).max(2)]);
            flush_text(tree, &mut open_stack, &mut text_buf);
            close_tag(&mut open_stack, tree, &name);
            pos += end;
            continue;
        }
        if rest.starts_with('<') && rest[1..].starts_with(|c: char| c.is_ascii_alphabetic()) {
            let end = rest.find('>').map(|i| i + 1).unwrap_or(rest.len());
            flush_text(tree, &mut open_stack, &mut text_buf);
            let body = rest[1..end].trim_end_matches('>');
            let self_closing = body.ends_with('/');
            let body = body.trim_end_matches('/');
            let (element, tag) = parse_open_tag(body);
            let id = tree.create_element_with(element);
            let top = *open_stack.last().unwrap_or(&tree.root());
            tree.append_child(top, id);
            if !self_closing && !is_void_tag(&tag) {
                open_stack.push(id);
            }
            pos += end;
            continue;
        }
        if rest.starts_with('<') {
            // Stray bracket: literal text.
            text_buf.push('<');
            pos += 1;
            continue;
        }

        let next = rest.find('<').unwrap_or(rest.len());
        text_buf.push_str(&decode_entities(&rest[..next]));
        pos += next;
    }

    flush_text(tree, &mut open_stack, &mut text_buf);
}

fn flush_text(tree: &mut DomTree, open_stack: &mut [NodeId], text_buf: &mut String) {
    if text_buf.is_empty() {
        return;
    }
    let text = std::mem::take(text_buf);
    let id = tree.create_text(text);
    let top = *open_stack.last().unwrap_or(&tree.root());
    tree.append_child(top, id);
}

fn close_tag(open_stack: &mut Vec<NodeId>, tree: &DomTree, name: &str) {
    if name.is_empty() {
        return;
    }
    // Pop to the nearest matching open element; unmatched close tags are
    // ignored (index 0 is the synthetic root and never pops).
    for i in (1..open_stack.len()).rev() {
        if tree.tag(open_stack[i]) == Some(name) {
            open_stack.truncate(i);
            return;
        }
    }
}

/// Parse `tag attr="v" attr2` (the text between `<` and `>`).
fn parse_open_tag(body: &str) -> (ElementData, String) {
    let name_end = body
        .find(|c: char| c.is_ascii_whitespace())
        .unwrap_or(body.len());
    let tag = tag_name(&body[..name_end]);
    let mut element = ElementData::new(tag.as_str());

    let mut rest = body[name_end..].trim_start();
    while !rest.is_empty() {
        let name_len = rest
            .find(|c: char| c.is_ascii_whitespace() || c == '=')
            .unwrap_or(rest.len());
        if name_len == 0 {
            rest = &rest[1..];
            continue;
        }
        let attr_name = rest[..name_len].to_ascii_lowercase();
        rest = rest[name_len..].trim_start();

        if let Some(after_eq) = rest.strip_prefix('=') {
            let after_eq = after_eq.trim_start();
            let (value, remaining) = if let Some(inner) = after_eq.strip_prefix('"') {
                let end = inner.find('"').unwrap_or(inner.len());
                (&inner[..end], inner.get(end + 1..).unwrap_or(""))
            } else if let Some(inner) = after_eq.strip_prefix('\'') {
                let end = inner.find('\'').unwrap_or(inner.len());
                (&inner[..end], inner.get(end + 1..).unwrap_or(""))
            } else {
                let end = after_eq
                    .find(|c: char| c.is_ascii_whitespace())
                    .unwrap_or(after_eq.len());
                (&after_eq[..end], &after_eq[end..])
            };
            element.set_attr(attr_name.as_str(), decode_entities(value));
            rest = remaining.trim_start();
        } else {
            // Bare attribute.
            element.set_attr(attr_name.as_str(), String::new());
        }
    }

    (element, tag)
}

fn tag_name(raw: &str) -> String {
    // ':' admits the vendor-namespaced tags word processors paste in.
    raw.trim()
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == ':')
        .collect::<String>()
        .to_ascii_lowercase()
}

/// Decode the named entities the editor emits plus numeric references.
/// Unknown entities pass through literally.
fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp..];
        let end = rest[1..].find(';').map(|i| i + 1);
        match end {
            Some(end) if end <= 10 => {
                let entity = &rest[1..end];
                match decode_entity(entity) {
                    Some(decoded) => out.push(decoded),
                    None => out.push_str(&rest[..end + 1]),
                }
                rest = &rest[end + 1..];
            }
            _ => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(entity: &str) -> Option<char> {
    match entity {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let code = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok()?
            } else {
                return None;
            };
            char::from_u32(code)
        }
    }
}
