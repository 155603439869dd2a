//! Search and highlight.
//!
//! Matching is case-insensitive over the document's visible text, one
//! text node at a time; each hit is rewrapped in a marker span. Markers
//! are purely decorative: clearing them restores the exact original text
//! and merges the fragments back together, so search-then-clear is an
//! identity transform on the document.

use regex::RegexBuilder;
use vellum_dom::{DomTree, NodeId};

pub const HIGHLIGHT_CLASS: &str = "search-highlight";
pub const CURRENT_CLASS: &str = "search-highlight-current";

/// One active search session: query, live marker references, cursor.
#[derive(Debug, Clone, Default)]
pub struct SearchState {
    query: String,
    matches: Vec<NodeId>,
    current: Option<usize>,
    revision: u64,
}

impl SearchState {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn count(&self) -> usize {
        self.matches.len()
    }

    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    pub fn matches(&self) -> &[NodeId] {
        &self.matches
    }
}

/// Clear any previous session and wrap every match of `query` in a
/// marker span. The first match is not yet current - callers follow up
/// with `set_current` so they control scrolling.
pub fn run_search(tree: &mut DomTree, query: &str) -> SearchState {
    clear_highlights(tree);
    if query.is_empty() {
        return SearchState::default();
    }
    let Ok(pattern) = RegexBuilder::new(&regex::escape(query))
        .case_insensitive(true)
        .build()
    else {
        return SearchState::default();
    };

    let text_nodes: Vec<NodeId> = tree.find_all(|t, id| t.text(id).is_some());
    let mut markers = Vec::new();

    for id in text_nodes {
        let Some(text) = tree.text(id).map(str::to_owned) else {
            continue;
        };
        let hits: Vec<(usize, usize)> = pattern
            .find_iter(&text)
            .map(|m| (m.start(), m.end()))
            .collect();
        if hits.is_empty() {
            continue;
        }

        let mut cursor = 0;
        let mut replacements = Vec::new();
        for (start, end) in hits {
            if start > cursor {
                let plain = tree.create_text(text[cursor..start].to_owned());
                replacements.push(plain);
            }
            let span = tree.create_element("span");
            if let Some(el) = tree.element_mut(span) {
                el.add_class(HIGHLIGHT_CLASS);
            }
            let matched = tree.create_text(text[start..end].to_owned());
            tree.append_child(span, matched);
            replacements.push(span);
            markers.push(span);
            cursor = end;
        }
        if cursor < text.len() {
            let tail = tree.create_text(text[cursor..].to_owned());
            replacements.push(tail);
        }
        for node in replacements {
            tree.insert_before(id, node);
        }
        tree.detach(id);
    }

    SearchState {
        query: query.to_string(),
        matches: markers,
        current: None,
        revision: tree.revision(),
    }
}

/// Replace every marker with its plain text and merge adjacent runs.
pub fn clear_highlights(tree: &mut DomTree) {
    let markers = tree.find_all(|t, id| {
        t.element(id)
            .is_some_and(|el| el.has_class(HIGHLIGHT_CLASS) || el.has_class(CURRENT_CLASS))
    });
    if markers.is_empty() {
        return;
    }
    for marker in markers {
        let text = tree.text_content(marker);
        let replacement = tree.create_text(text);
        tree.replace_with(marker, replacement);
    }
    tree.normalize();
}

/// Move the "current" flag to `index` (modulo match count). Returns the
/// marker node so the caller can scroll it into view.
pub fn set_current(tree: &mut DomTree, state: &mut SearchState, index: usize) -> Option<NodeId> {
    // Marker references die with the tree incarnation that created them
    // (a sanitize pass may have rebuilt the arena underneath us).
    if state.matches.is_empty() || state.revision != tree.revision() {
        state.current = None;
        return None;
    }
    let index = index % state.matches.len();
    for marker in &state.matches {
        if let Some(el) = tree.element_mut(*marker) {
            el.remove_class(CURRENT_CLASS);
        }
    }
    let target = state.matches[index];
    if let Some(el) = tree.element_mut(target) {
        el.add_class(CURRENT_CLASS);
    }
    state.current = Some(index);
    Some(target)
}

/// Advance to the next match, wrapping around.
pub fn next_match(tree: &mut DomTree, state: &mut SearchState) -> Option<NodeId> {
    let index = state.current.map(|c| c + 1).unwrap_or(0);
    set_current(tree, state, index)
}

/// Step back to the previous match, wrapping around.
pub fn previous_match(tree: &mut DomTree, state: &mut SearchState) -> Option<NodeId> {
    let count = state.matches.len();
    if count == 0 {
        return None;
    }
    let index = state.current.map(|c| (c + count - 1) % count).unwrap_or(0);
    set_current(tree, state, index)
}
