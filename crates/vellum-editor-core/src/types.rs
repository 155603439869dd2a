//! Core editor types: selection anchors, formatting snapshots, sizing.

use vellum_dom::{DomTree, NodeId};

/// One end of a selection: a node plus an in-node offset.
///
/// For text nodes the offset counts characters; for elements it is a
/// child index. Anchors are ephemeral - they are only valid against the
/// tree incarnation that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub node: NodeId,
    pub offset: usize,
}

impl Anchor {
    pub fn new(node: NodeId, offset: usize) -> Self {
        Self { node, offset }
    }
}

/// A captured caret or span against the document surface.
///
/// Besides the node anchors, the range carries the tree revision it was
/// captured against and the absolute text offsets of both ends. The text
/// offsets are the re-anchoring fallback after the tree has been rebuilt
/// underneath the range (sanitization, raw-view round trips).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionRange {
    pub start: Anchor,
    pub end: Anchor,
    pub revision: u64,
    pub text_start: usize,
    pub text_end: usize,
}

impl SelectionRange {
    /// Build a range from two anchors, normalizing so start <= end in
    /// document text order.
    pub fn new(tree: &DomTree, start: Anchor, end: Anchor) -> Self {
        let text_start = tree.text_offset_at(start.node, start.offset);
        let text_end = tree.text_offset_at(end.node, end.offset);
        if text_start <= text_end {
            Self {
                start,
                end,
                revision: tree.revision(),
                text_start,
                text_end,
            }
        } else {
            Self {
                start: end,
                end: start,
                revision: tree.revision(),
                text_start: text_end,
                text_end: text_start,
            }
        }
    }

    /// A collapsed range at a single anchor.
    pub fn caret(tree: &DomTree, anchor: Anchor) -> Self {
        Self::new(tree, anchor, anchor)
    }

    /// Re-anchor absolute text offsets onto the current tree. Returns
    /// None when the tree has no text to anchor to.
    pub fn from_text_range(tree: &DomTree, start: usize, end: usize) -> Option<Self> {
        let (start, end) = if start <= end { (start, end) } else { (end, start) };
        let (start_node, start_offset) = tree.anchor_at_text_offset(start)?;
        let (end_node, end_offset) = tree.anchor_at_text_offset(end)?;
        Some(Self::new(
            tree,
            Anchor::new(start_node, start_offset),
            Anchor::new(end_node, end_offset),
        ))
    }

    pub fn is_collapsed(&self) -> bool {
        self.text_start == self.text_end
    }

    pub fn char_len(&self) -> usize {
        self.text_end - self.text_start
    }
}

/// Which toggle states are active at the caret, for toolbar reflection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct ActiveFormatting {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub superscript: bool,
    pub subscript: bool,
    pub justify_left: bool,
    pub justify_center: bool,
    pub justify_right: bool,
    pub unordered_list: bool,
    pub ordered_list: bool,
}

/// Caller-facing sizing: fixed pixels, content-driven, or fill-parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Auto,
    Responsive,
    Px(u32),
}

/// Block-level tags the editor treats as toggle/selection boundaries.
pub const BLOCK_TAGS: &[&str] = &[
    "p",
    "div",
    "h1",
    "h2",
    "h3",
    "h4",
    "h5",
    "h6",
    "blockquote",
    "li",
];

pub fn is_block_tag(tag: &str) -> bool {
    BLOCK_TAGS.contains(&tag)
}
