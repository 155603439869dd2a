//! Arena storage and structural operations for the document tree.
//!
//! The tree owns every node in a flat arena; `NodeId`s are indexes into
//! it. Detached nodes keep their slot (so ids held across a detach stay
//! resolvable), while `rebuild` replaces the whole arena and bumps the
//! revision stamp so callers can reject ids from the old incarnation.

use smol_str::SmolStr;

use crate::node::{ElementData, NodeData, NodeId};
use crate::parse;
use crate::serialize;

#[derive(Debug, Clone)]
struct Slot {
    data: NodeData,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

/// An ordered, mutable tree of element and text nodes.
#[derive(Debug, Clone)]
pub struct DomTree {
    slots: Vec<Slot>,
    root: NodeId,
    revision: u64,
}

const EMPTY_CHILDREN: &[NodeId] = &[];

/// Synthetic tag for the invisible root container.
pub const ROOT_TAG: &str = "#root";

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Create an empty tree holding only the synthetic root.
    pub fn new() -> Self {
        Self {
            slots: vec![Slot {
                data: NodeData::Element(ElementData::new(ROOT_TAG)),
                parent: None,
                children: Vec::new(),
            }],
            root: NodeId(0),
            revision: 0,
        }
    }

    /// Parse an HTML fragment into a fresh tree.
    pub fn from_markup(markup: &str) -> Self {
        let mut tree = Self::new();
        parse::parse_into(&mut tree, markup);
        tree
    }

    /// Replace the entire contents with freshly parsed markup.
    ///
    /// All previously issued `NodeId`s become invalid; the revision stamp
    /// changes so stale ids can be detected by holders that recorded it.
    pub fn rebuild(&mut self, markup: &str) {
        let next_revision = self.revision + 1;
        *self = Self::from_markup(markup);
        self.revision = next_revision;
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Serialize the whole tree back to markup.
    pub fn to_html(&self) -> String {
        serialize::to_html(self)
    }

    fn slot(&self, id: NodeId) -> Option<&Slot> {
        self.slots.get(id.index())
    }

    fn slot_mut(&mut self, id: NodeId) -> Option<&mut Slot> {
        self.slots.get_mut(id.index())
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.slot(id).is_some()
    }

    // === Node access ===

    pub fn data(&self, id: NodeId) -> Option<&NodeData> {
        self.slot(id).map(|s| &s.data)
    }

    pub fn element(&self, id: NodeId) -> Option<&ElementData> {
        match self.data(id) {
            Some(NodeData::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        match self.slot_mut(id).map(|s| &mut s.data) {
            Some(NodeData::Element(el)) => Some(el),
            _ => None,
        }
    }

    pub fn text(&self, id: NodeId) -> Option<&str> {
        match self.data(id) {
            Some(NodeData::Text(t)) => Some(t.as_str()),
            _ => None,
        }
    }

    pub fn text_mut(&mut self, id: NodeId) -> Option<&mut String> {
        match self.slot_mut(id).map(|s| &mut s.data) {
            Some(NodeData::Text(t)) => Some(t),
            _ => None,
        }
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.element(id).map(|el| el.tag.as_str())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.slot(id).and_then(|s| s.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.slot(id).map(|s| s.children.as_slice()).unwrap_or(EMPTY_CHILDREN)
    }

    /// Position of `id` within its parent's child list.
    pub fn child_index(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|c| *c == id)
    }

    // === Construction ===

    fn push_slot(&mut self, data: NodeData) -> NodeId {
        let id = NodeId(self.slots.len() as u32);
        self.slots.push(Slot {
            data,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn create_element(&mut self, tag: impl Into<SmolStr>) -> NodeId {
        self.push_slot(NodeData::Element(ElementData::new(tag)))
    }

    pub fn create_element_with(&mut self, data: ElementData) -> NodeId {
        self.push_slot(NodeData::Element(data))
    }

    pub fn create_text(&mut self, text: impl Into<String>) -> NodeId {
        self.push_slot(NodeData::Text(text.into()))
    }

    // === Structural mutation ===

    /// Append `child` as the last child of `parent`, detaching it from
    /// any previous parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        let len = self.children(parent).len();
        self.insert_child(parent, len, child);
    }

    /// Insert `child` at `index` within `parent`'s children.
    pub fn insert_child(&mut self, parent: NodeId, index: usize, child: NodeId) {
        if parent == child || !self.contains(parent) || !self.contains(child) {
            return;
        }
        self.detach(child);
        let index = index.min(self.children(parent).len());
        if let Some(slot) = self.slot_mut(parent) {
            slot.children.insert(index, child);
        }
        if let Some(slot) = self.slot_mut(child) {
            slot.parent = Some(parent);
        }
    }

    /// Insert `new` as the sibling immediately before `reference`.
    pub fn insert_before(&mut self, reference: NodeId, new: NodeId) {
        let Some(parent) = self.parent(reference) else {
            return;
        };
        let Some(index) = self.child_index(reference) else {
            return;
        };
        self.insert_child(parent, index, new);
    }

    /// Insert `new` as the sibling immediately after `reference`.
    pub fn insert_after(&mut self, reference: NodeId, new: NodeId) {
        let Some(parent) = self.parent(reference) else {
            return;
        };
        let Some(index) = self.child_index(reference) else {
            return;
        };
        self.insert_child(parent, index + 1, new);
    }

    /// Remove `id` from its parent. The node and its subtree stay in the
    /// arena but are no longer reachable from the root.
    pub fn detach(&mut self, id: NodeId) {
        if id == self.root {
            return;
        }
        let Some(parent) = self.parent(id) else {
            return;
        };
        if let Some(slot) = self.slot_mut(parent) {
            slot.children.retain(|c| *c != id);
        }
        if let Some(slot) = self.slot_mut(id) {
            slot.parent = None;
        }
    }

    /// Put `new` where `old` is and detach `old`.
    pub fn replace_with(&mut self, old: NodeId, new: NodeId) {
        if old == new {
            return;
        }
        self.insert_before(old, new);
        self.detach(old);
    }

    /// Remove the element shell, splicing its children into the parent at
    /// the element's position. Returns the spliced children in order.
    pub fn unwrap_node(&mut self, id: NodeId) -> Vec<NodeId> {
        let Some(parent) = self.parent(id) else {
            return Vec::new();
        };
        let Some(mut index) = self.child_index(id) else {
            return Vec::new();
        };
        let children: Vec<NodeId> = self.children(id).to_vec();
        self.detach(id);
        for child in &children {
            self.insert_child(parent, index, *child);
            index += 1;
        }
        children
    }

    /// Wrap `id` in `wrapper`: the wrapper takes the node's place in the
    /// parent and adopts the node as its only child.
    pub fn wrap_node(&mut self, id: NodeId, wrapper: NodeId) {
        if self.parent(id).is_none() {
            return;
        }
        self.insert_before(id, wrapper);
        self.append_child(wrapper, id);
    }

    // === Queries ===

    /// Whether the node is reachable from the root.
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.parent(current) {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    /// Nearest ancestor element (including `id` itself when it is an
    /// element) matching the predicate. Stops below the synthetic root.
    pub fn closest(&self, id: NodeId, pred: impl Fn(&ElementData) -> bool) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == self.root {
                return None;
            }
            if let Some(el) = self.element(node) {
                if pred(el) {
                    return Some(node);
                }
            }
            current = self.parent(node);
        }
        None
    }

    pub fn closest_tag(&self, id: NodeId, tag: &str) -> Option<NodeId> {
        self.closest(id, |el| el.tag == tag)
    }

    /// Depth-first preorder iterator over the subtree below `id`
    /// (excluding `id` itself).
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).to_vec();
        stack.reverse();
        Descendants { tree: self, stack }
    }

    pub fn find_first(&self, pred: impl Fn(&DomTree, NodeId) -> bool) -> Option<NodeId> {
        self.descendants(self.root).find(|id| pred(self, *id))
    }

    pub fn find_all(&self, pred: impl Fn(&DomTree, NodeId) -> bool) -> Vec<NodeId> {
        self.descendants(self.root)
            .filter(|id| pred(self, *id))
            .collect()
    }

    /// Concatenated text of the subtree rooted at `id`, document order.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(t) = self.text(id) {
            out.push_str(t);
        }
        for child in self.descendants(id) {
            if let Some(t) = self.text(child) {
                out.push_str(t);
            }
        }
        out
    }

    /// Total character count of all text in the subtree.
    pub fn subtree_char_len(&self, id: NodeId) -> usize {
        let own = self.text(id).map(|t| t.chars().count()).unwrap_or(0);
        own + self
            .descendants(id)
            .filter_map(|c| self.text(c))
            .map(|t| t.chars().count())
            .sum::<usize>()
    }

    // === Text-offset mapping (selection re-anchoring) ===

    /// Absolute character offset of an anchor expressed as a node plus an
    /// in-node offset (chars into a text node, child index for elements).
    pub fn text_offset_at(&self, node: NodeId, offset: usize) -> usize {
        let mut acc = 0usize;
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            if id == node {
                return match self.data(id) {
                    Some(NodeData::Text(t)) => acc + offset.min(t.chars().count()),
                    Some(NodeData::Element(_)) => {
                        acc + self
                            .children(id)
                            .iter()
                            .take(offset)
                            .map(|c| self.subtree_char_len(*c))
                            .sum::<usize>()
                    }
                    None => acc,
                };
            }
            match self.data(id) {
                Some(NodeData::Text(t)) => acc += t.chars().count(),
                Some(NodeData::Element(_)) => {
                    for child in self.children(id).iter().rev() {
                        stack.push(*child);
                    }
                }
                None => {}
            }
        }
        acc
    }

    /// Re-anchor an absolute character offset onto a text node. Offsets
    /// past the end land at the end of the last text node; a tree with no
    /// text yields None.
    pub fn anchor_at_text_offset(&self, pos: usize) -> Option<(NodeId, usize)> {
        let mut acc = 0usize;
        let mut last_text: Option<(NodeId, usize)> = None;
        for id in self.descendants(self.root) {
            if let Some(t) = self.text(id) {
                let len = t.chars().count();
                if pos <= acc + len {
                    return Some((id, pos - acc));
                }
                acc += len;
                last_text = Some((id, len));
            }
        }
        last_text
    }

    /// The last text node in document order, with its char length.
    pub fn last_text_node(&self) -> Option<(NodeId, usize)> {
        let mut last = None;
        for id in self.descendants(self.root) {
            if let Some(t) = self.text(id) {
                last = Some((id, t.chars().count()));
            }
        }
        last
    }

    /// Deep-copy a subtree from another tree into this arena. The copy
    /// arrives detached; attach it with `append_child` or the insert
    /// helpers.
    pub fn import(&mut self, source: &DomTree, node: NodeId) -> NodeId {
        let data = match source.data(node) {
            Some(data) => data.clone(),
            None => NodeData::Text(String::new()),
        };
        let copy = self.push_slot(data);
        for child in source.children(node) {
            let imported = self.import(source, *child);
            self.append_child(copy, imported);
        }
        copy
    }

    // === Cleanup ===

    /// Merge adjacent sibling text nodes and drop empty ones, across the
    /// whole tree. Mirrors `Node.normalize()` on a live surface.
    pub fn normalize(&mut self) {
        let elements: Vec<NodeId> = std::iter::once(self.root)
            .chain(self.descendants(self.root))
            .filter(|id| self.element(*id).is_some())
            .collect();

        for el in elements {
            let children = self.children(el).to_vec();
            let mut previous_text: Option<NodeId> = None;
            for child in children {
                match self.text(child).map(str::to_owned) {
                    Some(t) if t.is_empty() => {
                        self.detach(child);
                    }
                    Some(t) => {
                        if let Some(prev) = previous_text {
                            if let Some(buf) = self.text_mut(prev) {
                                buf.push_str(&t);
                            }
                            self.detach(child);
                        } else {
                            previous_text = Some(child);
                        }
                    }
                    None => previous_text = None,
                }
            }
        }
    }
}

/// Preorder iterator returned by `DomTree::descendants`.
pub struct Descendants<'a> {
    tree: &'a DomTree,
    stack: Vec<NodeId>,
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        for child in self.tree.children(id).iter().rev() {
            self.stack.push(*child);
        }
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (DomTree, NodeId, NodeId, NodeId) {
        // <p>hello <strong>world</strong></p>
        let mut tree = DomTree::new();
        let p = tree.create_element("p");
        let hello = tree.create_text("hello ");
        let strong = tree.create_element("strong");
        let world = tree.create_text("world");
        let root = tree.root();
        tree.append_child(root, p);
        tree.append_child(p, hello);
        tree.append_child(p, strong);
        tree.append_child(strong, world);
        (tree, p, strong, world)
    }

    #[test]
    fn test_build_and_text_content() {
        let (tree, p, ..) = sample();
        assert_eq!(tree.text_content(tree.root()), "hello world");
        assert_eq!(tree.text_content(p), "hello world");
        assert_eq!(tree.children(p).len(), 2);
    }

    #[test]
    fn test_unwrap_preserves_children_in_place() {
        let (mut tree, p, strong, world) = sample();
        let spliced = tree.unwrap_node(strong);
        assert_eq!(spliced, vec![world]);
        assert_eq!(tree.parent(world), Some(p));
        assert_eq!(tree.text_content(p), "hello world");
        assert!(!tree.is_attached(strong));
        // "world" sits where the wrapper used to be.
        assert_eq!(tree.child_index(world), Some(1));
    }

    #[test]
    fn test_wrap_takes_nodes_place() {
        let (mut tree, p, strong, world) = sample();
        let em = tree.create_element("em");
        tree.wrap_node(world, em);
        assert_eq!(tree.parent(em), Some(strong));
        assert_eq!(tree.parent(world), Some(em));
        assert_eq!(tree.children(em), &[world]);
        assert_eq!(tree.text_content(p), "hello world");
    }

    #[test]
    fn test_closest() {
        let (tree, p, strong, world) = sample();
        assert_eq!(tree.closest_tag(world, "strong"), Some(strong));
        assert_eq!(tree.closest_tag(world, "p"), Some(p));
        assert_eq!(tree.closest_tag(world, "em"), None);
        // An element matches itself.
        assert_eq!(tree.closest_tag(strong, "strong"), Some(strong));
    }

    #[test]
    fn test_detach_and_is_attached() {
        let (mut tree, p, strong, world) = sample();
        assert!(tree.is_attached(world));
        tree.detach(strong);
        assert!(!tree.is_attached(strong));
        assert!(!tree.is_attached(world));
        assert_eq!(tree.text_content(p), "hello ");
        // Detached nodes still resolve.
        assert_eq!(tree.text(world), Some("world"));
    }

    #[test]
    fn test_insert_before_and_after() {
        let (mut tree, p, strong, _) = sample();
        let comma = tree.create_text(", ");
        tree.insert_before(strong, comma);
        assert_eq!(tree.text_content(p), "hello , world");

        let bang = tree.create_text("!");
        tree.insert_after(strong, bang);
        assert_eq!(tree.text_content(p), "hello , world!");
    }

    #[test]
    fn test_normalize_merges_text_runs() {
        let mut tree = DomTree::new();
        let p = tree.create_element("p");
        let root = tree.root();
        tree.append_child(root, p);
        for part in ["cat", "", " ", "scatter"] {
            let t = tree.create_text(part);
            tree.append_child(p, t);
        }
        tree.normalize();
        assert_eq!(tree.children(p).len(), 1);
        assert_eq!(tree.text_content(p), "cat scatter");
    }

    #[test]
    fn test_text_offset_round_trip() {
        let (tree, _, _, world) = sample();
        // "hello " is 6 chars; offset 2 into "world" is absolute 8.
        assert_eq!(tree.text_offset_at(world, 2), 8);
        let (node, offset) = tree.anchor_at_text_offset(8).unwrap();
        assert_eq!(node, world);
        assert_eq!(offset, 2);
    }

    #[test]
    fn test_anchor_past_end_lands_at_last_text() {
        let (tree, _, _, world) = sample();
        let (node, offset) = tree.anchor_at_text_offset(999).unwrap();
        assert_eq!(node, world);
        assert_eq!(offset, 5);
    }

    #[test]
    fn test_rebuild_bumps_revision() {
        let mut tree = DomTree::from_markup("<p>one</p>");
        let before = tree.revision();
        tree.rebuild("<p>two</p>");
        assert_eq!(tree.revision(), before + 1);
        assert_eq!(tree.text_content(tree.root()), "two");
    }
}
