//! Selection capture and restore across tree mutation.
//!
//! Every mutating command snapshots the selection before touching the
//! tree and re-applies it afterwards. Restoration is layered: exact node
//! anchors when the tree incarnation still matches, absolute text offsets
//! when it does not, and an end-of-document caret as the last resort.
//! Restore never fails outward.

use crate::surface::TextSurface;
use crate::types::SelectionRange;

/// Snapshot the current selection, if any.
pub fn capture<S: TextSurface>(surface: &S) -> Option<SelectionRange> {
    surface.selection()
}

/// Re-apply a previously captured range.
pub fn restore<S: TextSurface>(surface: &mut S, range: SelectionRange) {
    let tree = surface.tree();

    let anchors_valid = range.revision == tree.revision()
        && tree.is_attached(range.start.node)
        && tree.is_attached(range.end.node);
    if anchors_valid {
        surface.set_selection(Some(range));
        return;
    }

    // The anchors died with an old tree; fall back to text offsets.
    match SelectionRange::from_text_range(tree, range.text_start, range.text_end) {
        Some(reanchored) => surface.set_selection(Some(reanchored)),
        None => {
            tracing::debug!(
                text_start = range.text_start,
                text_end = range.text_end,
                "selection restore failed, collapsing to end of document"
            );
            surface.caret_to_end();
        }
    }
}

/// Force focus onto the surface without losing the selection.
pub fn ensure_focused<S: TextSurface>(surface: &mut S) {
    if surface.is_focused() {
        return;
    }
    let saved = capture(surface);
    surface.focus();
    if let Some(range) = saved {
        restore(surface, range);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::MemorySurface;

    #[test]
    fn test_restore_exact_when_tree_unchanged() {
        let mut surface = MemorySurface::from_markup("<p>hello</p>");
        let range = SelectionRange::from_text_range(surface.tree(), 1, 3).unwrap();
        restore(&mut surface, range);
        assert_eq!(surface.selection(), Some(range));
    }

    #[test]
    fn test_restore_reanchors_after_rebuild() {
        let mut surface = MemorySurface::from_markup("<p>hello <em>world</em></p>");
        let range = SelectionRange::from_text_range(surface.tree(), 6, 11).unwrap();

        // Rebuild with the same text but different structure (em unwrapped).
        surface.tree_mut().rebuild("<p>hello world</p>");
        restore(&mut surface, range);

        let restored = surface.selection().unwrap();
        assert_eq!(restored.text_start, 6);
        assert_eq!(restored.text_end, 11);
        assert_eq!(surface.selected_text(), "world");
    }

    #[test]
    fn test_restore_falls_back_to_document_end() {
        let mut surface = MemorySurface::from_markup("<p>hello</p>");
        let range = SelectionRange::from_text_range(surface.tree(), 1, 3).unwrap();

        surface.tree_mut().rebuild("");
        restore(&mut surface, range);

        // Nothing to anchor to: caret collapses at the (empty) end.
        let caret = surface.selection().unwrap();
        assert!(caret.is_collapsed());
    }

    #[test]
    fn test_ensure_focused_preserves_selection() {
        let mut surface = MemorySurface::from_markup("<p>hello</p>");
        let range = SelectionRange::from_text_range(surface.tree(), 0, 5);
        surface.set_selection(range);
        assert!(!surface.is_focused());

        ensure_focused(&mut surface);
        assert!(surface.is_focused());
        assert_eq!(surface.selected_text(), "hello");
    }
}
