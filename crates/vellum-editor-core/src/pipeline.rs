//! The change pipeline: the single chokepoint after any mutation.
//!
//! Re-validate against the tag policy (rewriting only when the cheap
//! compliance check fails), notify the caller with the new serialized
//! value, persist it, and recompute the active-formatting snapshot.
//! Guarded by a flag so it can never recurse into itself, and safe to
//! call redundantly on an already-compliant, already-notified state.

use crate::editor::Editor;
use crate::selection;
use crate::surface::TextSurface;
use crate::types::{ActiveFormatting, is_block_tag};

impl<S: TextSurface> Editor<S> {
    pub fn handle_change(&mut self) {
        if self.in_change {
            return;
        }
        self.in_change = true;

        if !self.raw_view && !self.policy.is_compliant(self.surface.tree()) {
            let saved = selection::capture(&self.surface);
            let markup = self.surface.tree().to_html();
            let clean = self.policy.sanitize_markup(&markup);
            tracing::debug!(
                before = markup.len(),
                after = clean.len(),
                "document fell out of policy, resanitizing"
            );
            self.surface.tree_mut().rebuild(&clean);
            if let Some(range) = saved {
                selection::restore(&mut self.surface, range);
            }
        }

        let html = self.surface.tree().to_html();
        if let Some(callback) = self.on_change.as_mut() {
            callback(&html);
        }
        self.persist_content(&html);
        self.refresh_active_formatting();

        self.in_change = false;
    }

    /// Recompute which toggles are active at the caret.
    pub(crate) fn refresh_active_formatting(&mut self) {
        let mut formatting = ActiveFormatting::default();

        if let Some(sel) = self.surface.selection() {
            let tree = self.surface.tree();
            if sel.revision == tree.revision() && tree.is_attached(sel.start.node) {
                let node = sel.start.node;
                formatting.bold = tree.closest_tag(node, "strong").is_some();
                formatting.italic = tree.closest_tag(node, "em").is_some();
                formatting.underline = tree.closest_tag(node, "u").is_some();
                formatting.strikethrough = tree.closest_tag(node, "s").is_some();
                formatting.superscript = tree.closest_tag(node, "sup").is_some();
                formatting.subscript = tree.closest_tag(node, "sub").is_some();
                formatting.unordered_list = tree.closest_tag(node, "ul").is_some();
                formatting.ordered_list = tree.closest_tag(node, "ol").is_some();

                if let Some(block) = tree.closest(node, |el| is_block_tag(&el.tag)) {
                    match tree.style(block).get("text-align") {
                        Some("left") => formatting.justify_left = true,
                        Some("center") => formatting.justify_center = true,
                        Some("right") => formatting.justify_right = true,
                        _ => {}
                    }
                }
            }
        }

        // Ambient state counts even before anything is typed.
        formatting.bold |= self.surface.ambient_format("strong");
        formatting.italic |= self.surface.ambient_format("em");
        formatting.underline |= self.surface.ambient_format("u");
        formatting.strikethrough |= self.surface.ambient_format("s");
        formatting.superscript |= self.surface.ambient_format("sup");
        formatting.subscript |= self.surface.ambient_format("sub");

        self.active_formatting = formatting;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::config::EditorOptions;
    use crate::editor::{Editor, Hosts};
    use crate::surface::TextSurface;

    fn editor_with(value: &str, tags: &[&str]) -> Editor {
        let options = EditorOptions::default()
            .with_value(value)
            .with_allowed_tags(tags.iter().copied())
            .with_storage_key(None);
        Editor::new(options, Hosts::default())
    }

    #[test]
    fn test_compliant_document_untouched() {
        let mut editor = editor_with("<p>hi <strong>you</strong></p>", &["p", "strong"]);
        editor.handle_change();
        assert_eq!(editor.value(), "<p>hi <strong>you</strong></p>");
    }

    #[test]
    fn test_noncompliant_document_rewritten() {
        let mut editor = editor_with("<p>x</p>", &["p", "strong"]);
        // Smuggle a disallowed element straight into the tree.
        let tree = editor.surface_mut().tree_mut();
        let p = tree.children(tree.root())[0];
        let em = tree.create_element("em");
        let text = tree.create_text("sneaky");
        tree.append_child(em, text);
        tree.append_child(p, em);

        editor.handle_change();
        assert_eq!(editor.value(), "<p>xsneaky</p>");
    }

    #[test]
    fn test_on_change_receives_serialized_value() {
        let mut editor = editor_with("<p>hi</p>", &["p"]);
        let seen: Rc<RefCell<Vec<String>>> = Rc::default();
        let sink = Rc::clone(&seen);
        editor.set_on_change(move |html| sink.borrow_mut().push(html.to_string()));

        editor.handle_change();
        assert_eq!(seen.borrow().as_slice(), ["<p>hi</p>".to_string()]);
    }

    #[test]
    fn test_selection_survives_resanitize() {
        let mut editor = editor_with("<p>hello world</p>", &["p"]);
        let tree = editor.surface_mut().tree_mut();
        let p = tree.children(tree.root())[0];
        let em = tree.create_element("em");
        let text = tree.create_text("!!");
        tree.append_child(em, text);
        tree.append_child(p, em);

        editor.select(6, 11);
        editor.handle_change();

        assert_eq!(editor.value(), "<p>hello world!!</p>");
        assert_eq!(editor.surface().selected_text(), "world");
    }

    #[test]
    fn test_redundant_calls_are_stable() {
        let mut editor = editor_with("<p>hi</p>", &["p"]);
        let counter: Rc<RefCell<usize>> = Rc::default();
        let sink = Rc::clone(&counter);
        editor.set_on_change(move |_| *sink.borrow_mut() += 1);

        editor.handle_change();
        let first = editor.value();
        editor.handle_change();
        assert_eq!(editor.value(), first);
        assert_eq!(*counter.borrow(), 2);
    }
}
