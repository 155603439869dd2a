//! Command dispatch: `exec(command, argument)` and the per-command
//! mutation logic.
//!
//! Every branch that mutates content ends in the change pipeline;
//! branches that only open an auxiliary picker park the selection and
//! return. Mutating helpers report whether they changed anything so a
//! history checkpoint is only recorded for real edits.

use vellum_dom::{DomTree, NodeId};

use crate::command::Command;
use crate::editor::{DeferredOp, Editor, ListKind};
use crate::history::UndoManager;
use crate::paste::clean_word_markup;
use crate::selection;
use crate::surface::TextSurface;
use crate::types::{Anchor, SelectionRange, is_block_tag};

impl<S: TextSurface> Editor<S> {
    /// The single mutation entry point for named commands.
    pub fn exec(&mut self, cmd: Command, arg: Option<&str>) {
        selection::ensure_focused(&mut self.surface);

        match cmd {
            Command::Undo => {
                self.undo();
            }
            Command::Redo => {
                self.redo();
            }
            Command::Bold => self.exec_inline_toggle("strong"),
            Command::Italic => self.exec_inline_toggle("em"),
            Command::Underline => self.exec_inline_toggle("u"),
            Command::Strikethrough => self.exec_inline_toggle("s"),
            Command::Superscript => self.exec_inline_toggle("sup"),
            Command::Subscript => self.exec_inline_toggle("sub"),
            Command::FormatBlock => {
                let arg = arg.unwrap_or("");
                if arg.eq_ignore_ascii_case("blockquote") {
                    self.run_tracked(|e| e.apply_blockquote());
                } else {
                    self.run_tracked(|e| e.apply_format_block(arg));
                }
                self.handle_change();
            }
            Command::JustifyLeft => {
                self.run_tracked(|e| e.justify_blocks("left"));
                self.handle_change();
            }
            Command::JustifyCenter => {
                self.run_tracked(|e| e.justify_blocks("center"));
                self.handle_change();
            }
            Command::JustifyRight => {
                self.run_tracked(|e| e.justify_blocks("right"));
                self.handle_change();
            }
            Command::CreateLink => {
                self.run_tracked(|e| e.create_link());
                self.handle_change();
            }
            Command::Unlink => {
                self.run_tracked(|e| e.unlink());
                self.handle_change();
            }
            Command::InsertUnorderedList => {
                self.run_tracked(|e| e.toggle_list(ListKind::Unordered));
                self.handle_change();
            }
            Command::InsertOrderedList => {
                self.run_tracked(|e| e.toggle_list(ListKind::Ordered));
                self.handle_change();
            }
            Command::UnorderedListStyle => {
                self.set_list_style(ListKind::Unordered, arg.unwrap_or(""));
            }
            Command::OrderedListStyle => {
                self.set_list_style(ListKind::Ordered, arg.unwrap_or(""));
            }
            Command::ToUpperCase => {
                self.run_tracked(|e| e.transform_case(true));
                self.handle_change();
            }
            Command::ToLowerCase => {
                self.run_tracked(|e| e.transform_case(false));
                self.handle_change();
            }
            Command::ToggleHtml => {
                self.toggle_raw_view();
                self.handle_change();
            }
            Command::InsertHorizontalRule => {
                self.run_tracked(|e| e.insert_horizontal_rule());
                self.handle_change();
            }
            Command::FontName => {
                self.run_tracked(|e| e.apply_font_family(arg.unwrap_or("")));
                self.handle_change();
            }
            Command::Cut => {
                if self.clipboard_cut() {
                    self.handle_change();
                }
            }
            Command::Copy => {
                self.clipboard_copy();
            }
            Command::Paste => {
                if self.clipboard_paste() {
                    self.handle_change();
                }
            }
            Command::RemoveText => {
                let removed = self.run_tracked(|e| e.surface.delete_selection());
                if removed {
                    self.handle_change();
                }
            }
            Command::SelectAll => {
                self.surface.select_all();
                self.handle_change();
            }
            // Picker-only branches: park the selection, no pipeline.
            Command::InsertImage => {
                self.park_selection();
                self.hosts.picker.request_image();
            }
            Command::InsertEmoji
            | Command::InsertTableGrid
            | Command::TextColor
            | Command::Highlight => {
                self.park_selection();
            }
        }

        self.flush_deferred_if_settled();
    }

    /// Whether a command's toolbar affordance is shown under the policy.
    pub fn command_visible(&self, cmd: Command) -> bool {
        match cmd.policy_gate() {
            Some(gate) => self.policy.allows(gate),
            None => true,
        }
    }

    /// Paste pre-rendered markup (the text/html clipboard flavor):
    /// word-processor cruft is cleaned, then the fragment is sanitized
    /// and spliced in at the caret.
    pub fn paste_html(&mut self, html: &str) {
        self.checkpoint();
        let cleaned = clean_word_markup(html);
        let cleaned = self.policy.sanitize_markup(&cleaned);
        let fragment = DomTree::from_markup(&cleaned);
        let top_level: Vec<NodeId> = fragment.children(fragment.root()).to_vec();
        for node in top_level {
            let imported = self.surface.tree_mut().import(&fragment, node);
            self.surface.insert_node_at_caret(imported);
        }
        self.handle_change();
    }

    // === Internals ===

    /// Run a mutating helper, recording a history checkpoint only when
    /// it actually changed the document.
    fn run_tracked(&mut self, op: impl FnOnce(&mut Self) -> bool) -> bool {
        let snapshot = self.document_snapshot();
        let changed = op(self);
        if changed {
            self.history.record(snapshot);
        }
        changed
    }

    fn exec_inline_toggle(&mut self, tag: &'static str) {
        self.run_tracked(|e| e.toggle_inline_format(tag));
        self.handle_change();
    }

    /// Nearest block-level ancestor of a node, if any.
    fn block_of(&self, node: NodeId) -> Option<NodeId> {
        self.surface
            .tree()
            .closest(node, |el| is_block_tag(&el.tag))
    }

    fn current_block(&self) -> Option<NodeId> {
        let sel = self.surface.selection()?;
        self.block_of(sel.start.node)
    }

    /// Block elements the selection spans: the start block's siblings up
    /// to and including the end block (or the sibling containing it).
    fn selection_blocks(&self) -> Vec<NodeId> {
        let Some(sel) = self.surface.selection() else {
            return Vec::new();
        };
        let tree = self.surface.tree();
        let start_block = self.block_of(sel.start.node);
        let end_block = self.block_of(sel.end.node);
        match (start_block, end_block) {
            (Some(start), Some(end)) if start != end => {
                let Some(parent) = tree.parent(start) else {
                    return vec![start];
                };
                let mut blocks = Vec::new();
                let mut walking = false;
                for sibling in tree.children(parent) {
                    if *sibling == start {
                        walking = true;
                    }
                    if !walking {
                        continue;
                    }
                    if tree.tag(*sibling).is_some_and(is_block_tag) {
                        blocks.push(*sibling);
                    }
                    if *sibling == end || is_ancestor(tree, *sibling, end) {
                        break;
                    }
                }
                blocks
            }
            (Some(start), _) => vec![start],
            _ => Vec::new(),
        }
    }

    /// Toggle an inline wrapper on the current selection.
    fn toggle_inline_format(&mut self, tag: &str) -> bool {
        let Some(sel) = self.surface.selection() else {
            self.surface.toggle_ambient_format(tag);
            return false;
        };
        if sel.is_collapsed() {
            // Collapsed caret toggles the "next typed character" state.
            self.surface.toggle_ambient_format(tag);
            return false;
        }

        let blocks = self.selection_blocks();
        if blocks.len() > 1 {
            // Independent toggle per block; never merge distinct blocks.
            for block in blocks {
                self.toggle_block_wrap(block, tag);
            }
            selection::restore(&mut self.surface, sel);
            return true;
        }

        if let Some(wrapper) = self.surface.tree().closest_tag(sel.start.node, tag) {
            self.surface.tree_mut().unwrap_node(wrapper);
            selection::restore(&mut self.surface, sel);
            return true;
        }

        let selected = self.surface.selected_text();
        if selected.is_empty() {
            return false;
        }
        self.surface.delete_selection();
        let wrapper = {
            let tree = self.surface.tree_mut();
            let el = tree.create_element(tag);
            let text = tree.create_text(selected);
            tree.append_child(el, text);
            el
        };
        self.surface.insert_node_at_caret(wrapper);
        true
    }

    /// Per-block arm of a multi-block toggle: if the block is entirely
    /// wrapped, unwrap; otherwise wrap the block's whole content.
    fn toggle_block_wrap(&mut self, block: NodeId, tag: &str) {
        let tree = self.surface.tree_mut();
        let children = tree.children(block).to_vec();
        if children.len() == 1 && tree.tag(children[0]) == Some(tag) {
            tree.unwrap_node(children[0]);
            return;
        }
        let wrapper = tree.create_element(tag);
        for child in children {
            tree.append_child(wrapper, child);
        }
        tree.append_child(block, wrapper);
    }

    /// Rewrap the current block as the named tag. Stray angle brackets in
    /// the argument are stripped, never rejected.
    fn apply_format_block(&mut self, arg: &str) -> bool {
        let clean: String = arg
            .chars()
            .filter(|c| *c != '<' && *c != '>')
            .collect::<String>()
            .trim()
            .to_ascii_lowercase();
        if clean.is_empty() || !clean.chars().all(|c| c.is_ascii_alphanumeric()) {
            return false;
        }

        let Some(block) = self.current_block() else {
            // Bare content under the root: give it a block of its own.
            let tree = self.surface.tree_mut();
            let root = tree.root();
            let children = tree.children(root).to_vec();
            let block = tree.create_element(clean.as_str());
            for child in children {
                tree.append_child(block, child);
            }
            tree.append_child(root, block);
            return true;
        };

        if self.surface.tree().tag(block) == Some(clean.as_str()) {
            return false;
        }
        let saved = selection::capture(&self.surface);
        {
            let tree = self.surface.tree_mut();
            let replacement = tree.create_element(clean.as_str());
            let children = tree.children(block).to_vec();
            for child in children {
                tree.append_child(replacement, child);
            }
            tree.replace_with(block, replacement);
        }
        if let Some(range) = saved {
            selection::restore(&mut self.surface, range);
        }
        true
    }

    /// Toggle the blockquote wrapper around the caret, or build a fresh
    /// quote with its separately editable citation line.
    fn apply_blockquote(&mut self) -> bool {
        let Some(sel) = self.surface.selection() else {
            return false;
        };

        if let Some(existing) = self.surface.tree().closest_tag(sel.start.node, "blockquote") {
            self.surface.tree_mut().unwrap_node(existing);
            selection::restore(&mut self.surface, sel);
            return true;
        }

        let selected = self.surface.selected_text();
        if !selected.is_empty() {
            self.surface.delete_selection();
        }

        let (quote, cite_text, quote_text) = {
            let tree = self.surface.tree_mut();
            let quote = tree.create_element("blockquote");
            let body = tree.create_element("p");
            let body_text = if selected.is_empty() {
                tree.create_text("\u{a0}")
            } else {
                tree.create_text(selected.clone())
            };
            tree.append_child(body, body_text);
            tree.append_child(quote, body);

            let cite = tree.create_element("cite");
            if let Some(el) = tree.element_mut(cite) {
                el.set_attr("contenteditable", "true");
                let margin_top = if selected.is_empty() { "8px" } else { "6px" };
                el.set_attr(
                    "style",
                    format!(
                        "display: block; margin-top: {margin_top}; font-style: normal; color: #888;"
                    ),
                );
            }
            let cite_text = tree.create_text("— Source");
            tree.append_child(cite, cite_text);
            tree.append_child(quote, cite);
            (quote, cite_text, body_text)
        };
        self.surface.insert_node_at_caret(quote);

        // Caret lands in the citation line when quoting a selection, in
        // the quote body when starting empty.
        let caret = if selected.is_empty() {
            SelectionRange::caret(self.surface.tree(), Anchor::new(quote_text, 0))
        } else {
            let len = self
                .surface
                .tree()
                .text(cite_text)
                .map(|t| t.chars().count())
                .unwrap_or(0);
            SelectionRange::caret(self.surface.tree(), Anchor::new(cite_text, len))
        };
        self.surface.set_selection(Some(caret));
        true
    }

    fn justify_blocks(&mut self, align: &str) -> bool {
        let blocks = self.selection_blocks();
        if blocks.is_empty() {
            return false;
        }
        for block in blocks {
            self.surface
                .tree_mut()
                .set_style_property(block, "text-align", align);
        }
        true
    }

    fn create_link(&mut self) -> bool {
        let Some(url) = self.hosts.prompt.prompt_url().filter(|u| !u.is_empty()) else {
            return false;
        };
        let selected = self.surface.selected_text();
        if selected.is_empty() {
            return false;
        }
        self.surface.delete_selection();
        let anchor = {
            let tree = self.surface.tree_mut();
            let a = tree.create_element("a");
            if let Some(el) = tree.element_mut(a) {
                el.set_attr("href", url);
                el.set_attr("target", "_blank");
                el.set_attr("rel", "noopener noreferrer");
            }
            let text = tree.create_text(selected);
            tree.append_child(a, text);
            a
        };
        self.surface.insert_node_at_caret(anchor);
        true
    }

    fn unlink(&mut self) -> bool {
        let Some(sel) = self.surface.selection() else {
            return false;
        };
        let Some(link) = self.surface.tree().closest_tag(sel.start.node, "a") else {
            return false;
        };
        self.surface.tree_mut().unwrap_node(link);
        selection::restore(&mut self.surface, sel);
        true
    }

    /// Toggle the caret's block into or out of a list of `kind`.
    fn toggle_list(&mut self, kind: ListKind) -> bool {
        let Some(sel) = self.surface.selection() else {
            return false;
        };

        if let Some(list) = self.surface.tree().closest_tag(sel.start.node, kind.tag()) {
            // Outdent: every item becomes a paragraph where the list was.
            let tree = self.surface.tree_mut();
            let items = tree.children(list).to_vec();
            for item in items {
                if tree.tag(item) == Some("li") {
                    let paragraph = tree.create_element("p");
                    let kids = tree.children(item).to_vec();
                    for kid in kids {
                        tree.append_child(paragraph, kid);
                    }
                    tree.insert_before(list, paragraph);
                } else {
                    tree.insert_before(list, item);
                }
            }
            tree.detach(list);
            selection::restore(&mut self.surface, sel);
            return true;
        }

        match self.current_block() {
            Some(block) if self.surface.tree().tag(block) != Some("li") => {
                let tree = self.surface.tree_mut();
                let list = tree.create_element(kind.tag());
                let item = tree.create_element("li");
                let kids = tree.children(block).to_vec();
                for kid in kids {
                    tree.append_child(item, kid);
                }
                tree.append_child(list, item);
                tree.replace_with(block, list);
                selection::restore(&mut self.surface, sel);
                true
            }
            Some(_) => false,
            None => {
                // Nothing to convert: start an empty list at the caret.
                let (list, item) = {
                    let tree = self.surface.tree_mut();
                    let list = tree.create_element(kind.tag());
                    let item = tree.create_element("li");
                    let br = tree.create_element("br");
                    tree.append_child(item, br);
                    tree.append_child(list, item);
                    (list, item)
                };
                self.surface.insert_node_at_caret(list);
                let caret = SelectionRange::caret(self.surface.tree(), Anchor::new(item, 0));
                self.surface.set_selection(Some(caret));
                true
            }
        }
    }

    /// Style the list around the caret now, or create one and defer the
    /// styling until the surface confirms the new structure exists.
    pub(crate) fn set_list_style(&mut self, kind: ListKind, style: &str) {
        let style = if style.is_empty() {
            kind.default_style().to_string()
        } else {
            style.to_string()
        };

        let in_list = self
            .surface
            .selection()
            .and_then(|sel| self.surface.tree().closest_tag(sel.start.node, kind.tag()))
            .is_some();

        if in_list {
            self.run_tracked(|e| e.style_nearest_list(kind, &style));
            self.handle_change();
            return;
        }

        // Two phases: create the list, then style it once the structural
        // mutation is observable.
        self.run_tracked(|e| e.toggle_list(kind));
        self.handle_change();
        self.deferred.push(DeferredOp::StyleList { kind, style });
        self.flush_deferred_if_settled();
    }

    /// Apply a list style to the nearest list of `kind`, falling back to
    /// the document's first such list when the caret lost its place.
    pub(crate) fn style_nearest_list(&mut self, kind: ListKind, style: &str) -> bool {
        let tree = self.surface.tree();
        let from_caret = self
            .surface
            .selection()
            .and_then(|sel| tree.closest_tag(sel.start.node, kind.tag()));
        let target =
            from_caret.or_else(|| tree.find_first(|t, id| t.tag(id) == Some(kind.tag())));
        let Some(list) = target else {
            return false;
        };
        let tree = self.surface.tree_mut();
        tree.set_style_property(list, "list-style-type", style);
        tree.set_style_property(list, "padding-left", "1.5rem");
        true
    }

    /// Case-transform the selection, or the whole serialized document
    /// when the caret is collapsed (a blind string transform; the parser
    /// re-normalizes tag and attribute names on the way back in).
    fn transform_case(&mut self, upper: bool) -> bool {
        let selected = self.surface.selected_text();
        if !selected.is_empty() {
            let transformed = if upper {
                selected.to_uppercase()
            } else {
                selected.to_lowercase()
            };
            self.surface.delete_selection();
            let node = self.surface.tree_mut().create_text(transformed);
            self.surface.insert_node_at_caret(node);
            return true;
        }

        let markup = self.surface.tree().to_html();
        if markup.is_empty() {
            return false;
        }
        let transformed = if upper {
            markup.to_uppercase()
        } else {
            markup.to_lowercase()
        };
        self.surface.tree_mut().rebuild(&transformed);
        self.surface.caret_to_end();
        true
    }

    fn insert_horizontal_rule(&mut self) -> bool {
        let hr = self.surface.tree_mut().create_element("hr");
        self.surface.insert_node_at_caret(hr);
        true
    }

    fn apply_font_family(&mut self, family: &str) -> bool {
        if family.is_empty() {
            return false;
        }
        let selected = self.surface.selected_text();
        if !selected.is_empty() {
            self.surface.delete_selection();
        }
        let span = {
            let tree = self.surface.tree_mut();
            let span = tree.create_element("span");
            if let Some(el) = tree.element_mut(span) {
                el.set_attr("style", format!("font-family: {family};"));
            }
            if !selected.is_empty() {
                let text = tree.create_text(selected.clone());
                tree.append_child(span, text);
            }
            span
        };
        self.surface.insert_node_at_caret(span);
        if selected.is_empty() {
            // Empty span: the caret moves inside so typed text inherits.
            let caret = SelectionRange::caret(self.surface.tree(), Anchor::new(span, 0));
            self.surface.set_selection(Some(caret));
        }
        true
    }

    /// Swap between rendered mode and the raw-markup plain-text view.
    fn toggle_raw_view(&mut self) {
        if !self.raw_view {
            let markup = self.surface.tree().to_html();
            let tree = self.surface.tree_mut();
            tree.rebuild("");
            let text = tree.create_text(markup);
            let root = tree.root();
            tree.append_child(root, text);
            self.surface.set_selection(None);
            self.raw_view = true;
        } else {
            // The user may have hand-edited the markup; resanitize it.
            let raw = {
                let tree = self.surface.tree();
                tree.text_content(tree.root())
            };
            let clean = self.policy.sanitize_markup(&raw);
            self.surface.tree_mut().rebuild(&clean);
            self.surface.set_selection(None);
            self.raw_view = false;
        }
    }

    // === Clipboard ===

    /// Cut deletes locally only after the host write succeeds; a host
    /// rejection leaves the document untouched.
    fn clipboard_cut(&mut self) -> bool {
        let selected = self.surface.selected_text();
        if selected.is_empty() {
            return false;
        }
        match self.hosts.clipboard.write_text(&selected) {
            Ok(()) => {
                self.checkpoint();
                self.surface.delete_selection();
                true
            }
            Err(err) => {
                tracing::warn!(error = %err, "cut abandoned, clipboard write failed");
                false
            }
        }
    }

    fn clipboard_copy(&mut self) {
        let selected = self.surface.selected_text();
        let text = if selected.is_empty() {
            let tree = self.surface.tree();
            tree.text_content(tree.root())
        } else {
            selected
        };
        if let Err(err) = self.hosts.clipboard.write_text(&text) {
            tracing::warn!(error = %err, "copy failed");
        }
    }

    fn clipboard_paste(&mut self) -> bool {
        match self.hosts.clipboard.read_text() {
            Ok(text) if !text.is_empty() => {
                self.checkpoint();
                self.surface.insert_text(&text);
                true
            }
            Ok(_) => false,
            Err(err) => {
                tracing::warn!(error = %err, "paste abandoned, clipboard read failed");
                false
            }
        }
    }
}

fn is_ancestor(tree: &DomTree, maybe_ancestor: NodeId, node: NodeId) -> bool {
    let mut current = tree.parent(node);
    while let Some(parent) = current {
        if parent == maybe_ancestor {
            return true;
        }
        current = tree.parent(parent);
    }
    false
}
