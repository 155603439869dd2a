//! The editor facade: wiring for the surface, policy, hosts, and state.
//!
//! `Editor` owns one document surface and routes every mutation through
//! the change pipeline. The command dispatcher lives in `exec.rs`, the
//! pipeline in `pipeline.rs`; this file holds construction, persistence,
//! the plugin/search/image entry points, and the two-phase insertion
//! paths (images, tables, emoji) that park a captured selection while a
//! picker is open.

use smol_str::SmolStr;
use vellum_dom::NodeId;

use crate::command::Command;
use crate::config::EditorOptions;
use crate::history::{DocumentHistory, Snapshot, UndoManager};
use crate::host::{
    Clipboard, FilePicker, KeyValueStore, LinkPrompt, MemoryClipboard, MemoryStore,
    RecordingPicker, StaticPrompt,
};
use crate::image::{self, ImageProps, ResizeHandle, ResizeSession};
use crate::plugin::{Plugin, PluginRegistry, timestamp_text};
use crate::policy::TagPolicy;
use crate::search::{self, SearchState};
use crate::selection;
use crate::surface::{MemorySurface, TextSurface};
use crate::types::{ActiveFormatting, SelectionRange};

/// The host capabilities an editor consumes, boxed behind their seams.
pub struct Hosts {
    pub clipboard: Box<dyn Clipboard>,
    pub prompt: Box<dyn LinkPrompt>,
    pub picker: Box<dyn FilePicker>,
    pub store: Box<dyn KeyValueStore>,
}

impl Default for Hosts {
    fn default() -> Self {
        Self {
            clipboard: Box::new(MemoryClipboard::default()),
            prompt: Box::new(StaticPrompt::default()),
            picker: Box::new(RecordingPicker::default()),
            store: Box::new(MemoryStore::default()),
        }
    }
}

/// Which list family a list command addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    pub fn tag(&self) -> &'static str {
        match self {
            ListKind::Unordered => "ul",
            ListKind::Ordered => "ol",
        }
    }

    pub fn default_style(&self) -> &'static str {
        match self {
            ListKind::Unordered => "disc",
            ListKind::Ordered => "decimal",
        }
    }
}

/// A continuation waiting for the surface's structure-settled signal.
pub(crate) enum DeferredOp {
    StyleList { kind: ListKind, style: String },
}

pub struct Editor<S: TextSurface = MemorySurface> {
    pub(crate) surface: S,
    pub(crate) policy: TagPolicy,
    pub(crate) options: EditorOptions,
    pub(crate) hosts: Hosts,
    pub(crate) plugins: PluginRegistry,
    pub(crate) history: DocumentHistory,
    pub(crate) search: SearchState,
    pub(crate) on_change: Option<Box<dyn FnMut(&str)>>,
    pub(crate) active_formatting: ActiveFormatting,
    pub(crate) in_change: bool,
    pub(crate) raw_view: bool,
    pub(crate) selected_image: Option<NodeId>,
    pub(crate) resize: Option<ResizeSession>,
    pub(crate) pending_selection: Option<SelectionRange>,
    pub(crate) deferred: Vec<DeferredOp>,
}

impl Editor<MemorySurface> {
    pub fn new(options: EditorOptions, hosts: Hosts) -> Self {
        Self::with_surface(MemorySurface::new(), options, hosts)
    }
}

impl<S: TextSurface> Editor<S> {
    /// Build an editor over an existing surface.
    ///
    /// Persisted state (keyed by `storage_key`) fills in what the caller
    /// left out: stored content when `value` is empty, the stored
    /// allow-list when no explicit `allowed_tags` override came in.
    pub fn with_surface(surface: S, options: EditorOptions, hosts: Hosts) -> Self {
        let policy = options
            .allowed_tags
            .as_ref()
            .map(|tags| TagPolicy::from_tags(tags.iter().cloned()))
            .unwrap_or_default();

        let mut editor = Self {
            surface,
            policy,
            options,
            hosts,
            plugins: PluginRegistry::new(),
            history: DocumentHistory::new(100),
            search: SearchState::default(),
            on_change: None,
            active_formatting: ActiveFormatting::default(),
            in_change: false,
            raw_view: false,
            selected_image: None,
            resize: None,
            pending_selection: None,
            deferred: Vec::new(),
        };

        let mut initial = editor.options.value.clone();
        if let Some(key) = editor.options.storage_key.clone() {
            if editor.options.allowed_tags.is_none() {
                match editor.hosts.store.get(&format!("{key}-allowedTags")) {
                    Ok(Some(json)) => {
                        if let Some(saved) = TagPolicy::from_json(&json) {
                            editor.policy = saved;
                        }
                    }
                    Ok(None) => {}
                    Err(err) => {
                        tracing::warn!(error = %err, "loading persisted allow-list failed")
                    }
                }
            }
            if initial.is_empty() {
                match editor.hosts.store.get(&format!("{key}-content")) {
                    Ok(Some(content)) => initial = content,
                    Ok(None) => {}
                    Err(err) => {
                        tracing::warn!(error = %err, "loading persisted content failed")
                    }
                }
            }
        }

        editor.load_document(&initial);
        editor
    }

    /// The current serialized document.
    pub fn value(&self) -> String {
        self.surface.tree().to_html()
    }

    pub fn set_on_change(&mut self, callback: impl FnMut(&str) + 'static) {
        self.on_change = Some(Box::new(callback));
    }

    pub fn policy(&self) -> &TagPolicy {
        &self.policy
    }

    pub fn options(&self) -> &EditorOptions {
        &self.options
    }

    pub fn active_formatting(&self) -> ActiveFormatting {
        self.active_formatting
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn is_raw_view(&self) -> bool {
        self.raw_view
    }

    /// Select a span by absolute text offsets. Test and host convenience.
    pub fn select(&mut self, start: usize, end: usize) {
        let range = SelectionRange::from_text_range(self.surface.tree(), start, end);
        self.surface.set_selection(range);
    }

    /// Collapse the caret at an absolute text offset.
    pub fn collapse_caret(&mut self, offset: usize) {
        self.select(offset, offset);
    }

    /// Replace the document with a caller-pushed value. Sanitization is
    /// unconditional; the caller is not notified of its own push.
    pub fn set_value(&mut self, markup: &str) {
        self.load_document(markup);
        let html = self.value();
        self.persist_content(&html);
        self.history.clear_history();
    }

    pub(crate) fn load_document(&mut self, markup: &str) {
        let clean = self.policy.sanitize_markup(markup);
        self.surface.tree_mut().rebuild(&clean);
        self.surface.set_selection(None);
        self.search = SearchState::default();
        self.selected_image = None;
        self.refresh_active_formatting();
    }

    /// Replace the allow-list. Plugin-declared tags are unioned back in,
    /// the new list is persisted, and the live document is resanitized
    /// unconditionally with the selection preserved best-effort.
    pub fn set_allowed_tags<I, T>(&mut self, tags: I)
    where
        I: IntoIterator<Item = T>,
        T: Into<SmolStr>,
    {
        let mut policy = TagPolicy::from_tags(tags);
        for tag in self.plugins.declared_tags() {
            policy.insert(tag);
        }
        self.policy = policy;
        self.persist_tags();

        let saved = selection::capture(&self.surface);
        let markup = self.surface.tree().to_html();
        let clean = self.policy.sanitize_markup(&markup);
        if clean != markup {
            self.surface.tree_mut().rebuild(&clean);
            if let Some(range) = saved {
                selection::restore(&mut self.surface, range);
            }
        }
        self.handle_change();
    }

    pub(crate) fn persist_content(&mut self, html: &str) {
        let Some(key) = self.options.storage_key.clone() else {
            return;
        };
        if let Err(err) = self.hosts.store.set(&format!("{key}-content"), html) {
            tracing::warn!(error = %err, "persisting content failed");
        }
    }

    pub(crate) fn persist_tags(&mut self) {
        let Some(key) = self.options.storage_key.clone() else {
            return;
        };
        let json = self.policy.to_json();
        if let Err(err) = self.hosts.store.set(&format!("{key}-allowedTags"), &json) {
            tracing::warn!(error = %err, "persisting allow-list failed");
        }
    }

    // === History ===

    pub(crate) fn document_snapshot(&self) -> Snapshot {
        Snapshot {
            markup: self.surface.tree().to_html(),
            selection: self
                .surface
                .selection()
                .map(|sel| (sel.text_start, sel.text_end)),
        }
    }

    /// Record the current state so the next mutation is undoable.
    pub(crate) fn checkpoint(&mut self) {
        let snapshot = self.document_snapshot();
        self.history.record(snapshot);
    }

    pub(crate) fn apply_snapshot(&mut self, snapshot: Snapshot) {
        self.surface.tree_mut().rebuild(&snapshot.markup);
        let range = snapshot.selection.and_then(|(start, end)| {
            SelectionRange::from_text_range(self.surface.tree(), start, end)
        });
        self.surface.set_selection(range);
        self.handle_change();
    }

    pub fn undo(&mut self) -> bool {
        let current = self.document_snapshot();
        match self.history.undo(current) {
            Some(previous) => {
                self.apply_snapshot(previous);
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self) -> bool {
        let current = self.document_snapshot();
        match self.history.redo(current) {
            Some(next) => {
                self.apply_snapshot(next);
                true
            }
            None => false,
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Feed typed text through the surface and the change pipeline, the
    /// way keystrokes reach the document.
    pub fn type_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.checkpoint();
        selection::ensure_focused(&mut self.surface);
        self.surface.insert_text(text);
        self.handle_change();
    }

    // === Plugins ===

    /// Register a plugin; its declared tag joins the policy permanently.
    pub fn register_plugin(&mut self, plugin: Plugin) -> usize {
        if let Some(tag) = plugin.declared_tag() {
            self.policy.insert(SmolStr::new(tag));
            self.persist_tags();
        }
        self.plugins.register(plugin)
    }

    pub fn plugin_visible(&self, index: usize) -> bool {
        self.plugins.is_visible(index, &self.policy)
    }

    /// Run a registered plugin against the current selection.
    pub fn invoke_plugin(&mut self, index: usize) {
        if !self.plugins.is_visible(index, &self.policy) {
            return;
        }
        selection::ensure_focused(&mut self.surface);

        enum Resolved {
            Wrap(SmolStr),
            Invoke(Command, Option<String>),
            Action,
            Timestamp,
        }
        let resolved = match self.plugins.get_mut(index) {
            Some(Plugin::WrapSelection { tag }) => Resolved::Wrap(tag.clone()),
            Some(Plugin::Invoke { cmd, arg }) => Resolved::Invoke(*cmd, arg.clone()),
            Some(Plugin::Action { .. }) => Resolved::Action,
            Some(Plugin::Timestamp) => Resolved::Timestamp,
            None => return,
        };

        match resolved {
            Resolved::Wrap(tag) => {
                let selected = self.surface.selected_text();
                if selected.is_empty() {
                    return;
                }
                self.checkpoint();
                self.surface.delete_selection();
                let wrapper = {
                    let tree = self.surface.tree_mut();
                    let el = tree.create_element(tag);
                    let text = tree.create_text(selected);
                    tree.append_child(el, text);
                    el
                };
                self.surface.insert_node_at_caret(wrapper);
                self.handle_change();
            }
            Resolved::Invoke(cmd, arg) => self.exec(cmd, arg.as_deref()),
            Resolved::Action => {
                self.checkpoint();
                if let Some(Plugin::Action { run }) = self.plugins.get_mut(index) {
                    run(self.surface.tree_mut());
                }
                self.handle_change();
            }
            Resolved::Timestamp => {
                self.checkpoint();
                let stamp = timestamp_text();
                self.surface.insert_text(&stamp);
                self.handle_change();
            }
        }
    }

    // === Search ===

    /// Start (or restart) a search session over the live document.
    pub fn search(&mut self, query: &str) {
        self.search = search::run_search(self.surface.tree_mut(), query);
        if self.search.count() > 0 {
            if let Some(node) = search::set_current(self.surface.tree_mut(), &mut self.search, 0) {
                self.surface.scroll_into_view(node);
            }
        }
        self.handle_change();
    }

    pub fn search_state(&self) -> &SearchState {
        &self.search
    }

    pub fn next_match(&mut self) {
        if let Some(node) = search::next_match(self.surface.tree_mut(), &mut self.search) {
            self.surface.scroll_into_view(node);
        }
    }

    pub fn previous_match(&mut self) {
        if let Some(node) = search::previous_match(self.surface.tree_mut(), &mut self.search) {
            self.surface.scroll_into_view(node);
        }
    }

    /// Remove every marker, restoring the exact pre-search text.
    pub fn clear_search(&mut self) {
        search::clear_highlights(self.surface.tree_mut());
        self.search = SearchState::default();
        self.handle_change();
    }

    // === Two-phase insertions ===

    /// Complete an image insert once the host has the file bytes.
    pub fn insert_image_from_file(&mut self, data_url: &str) {
        self.checkpoint();
        self.restore_pending_selection();
        let img = {
            let tree = self.surface.tree_mut();
            let img = tree.create_element("img");
            if let Some(el) = tree.element_mut(img) {
                el.set_attr("src", data_url);
            }
            img
        };
        self.surface.insert_node_at_caret(img);
        image::normalize_inserted_image(self.surface.tree_mut(), img);
        self.handle_change();
    }

    /// Build and insert a rows x cols grid at the parked selection.
    pub fn insert_table(&mut self, rows: usize, cols: usize) {
        if rows == 0 || cols == 0 {
            return;
        }
        self.checkpoint();
        self.restore_pending_selection();
        let table = {
            let tree = self.surface.tree_mut();
            let table = tree.create_element("table");
            if let Some(el) = tree.element_mut(table) {
                el.set_attr("style", "border-collapse: collapse; width: 100%;");
            }
            for _ in 0..rows {
                let tr = tree.create_element("tr");
                for _ in 0..cols {
                    let td = tree.create_element("td");
                    if let Some(el) = tree.element_mut(td) {
                        el.set_attr("style", "border: 1px solid #999; padding: 8px; min-width: 60px;");
                    }
                    let pad = tree.create_text("\u{a0}");
                    tree.append_child(td, pad);
                    tree.append_child(tr, td);
                }
                tree.append_child(table, tr);
            }
            table
        };
        self.surface.insert_node_at_caret(table);
        let br = self.surface.tree_mut().create_element("br");
        self.surface.insert_node_at_caret(br);
        self.handle_change();
    }

    /// Insert a picked emoji at the parked selection.
    pub fn insert_emoji(&mut self, emoji: &str) {
        self.checkpoint();
        self.restore_pending_selection();
        selection::ensure_focused(&mut self.surface);
        self.surface.insert_text(emoji);
        self.handle_change();
    }

    /// Apply a picked text color to the parked selection.
    pub fn apply_text_color(&mut self, color: &str) {
        self.apply_color_span("color", color);
    }

    /// Apply a picked highlight color to the parked selection.
    pub fn apply_highlight(&mut self, color: &str) {
        self.apply_color_span("background-color", color);
    }

    fn apply_color_span(&mut self, property: &str, color: &str) {
        self.checkpoint();
        self.restore_pending_selection();
        let selected = self.surface.selected_text();
        if !selected.is_empty() {
            self.surface.delete_selection();
        }
        let span = {
            let tree = self.surface.tree_mut();
            let span = tree.create_element("span");
            if let Some(el) = tree.element_mut(span) {
                el.set_attr("style", format!("{property}: {color};"));
            }
            let text = tree.create_text(selected);
            tree.append_child(span, text);
            span
        };
        self.surface.insert_node_at_caret(span);
        self.handle_change();
    }

    pub(crate) fn park_selection(&mut self) {
        self.pending_selection = selection::capture(&self.surface);
    }

    pub(crate) fn restore_pending_selection(&mut self) {
        if let Some(range) = self.pending_selection.take() {
            selection::restore(&mut self.surface, range);
        }
    }

    // === Image transforms ===

    /// Mark an image element as selected for transform operations.
    pub fn select_image(&mut self, node: NodeId) -> bool {
        let is_image = self.surface.tree().tag(node) == Some("img");
        self.selected_image = is_image.then_some(node);
        is_image
    }

    pub fn deselect_image(&mut self) {
        self.selected_image = None;
        self.resize = None;
    }

    pub fn selected_image(&self) -> Option<NodeId> {
        self.selected_image
    }

    /// Read the property form for the selected image.
    pub fn image_props(&self) -> Option<ImageProps> {
        let img = self.selected_image?;
        Some(image::read_props(self.surface.tree(), img))
    }

    /// Pointer-down on a resize handle.
    pub fn begin_image_resize(
        &mut self,
        handle: ResizeHandle,
        pointer_x: f64,
        pointer_y: f64,
        lock_aspect: bool,
    ) -> bool {
        let Some(img) = self.selected_image else {
            return false;
        };
        self.checkpoint();
        let (width, height) = image::image_size(self.surface.tree(), img);
        self.resize = Some(ResizeSession::begin(
            handle, pointer_x, pointer_y, width, height, lock_aspect,
        ));
        true
    }

    /// Pointer-move while dragging: write the new size through.
    pub fn update_image_resize(&mut self, pointer_x: f64, pointer_y: f64) {
        let (Some(img), Some(session)) = (self.selected_image, self.resize) else {
            return;
        };
        let (width, height) = session.size_at(pointer_x, pointer_y);
        let tree = self.surface.tree_mut();
        tree.set_style_property(img, "width", &format!("{}px", width.round() as i64));
        tree.set_style_property(img, "height", &format!("{}px", height.round() as i64));
        self.handle_change();
    }

    /// Pointer-up: the drag ends, nothing else happens.
    pub fn end_image_resize(&mut self) {
        self.resize = None;
    }

    pub fn is_resizing(&self) -> bool {
        self.resize.is_some()
    }

    /// Write the whole property form to the selected image atomically.
    pub fn apply_image_props(&mut self, props: &ImageProps) {
        let Some(img) = self.selected_image else {
            return;
        };
        self.checkpoint();
        image::apply_props(self.surface.tree_mut(), img, props);
        self.handle_change();
    }

    pub fn remove_selected_image(&mut self) {
        let Some(img) = self.selected_image.take() else {
            return;
        };
        self.checkpoint();
        self.surface.tree_mut().detach(img);
        self.handle_change();
    }

    // === Deferred continuations ===

    /// The surface reports that structural mutations are now observable;
    /// run anything that was waiting on them.
    pub fn notify_structure_settled(&mut self) {
        let ops = std::mem::take(&mut self.deferred);
        for op in ops {
            match op {
                DeferredOp::StyleList { kind, style } => {
                    self.style_nearest_list(kind, &style);
                    self.handle_change();
                }
            }
        }
    }

    pub(crate) fn flush_deferred_if_settled(&mut self) {
        if !self.deferred.is_empty() && self.surface.structure_settled() {
            self.notify_structure_settled();
        }
    }
}
