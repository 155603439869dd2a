//! End-to-end scenarios through the public editor API.

use std::cell::RefCell;
use std::rc::Rc;

use vellum_editor_core::{
    Command, Editor, EditorOptions, Hosts, MemoryClipboard, MemoryStore, Plugin,
    RecordingPicker, ResizeHandle, StaticPrompt, TextSurface,
};

fn options(value: &str) -> EditorOptions {
    EditorOptions::default()
        .with_value(value)
        .with_storage_key(None)
}

fn editor(value: &str) -> Editor {
    Editor::new(options(value), Hosts::default())
}

fn editor_with_tags(value: &str, tags: &[&str]) -> Editor {
    Editor::new(
        options(value).with_allowed_tags(tags.iter().copied()),
        Hosts::default(),
    )
}

// === Scenario A: sanitize to the allow-list ===

#[test]
fn sanitize_unwraps_disallowed_tags_keeping_text() {
    let e = editor_with_tags("<p>Hi <em>you</em></p>", &["p", "strong"]);
    assert_eq!(e.value(), "<p>Hi you</p>");
}

#[test]
fn pushed_values_sanitize_unconditionally() {
    let mut e = editor_with_tags("", &["p"]);
    e.set_value("<div><p>a</p><script-ish>b</script-ish></div>");
    assert_eq!(e.value(), "<p>a</p>b");
}

// === Scenario B: ambient formatting on a collapsed caret ===

#[test]
fn collapsed_bold_applies_to_subsequent_typing() {
    let mut e = editor("");
    e.exec(Command::Bold, None);
    assert!(e.active_formatting().bold);

    e.type_text("hi");
    assert_eq!(e.value(), "<strong>hi</strong>");
}

// === Scenario C: search counting and cycling ===

#[test]
fn search_finds_matches_and_cycles() {
    let mut e = editor("<p>cat scatter</p>");
    e.search("cat");
    assert_eq!(e.search_state().count(), 2);
    assert_eq!(e.search_state().current_index(), Some(0));

    e.next_match();
    assert_eq!(e.search_state().current_index(), Some(1));
    e.next_match();
    assert_eq!(e.search_state().current_index(), Some(0));

    e.previous_match();
    assert_eq!(e.search_state().current_index(), Some(1));
}

#[test]
fn search_then_clear_is_identity() {
    let mut e = editor("<p>cat scatter</p><p>more cats</p>");
    let before = e.value();
    e.search("cat");
    assert_eq!(e.search_state().count(), 3);
    e.clear_search();
    assert_eq!(e.value(), before);
}

// === Scenario D: list styling creates the list first ===

#[test]
fn list_style_outside_list_creates_styled_list() {
    let mut e = editor("<p>item one</p>");
    e.collapse_caret(4);
    e.exec(Command::UnorderedListStyle, Some("square"));
    assert_eq!(
        e.value(),
        "<ul style=\"list-style-type: square; padding-left: 1.5rem;\"><li>item one</li></ul>"
    );
}

#[test]
fn list_style_inside_list_is_synchronous() {
    let mut e = editor("<ul><li>x</li></ul>");
    e.collapse_caret(1);
    e.exec(Command::UnorderedListStyle, Some("circle"));
    assert_eq!(
        e.value(),
        "<ul style=\"list-style-type: circle; padding-left: 1.5rem;\"><li>x</li></ul>"
    );
}

// === Toggle reversibility ===

#[test]
fn bold_toggle_round_trips() {
    let mut e = editor("<p>hello world</p>");
    e.select(0, 5);
    e.exec(Command::Bold, None);
    assert_eq!(e.value(), "<p><strong>hello</strong> world</p>");

    e.select(0, 5);
    e.exec(Command::Bold, None);
    let tree = vellum_dom::DomTree::from_markup(&e.value());
    assert_eq!(tree.text_content(tree.root()), "hello world");
    assert!(!e.value().contains("<strong"));
}

#[test]
fn multi_block_toggle_wraps_each_block_independently() {
    let mut e = editor("<p>one</p><p>two</p>");
    e.select(0, 6);
    e.exec(Command::Bold, None);
    assert_eq!(
        e.value(),
        "<p><strong>one</strong></p><p><strong>two</strong></p>"
    );

    // Selection survived; the same toggle reverses it per block.
    e.exec(Command::Bold, None);
    assert_eq!(e.value(), "<p>one</p><p>two</p>");
}

// === Blockquote ===

#[test]
fn blockquote_wraps_selection_with_citation_line() {
    let mut e = editor("<p>wisdom</p>");
    e.select(0, 6);
    e.exec(Command::FormatBlock, Some("blockquote"));

    insta::assert_snapshot!(
        e.value(),
        @r#"<blockquote><p>wisdom</p><cite contenteditable="true" style="display: block; margin-top: 6px; font-style: normal; color: #888;">— Source</cite></blockquote>"#
    );
}

#[test]
fn blockquote_toggle_unwraps_existing_quote() {
    let mut e = editor("<blockquote><p>quoted</p></blockquote>");
    e.collapse_caret(2);
    e.exec(Command::FormatBlock, Some("blockquote"));
    assert_eq!(e.value(), "<p>quoted</p>");
}

// === Heading / format block ===

#[test]
fn format_block_strips_angle_brackets() {
    let mut e = editor("<p>title</p>");
    e.collapse_caret(2);
    e.exec(Command::FormatBlock, Some("<h2>"));
    assert_eq!(e.value(), "<h2>title</h2>");
}

// === Links ===

#[test]
fn create_link_forces_safe_attributes() {
    let hosts = Hosts {
        prompt: Box::new(StaticPrompt::answering("https://example.com")),
        ..Default::default()
    };
    let mut e = Editor::new(options("<p>hello world</p>"), hosts);
    e.select(0, 5);
    e.exec(Command::CreateLink, None);
    assert_eq!(
        e.value(),
        "<p><a href=\"https://example.com\" target=\"_blank\" rel=\"noopener noreferrer\">hello</a> world</p>"
    );
}

#[test]
fn cancelled_link_prompt_changes_nothing() {
    let mut e = editor("<p>hello</p>");
    e.select(0, 5);
    e.exec(Command::CreateLink, None);
    assert_eq!(e.value(), "<p>hello</p>");
}

#[test]
fn unlink_unwraps_nearest_anchor() {
    let mut e = editor("<p><a href=\"https://x.example\">hello</a> world</p>");
    e.collapse_caret(2);
    e.exec(Command::Unlink, None);
    assert_eq!(e.value(), "<p>hello world</p>");
}

// === Case transforms ===

#[test]
fn case_transform_replaces_selected_text_only() {
    let mut e = editor("<p>hello world</p>");
    e.select(0, 5);
    e.exec(Command::ToUpperCase, None);
    assert_eq!(e.value(), "<p>HELLO world</p>");
}

#[test]
fn collapsed_case_transform_hits_whole_document() {
    let mut e = editor("<p>hello <strong>world</strong></p>");
    e.exec(Command::ToUpperCase, None);
    // The blind string transform uppercases everything; the parser
    // re-normalizes tag names on the way back in.
    assert_eq!(e.value(), "<p>HELLO <strong>WORLD</strong></p>");
}

// === Clipboard ===

#[test]
fn cut_then_paste_round_trips_through_clipboard() {
    let mut e = editor("<p>hello world</p>");
    e.select(0, 6);
    e.exec(Command::Cut, None);
    assert_eq!(e.value(), "<p>world</p>");

    e.exec(Command::Paste, None);
    assert_eq!(e.value(), "<p>hello world</p>");
}

#[test]
fn failed_clipboard_write_abandons_cut() {
    let hosts = Hosts {
        clipboard: Box::new(MemoryClipboard {
            fail_writes: true,
            ..Default::default()
        }),
        ..Default::default()
    };
    let mut e = Editor::new(options("<p>hello</p>"), hosts);
    e.select(0, 5);
    e.exec(Command::Cut, None);
    assert_eq!(e.value(), "<p>hello</p>");
}

#[test]
fn cut_requires_selection() {
    let clipboard = Rc::new(RefCell::new(MemoryClipboard::default()));
    let hosts = Hosts {
        clipboard: Box::new(Rc::clone(&clipboard)),
        ..Default::default()
    };
    let mut e = Editor::new(options("<p>hello</p>"), hosts);
    e.exec(Command::Cut, None);
    assert_eq!(e.value(), "<p>hello</p>");
    assert!(clipboard.borrow().contents.is_none());
}

// === Raw markup view ===

#[test]
fn raw_view_round_trip_is_identity() {
    let mut e = editor("<p>hi <strong>there</strong></p>");
    e.exec(Command::ToggleHtml, None);
    assert!(e.is_raw_view());
    assert_eq!(e.value(), "&lt;p&gt;hi &lt;strong&gt;there&lt;/strong&gt;&lt;/p&gt;");

    e.exec(Command::ToggleHtml, None);
    assert!(!e.is_raw_view());
    assert_eq!(e.value(), "<p>hi <strong>there</strong></p>");
}

#[test]
fn hand_edited_raw_markup_is_resanitized() {
    let mut e = editor_with_tags("<p>hi</p>", &["p"]);
    e.exec(Command::ToggleHtml, None);
    // Simulate the user hand-editing the raw text.
    {
        let tree = e.surface_mut().tree_mut();
        let root = tree.root();
        let raw = tree.children(root)[0];
        if let Some(buf) = tree.text_mut(raw) {
            buf.clear();
            buf.push_str("<p>hi</p><em>sneak</em>");
        }
    }
    e.exec(Command::ToggleHtml, None);
    assert_eq!(e.value(), "<p>hi</p>sneak");
}

// === Tables, images, emoji: two-phase insertion ===

#[test]
fn table_grid_parks_selection_then_inserts() {
    let mut e = editor("<p>ab</p>");
    e.collapse_caret(1);
    e.exec(Command::InsertTableGrid, None);
    assert_eq!(e.value(), "<p>ab</p>");

    e.insert_table(2, 3);
    let value = e.value();
    assert!(value.contains("<table style=\"border-collapse: collapse; width: 100%;\">"));
    assert_eq!(value.matches("<tr>").count(), 2);
    assert_eq!(value.matches("<td").count(), 6);
    assert!(value.contains("<br>"));
}

#[test]
fn image_insert_requests_picker_then_normalizes_style() {
    let picker = Rc::new(RefCell::new(RecordingPicker::default()));
    let hosts = Hosts {
        picker: Box::new(Rc::clone(&picker)),
        ..Default::default()
    };
    let mut e = Editor::new(options("<p>ab</p>"), hosts);
    e.collapse_caret(1);
    e.exec(Command::InsertImage, None);
    assert_eq!(picker.borrow().requests, 1);
    assert_eq!(e.value(), "<p>ab</p>");

    e.insert_image_from_file("data:image/png;base64,AAA");
    assert_eq!(
        e.value(),
        "<p>a<img src=\"data:image/png;base64,AAA\" style=\"object-fit: cover; max-width: 100%; border-radius: 8px; margin: 8px 0; display: block;\">b</p>"
    );
}

#[test]
fn emoji_inserts_at_parked_selection() {
    let mut e = editor("<p>ab</p>");
    e.collapse_caret(1);
    e.exec(Command::InsertEmoji, None);
    e.insert_emoji("🎉");
    assert_eq!(e.value(), "<p>a🎉b</p>");
}

// === Image resize ===

#[test]
fn locked_resize_preserves_aspect_ratio() {
    let mut e = editor("<img src=\"x.png\" width=\"200\" height=\"100\">");
    let img = {
        let tree = e.surface().tree();
        tree.children(tree.root())[0]
    };
    assert!(e.select_image(img));
    assert!(e.begin_image_resize(ResizeHandle::SouthEast, 0.0, 0.0, true));

    e.update_image_resize(100.0, 10.0);
    let value = e.value();
    assert!(value.contains("width: 300px;"));
    assert!(value.contains("height: 150px;"));

    e.end_image_resize();
    assert!(!e.is_resizing());
}

#[test]
fn resize_respects_minimum_size() {
    let mut e = editor("<img src=\"x.png\" width=\"100\" height=\"100\">");
    let img = {
        let tree = e.surface().tree();
        tree.children(tree.root())[0]
    };
    e.select_image(img);
    e.begin_image_resize(ResizeHandle::SouthEast, 0.0, 0.0, false);
    e.update_image_resize(-500.0, -500.0);
    let value = e.value();
    assert!(value.contains("width: 20px;"));
    assert!(value.contains("height: 20px;"));
}

// === Selection-wide commands ===

#[test]
fn select_all_then_remove_text_empties_document() {
    let mut e = editor("<p>one</p><p>two</p>");
    e.exec(Command::SelectAll, None);
    e.exec(Command::RemoveText, None);
    assert_eq!(e.value(), "");

    assert!(e.undo());
    assert_eq!(e.value(), "<p>one</p><p>two</p>");
}

#[test]
fn justify_sets_alignment_on_block() {
    let mut e = editor("<p>text</p>");
    e.collapse_caret(2);
    e.exec(Command::JustifyCenter, None);
    assert_eq!(e.value(), "<p style=\"text-align: center;\">text</p>");
    assert!(e.active_formatting().justify_center);
}

// === Undo / redo ===

#[test]
fn typing_is_undoable_and_redoable() {
    let mut e = editor("");
    e.type_text("a");
    e.type_text("b");
    assert_eq!(e.value(), "ab");

    assert!(e.undo());
    assert_eq!(e.value(), "a");
    assert!(e.undo());
    assert_eq!(e.value(), "");
    assert!(!e.undo());

    assert!(e.redo());
    assert_eq!(e.value(), "a");
}

// === Persistence ===

#[test]
fn content_and_tags_persist_under_storage_key() {
    let store = Rc::new(RefCell::new(MemoryStore::default()));
    let hosts = Hosts {
        store: Box::new(Rc::clone(&store)),
        ..Default::default()
    };
    let mut e = Editor::new(
        EditorOptions::default()
            .with_value("<p>draft</p>")
            .with_storage_key(Some("note")),
        hosts,
    );
    e.type_text("!");
    assert!(
        store
            .borrow()
            .entries
            .get("note-content")
            .is_some_and(|v| v.contains("draft"))
    );

    e.set_allowed_tags(["p", "strong"]);
    let tags_json = store.borrow().entries.get("note-allowedTags").cloned();
    assert!(tags_json.is_some_and(|v| v.contains("strong")));
}

#[test]
fn stored_content_loads_when_value_is_empty() {
    let store = Rc::new(RefCell::new(MemoryStore::default()));
    store
        .borrow_mut()
        .entries
        .insert("note-content".into(), "<p>restored</p>".into());
    let hosts = Hosts {
        store: Box::new(Rc::clone(&store)),
        ..Default::default()
    };
    let e = Editor::new(
        EditorOptions::default().with_storage_key(Some("note")),
        hosts,
    );
    assert_eq!(e.value(), "<p>restored</p>");
}

#[test]
fn storage_failures_never_surface() {
    let hosts = Hosts {
        store: Box::new(MemoryStore {
            fail: true,
            ..Default::default()
        }),
        ..Default::default()
    };
    let mut e = Editor::new(
        EditorOptions::default()
            .with_value("<p>x</p>")
            .with_storage_key(Some("note")),
        hosts,
    );
    e.type_text("!");
    assert!(e.value().contains('!'));
}

// === Plugins ===

#[test]
fn plugin_tag_joins_policy_and_cannot_be_removed() {
    let mut e = editor_with_tags("<p>hello</p>", &["p"]);
    let idx = e.register_plugin(Plugin::WrapSelection { tag: "mark".into() });
    assert!(e.policy().allows("mark"));
    assert!(e.plugin_visible(idx));

    // A later explicit list still gets the plugin tag unioned back in.
    e.set_allowed_tags(["p"]);
    assert!(e.policy().allows("mark"));
}

#[test]
fn wrap_plugin_wraps_selection() {
    let mut e = editor_with_tags("<p>hello world</p>", &["p"]);
    let idx = e.register_plugin(Plugin::WrapSelection { tag: "mark".into() });
    e.select(0, 5);
    e.invoke_plugin(idx);
    assert_eq!(e.value(), "<p><mark>hello</mark> world</p>");
}

#[test]
fn command_plugin_delegates_to_dispatcher() {
    let mut e = editor("<p>hello</p>");
    let idx = e.register_plugin(Plugin::Invoke {
        cmd: Command::Bold,
        arg: None,
    });
    e.select(0, 5);
    e.invoke_plugin(idx);
    assert_eq!(e.value(), "<p><strong>hello</strong></p>");
}

#[test]
fn timestamp_plugin_inserts_datetime_text() {
    let mut e = editor("");
    let idx = e.register_plugin(Plugin::Timestamp);
    e.invoke_plugin(idx);
    let tree = vellum_dom::DomTree::from_markup(&e.value());
    assert_eq!(tree.text_content(tree.root()).len(), 19);
}

#[test]
fn action_plugin_gets_the_tree() {
    let mut e = editor("<p>x</p>");
    let idx = e.register_plugin(Plugin::Action {
        run: Box::new(|tree| {
            let hr = tree.create_element("hr");
            let root = tree.root();
            tree.append_child(root, hr);
        }),
    });
    e.invoke_plugin(idx);
    assert_eq!(e.value(), "<p>x</p><hr>");
}

// === Pasted markup cleanup ===

#[test]
fn pasted_word_markup_is_cleaned_and_sanitized() {
    let mut e = editor_with_tags("", &["p", "h2"]);
    e.paste_html("<div style=\"mso-heading: 2;\">Title</div><o:p>cruft</o:p>");
    assert_eq!(e.value(), "<h2>Title</h2>");
}

// === Toolbar gating ===

#[test]
fn command_visibility_follows_policy_membership() {
    let e = editor_with_tags("<p>x</p>", &["p", "strong", "cut"]);
    assert!(e.command_visible(Command::Bold));
    assert!(e.command_visible(Command::Cut));
    assert!(!e.command_visible(Command::Italic));
    assert!(!e.command_visible(Command::Copy));
    // Ungated commands always show.
    assert!(e.command_visible(Command::Undo));
}
