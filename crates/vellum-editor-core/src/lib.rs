//! vellum-editor-core: the editing command and content-policy engine.
//!
//! This crate provides:
//! - `TextSurface` trait + `MemorySurface` - the host-surface seam
//! - `TagPolicy` - the allowed-tag sanitization policy
//! - `Editor` - the command dispatcher and change pipeline
//! - search/highlight, image transforms, plugins, theme storage
//!
//! The document itself lives in `vellum-dom`; hosts plug in through the
//! capability traits in `host`.

pub mod command;
pub mod config;
pub mod editor;
mod exec;
pub mod history;
pub mod host;
pub mod image;
pub mod paste;
mod pipeline;
pub mod plugin;
pub mod policy;
pub mod search;
pub mod selection;
pub mod surface;
pub mod theme;
pub mod types;

pub use command::{ALL_COMMANDS, Command};
pub use config::EditorOptions;
pub use editor::{Editor, Hosts, ListKind};
pub use history::{DocumentHistory, Snapshot, UndoManager};
pub use host::{
    Clipboard, ColorSchemeSignal, FilePicker, HostError, KeyValueStore, LinkPrompt,
    MemoryClipboard, MemoryStore, RecordingPicker, StaticPrompt,
};
pub use image::{ImageAlignment, ImageProps, MIN_IMAGE_SIZE, ResizeHandle, ResizeSession};
pub use plugin::{Plugin, PluginRegistry};
pub use policy::{ACTION_TAGS, ALLOWED_ATTRS, STRUCTURAL_TAGS, TagPolicy};
pub use search::SearchState;
pub use surface::{INLINE_FORMAT_TAGS, MemorySurface, TextSurface};
pub use theme::{GLOBAL_THEME_KEY, Theme, ThemeStore};
pub use types::{ActiveFormatting, Anchor, Dimension, SelectionRange};
