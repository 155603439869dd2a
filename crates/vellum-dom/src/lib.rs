//! vellum-dom: the in-memory document tree the vellum editor mutates.
//!
//! This crate provides:
//! - `DomTree` - an arena-backed ordered tree of element and text nodes
//! - a permissive HTML fragment parser (`parse_fragment`)
//! - HTML serialization with escaping (`to_html`)
//! - `InlineStyle` - a typed view over an element's `style` attribute
//!
//! The tree is a structural model, not a rendering engine: it knows tag
//! names, ordered attributes, and child order, and nothing about layout.

pub mod node;
pub mod parse;
pub mod serialize;
pub mod style;
pub mod tree;

pub use node::{ElementData, NodeData, NodeId, is_void_tag};
pub use parse::parse_fragment;
pub use serialize::to_html;
pub use style::InlineStyle;
pub use tree::DomTree;
