//! The glyph tree object model
//!
//! Skeleton sources are loaded into [`GlyphTree`]s; every opened master
//! works on its own clone.

pub mod element;
pub mod tree;

pub use element::{Capabilities, Element, ElementKind, NodeId, Property};
pub use tree::GlyphTree;
