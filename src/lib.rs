//! Offset-addressed content tree for structured rich-text editors.
//!
//! A [`Document`](document::Document) holds a tree of leaves and containers.
//! Every node has a length in content units, and insert, delete, format and
//! split are addressed by flat offsets. Each node owns one element of a
//! backing [`Presentation`](infrastructure::traits::Presentation) that is kept
//! in the same order as the tree.

pub mod config;
pub mod document;
pub mod domain;
pub mod errors;
pub mod infrastructure;
pub mod tree_traits;
pub mod util;

pub use document::Document;
pub use domain::{FormatValue, Insert, LeafValue, NodeId, Registry};
pub use errors::{TreeError, TreeResult};
