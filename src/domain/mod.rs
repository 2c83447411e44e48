//! Domain layer: node storage, child sequences and kind definitions
//!
//! This layer is independent of the backing presentation (no element handles
//! are interpreted here, only stored).

pub mod arena;
pub mod children;
pub mod format;
pub mod registry;

pub use arena::{Body, LeafContent, Node, NodeArena, NodeId, Values};
pub use children::{ChildIter, ChildList, Span};
pub use format::{FormatValue, Insert, LeafValue};
pub use registry::{Definition, Registry, Scope, Variant};
