//! Infrastructure layer: presentation boundary and its in-memory implementation

pub mod memory;
pub mod traits;

pub use memory::{ElementId, MemoryPresentation};
pub use traits::Presentation;
