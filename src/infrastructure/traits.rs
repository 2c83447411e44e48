//! Presentation boundary trait
//!
//! The document keeps one backing element per node and drives it through this
//! trait. Hosts implement it over their rendered view; tests use
//! [`MemoryPresentation`](crate::infrastructure::memory::MemoryPresentation).

use std::fmt;

use crate::domain::FormatValue;

/// Backing presentation layer abstraction.
pub trait Presentation {
    /// Handle to one backing element. Copying a handle never copies the element.
    type Handle: Copy + Eq + fmt::Debug;

    /// Create a detached element for a tagged kind.
    fn create(&mut self, tag: &str, value: &FormatValue) -> Self::Handle;

    /// Create a detached text element.
    fn create_text(&mut self, text: &str) -> Self::Handle;

    /// Tag of an element, None for text elements.
    fn tag(&self, element: Self::Handle) -> Option<String>;

    /// Content of a text element.
    fn text(&self, element: Self::Handle) -> Option<String>;

    fn set_text(&mut self, element: Self::Handle, text: &str);

    /// Value stored on an element at creation (link target, image source).
    fn attribute(&self, element: Self::Handle) -> Option<FormatValue>;

    fn parent(&self, element: Self::Handle) -> Option<Self::Handle>;

    fn children(&self, element: Self::Handle) -> Vec<Self::Handle>;

    fn next_sibling(&self, element: Self::Handle) -> Option<Self::Handle>;

    /// Move `child` under `parent` before `reference`, or to the end.
    fn insert_before(
        &mut self,
        parent: Self::Handle,
        child: Self::Handle,
        reference: Option<Self::Handle>,
    );

    /// Take an element out of its parent. No-op for detached elements.
    fn detach(&mut self, element: Self::Handle);

    /// The node owning `element` is gone; the handle is never used again.
    fn release(&mut self, element: Self::Handle);
}
