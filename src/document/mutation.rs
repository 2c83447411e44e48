use tracing::{debug, instrument};

use crate::document::Document;
use crate::domain::{FormatValue, Insert, NodeId};
use crate::errors::{TreeError, TreeResult};
use crate::infrastructure::traits::Presentation;

impl<P: Presentation> Document<P> {
    fn check_range(&self, id: NodeId, index: usize, length: usize) -> TreeResult<usize> {
        let total = self.arena.length(id)?;
        if index.checked_add(length).map_or(true, |end| end > total) {
            return Err(TreeError::RangeOutOfBounds {
                index,
                length,
                total,
            });
        }
        Ok(total)
    }

    /// Delete `length` units starting at `index` inside `id`.
    ///
    /// Deleting the full range removes the node itself.
    #[instrument(level = "trace", skip(self))]
    pub fn delete_at(&mut self, id: NodeId, index: usize, length: usize) -> TreeResult<()> {
        let total = self.check_range(id, index, length)?;
        if index == 0 && length == total {
            return self.remove(id);
        }
        if !self.arena.get(id)?.is_container() {
            return self.leaf_delete_at(id, index, length);
        }
        for span in self.arena.resolve_range(id, index, length)? {
            self.delete_at(span.child, span.offset, span.length)?;
        }
        Ok(())
    }

    /// Apply or clear format `name` on the node as a whole.
    ///
    /// A container clearing its own kind dissolves itself; setting any other
    /// format wraps the node. Setting an existing format and clearing one the
    /// node does not represent do nothing.
    #[instrument(level = "trace", skip(self))]
    pub fn format(&mut self, id: NodeId, name: &str, value: &FormatValue) -> TreeResult<()> {
        let node = self.arena.get(id)?;
        if node.is_container() && node.kind == name {
            if value.is_set() {
                debug!("{} already is {}", id, name);
                return Ok(());
            }
            return self.unwrap(id);
        }
        if !value.is_set() {
            debug!("{} cannot clear {} it does not represent", id, name);
            return Ok(());
        }
        self.wrap(id, name, value.clone()).map(|_| ())
    }

    /// Apply or clear format `name` over `[index, index + length)` inside `id`.
    #[instrument(level = "trace", skip(self))]
    pub fn format_at(
        &mut self,
        id: NodeId,
        index: usize,
        length: usize,
        name: &str,
        value: &FormatValue,
    ) -> TreeResult<()> {
        let total = self.check_range(id, index, length)?;
        if index == 0 && length == total {
            return self.format(id, name, value);
        }
        if !self.arena.get(id)?.is_container() {
            return self.leaf_format_at(id, index, length, name, value);
        }
        for span in self.arena.resolve_range(id, index, length)? {
            self.format_at(span.child, span.offset, span.length, name, value)?;
        }
        Ok(())
    }

    /// Insert content at `index` inside `id`.
    ///
    /// Containers delegate to the child holding `index`; an insert at the end of
    /// a child goes into that child. An empty container receives a new leaf.
    #[instrument(level = "trace", skip(self))]
    pub fn insert_at(&mut self, id: NodeId, index: usize, content: Insert<'_>) -> TreeResult<()> {
        if let Insert::Text("") = content {
            return Ok(());
        }
        let node = self.arena.get(id)?;
        if !node.is_container() {
            return self.leaf_insert_at(id, index, content);
        }
        if self.arena.child_list(id)?.is_empty() {
            if index != 0 {
                return Err(TreeError::OffsetOutOfRange { index, length: 0 });
            }
            let leaf = self.leaf_from_insert(content)?;
            return self.append_child(id, leaf);
        }
        let (child, offset) = self.arena.find(id, index, true)?;
        self.insert_at(child, offset, content)
    }
}
