//! Leaf behaviour: text runs and embeds

use tracing::instrument;

use crate::document::Document;
use crate::domain::{Body, FormatValue, Insert, LeafContent, NodeId};
use crate::errors::{TreeError, TreeResult};
use crate::infrastructure::traits::Presentation;

/// Byte position of the `index`-th char, or the end of the string.
fn byte_offset(text: &str, index: usize) -> usize {
    text.char_indices()
        .nth(index)
        .map(|(i, _)| i)
        .unwrap_or(text.len())
}

impl<P: Presentation> Document<P> {
    /// Replace the content of a text leaf, keeping the backing element in step.
    pub(crate) fn set_leaf_text(&mut self, id: NodeId, text: String) -> TreeResult<()> {
        let node = self.arena.get_mut(id)?;
        match &mut node.body {
            Body::Leaf(LeafContent::Text(current)) => {
                self.presentation.set_text(node.element, &text);
                *current = text;
                Ok(())
            }
            _ => Err(TreeError::Inconsistent(format!("{} is not a text leaf", id))),
        }
    }

    pub(crate) fn leaf_from_insert(&mut self, content: Insert<'_>) -> TreeResult<NodeId> {
        match content {
            Insert::Text(text) => self.create_text(text),
            Insert::Embed { kind, value } => self.create_node(kind, value.clone()),
        }
    }

    /// Strictly inside the leaf: the tail becomes a new sibling after it.
    #[instrument(level = "trace", skip(self))]
    pub(crate) fn split_leaf(&mut self, id: NodeId, index: usize) -> TreeResult<Option<NodeId>> {
        let node = self.arena.get(id)?;
        let parent = node.parent.ok_or(TreeError::NoParent(id))?;
        let next = node.next;
        let text = match node.leaf() {
            Some(LeafContent::Text(text)) => text.clone(),
            // embeds have length 1 and never split inside
            _ => return Ok(next),
        };

        let at = byte_offset(&text, index);
        let tail = self.clone_node(id)?;
        self.set_leaf_text(tail, text[at..].to_string())?;
        self.set_leaf_text(id, text[..at].to_string())?;
        self.insert_before(parent, tail, next)?;
        Ok(Some(tail))
    }

    #[instrument(level = "trace", skip(self))]
    pub(crate) fn leaf_insert_at(
        &mut self,
        id: NodeId,
        offset: usize,
        content: Insert<'_>,
    ) -> TreeResult<()> {
        let node = self.arena.get(id)?;
        if let (Some(LeafContent::Text(text)), Insert::Text(inserted)) = (node.leaf(), content) {
            let length = text.chars().count();
            if offset > length {
                return Err(TreeError::OffsetOutOfRange {
                    index: offset,
                    length,
                });
            }
            let at = byte_offset(text, offset);
            let mut updated = String::with_capacity(text.len() + inserted.len());
            updated.push_str(&text[..at]);
            updated.push_str(inserted);
            updated.push_str(&text[at..]);
            return self.set_leaf_text(id, updated);
        }

        let parent = node.parent.ok_or(TreeError::NoParent(id))?;
        let reference = self.split(id, offset)?;
        let leaf = self.leaf_from_insert(content)?;
        self.insert_before(parent, leaf, reference)
    }

    /// Delete part of a leaf. The whole-leaf case is handled by the caller.
    #[instrument(level = "trace", skip(self))]
    pub(crate) fn leaf_delete_at(&mut self, id: NodeId, index: usize, length: usize) -> TreeResult<()> {
        if length == 0 {
            return Ok(());
        }
        let text = match self.arena.get(id)?.leaf() {
            Some(LeafContent::Text(text)) => text.clone(),
            _ => return Ok(()),
        };
        let start = byte_offset(&text, index);
        let end = byte_offset(&text, index + length);
        let mut updated = text;
        updated.replace_range(start..end, "");
        if updated.is_empty() {
            return self.remove(id);
        }
        self.set_leaf_text(id, updated)
    }

    /// Split off `[index, index + length)` and format that piece alone.
    #[instrument(level = "trace", skip(self))]
    pub(crate) fn leaf_format_at(
        &mut self,
        id: NodeId,
        index: usize,
        length: usize,
        name: &str,
        value: &FormatValue,
    ) -> TreeResult<()> {
        if length == 0 {
            return Ok(());
        }
        let Some(target) = self.split(id, index)? else {
            return Ok(());
        };
        self.split(target, length)?;
        self.format(target, name, value)
    }
}
