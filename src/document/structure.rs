use tracing::{debug, instrument};

use crate::document::Document;
use crate::domain::{Body, FormatValue, LeafContent, NodeId};
use crate::errors::{TreeError, TreeResult};
use crate::infrastructure::traits::Presentation;

impl<P: Presentation> Document<P> {
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> TreeResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert a detached `child` into `parent` before `reference`, or at the end.
    ///
    /// The backing element is only moved when it is not already in place.
    #[instrument(level = "trace", skip(self))]
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> TreeResult<()> {
        if child == self.root {
            return Err(TreeError::RootNotMovable(child));
        }
        self.arena.link_before(parent, child, reference)?;

        let parent_element = self.arena.get(parent)?.element;
        let child_element = self.arena.get(child)?.element;
        let reference_element = match reference {
            Some(r) => Some(self.arena.get(r)?.element),
            None => None,
        };
        let in_place = self.presentation.parent(child_element) == Some(parent_element)
            && self.presentation.next_sibling(child_element) == reference_element;
        if !in_place {
            self.presentation
                .insert_before(parent_element, child_element, reference_element);
        }
        Ok(())
    }

    /// Take a node out of its parent and out of the backing tree, keeping it alive.
    #[instrument(level = "trace", skip(self))]
    pub fn detach(&mut self, id: NodeId) -> TreeResult<()> {
        let element = self.arena.get(id)?.element;
        self.arena.unlink(id)?;
        self.presentation.detach(element);
        Ok(())
    }

    /// Destroy a node and its subtree. Removing a node that is already gone is a no-op.
    ///
    /// The root cannot leave the document; removing it removes its children.
    #[instrument(level = "trace", skip(self))]
    pub fn remove(&mut self, id: NodeId) -> TreeResult<()> {
        if !self.arena.contains(id) {
            return Ok(());
        }
        if id == self.root {
            for child in self.children(id)? {
                self.remove(child)?;
            }
            return Ok(());
        }
        self.detach(id)?;

        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.arena.release(current) {
                if let Body::Container(list) = node.body {
                    stack.extend(self.arena.iter_from(list.head));
                }
                self.presentation.release(node.element);
            }
        }
        Ok(())
    }

    /// A detached copy of `id` with the same kind and value but no children.
    ///
    /// Leaves keep their content.
    #[instrument(level = "trace", skip(self))]
    pub fn clone_node(&mut self, id: NodeId) -> TreeResult<NodeId> {
        let node = self.arena.get(id)?;
        let definition = self.registry.get(&node.kind)?.clone();
        let value = node.value.clone();
        let content = node.leaf().cloned();
        self.spawn(&definition, value, content)
    }

    /// Move every child of `from` into `target` before `reference`, keeping order.
    #[instrument(level = "trace", skip(self))]
    pub fn move_children(
        &mut self,
        from: NodeId,
        target: NodeId,
        reference: Option<NodeId>,
    ) -> TreeResult<()> {
        let children = self.children(from)?;
        for &child in &children {
            if self.arena.is_ancestor_or_self(child, target)? {
                return Err(TreeError::CycleDetected(child));
            }
        }
        for child in children {
            self.arena.unlink(child)?;
            self.insert_before(target, child, reference)?;
        }
        Ok(())
    }

    /// Put a node of `kind` in place of `id`.
    ///
    /// A container hands its children over; a text leaf replaced by a text kind
    /// keeps its text. The original node is removed.
    #[instrument(level = "trace", skip(self))]
    pub fn replace(&mut self, id: NodeId, kind: &str, value: FormatValue) -> TreeResult<NodeId> {
        let parent = self.arena.get(id)?.parent.ok_or(TreeError::NoParent(id))?;
        let replacement = self.create_node(kind, value)?;
        let replacement_is_container = self.arena.get(replacement)?.is_container();

        let (has_children, text) = match &self.arena.get(id)?.body {
            Body::Container(list) => (!list.is_empty(), None),
            Body::Leaf(LeafContent::Text(text)) => (false, Some(text.clone())),
            Body::Leaf(LeafContent::Embed) => (false, None),
        };
        if has_children {
            if !replacement_is_container {
                self.remove(replacement)?;
                return Err(TreeError::NotAContainerKind(kind.to_string()));
            }
            self.move_children(id, replacement, None)?;
        } else if let Some(text) = text {
            if self.text(replacement)?.is_some() {
                self.set_leaf_text(replacement, text)?;
            }
        }

        self.insert_before(parent, replacement, Some(id))?;
        self.remove(id)?;
        Ok(replacement)
    }

    /// Insert a new `kind` container above `id` and move `id` under it.
    #[instrument(level = "trace", skip(self))]
    pub fn wrap(&mut self, id: NodeId, kind: &str, value: FormatValue) -> TreeResult<NodeId> {
        let parent = self.arena.get(id)?.parent.ok_or(TreeError::NoParent(id))?;
        if !self.registry.get(kind)?.variant.is_container() {
            return Err(TreeError::NotAContainerKind(kind.to_string()));
        }
        let wrapper = self.create_node(kind, value)?;
        self.insert_before(parent, wrapper, Some(id))?;
        self.arena.unlink(id)?;
        self.append_child(wrapper, id)?;
        debug!("wrapped {} in {} {}", id, kind, wrapper);
        Ok(wrapper)
    }

    /// Dissolve container `id`: its children take its place in the parent.
    #[instrument(level = "trace", skip(self))]
    pub fn unwrap(&mut self, id: NodeId) -> TreeResult<()> {
        let node = self.arena.get(id)?;
        if !node.is_container() {
            return Err(TreeError::NotAContainer(id));
        }
        let parent = node.parent.ok_or(TreeError::NoParent(id))?;
        self.move_children(id, parent, Some(id))?;
        self.remove(id)
    }

    /// Partition `id` at `index` into itself and a following sibling of the same kind.
    ///
    /// Returns the node starting at `index`: `id` itself for 0, the existing next
    /// sibling (if any) for the full length, otherwise the new sibling.
    #[instrument(level = "trace", skip(self))]
    pub fn split(&mut self, id: NodeId, index: usize) -> TreeResult<Option<NodeId>> {
        let length = self.arena.length(id)?;
        if index > length {
            return Err(TreeError::OffsetOutOfRange { index, length });
        }
        if index == 0 {
            return Ok(Some(id));
        }
        let node = self.arena.get(id)?;
        if index == length {
            return Ok(node.next);
        }
        if !node.is_container() {
            return self.split_leaf(id, index);
        }

        let parent = node.parent.ok_or(TreeError::NoParent(id))?;
        let next = node.next;
        let after = self.clone_node(id)?;
        self.insert_before(parent, after, next)?;
        for span in self.arena.resolve_range(id, index, length - index)? {
            if let Some(part) = self.split(span.child, span.offset)? {
                self.arena.unlink(part)?;
                self.append_child(after, part)?;
            }
        }
        Ok(Some(after))
    }
}
