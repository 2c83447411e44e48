//! Ordered child sequence
//!
//! A container keeps only the ends of its sequence; the `prev`/`next` links
//! live on the child nodes themselves. Membership is what the list owns, the
//! arena owns the nodes.

use tracing::instrument;

use crate::domain::arena::{Body, NodeArena, NodeId};
use crate::errors::{TreeError, TreeResult};

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ChildList {
    pub head: Option<NodeId>,
    pub tail: Option<NodeId>,
    pub len: usize,
}

impl ChildList {
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Portion of a child covered by a resolved range, in the child's coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub child: NodeId,
    pub offset: usize,
    pub length: usize,
}

pub struct ChildIter<'a, H> {
    arena: &'a NodeArena<H>,
    current: Option<NodeId>,
}

impl<'a, H> Iterator for ChildIter<'a, H> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current?;
        self.current = self.arena.get(current).ok().and_then(|node| node.next);
        Some(current)
    }
}

impl<H> NodeArena<H> {
    pub fn child_list(&self, parent: NodeId) -> TreeResult<&ChildList> {
        self.get(parent)?
            .child_list()
            .ok_or(TreeError::NotAContainer(parent))
    }

    fn child_list_mut(&mut self, parent: NodeId) -> TreeResult<&mut ChildList> {
        match &mut self.get_mut(parent)?.body {
            Body::Container(list) => Ok(list),
            Body::Leaf(_) => Err(TreeError::NotAContainer(parent)),
        }
    }

    pub fn iter_children(&self, parent: NodeId) -> TreeResult<ChildIter<'_, H>> {
        let head = self.child_list(parent)?.head;
        Ok(ChildIter {
            arena: self,
            current: head,
        })
    }

    /// Iterate starting at `start` and following `next` links.
    pub fn iter_from(&self, start: Option<NodeId>) -> ChildIter<'_, H> {
        ChildIter {
            arena: self,
            current: start,
        }
    }

    /// Whether `ancestor` is `id` or one of the owners above it.
    pub fn is_ancestor_or_self(&self, ancestor: NodeId, id: NodeId) -> TreeResult<bool> {
        let mut current = Some(id);
        while let Some(node) = current {
            if node == ancestor {
                return Ok(true);
            }
            current = self.get(node)?.parent;
        }
        Ok(false)
    }

    /// Link `child` into `parent`'s sequence before `reference`, or at the end.
    #[instrument(level = "trace", skip(self))]
    pub fn link_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> TreeResult<()> {
        if self.get(child)?.parent.is_some() {
            return Err(TreeError::AlreadyAttached(child));
        }
        if self.is_ancestor_or_self(child, parent)? {
            return Err(TreeError::CycleDetected(child));
        }
        let prev = match reference {
            Some(r) => {
                let node = self.get(r)?;
                if node.parent != Some(parent) {
                    return Err(TreeError::Inconsistent(format!(
                        "reference {} is not a child of {}",
                        r, parent
                    )));
                }
                node.prev
            }
            None => self.child_list(parent)?.tail,
        };

        {
            let node = self.get_mut(child)?;
            node.parent = Some(parent);
            node.prev = prev;
            node.next = reference;
        }
        match prev {
            Some(p) => self.get_mut(p)?.next = Some(child),
            None => self.child_list_mut(parent)?.head = Some(child),
        }
        match reference {
            Some(r) => self.get_mut(r)?.prev = Some(child),
            None => self.child_list_mut(parent)?.tail = Some(child),
        }
        self.child_list_mut(parent)?.len += 1;
        Ok(())
    }

    /// Remove `child` from its parent's sequence. No-op for detached nodes.
    #[instrument(level = "trace", skip(self))]
    pub fn unlink(&mut self, child: NodeId) -> TreeResult<()> {
        let (parent, prev, next) = {
            let node = self.get(child)?;
            match node.parent {
                Some(parent) => (parent, node.prev, node.next),
                None => return Ok(()),
            }
        };
        match prev {
            Some(p) => self.get_mut(p)?.next = next,
            None => self.child_list_mut(parent)?.head = next,
        }
        match next {
            Some(n) => self.get_mut(n)?.prev = prev,
            None => self.child_list_mut(parent)?.tail = prev,
        }
        self.child_list_mut(parent)?.len -= 1;

        let node = self.get_mut(child)?;
        node.parent = None;
        node.prev = None;
        node.next = None;
        Ok(())
    }

    /// Resolve a flat index to `(child, offset within child)`.
    ///
    /// With `inclusive`, an index sitting exactly at the end of a child resolves
    /// to that child unless the following child is empty (so an insert at the
    /// very end of the sequence lands in the last child).
    #[instrument(level = "trace", skip(self))]
    pub fn find(&self, parent: NodeId, index: usize, inclusive: bool) -> TreeResult<(NodeId, usize)> {
        let mut remaining = index;
        for child in self.iter_children(parent)? {
            let length = self.length(child)?;
            if remaining < length {
                return Ok((child, remaining));
            }
            if inclusive && remaining == length {
                let next = self.get(child)?.next;
                let next_is_empty = match next {
                    Some(n) => self.length(n)? == 0,
                    None => false,
                };
                if !next_is_empty {
                    return Ok((child, remaining));
                }
            }
            remaining -= length;
        }
        Err(TreeError::OffsetOutOfRange {
            index,
            length: self.length(parent)?,
        })
    }

    /// Resolve `[index, index + length)` to the overlapping children.
    ///
    /// The spans are collected up front; callers may restructure the sequence
    /// while consuming them.
    #[instrument(level = "trace", skip(self))]
    pub fn resolve_range(&self, parent: NodeId, index: usize, length: usize) -> TreeResult<Vec<Span>> {
        let total = self.length(parent)?;
        let end = match index.checked_add(length) {
            Some(end) if end <= total => end,
            _ => {
                return Err(TreeError::RangeOutOfBounds {
                    index,
                    length,
                    total,
                })
            }
        };
        if length == 0 {
            return Ok(Vec::new());
        }

        let (start, offset) = self.find(parent, index, false)?;
        let mut cursor = index - offset;
        let mut spans = Vec::new();
        for child in self.iter_from(Some(start)) {
            if cursor >= end {
                break;
            }
            let child_length = self.length(child)?;
            let span = if index > cursor {
                Span {
                    child,
                    offset: index - cursor,
                    length: length.min(cursor + child_length - index),
                }
            } else {
                Span {
                    child,
                    offset: 0,
                    length: child_length.min(end - cursor),
                }
            };
            spans.push(span);
            cursor += child_length;
        }
        Ok(spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::arena::{LeafContent, Node};
    use crate::domain::format::FormatValue;

    fn node(body: Body) -> Node<()> {
        Node {
            kind: "test".into(),
            value: FormatValue::default(),
            parent: None,
            prev: None,
            next: None,
            element: (),
            body,
        }
    }

    fn container(arena: &mut NodeArena<()>) -> NodeId {
        arena.insert(node(Body::Container(ChildList::default())))
    }

    fn leaf(arena: &mut NodeArena<()>, text: &str) -> NodeId {
        arena.insert(node(Body::Leaf(LeafContent::Text(text.into()))))
    }

    fn children(arena: &NodeArena<()>, parent: NodeId) -> Vec<NodeId> {
        arena.iter_children(parent).unwrap().collect()
    }

    #[test]
    fn test_append_and_insert_before() {
        let mut arena = NodeArena::new();
        let p = container(&mut arena);
        let a = leaf(&mut arena, "a");
        let b = leaf(&mut arena, "b");
        let c = leaf(&mut arena, "c");
        arena.link_before(p, a, None).unwrap();
        arena.link_before(p, c, None).unwrap();
        arena.link_before(p, b, Some(c)).unwrap();

        assert_eq!(children(&arena, p), vec![a, b, c]);
        assert_eq!(arena.get(b).unwrap().prev, Some(a));
        assert_eq!(arena.get(b).unwrap().next, Some(c));
        assert_eq!(arena.child_list(p).unwrap().len, 3);
        assert_eq!(arena.child_list(p).unwrap().tail, Some(c));
    }

    #[test]
    fn test_link_attached_node_fails() {
        let mut arena = NodeArena::new();
        let p = container(&mut arena);
        let q = container(&mut arena);
        let a = leaf(&mut arena, "a");
        arena.link_before(p, a, None).unwrap();
        assert_eq!(
            arena.link_before(q, a, None),
            Err(TreeError::AlreadyAttached(a))
        );
    }

    #[test]
    fn test_link_under_own_descendant_fails() {
        let mut arena = NodeArena::new();
        let outer = container(&mut arena);
        let inner = container(&mut arena);
        arena.link_before(outer, inner, None).unwrap();

        assert_eq!(
            arena.link_before(inner, outer, None),
            Err(TreeError::CycleDetected(outer))
        );
        assert_eq!(
            arena.link_before(outer, outer, None),
            Err(TreeError::CycleDetected(outer))
        );
        assert!(arena.child_list(inner).unwrap().is_empty());
        assert!(arena.is_ancestor_or_self(outer, inner).unwrap());
        assert!(!arena.is_ancestor_or_self(inner, outer).unwrap());
    }

    #[test]
    fn test_unlink_middle_head_and_tail() {
        let mut arena = NodeArena::new();
        let p = container(&mut arena);
        let ids: Vec<_> = ["a", "b", "c"].iter().map(|t| leaf(&mut arena, t)).collect();
        for &id in &ids {
            arena.link_before(p, id, None).unwrap();
        }
        arena.unlink(ids[1]).unwrap();
        assert_eq!(children(&arena, p), vec![ids[0], ids[2]]);
        arena.unlink(ids[0]).unwrap();
        arena.unlink(ids[2]).unwrap();
        assert!(children(&arena, p).is_empty());
        let list = arena.child_list(p).unwrap();
        assert_eq!((list.head, list.tail, list.len), (None, None, 0));
        // detached again: no-op
        arena.unlink(ids[2]).unwrap();
    }

    #[test]
    fn test_find_exclusive_and_inclusive() {
        let mut arena = NodeArena::new();
        let p = container(&mut arena);
        let a = leaf(&mut arena, "abc");
        let b = leaf(&mut arena, "defg");
        arena.link_before(p, a, None).unwrap();
        arena.link_before(p, b, None).unwrap();

        assert_eq!(arena.find(p, 0, false).unwrap(), (a, 0));
        assert_eq!(arena.find(p, 3, false).unwrap(), (b, 0));
        assert_eq!(arena.find(p, 3, true).unwrap(), (a, 3));
        assert_eq!(arena.find(p, 7, true).unwrap(), (b, 4));
        assert_eq!(
            arena.find(p, 7, false),
            Err(TreeError::OffsetOutOfRange { index: 7, length: 7 })
        );
        assert!(arena.find(p, 8, true).is_err());
    }

    #[test]
    fn test_find_inclusive_skips_to_empty_follower() {
        let mut arena = NodeArena::new();
        let p = container(&mut arena);
        let a = leaf(&mut arena, "ab");
        let empty = leaf(&mut arena, "");
        arena.link_before(p, a, None).unwrap();
        arena.link_before(p, empty, None).unwrap();
        assert_eq!(arena.find(p, 2, true).unwrap(), (empty, 0));
    }

    #[test]
    fn test_resolve_range_clips_to_children() {
        let mut arena = NodeArena::new();
        let p = container(&mut arena);
        let a = leaf(&mut arena, "abc");
        let b = leaf(&mut arena, "defg");
        arena.link_before(p, a, None).unwrap();
        arena.link_before(p, b, None).unwrap();

        let spans = arena.resolve_range(p, 2, 3).unwrap();
        assert_eq!(
            spans,
            vec![
                Span { child: a, offset: 2, length: 1 },
                Span { child: b, offset: 0, length: 2 },
            ]
        );
        assert_eq!(
            arena.resolve_range(p, 3, 4).unwrap(),
            vec![Span { child: b, offset: 0, length: 4 }]
        );
        assert!(arena.resolve_range(p, 7, 0).unwrap().is_empty());
        assert_eq!(
            arena.resolve_range(p, 5, 3),
            Err(TreeError::RangeOutOfBounds { index: 5, length: 3, total: 7 })
        );
    }

    #[test]
    fn test_leaf_has_no_children() {
        let mut arena = NodeArena::new();
        let a = leaf(&mut arena, "a");
        assert!(matches!(
            arena.iter_children(a),
            Err(TreeError::NotAContainer(_))
        ));
    }
}
