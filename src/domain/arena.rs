use std::fmt;

use generational_arena::{Arena, Index};
use tracing::instrument;

use crate::domain::children::ChildList;
use crate::domain::format::{FormatValue, LeafValue};
use crate::errors::{TreeError, TreeResult};

/// Handle to a node stored in a [`NodeArena`].
///
/// Ids are generational: once a node is removed its id never resolves again,
/// even if the slot is reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) Index);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (slot, generation) = self.0.into_raw_parts();
        write!(f, "#{}.{}", slot, generation)
    }
}

/// Raw content held by a leaf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeafContent {
    Text(String),
    /// Atomic unit of length 1; its payload is the node's `value`.
    Embed,
}

impl LeafContent {
    pub fn len(&self) -> usize {
        match self {
            LeafContent::Text(text) => text.chars().count(),
            LeafContent::Embed => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug)]
pub enum Body {
    Leaf(LeafContent),
    Container(ChildList),
}

/// Tree node in the arena-based document structure.
#[derive(Debug)]
pub struct Node<H> {
    /// Registered kind name
    pub kind: String,
    /// Format value for format containers and embeds
    pub value: FormatValue,
    /// Owning container, None for the root and for detached nodes
    pub parent: Option<NodeId>,
    pub prev: Option<NodeId>,
    pub next: Option<NodeId>,
    /// Backing presentation element
    pub element: H,
    pub body: Body,
}

impl<H> Node<H> {
    pub fn is_container(&self) -> bool {
        matches!(self.body, Body::Container(_))
    }

    pub fn child_list(&self) -> Option<&ChildList> {
        match &self.body {
            Body::Container(list) => Some(list),
            Body::Leaf(_) => None,
        }
    }

    pub fn leaf(&self) -> Option<&LeafContent> {
        match &self.body {
            Body::Leaf(content) => Some(content),
            Body::Container(_) => None,
        }
    }
}

/// Arena storage for every node of one document.
#[derive(Debug)]
pub struct NodeArena<H> {
    nodes: Arena<Node<H>>,
}

impl<H> Default for NodeArena<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> NodeArena<H> {
    pub fn new() -> Self {
        Self {
            nodes: Arena::new(),
        }
    }

    pub fn insert(&mut self, node: Node<H>) -> NodeId {
        NodeId(self.nodes.insert(node))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains(id.0)
    }

    pub fn get(&self, id: NodeId) -> TreeResult<&Node<H>> {
        self.nodes.get(id.0).ok_or(TreeError::StaleNode(id))
    }

    pub fn get_mut(&mut self, id: NodeId) -> TreeResult<&mut Node<H>> {
        self.nodes.get_mut(id.0).ok_or(TreeError::StaleNode(id))
    }

    /// Drop a single node from storage. Links are not touched.
    pub fn release(&mut self, id: NodeId) -> Option<Node<H>> {
        self.nodes.remove(id.0)
    }

    /// Number of live nodes, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Content length of a node: leaf content size, or the sum over children.
    #[instrument(level = "trace", skip(self))]
    pub fn length(&self, id: NodeId) -> TreeResult<usize> {
        let node = self.get(id)?;
        match &node.body {
            Body::Leaf(content) => Ok(content.len()),
            Body::Container(_) => self
                .iter_children(id)?
                .try_fold(0, |acc, child| -> TreeResult<usize> {
                    Ok(acc + self.length(child)?)
                }),
        }
    }

    /// Lazy walk over the leaf values below `id`, in document order.
    #[instrument(level = "trace", skip(self))]
    pub fn values(&self, id: NodeId) -> TreeResult<Values<'_, H>> {
        self.get(id)?;
        Ok(Values::new(self, id))
    }
}

/// Pre-order walk yielding the value of every leaf below a node.
pub struct Values<'a, H> {
    arena: &'a NodeArena<H>,
    stack: Vec<NodeId>,
}

impl<'a, H> Values<'a, H> {
    fn new(arena: &'a NodeArena<H>, start: NodeId) -> Self {
        Self {
            arena,
            stack: vec![start],
        }
    }
}

impl<'a, H> Iterator for Values<'a, H> {
    type Item = LeafValue;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current) = self.stack.pop() {
            let Ok(node) = self.arena.get(current) else {
                continue;
            };
            match &node.body {
                Body::Leaf(LeafContent::Text(text)) => return Some(LeafValue::Text(text.clone())),
                Body::Leaf(LeafContent::Embed) => {
                    return Some(LeafValue::Embed {
                        kind: node.kind.clone(),
                        value: node.value.clone(),
                    })
                }
                Body::Container(_) => {
                    // Push children in reverse order for left-to-right traversal
                    if let Ok(children) = self.arena.iter_children(current) {
                        let children: Vec<NodeId> = children.collect();
                        self.stack.extend(children.into_iter().rev());
                    }
                }
            }
        }
        None
    }
}
