//! The document tree: an arena of nodes kept in step with a backing presentation
//!
//! Every operation addresses a node by [`NodeId`] and, for offset-addressed
//! mutations, a flat content index inside that node. Structural operations
//! live in `structure`, offset-addressed ones in `mutation`, leaf behaviour in
//! `leaf`.

mod leaf;
mod mutation;
mod structure;

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use crate::config::Settings;
use crate::domain::{
    Body, ChildList, Definition, FormatValue, LeafContent, Node, NodeArena, NodeId, Registry,
    Values, Variant,
};
use crate::errors::{TreeError, TreeResult};
use crate::infrastructure::traits::Presentation;

pub struct Document<P: Presentation> {
    arena: NodeArena<P::Handle>,
    registry: Registry,
    presentation: P,
    root: NodeId,
}

impl<P: Presentation> Document<P> {
    /// Create an empty document whose root is a fresh `root_kind` element.
    pub fn new(mut presentation: P, registry: Registry, root_kind: &str) -> TreeResult<Self> {
        let definition = root_definition(&registry, root_kind)?;
        let element = presentation.create(&definition.element_tag(), &FormatValue::default());
        Ok(Self::assemble(presentation, registry, definition, element))
    }

    /// Create a document over an existing root element, adopting its content.
    ///
    /// Child elements the registry does not recognize are removed from the
    /// presentation.
    #[instrument(level = "debug", skip(presentation, registry))]
    pub fn from_element(
        presentation: P,
        registry: Registry,
        root_kind: &str,
        element: P::Handle,
    ) -> TreeResult<Self> {
        let definition = root_definition(&registry, root_kind)?;
        let mut document = Self::assemble(presentation, registry, definition, element);
        document.build(document.root)?;
        Ok(document)
    }

    /// Create an empty document with the registry and root kind from `settings`.
    pub fn with_settings(presentation: P, settings: &Settings) -> TreeResult<Self> {
        let registry = settings.registry()?;
        Self::new(presentation, registry, &settings.root_kind)
    }

    fn assemble(
        presentation: P,
        registry: Registry,
        definition: Definition,
        element: P::Handle,
    ) -> Self {
        let mut arena = NodeArena::new();
        let root = arena.insert(Node {
            kind: definition.name,
            value: FormatValue::default(),
            parent: None,
            prev: None,
            next: None,
            element,
            body: Body::Container(ChildList::default()),
        });
        Self {
            arena,
            registry,
            presentation,
            root,
        }
    }

    /// Populate `container` from the children of its backing element.
    fn build(&mut self, container: NodeId) -> TreeResult<()> {
        let element = self.arena.get(container)?.element;
        for child_element in self.presentation.children(element) {
            let tag = self.presentation.tag(child_element);
            let Some(definition) = self.registry.matches(tag.as_deref()).cloned() else {
                debug!("dropping unrecognized element {:?} ({:?})", child_element, tag);
                self.presentation.detach(child_element);
                continue;
            };
            let child = self.adopt(&definition, child_element)?;
            // the element is already in place, only the sequence needs it
            self.arena.link_before(container, child, None)?;
            if definition.variant.is_container() {
                self.build(child)?;
            }
        }
        Ok(())
    }

    /// Wrap an existing backing element in a detached node.
    fn adopt(&mut self, definition: &Definition, element: P::Handle) -> TreeResult<NodeId> {
        let value = self.presentation.attribute(element).unwrap_or_default();
        let body = match definition.variant {
            Variant::Text => Body::Leaf(LeafContent::Text(
                self.presentation.text(element).unwrap_or_default(),
            )),
            Variant::Embed => Body::Leaf(LeafContent::Embed),
            Variant::Container | Variant::Format => Body::Container(ChildList::default()),
        };
        Ok(self.arena.insert(Node {
            kind: definition.name.clone(),
            value,
            parent: None,
            prev: None,
            next: None,
            element,
            body,
        }))
    }

    /// Create a detached node of a registered kind, with its backing element.
    #[instrument(level = "trace", skip(self))]
    pub fn create_node(&mut self, kind: &str, value: FormatValue) -> TreeResult<NodeId> {
        let definition = self.registry.get(kind)?.clone();
        let content = match definition.variant {
            Variant::Text => Some(LeafContent::Text(String::new())),
            Variant::Embed => Some(LeafContent::Embed),
            Variant::Container | Variant::Format => None,
        };
        self.spawn(&definition, value, content)
    }

    /// Create a detached text leaf.
    pub fn create_text(&mut self, text: &str) -> TreeResult<NodeId> {
        let definition = self.registry.text_kind()?.clone();
        self.spawn(
            &definition,
            FormatValue::default(),
            Some(LeafContent::Text(text.to_string())),
        )
    }

    fn spawn(
        &mut self,
        definition: &Definition,
        value: FormatValue,
        content: Option<LeafContent>,
    ) -> TreeResult<NodeId> {
        let (element, body) = match content {
            Some(LeafContent::Text(text)) => (
                self.presentation.create_text(&text),
                Body::Leaf(LeafContent::Text(text)),
            ),
            Some(LeafContent::Embed) => (
                self.presentation.create(&definition.element_tag(), &value),
                Body::Leaf(LeafContent::Embed),
            ),
            None => (
                self.presentation.create(&definition.element_tag(), &value),
                Body::Container(ChildList::default()),
            ),
        };
        Ok(self.arena.insert(Node {
            kind: definition.name.clone(),
            value,
            parent: None,
            prev: None,
            next: None,
            element,
            body,
        }))
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn presentation(&self) -> &P {
        &self.presentation
    }

    /// Give up the tree and hand back the presentation.
    pub fn into_presentation(self) -> P {
        self.presentation
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.arena.contains(id)
    }

    pub fn node(&self, id: NodeId) -> TreeResult<&Node<P::Handle>> {
        self.arena.get(id)
    }

    pub fn kind(&self, id: NodeId) -> TreeResult<&str> {
        Ok(&self.arena.get(id)?.kind)
    }

    pub fn value(&self, id: NodeId) -> TreeResult<&FormatValue> {
        Ok(&self.arena.get(id)?.value)
    }

    pub fn element(&self, id: NodeId) -> TreeResult<P::Handle> {
        Ok(self.arena.get(id)?.element)
    }

    pub fn parent(&self, id: NodeId) -> TreeResult<Option<NodeId>> {
        Ok(self.arena.get(id)?.parent)
    }

    pub fn prev(&self, id: NodeId) -> TreeResult<Option<NodeId>> {
        Ok(self.arena.get(id)?.prev)
    }

    pub fn next(&self, id: NodeId) -> TreeResult<Option<NodeId>> {
        Ok(self.arena.get(id)?.next)
    }

    pub fn children(&self, id: NodeId) -> TreeResult<Vec<NodeId>> {
        Ok(self.arena.iter_children(id)?.collect())
    }

    /// Text of a text leaf, None for embeds and containers.
    pub fn text(&self, id: NodeId) -> TreeResult<Option<&str>> {
        Ok(match self.arena.get(id)?.leaf() {
            Some(LeafContent::Text(text)) => Some(text.as_str()),
            _ => None,
        })
    }

    /// Number of live nodes, including detached ones.
    pub fn node_count(&self) -> usize {
        self.arena.len()
    }

    pub fn length(&self, id: NodeId) -> TreeResult<usize> {
        self.arena.length(id)
    }

    /// Lazy enumeration of the leaf values below `id`. Call again to restart.
    pub fn values(&self, id: NodeId) -> TreeResult<Values<'_, P::Handle>> {
        self.arena.values(id)
    }

    /// Plain text of a subtree; embeds are skipped.
    pub fn plain_text(&self, id: NodeId) -> TreeResult<String> {
        Ok(self
            .values(id)?
            .filter_map(|value| value.as_text().map(str::to_string))
            .collect())
    }

    /// Formats this node represents.
    ///
    /// Structural containers have no format of their own and report
    /// `FormatsUnsupported`.
    pub fn formats(&self, id: NodeId) -> TreeResult<BTreeMap<String, FormatValue>> {
        let node = self.arena.get(id)?;
        let definition = self.registry.get(&node.kind)?;
        match definition.variant {
            Variant::Format => Ok(BTreeMap::from([(node.kind.clone(), node.value.clone())])),
            Variant::Text | Variant::Embed => Ok(BTreeMap::new()),
            Variant::Container => Err(TreeError::FormatsUnsupported(node.kind.clone())),
        }
    }

    /// Resolve `index` inside container `id` to `(child, local offset)`.
    pub fn find(&self, id: NodeId, index: usize, inclusive: bool) -> TreeResult<(NodeId, usize)> {
        self.arena.find(id, index, inclusive)
    }

    /// Chain of `(node, local offset)` from `id` down to the leaf holding `index`.
    #[instrument(level = "trace", skip(self))]
    pub fn path(&self, id: NodeId, index: usize, inclusive: bool) -> TreeResult<Vec<(NodeId, usize)>> {
        let mut path = vec![(id, index)];
        let (mut current, mut offset) = (id, index);
        while self.arena.get(current)?.is_container() {
            let (child, local) = self.arena.find(current, offset, inclusive)?;
            path.push((child, local));
            current = child;
            offset = local;
        }
        Ok(path)
    }

    /// Verify links, parent pointers and backing order for the whole tree.
    #[instrument(level = "debug", skip(self))]
    pub fn check_consistency(&self) -> TreeResult<()> {
        let mut stack = vec![self.root];
        while let Some(current) = stack.pop() {
            let node = self.arena.get(current)?;
            match &node.body {
                Body::Leaf(LeafContent::Text(text)) => {
                    let backing = self.presentation.text(node.element);
                    if backing.as_deref() != Some(text.as_str()) {
                        return Err(TreeError::Inconsistent(format!(
                            "text of {} is {:?} but backing holds {:?}",
                            current, text, backing
                        )));
                    }
                }
                Body::Leaf(LeafContent::Embed) => {}
                Body::Container(list) => {
                    let children = self.children(current)?;
                    if children.len() != list.len || list.tail != children.last().copied() {
                        return Err(TreeError::Inconsistent(format!(
                            "child list of {} is out of step with its links",
                            current
                        )));
                    }
                    let mut prev = None;
                    for &child in &children {
                        let child_node = self.arena.get(child)?;
                        if child_node.parent != Some(current) || child_node.prev != prev {
                            return Err(TreeError::Inconsistent(format!(
                                "links of {} under {} are broken",
                                child, current
                            )));
                        }
                        prev = Some(child);
                    }
                    let expected: Vec<P::Handle> = children
                        .iter()
                        .map(|&c| self.arena.get(c).map(|n| n.element))
                        .collect::<TreeResult<_>>()?;
                    if self.presentation.children(node.element) != expected {
                        return Err(TreeError::Inconsistent(format!(
                            "backing children of {} differ from the child sequence",
                            current
                        )));
                    }
                    stack.extend(children.into_iter().rev());
                }
            }
        }
        Ok(())
    }
}

fn root_definition(registry: &Registry, root_kind: &str) -> TreeResult<Definition> {
    let definition = registry.get(root_kind)?;
    if !definition.variant.is_container() {
        return Err(TreeError::NotAContainerKind(root_kind.to_string()));
    }
    Ok(definition.clone())
}
