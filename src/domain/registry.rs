//! Kind registry: maps backing element tags to node definitions

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::errors::{TreeError, TreeResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Block,
    Inline,
}

/// Closed set of node behaviours a kind can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Variant {
    /// Leaf holding a text run
    Text,
    /// Leaf of length 1 carrying a value
    Embed,
    /// Structural container without a format of its own
    Container,
    /// Container whose kind is a format (bold, link, ...)
    Format,
}

impl Variant {
    pub fn is_container(self) -> bool {
        matches!(self, Variant::Container | Variant::Format)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Definition {
    pub name: String,
    /// Backing element tag; text leaves have none
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    pub scope: Scope,
    pub variant: Variant,
}

impl Definition {
    pub fn new(name: &str, tag: Option<&str>, scope: Scope, variant: Variant) -> Self {
        Self {
            name: name.to_string(),
            tag: tag.map(str::to_string),
            scope,
            variant,
        }
    }

    /// Tag used when creating a backing element for this kind.
    pub fn element_tag(&self) -> String {
        self.tag
            .clone()
            .unwrap_or_else(|| self.name.to_uppercase())
            .to_uppercase()
    }
}

/// Registration table from kind name and element tag to definition.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    definitions: BTreeMap<String, Definition>,
    tags: HashMap<String, String>,
    text_kind: Option<String>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every definition in order, stopping at the first conflict.
    pub fn from_definitions<I>(definitions: I) -> TreeResult<Self>
    where
        I: IntoIterator<Item = Definition>,
    {
        let mut registry = Self::new();
        for definition in definitions {
            registry.register(definition)?;
        }
        Ok(registry)
    }

    /// The kinds every editor needs: a root, lines, inline formats, text and images.
    pub fn builtin() -> TreeResult<Self> {
        Self::from_definitions(builtin_definitions())
    }

    #[instrument(level = "trace", skip(self))]
    pub fn register(&mut self, definition: Definition) -> TreeResult<()> {
        if self.definitions.contains_key(&definition.name) {
            return Err(TreeError::DuplicateKind(definition.name));
        }
        match definition.variant {
            Variant::Text => {
                if self.text_kind.is_some() {
                    return Err(TreeError::DuplicateKind(definition.name));
                }
                self.text_kind = Some(definition.name.clone());
            }
            _ => {
                let tag = definition.element_tag();
                if self.tags.contains_key(&tag) {
                    return Err(TreeError::DuplicateKind(tag));
                }
                self.tags.insert(tag, definition.name.clone());
            }
        }
        self.definitions
            .insert(definition.name.clone(), definition);
        Ok(())
    }

    pub fn get(&self, name: &str) -> TreeResult<&Definition> {
        self.definitions
            .get(name)
            .ok_or_else(|| TreeError::UnknownKind(name.to_string()))
    }

    pub fn query(&self, name: &str) -> Option<&Definition> {
        self.definitions.get(name)
    }

    /// Definition for a backing element: untagged elements are text.
    pub fn matches(&self, tag: Option<&str>) -> Option<&Definition> {
        match tag {
            None => self.text_kind.as_deref().and_then(|k| self.query(k)),
            Some(tag) => self
                .tags
                .get(&tag.to_uppercase())
                .and_then(|name| self.query(name)),
        }
    }

    pub fn text_kind(&self) -> TreeResult<&Definition> {
        self.text_kind
            .as_deref()
            .and_then(|k| self.query(k))
            .ok_or_else(|| TreeError::UnknownKind("<text>".to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Definition> {
        self.definitions.values()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

pub fn builtin_definitions() -> Vec<Definition> {
    vec![
        Definition::new("scroll", Some("DIV"), Scope::Block, Variant::Container),
        Definition::new("line", Some("P"), Scope::Block, Variant::Container),
        Definition::new("bold", Some("STRONG"), Scope::Inline, Variant::Format),
        Definition::new("italic", Some("EM"), Scope::Inline, Variant::Format),
        Definition::new("link", Some("A"), Scope::Inline, Variant::Format),
        Definition::new("text", None, Scope::Inline, Variant::Text),
        Definition::new("image", Some("IMG"), Scope::Inline, Variant::Embed),
    ]
}
