//! In-memory element tree implementing [`Presentation`]

use std::fmt::Write as _;

use itertools::Itertools;
use tracing::debug;

use crate::domain::FormatValue;
use crate::infrastructure::traits::Presentation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(usize);

#[derive(Debug, Clone)]
struct Element {
    tag: Option<String>,
    text: String,
    attribute: Option<FormatValue>,
    parent: Option<ElementId>,
    children: Vec<ElementId>,
}

/// Element tree kept in a flat vector. Released slots are reused by later
/// elements; detached ones simply have no parent.
#[derive(Debug, Default)]
pub struct MemoryPresentation {
    elements: Vec<Element>,
    free: Vec<usize>,
    moves: usize,
}

impl MemoryPresentation {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, element: Element) -> ElementId {
        match self.free.pop() {
            Some(slot) => {
                self.elements[slot] = element;
                ElementId(slot)
            }
            None => {
                self.elements.push(element);
                ElementId(self.elements.len() - 1)
            }
        }
    }

    fn get(&self, id: ElementId) -> &Element {
        &self.elements[id.0]
    }

    fn get_mut(&mut self, id: ElementId) -> &mut Element {
        &mut self.elements[id.0]
    }

    /// Build a tagged element holding `children` in order.
    pub fn element(&mut self, tag: &str, children: &[ElementId]) -> ElementId {
        let id = self.push(Element {
            tag: Some(tag.to_uppercase()),
            text: String::new(),
            attribute: None,
            parent: None,
            children: Vec::new(),
        });
        for &child in children {
            self.detach(child);
            self.get_mut(child).parent = Some(id);
            self.get_mut(id).children.push(child);
        }
        id
    }

    pub fn text_node(&mut self, text: &str) -> ElementId {
        self.push(Element {
            tag: None,
            text: text.to_string(),
            attribute: None,
            parent: None,
            children: Vec::new(),
        })
    }

    pub fn set_attribute(&mut self, element: ElementId, value: FormatValue) {
        self.get_mut(element).attribute = Some(value);
    }

    /// Number of `insert_before` calls that actually moved an element.
    pub fn moves(&self) -> usize {
        self.moves
    }

    pub fn reset_moves(&mut self) {
        self.moves = 0;
    }

    /// Number of elements not yet released.
    pub fn live_elements(&self) -> usize {
        self.elements.len() - self.free.len()
    }

    /// Render an element subtree as markup, e.g. `<P>ab<STRONG>c</STRONG></P>`.
    pub fn markup(&self, element: ElementId) -> String {
        let mut out = String::new();
        self.write_markup(element, &mut out);
        out
    }

    fn write_markup(&self, element: ElementId, out: &mut String) {
        let el = self.get(element);
        match &el.tag {
            None => out.push_str(&el.text),
            Some(tag) => {
                match &el.attribute {
                    Some(FormatValue::Text(v)) => {
                        let _ = write!(out, "<{} value=\"{}\">", tag, v);
                    }
                    _ => {
                        let _ = write!(out, "<{}>", tag);
                    }
                }
                for &child in &el.children {
                    self.write_markup(child, out);
                }
                let _ = write!(out, "</{}>", tag);
            }
        }
    }

    /// Markup of every child of `element`, without the element itself.
    pub fn inner_markup(&self, element: ElementId) -> String {
        self.get(element)
            .children
            .iter()
            .map(|&child| self.markup(child))
            .join("")
    }
}

impl Presentation for MemoryPresentation {
    type Handle = ElementId;

    fn create(&mut self, tag: &str, value: &FormatValue) -> ElementId {
        let id = self.element(tag, &[]);
        if let FormatValue::Text(_) = value {
            self.set_attribute(id, value.clone());
        }
        id
    }

    fn create_text(&mut self, text: &str) -> ElementId {
        self.text_node(text)
    }

    fn tag(&self, element: ElementId) -> Option<String> {
        self.get(element).tag.clone()
    }

    fn text(&self, element: ElementId) -> Option<String> {
        let el = self.get(element);
        match el.tag {
            None => Some(el.text.clone()),
            Some(_) => None,
        }
    }

    fn set_text(&mut self, element: ElementId, text: &str) {
        self.get_mut(element).text = text.to_string();
    }

    fn attribute(&self, element: ElementId) -> Option<FormatValue> {
        self.get(element).attribute.clone()
    }

    fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.get(element).parent
    }

    fn children(&self, element: ElementId) -> Vec<ElementId> {
        self.get(element).children.clone()
    }

    fn next_sibling(&self, element: ElementId) -> Option<ElementId> {
        let parent = self.get(element).parent?;
        let siblings = &self.get(parent).children;
        let position = siblings.iter().position(|&c| c == element)?;
        siblings.get(position + 1).copied()
    }

    fn insert_before(
        &mut self,
        parent: ElementId,
        child: ElementId,
        reference: Option<ElementId>,
    ) {
        self.detach(child);
        let siblings = &mut self.get_mut(parent).children;
        let position = reference.and_then(|r| siblings.iter().position(|&c| c == r));
        match position {
            Some(p) => siblings.insert(p, child),
            None => {
                if reference.is_some() {
                    debug!("reference {:?} not under {:?}, appending", reference, parent);
                }
                siblings.push(child)
            }
        }
        self.get_mut(child).parent = Some(parent);
        self.moves += 1;
    }

    fn detach(&mut self, element: ElementId) {
        if let Some(parent) = self.get_mut(element).parent.take() {
            self.get_mut(parent).children.retain(|&c| c != element);
        }
    }

    fn release(&mut self, element: ElementId) {
        self.detach(element);
        let el = self.get_mut(element);
        el.children.clear();
        el.text.clear();
        el.attribute = None;
        self.free.push(element.0);
    }
}
