//! Headless page model: the elements the glue reads from and writes to.
//!
//! Selectors cover what the storefront pages use: `#id`, `.class` and `tag.class`
//! (any number of classes).

use std::collections::{BTreeMap, BTreeSet};

use crate::client::api::Suggestion;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub usize);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Element {
    pub tag: String,
    pub id: Option<String>,
    pub classes: BTreeSet<String>,
    pub attrs: BTreeMap<String, String>,
    /// Form control value.
    pub value: String,
    /// Text content.
    pub text: String,
    /// Rendered type-ahead rows, for search inputs.
    pub suggestions: Vec<Suggestion>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.insert(class.to_string());
        self
    }

    pub fn with_attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn matches(&self, selector: &str) -> bool {
        let selector = selector.trim();
        if let Some(id) = selector.strip_prefix('#') {
            return self.id.as_deref() == Some(id);
        }
        let mut parts = selector.split('.');
        let tag = parts.next().unwrap_or_default();
        if !tag.is_empty() && !tag.eq_ignore_ascii_case(&self.tag) {
            return false;
        }
        let mut classes = parts.peekable();
        if tag.is_empty() && classes.peek().is_none() {
            return false;
        }
        classes.all(|c| !c.is_empty() && self.has_class(c))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageModel {
    elements: Vec<Element>,
}

impl PageModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, element: Element) -> ElementId {
        self.elements.push(element);
        ElementId(self.elements.len() - 1)
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(id.0)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(id.0)
    }

    /// First element matching `selector`, in document order.
    pub fn query(&self, selector: &str) -> Option<ElementId> {
        self.query_all(selector).into_iter().next()
    }

    pub fn query_all(&self, selector: &str) -> Vec<ElementId> {
        self.elements
            .iter()
            .enumerate()
            .filter(|(_, e)| e.matches(selector))
            .map(|(i, _)| ElementId(i))
            .collect()
    }
}
