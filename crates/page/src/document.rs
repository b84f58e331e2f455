use crate::error::{PageError, Result};
use crate::markup;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Handle to a page element. Relation only: the page owns the element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementId(usize);

impl ElementId {
    pub const fn index(self) -> usize {
        self.0
    }

    pub(crate) const fn root_handle() -> Self {
        Self(0)
    }
}

impl std::fmt::Display for ElementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Everything the engine needs from a live page.
pub trait Document {
    /// Attached elements carrying both attributes, in document order.
    fn annotated_elements(&self, file_attr: &str, line_attr: &str) -> Vec<ElementId>;

    fn attribute(&self, id: ElementId, name: &str) -> Option<&str>;

    fn is_attached(&self, id: ElementId) -> bool;

    /// Full serialized markup, including content a structured query cannot
    /// reach (template contents, shadow roots).
    fn serialized_markup(&self) -> String;

    /// Returns `false` when the element is unknown or already has the class.
    fn add_class(&mut self, id: ElementId, class: &str) -> bool;

    /// Returns `false` when the element is unknown or lacks the class.
    fn remove_class(&mut self, id: ElementId, class: &str) -> bool;

    fn has_class(&self, id: ElementId, class: &str) -> bool;

    fn elements_with_class(&self, class: &str) -> Vec<ElementId>;

    fn scroll_into_view(&mut self, id: ElementId);

    /// Whether keyboard focus currently sits in a text-entry control.
    fn focus_in_text_entry(&self) -> bool;
}

#[derive(Debug, Clone)]
pub(crate) struct ElementNode {
    pub(crate) tag: String,
    pub(crate) attributes: Vec<(String, String)>,
    pub(crate) classes: BTreeSet<String>,
    pub(crate) text: Option<String>,
    pub(crate) parent: Option<ElementId>,
    pub(crate) children: Vec<ElementId>,
}

/// Arena-backed page. Element `0` is the `<body>` root.
#[derive(Debug, Clone)]
pub struct PageDocument {
    pub(crate) nodes: Vec<ElementNode>,
    pub(crate) inert_markup: Vec<String>,
    focused: Option<ElementId>,
    scrolled_to: Vec<ElementId>,
}

impl Default for PageDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl PageDocument {
    pub fn new() -> Self {
        Self {
            nodes: vec![ElementNode {
                tag: "body".to_string(),
                attributes: Vec::new(),
                classes: BTreeSet::new(),
                text: None,
                parent: None,
                children: Vec::new(),
            }],
            inert_markup: Vec::new(),
            focused: None,
            scrolled_to: Vec::new(),
        }
    }

    pub const fn root(&self) -> ElementId {
        ElementId(0)
    }

    /// Create a detached element.
    pub fn create_element(&mut self, tag: impl Into<String>) -> ElementId {
        let id = ElementId(self.nodes.len());
        self.nodes.push(ElementNode {
            tag: tag.into(),
            attributes: Vec::new(),
            classes: BTreeSet::new(),
            text: None,
            parent: None,
            children: Vec::new(),
        });
        id
    }

    pub fn append_child(&mut self, parent: ElementId, child: ElementId) -> Result<()> {
        if parent == child || child == self.root() || self.is_ancestor(child, parent) {
            return Err(PageError::InvalidAppend { parent, child });
        }
        self.node(parent)?;
        self.node(child)?;
        self.detach(child)?;
        self.nodes[child.0].parent = Some(parent);
        self.nodes[parent.0].children.push(child);
        Ok(())
    }

    /// Create an element and append it in one step.
    pub fn append_element(
        &mut self,
        parent: ElementId,
        tag: impl Into<String>,
        attributes: &[(&str, &str)],
    ) -> Result<ElementId> {
        let id = self.create_element(tag);
        for (name, value) in attributes {
            self.set_attribute(id, name, value)?;
        }
        self.append_child(parent, id)?;
        Ok(id)
    }

    /// Remove the element (and its subtree) from the page. Handles stay valid
    /// but [`Document::is_attached`] turns false.
    pub fn detach(&mut self, id: ElementId) -> Result<()> {
        let parent = self.node(id)?.parent;
        if let Some(parent) = parent {
            self.nodes[parent.0].children.retain(|c| *c != id);
            self.nodes[id.0].parent = None;
        }
        Ok(())
    }

    pub fn set_attribute(&mut self, id: ElementId, name: &str, value: &str) -> Result<()> {
        let node = self.node_mut(id)?;
        if name == "class" {
            node.classes = value.split_whitespace().map(str::to_string).collect();
            return Ok(());
        }
        match node.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => node.attributes.push((name.to_string(), value.to_string())),
        }
        Ok(())
    }

    pub fn set_text(&mut self, id: ElementId, text: impl Into<String>) -> Result<()> {
        self.node_mut(id)?.text = Some(text.into());
        Ok(())
    }

    pub fn tag(&self, id: ElementId) -> Option<&str> {
        self.nodes.get(id.0).map(|n| n.tag.as_str())
    }

    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or_default()
    }

    /// Markup that only the raw-text pass can see.
    pub fn add_inert_markup(&mut self, markup: impl Into<String>) {
        self.inert_markup.push(markup.into());
    }

    pub fn focus(&mut self, id: Option<ElementId>) {
        self.focused = id;
    }

    pub fn last_scrolled(&self) -> Option<ElementId> {
        self.scrolled_to.last().copied()
    }

    /// Attached elements in document (pre-)order, root excluded.
    pub fn attached_elements(&self) -> Vec<ElementId> {
        let mut out = Vec::new();
        let mut stack: Vec<ElementId> = self.nodes[0].children.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            out.push(id);
            stack.extend(self.nodes[id.0].children.iter().rev().copied());
        }
        out
    }

    fn is_ancestor(&self, candidate: ElementId, of: ElementId) -> bool {
        let mut current = self.nodes.get(of.0).and_then(|n| n.parent);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = self.nodes[id.0].parent;
        }
        false
    }

    fn node(&self, id: ElementId) -> Result<&ElementNode> {
        self.nodes.get(id.0).ok_or(PageError::UnknownElement(id))
    }

    fn node_mut(&mut self, id: ElementId) -> Result<&mut ElementNode> {
        self.nodes.get_mut(id.0).ok_or(PageError::UnknownElement(id))
    }
}

impl Document for PageDocument {
    fn annotated_elements(&self, file_attr: &str, line_attr: &str) -> Vec<ElementId> {
        self.attached_elements()
            .into_iter()
            .filter(|id| {
                self.attribute(*id, file_attr).is_some() && self.attribute(*id, line_attr).is_some()
            })
            .collect()
    }

    fn attribute(&self, id: ElementId, name: &str) -> Option<&str> {
        self.nodes
            .get(id.0)?
            .attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn is_attached(&self, id: ElementId) -> bool {
        if id.0 == 0 || id.0 >= self.nodes.len() {
            return false;
        }
        let mut current = self.nodes[id.0].parent;
        while let Some(parent) = current {
            if parent.0 == 0 {
                return true;
            }
            current = self.nodes[parent.0].parent;
        }
        false
    }

    fn serialized_markup(&self) -> String {
        markup::serialize(self)
    }

    fn add_class(&mut self, id: ElementId, class: &str) -> bool {
        match self.nodes.get_mut(id.0) {
            Some(node) => node.classes.insert(class.to_string()),
            None => false,
        }
    }

    fn remove_class(&mut self, id: ElementId, class: &str) -> bool {
        match self.nodes.get_mut(id.0) {
            Some(node) => node.classes.remove(class),
            None => false,
        }
    }

    fn has_class(&self, id: ElementId, class: &str) -> bool {
        self.nodes
            .get(id.0)
            .is_some_and(|node| node.classes.contains(class))
    }

    fn elements_with_class(&self, class: &str) -> Vec<ElementId> {
        (1..self.nodes.len())
            .map(ElementId)
            .filter(|id| self.nodes[id.0].classes.contains(class))
            .collect()
    }

    fn scroll_into_view(&mut self, id: ElementId) {
        if self.is_attached(id) {
            log::trace!("scrolling page element {id} into view");
            self.scrolled_to.push(id);
        }
    }

    fn focus_in_text_entry(&self) -> bool {
        let Some(id) = self.focused else {
            return false;
        };
        let Some(node) = self.nodes.get(id.0) else {
            return false;
        };
        if matches!(node.tag.to_ascii_lowercase().as_str(), "input" | "textarea" | "select") {
            return true;
        }
        self.attribute(id, "contenteditable")
            .is_some_and(|v| !v.eq_ignore_ascii_case("false"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn annotated_elements_follow_document_order() {
        let mut doc = PageDocument::new();
        let root = doc.root();
        let outer = doc
            .append_element(
                root,
                "div",
                &[("data-source-file", "a.tsx"), ("data-source-line", "1")],
            )
            .unwrap();
        let inner = doc
            .append_element(
                outer,
                "span",
                &[("data-source-file", "a.tsx"), ("data-source-line", "2")],
            )
            .unwrap();
        doc.append_element(root, "p", &[("data-source-file", "b.tsx")])
            .unwrap();

        assert_eq!(
            doc.annotated_elements("data-source-file", "data-source-line"),
            vec![outer, inner]
        );
    }

    #[test]
    fn detached_subtrees_are_not_attached() {
        let mut doc = PageDocument::new();
        let root = doc.root();
        let outer = doc.append_element(root, "div", &[]).unwrap();
        let inner = doc.append_element(outer, "span", &[]).unwrap();
        assert!(doc.is_attached(inner));

        doc.detach(outer).unwrap();
        assert!(!doc.is_attached(outer));
        assert!(!doc.is_attached(inner));
        assert!(doc.attached_elements().is_empty());
    }

    #[test]
    fn append_rejects_cycles() {
        let mut doc = PageDocument::new();
        let root = doc.root();
        let outer = doc.append_element(root, "div", &[]).unwrap();
        let inner = doc.append_element(outer, "span", &[]).unwrap();
        assert!(matches!(
            doc.append_child(inner, outer),
            Err(PageError::InvalidAppend { .. })
        ));
    }

    #[test]
    fn text_entry_focus_detection() {
        let mut doc = PageDocument::new();
        let root = doc.root();
        let input = doc.append_element(root, "input", &[]).unwrap();
        let editable = doc
            .append_element(root, "div", &[("contenteditable", "true")])
            .unwrap();
        let plain = doc.append_element(root, "div", &[]).unwrap();

        doc.focus(Some(input));
        assert!(doc.focus_in_text_entry());
        doc.focus(Some(editable));
        assert!(doc.focus_in_text_entry());
        doc.focus(Some(plain));
        assert!(!doc.focus_in_text_entry());
        doc.focus(None);
        assert!(!doc.focus_in_text_entry());
    }

    #[test]
    fn classes_round_trip_through_attribute() {
        let mut doc = PageDocument::new();
        let root = doc.root();
        let el = doc.append_element(root, "div", &[("class", "a b")]).unwrap();
        assert!(doc.has_class(el, "a"));
        assert!(doc.add_class(el, "c"));
        assert!(!doc.add_class(el, "c"));
        assert!(doc.remove_class(el, "a"));
        assert_eq!(doc.elements_with_class("c"), vec![el]);
    }
}
