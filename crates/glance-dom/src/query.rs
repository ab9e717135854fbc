//! Element queries
//!
//! Typed selectors instead of selector strings: callers say what they look
//! for, and there is no parsing step that can silently match nothing.

use crate::{DomTree, ElementData, NodeId};

/// Simple typed selector
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Any element
    Universal,
    /// Tag name (lowercase)
    Tag(String),
    /// Class token
    Class(String),
    /// `id` attribute
    Id(String),
    /// `name` attribute
    Name(String),
    /// Presence of an attribute
    HasAttr(String),
}

impl Selector {
    pub fn tag(tag: &str) -> Self {
        Self::Tag(tag.to_ascii_lowercase())
    }

    pub fn class(class: &str) -> Self {
        Self::Class(class.to_string())
    }

    pub fn id(id: &str) -> Self {
        Self::Id(id.to_string())
    }

    pub fn name(name: &str) -> Self {
        Self::Name(name.to_string())
    }

    /// Check an element against this selector
    pub fn matches(&self, elem: &ElementData) -> bool {
        match self {
            Self::Universal => true,
            Self::Tag(tag) => elem.tag == *tag,
            Self::Class(class) => elem.has_class(class),
            Self::Id(id) => elem.id() == Some(id.as_str()),
            Self::Name(name) => elem.name() == Some(name.as_str()),
            Self::HasAttr(attr) => elem.attrs().contains(attr),
        }
    }
}

impl DomTree {
    /// All descendant elements of `root` matching `selector`, in document order
    pub fn query_all(&self, root: NodeId, selector: &Selector) -> Vec<NodeId> {
        self.descendants(root)
            .filter(|(_, node)| node.as_element().is_some_and(|e| selector.matches(e)))
            .map(|(id, _)| id)
            .collect()
    }

    /// First descendant element of `root` matching `selector`
    pub fn query_first(&self, root: NodeId, selector: &Selector) -> Option<NodeId> {
        self.descendants(root)
            .find(|(_, node)| node.as_element().is_some_and(|e| selector.matches(e)))
            .map(|(id, _)| id)
    }

    /// Nearest inclusive ancestor element matching `selector`
    pub fn closest(&self, node: NodeId, selector: &Selector) -> Option<NodeId> {
        let mut current = node;
        while current.is_valid() {
            let n = self.get(current)?;
            if n.as_element().is_some_and(|e| selector.matches(e)) {
                return Some(current);
            }
            current = n.parent;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> (DomTree, NodeId) {
        let mut tree = DomTree::new();
        let form = tree.create_element("form");
        let a = tree.create_element("input");
        let b = tree.create_element("input");
        let div = tree.create_element("div");
        tree.append_child(tree.root(), form).unwrap();
        tree.append_child(form, a).unwrap();
        tree.append_child(form, div).unwrap();
        tree.append_child(div, b).unwrap();
        tree.set_attribute(a, "name", "first").unwrap();
        tree.set_attribute(b, "class", "sticky wide").unwrap();
        (tree, form)
    }

    #[test]
    fn test_query_all_by_tag() {
        let (tree, form) = sample();
        assert_eq!(tree.query_all(form, &Selector::tag("INPUT")).len(), 2);
        assert_eq!(tree.query_all(form, &Selector::Universal).len(), 3);
    }

    #[test]
    fn test_query_first_by_class_and_name() {
        let (tree, form) = sample();
        let sticky = tree.query_first(form, &Selector::class("sticky")).unwrap();
        assert_eq!(tree.element(sticky).unwrap().tag, "input");
        assert!(tree.query_first(form, &Selector::name("first")).is_some());
        assert!(tree.query_first(form, &Selector::name("second")).is_none());
    }

    #[test]
    fn test_closest() {
        let (tree, form) = sample();
        let sticky = tree.query_first(form, &Selector::class("sticky")).unwrap();
        assert_eq!(tree.closest(sticky, &Selector::tag("form")), Some(form));
        assert_eq!(tree.closest(sticky, &Selector::tag("table")), None);
    }
}
