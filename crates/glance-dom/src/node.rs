//! DOM Node
//!
//! Nodes link to each other through `NodeId`s rather than pointers, so the
//! whole tree lives in one arena and can be cut and spliced cheaply.

use crate::{Attributes, ClassList, ControlKind, FormState, NodeId};

/// DOM Node - Core structure
#[derive(Debug)]
pub struct Node {
    /// Parent node (NONE if detached or root)
    pub parent: NodeId,
    /// First child
    pub first_child: NodeId,
    /// Last child (for O(1) append)
    pub last_child: NodeId,
    /// Previous sibling
    pub prev_sibling: NodeId,
    /// Next sibling
    pub next_sibling: NodeId,
    /// Node-specific data
    pub data: NodeData,
}

impl Node {
    fn with_data(data: NodeData) -> Self {
        Self {
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
            data,
        }
    }

    /// Create a new element node
    pub fn element(data: ElementData) -> Self {
        Self::with_data(NodeData::Element(data))
    }

    /// Create a new text node
    pub fn text(content: impl Into<String>) -> Self {
        Self::with_data(NodeData::Text(content.into()))
    }

    /// Create a new comment node
    pub fn comment(content: impl Into<String>) -> Self {
        Self::with_data(NodeData::Comment(content.into()))
    }

    /// Create a document node
    pub fn document() -> Self {
        Self::with_data(NodeData::Document)
    }

    /// Check if this is an element
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Check if this is text
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    /// Get element data if this is an element
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get mutable element data
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get text content if this is a text node
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(t),
            _ => None,
        }
    }
}

/// Node-specific data
#[derive(Debug)]
pub enum NodeData {
    /// Document root
    Document,
    /// Element
    Element(ElementData),
    /// Text content
    Text(String),
    /// Comment
    Comment(String),
}

/// Element-specific data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementData {
    /// Lowercase tag name
    pub tag: String,
    attrs: Attributes,
    classes: ClassList,
    /// Live form-control state
    pub form: FormState,
}

impl ElementData {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attrs: Attributes::new(),
            classes: ClassList::new(),
            form: FormState::default(),
        }
    }

    /// Attributes in source order
    pub fn attrs(&self) -> &Attributes {
        &self.attrs
    }

    /// Get an attribute value
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name)
    }

    /// Set an attribute, keeping the class cache in sync
    pub(crate) fn set_attr(&mut self, name: &str, value: &str) -> Option<String> {
        if name == "class" {
            self.classes = ClassList::parse(value);
        }
        self.attrs.set(name, value)
    }

    pub(crate) fn remove_attr(&mut self, name: &str) -> Option<String> {
        if name == "class" {
            self.classes = ClassList::new();
        }
        self.attrs.remove(name).map(|a| a.value)
    }

    /// The `id` attribute
    pub fn id(&self) -> Option<&str> {
        self.attrs.get("id").filter(|id| !id.is_empty())
    }

    /// The `name` attribute
    pub fn name(&self) -> Option<&str> {
        self.attrs.get("name").filter(|name| !name.is_empty())
    }

    /// Class tokens
    pub fn classes(&self) -> &ClassList {
        &self.classes
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    /// Mutate the class list and write it back to the `class` attribute
    pub fn update_classes<R>(&mut self, f: impl FnOnce(&mut ClassList) -> R) -> R {
        let result = f(&mut self.classes);
        if self.classes.is_empty() && !self.attrs.contains("class") {
            return result;
        }
        let value = self.classes.value();
        self.attrs.set("class", &value);
        result
    }

    /// Form-control kind, if this element is one
    pub fn control_kind(&self) -> Option<ControlKind> {
        ControlKind::classify(&self.tag, self.attrs.get("type"))
    }

    /// Current checkedness (live state, falling back to the attribute)
    pub fn is_checked(&self) -> bool {
        self.form
            .checked
            .unwrap_or_else(|| self.attrs.contains("checked"))
    }

    /// Set live checkedness
    pub fn set_checked(&mut self, checked: bool) {
        self.form.checked = Some(checked);
    }
}
