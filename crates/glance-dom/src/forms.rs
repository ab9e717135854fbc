//! Form controls
//!
//! Classification of input/textarea/select elements and their live state.
//! The live `checked`/`value` state is kept apart from the attributes, the
//! same way a browser separates the property from the default value: the
//! attribute is only consulted until the user (or a restore) touches it.

use crate::{DomError, DomResult, DomTree, NodeId, Selector};

/// `type` attribute of an `<input>`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputKind {
    #[default]
    Text,
    Search,
    Email,
    Url,
    Tel,
    Password,
    Number,
    Hidden,
    Checkbox,
    Radio,
    Submit,
    Button,
    Other,
}

impl InputKind {
    /// Parse from the `type` attribute (missing means text)
    pub fn parse(value: Option<&str>) -> Self {
        let Some(value) = value else {
            return Self::Text;
        };
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "text" => Self::Text,
            "search" => Self::Search,
            "email" => Self::Email,
            "url" => Self::Url,
            "tel" => Self::Tel,
            "password" => Self::Password,
            "number" => Self::Number,
            "hidden" => Self::Hidden,
            "checkbox" => Self::Checkbox,
            "radio" => Self::Radio,
            "submit" => Self::Submit,
            "button" => Self::Button,
            _ => Self::Other,
        }
    }

    /// Checkbox or radio
    pub fn is_checkable(self) -> bool {
        matches!(self, Self::Checkbox | Self::Radio)
    }

    /// Free-text inputs whose value reflects typing
    pub fn is_text_like(self) -> bool {
        matches!(
            self,
            Self::Text | Self::Search | Self::Email | Self::Url | Self::Tel | Self::Password | Self::Number
        )
    }
}

/// Kind of form control an element is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    Input(InputKind),
    Textarea,
    Select,
}

impl ControlKind {
    /// Classify an element by tag name and `type` attribute
    pub fn classify(tag: &str, type_attr: Option<&str>) -> Option<Self> {
        match tag {
            "input" => Some(Self::Input(InputKind::parse(type_attr))),
            "textarea" => Some(Self::Textarea),
            "select" => Some(Self::Select),
            _ => None,
        }
    }

    pub fn is_checkable(self) -> bool {
        matches!(self, Self::Input(kind) if kind.is_checkable())
    }

    /// Controls whose typed value survives a refresh
    pub fn holds_typed_value(self) -> bool {
        match self {
            Self::Input(kind) => kind.is_text_like(),
            Self::Textarea => true,
            Self::Select => true,
        }
    }
}

/// Live (dirty) state of a form control
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormState {
    /// Checkedness once set explicitly
    pub checked: Option<bool>,
    /// Value once set explicitly
    pub value: Option<String>,
}

impl FormState {
    pub fn is_pristine(&self) -> bool {
        self.checked.is_none() && self.value.is_none()
    }
}

impl DomTree {
    /// Current value of a form control
    ///
    /// Textareas fall back to their text content, selects to the first
    /// `selected` option (or the first option), checkable inputs to `"on"`.
    pub fn control_value(&self, id: NodeId) -> Option<String> {
        let elem = self.element(id)?;
        if let Some(value) = &elem.form.value {
            return Some(value.clone());
        }
        match elem.control_kind()? {
            ControlKind::Textarea => Some(self.text_content(id)),
            ControlKind::Select => {
                let options = self.query_all(id, &Selector::tag("option"));
                let chosen = options
                    .iter()
                    .copied()
                    .find(|&opt| self.get_attribute(opt, "selected").is_some())
                    .or_else(|| options.first().copied())?;
                Some(
                    self.get_attribute(chosen, "value")
                        .map(str::to_string)
                        .unwrap_or_else(|| self.text_content(chosen).trim().to_string()),
                )
            }
            ControlKind::Input(kind) => Some(match elem.get_attr("value") {
                Some(value) => value.to_string(),
                None if kind.is_checkable() => "on".to_string(),
                None => String::new(),
            }),
        }
    }

    /// Values of a select's options, in document order
    pub fn option_values(&self, id: NodeId) -> Vec<String> {
        self.query_all(id, &Selector::tag("option"))
            .into_iter()
            .map(|opt| {
                self.get_attribute(opt, "value")
                    .map(str::to_string)
                    .unwrap_or_else(|| self.text_content(opt).trim().to_string())
            })
            .collect()
    }

    /// Set the live value of a form control
    pub fn set_control_value(&mut self, id: NodeId, value: &str) -> DomResult<()> {
        let node = self.get_mut(id).ok_or(DomError::NotFound)?;
        let elem = node.as_element_mut().ok_or(DomError::InvalidNodeType)?;
        if elem.control_kind().is_none() {
            return Err(DomError::InvalidNodeType);
        }
        elem.form.value = Some(value.to_string());
        Ok(())
    }

    /// Current checkedness of a checkbox or radio
    pub fn is_checked(&self, id: NodeId) -> bool {
        self.element(id).is_some_and(|e| e.is_checked())
    }

    /// Set checkedness; checking a radio unchecks its connected group mates
    pub fn set_checked(&mut self, id: NodeId, checked: bool) -> DomResult<()> {
        let elem = self.element(id).ok_or(DomError::NotFound)?;
        let Some(ControlKind::Input(kind)) = elem.control_kind() else {
            return Err(DomError::InvalidNodeType);
        };
        if !kind.is_checkable() {
            return Err(DomError::InvalidNodeType);
        }

        if checked && kind == InputKind::Radio {
            if let Some(group) = elem.name().map(str::to_string) {
                let scope = self
                    .closest(id, &Selector::tag("form"))
                    .unwrap_or(NodeId::ROOT);
                for mate in self.query_all(scope, &Selector::Name(group)) {
                    if mate != id {
                        if let Some(e) = self.element_mut(mate) {
                            e.set_checked(false);
                        }
                    }
                }
            }
        }

        if let Some(e) = self.element_mut(id) {
            e.set_checked(checked);
        }
        Ok(())
    }
}
