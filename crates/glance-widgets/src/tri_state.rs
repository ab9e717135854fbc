//! Tri-state toggle
//!
//! Cycles an element through an ordered list of state classes. The current
//! state is always read back from the element's classes, so a refresh that
//! re-renders the element (with a sticky class guard) keeps its position.

use glance_dom::{DomTree, NodeId};

use crate::WidgetError;

/// Class-cycling toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriStateToggle {
    states: Vec<String>,
}

impl Default for TriStateToggle {
    fn default() -> Self {
        Self {
            states: vec!["off".into(), "mixed".into(), "on".into()],
        }
    }
}

impl TriStateToggle {
    /// Toggle over the given state classes, in order
    pub fn new<I, S>(states: I) -> Result<Self, WidgetError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let states: Vec<String> = states.into_iter().map(Into::into).collect();
        if states.len() < 2 {
            return Err(WidgetError::InvalidStates("need at least two states".into()));
        }
        for (i, state) in states.iter().enumerate() {
            if state.is_empty() || state.contains(char::is_whitespace) {
                return Err(WidgetError::InvalidStates(format!("bad class {state:?}")));
            }
            if states[..i].contains(state) {
                return Err(WidgetError::InvalidStates(format!("duplicate class {state:?}")));
            }
        }
        Ok(Self { states })
    }

    pub fn states(&self) -> &[String] {
        &self.states
    }

    /// Index of the element's state; an element without any state class is
    /// in the first state
    pub fn state(&self, tree: &DomTree, node: NodeId) -> Result<usize, WidgetError> {
        let elem = tree
            .element(node)
            .ok_or_else(|| WidgetError::MissingElement(format!("{node:?}")))?;
        Ok(self
            .states
            .iter()
            .position(|state| elem.has_class(state))
            .unwrap_or(0))
    }

    pub fn state_name(&self, tree: &DomTree, node: NodeId) -> Result<&str, WidgetError> {
        let index = self.state(tree, node)?;
        Ok(&self.states[index])
    }

    /// Put the element into state `index` (wrapped into range)
    pub fn set(&self, tree: &mut DomTree, node: NodeId, index: usize) -> Result<&str, WidgetError> {
        let index = index % self.states.len();
        let elem = tree
            .element_mut(node)
            .ok_or_else(|| WidgetError::MissingElement(format!("{node:?}")))?;
        elem.update_classes(|classes| {
            for (i, state) in self.states.iter().enumerate() {
                classes.toggle(state, Some(i == index));
            }
        });
        Ok(&self.states[index])
    }

    /// Advance to the next state, wrapping after the last
    pub fn toggle(&self, tree: &mut DomTree, node: NodeId) -> Result<&str, WidgetError> {
        let next = self.state(tree, node)? + 1;
        let name = self.set(tree, node, next)?;
        tracing::debug!("tri-state {:?} -> {}", node, name);
        Ok(name)
    }
}
