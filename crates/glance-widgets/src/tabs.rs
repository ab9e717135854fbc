//! Tab set
//!
//! Tabs are the element children of a container. A tab's key is its
//! `data-tab` attribute, falling back to its id. Each tab may name its panel
//! with `data-panel`; panels of unselected tabs get the hidden class.

use glance_dom::{Document, NodeId};
use glance_refresh::ParamSource;

use crate::WidgetError;

/// Tab strip bound to a container id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabSet {
    container_id: String,
    current_class: String,
    hidden_class: String,
}

impl TabSet {
    pub fn new(container_id: &str) -> Self {
        Self {
            container_id: container_id.to_string(),
            current_class: "current".into(),
            hidden_class: "hidden".into(),
        }
    }

    pub fn current_class(mut self, class: &str) -> Self {
        self.current_class = class.to_string();
        self
    }

    pub fn hidden_class(mut self, class: &str) -> Self {
        self.hidden_class = class.to_string();
        self
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    fn tabs(&self, doc: &Document) -> Result<Vec<(NodeId, String)>, WidgetError> {
        let container = doc
            .get_element_by_id(&self.container_id)
            .ok_or_else(|| WidgetError::MissingElement(self.container_id.clone()))?;
        let tree = doc.tree();
        Ok(tree
            .element_children(container)
            .filter_map(|tab| {
                let elem = tree.element(tab)?;
                let key = elem.get_attr("data-tab").or_else(|| elem.id())?;
                Some((tab, key.to_string()))
            })
            .collect())
    }

    /// Keys of all tabs, in order
    pub fn tab_keys(&self, doc: &Document) -> Result<Vec<String>, WidgetError> {
        Ok(self.tabs(doc)?.into_iter().map(|(_, key)| key).collect())
    }

    /// Key of the selected tab
    pub fn current(&self, doc: &Document) -> Option<String> {
        glance_refresh::params::current_tab(doc, &self.container_id, &self.current_class)
    }

    /// Select a tab and show only its panel
    pub fn select(&self, doc: &mut Document, key: &str) -> Result<(), WidgetError> {
        let tabs = self.tabs(doc)?;
        if !tabs.iter().any(|(_, k)| k == key) {
            return Err(WidgetError::UnknownTab(key.to_string()));
        }

        for (tab, tab_key) in tabs {
            let selected = tab_key == key;
            let panel = doc
                .tree()
                .get_attribute(tab, "data-panel")
                .map(str::to_string)
                .and_then(|panel_id| doc.get_element_by_id(&panel_id));

            let tree = doc.tree_mut();
            if let Some(elem) = tree.element_mut(tab) {
                elem.update_classes(|c| c.toggle(&self.current_class, Some(selected)));
            }
            if let Some(elem) = panel.and_then(|p| tree.element_mut(p)) {
                elem.update_classes(|c| c.toggle(&self.hidden_class, Some(!selected)));
            }
        }
        tracing::debug!("tab set {} selected {}", self.container_id, key);
        Ok(())
    }

    /// Request parameter carrying the selected tab's key
    pub fn param_source(&self, key: &str) -> ParamSource {
        ParamSource::CurrentTab {
            key: key.to_string(),
            container_id: self.container_id.clone(),
            class: self.current_class.clone(),
        }
    }
}
