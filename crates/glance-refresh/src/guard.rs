//! State preservation guard
//!
//! Replacing a container's `innerHTML` throws away whatever the user did
//! inside it: ticked checkboxes, half-typed filters, expanded sections. The
//! guard snapshots that state before a patch and puts it back on the
//! freshly parsed elements afterwards.
//!
//! Elements are matched by key: `#id` when the element has an id, else its
//! `name`. Checkboxes and radios keyed by name also carry their `value`, so
//! the members of a group stay distinguishable.

use std::collections::{BTreeSet, HashMap};

use glance_dom::{ControlKind, DomTree, ElementData, NodeId};

/// Saved state of one element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreservedState {
    pub key: String,
    pub checked: Option<bool>,
    pub value: Option<String>,
    /// Sticky classes the element carried (only those from the guard's set)
    pub classes: Option<BTreeSet<String>>,
}

impl PreservedState {
    fn is_empty(&self) -> bool {
        self.checked.is_none() && self.value.is_none() && self.classes.is_none()
    }
}

/// State captured under one root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    entries: Vec<PreservedState>,
}

impl Snapshot {
    pub fn entries(&self) -> &[PreservedState] {
        &self.entries
    }

    /// First entry for a key
    pub fn get(&self, key: &str) -> Option<&PreservedState> {
        self.entries.iter().find(|e| e.key == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Captures and reapplies user-visible state across a patch
#[derive(Debug, Clone, Default)]
pub struct StateGuard {
    sticky_classes: Vec<String>,
}

impl StateGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Guard that also preserves the given classes
    pub fn with_sticky_classes<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut guard = Self::new();
        for class in classes {
            guard.add_sticky_class(class);
        }
        guard
    }

    pub fn add_sticky_class(&mut self, class: impl Into<String>) {
        let class = class.into();
        if !class.is_empty() && !self.sticky_classes.contains(&class) {
            self.sticky_classes.push(class);
        }
    }

    pub fn sticky_classes(&self) -> &[String] {
        &self.sticky_classes
    }

    /// Capture state of every keyed element below `root`
    pub fn snapshot(&self, tree: &DomTree, root: NodeId) -> Snapshot {
        let mut entries = Vec::new();
        for (node, data) in tree.descendants(root) {
            let Some(elem) = data.as_element() else {
                continue;
            };
            let Some(key) = state_key(elem) else {
                continue;
            };

            let kind = elem.control_kind();
            let state = PreservedState {
                key,
                checked: kind
                    .filter(|k| k.is_checkable())
                    .map(|_| elem.is_checked()),
                value: kind
                    .filter(|k| k.holds_typed_value())
                    .and_then(|_| tree.control_value(node)),
                classes: self.sticky_present(elem),
            };
            if !state.is_empty() {
                entries.push(state);
            }
        }
        tracing::trace!("snapshot of {:?}: {} entries", root, entries.len());
        Snapshot { entries }
    }

    /// Reapply a snapshot to the elements now below `root`
    ///
    /// Entries sharing a key are matched to elements in document order.
    /// Returns how many elements were restored.
    pub fn restore(&self, snapshot: &Snapshot, tree: &mut DomTree, root: NodeId) -> usize {
        if snapshot.is_empty() {
            return 0;
        }

        let mut by_key: HashMap<&str, Vec<&PreservedState>> = HashMap::new();
        for entry in &snapshot.entries {
            by_key.entry(entry.key.as_str()).or_default().push(entry);
        }

        let keyed: Vec<(NodeId, String)> = tree
            .descendants(root)
            .filter_map(|(node, data)| data.as_element().and_then(state_key).map(|key| (node, key)))
            .collect();

        let mut seen: HashMap<String, usize> = HashMap::new();
        let mut restored = 0;
        for (node, key) in keyed {
            let nth = seen.entry(key.clone()).or_insert(0);
            let entry = by_key.get(key.as_str()).and_then(|list| list.get(*nth)).copied();
            *nth += 1;
            let Some(entry) = entry else {
                continue;
            };
            if self.apply_entry(tree, node, entry) {
                restored += 1;
            }
        }
        tracing::trace!("restored {} elements under {:?}", restored, root);
        restored
    }

    fn apply_entry(&self, tree: &mut DomTree, node: NodeId, entry: &PreservedState) -> bool {
        // A select only takes back a choice the new markup still offers
        let offered = match (&entry.value, tree.element(node).and_then(|e| e.control_kind())) {
            (Some(value), Some(ControlKind::Select)) => tree.option_values(node).contains(value),
            _ => true,
        };
        let Some(elem) = tree.element_mut(node) else {
            return false;
        };
        let kind = elem.control_kind();
        let mut touched = false;

        if let Some(checked) = entry.checked {
            if kind.is_some_and(|k| k.is_checkable()) {
                elem.set_checked(checked);
                touched = true;
            }
        }
        if let Some(value) = &entry.value {
            if offered && kind.is_some_and(|k| k.holds_typed_value()) {
                elem.form.value = Some(value.clone());
                touched = true;
            }
        }
        if let Some(present) = &entry.classes {
            let sticky = &self.sticky_classes;
            elem.update_classes(|classes| {
                for class in sticky {
                    classes.toggle(class, Some(present.contains(class)));
                }
            });
            touched = true;
        }
        touched
    }

    fn sticky_present(&self, elem: &ElementData) -> Option<BTreeSet<String>> {
        let present: BTreeSet<String> = self
            .sticky_classes
            .iter()
            .filter(|class| elem.has_class(class))
            .cloned()
            .collect();
        (!present.is_empty()).then_some(present)
    }
}

/// Key an element is matched by across a patch
pub fn state_key(elem: &ElementData) -> Option<String> {
    if let Some(id) = elem.id() {
        return Some(format!("#{id}"));
    }
    let name = elem.name()?;
    if elem.control_kind().is_some_and(|k| k.is_checkable()) {
        let value = elem.get_attr("value").unwrap_or("on");
        return Some(format!("{name}={value}"));
    }
    Some(name.to_string())
}
