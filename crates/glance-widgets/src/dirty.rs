//! Dirty tracking
//!
//! Remembers the form state under a root and reports which controls the
//! user has since changed. Controls are matched by the same keys the state
//! guard uses, so tracking survives a refresh of the root.

use std::collections::BTreeMap;

use glance_dom::{DomTree, NodeId};
use glance_refresh::{Snapshot, StateGuard};

type ControlState = (Option<bool>, Option<String>);

/// Baseline of form state under one root
#[derive(Debug, Clone, Default)]
pub struct DirtyTracker {
    baseline: BTreeMap<String, Vec<ControlState>>,
}

impl DirtyTracker {
    /// Record the current state under `root` as the baseline
    pub fn capture(tree: &DomTree, root: NodeId) -> Self {
        Self {
            baseline: index(&StateGuard::new().snapshot(tree, root)),
        }
    }

    /// Make the current state the new baseline
    pub fn reset(&mut self, tree: &DomTree, root: NodeId) {
        *self = Self::capture(tree, root);
    }

    /// Keys of controls whose state differs from the baseline, sorted
    pub fn dirty(&self, tree: &DomTree, root: NodeId) -> Vec<String> {
        let current = index(&StateGuard::new().snapshot(tree, root));
        let mut keys: Vec<String> = current
            .iter()
            .filter(|(key, states)| self.baseline.get(*key) != Some(*states))
            .map(|(key, _)| key.clone())
            .collect();
        keys.extend(
            self.baseline
                .keys()
                .filter(|key| !current.contains_key(*key))
                .cloned(),
        );
        keys.sort();
        keys
    }

    pub fn is_dirty(&self, tree: &DomTree, root: NodeId) -> bool {
        !self.dirty(tree, root).is_empty()
    }

    /// Number of controls in the baseline
    pub fn len(&self) -> usize {
        self.baseline.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.baseline.is_empty()
    }
}

fn index(snapshot: &Snapshot) -> BTreeMap<String, Vec<ControlState>> {
    let mut map: BTreeMap<String, Vec<ControlState>> = BTreeMap::new();
    for entry in snapshot.entries() {
        if entry.checked.is_none() && entry.value.is_none() {
            continue;
        }
        map.entry(entry.key.clone())
            .or_default()
            .push((entry.checked, entry.value.clone()));
    }
    map
}
