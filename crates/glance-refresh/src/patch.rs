//! Fragment patch applier
//!
//! Applies a `RefreshPayload` to the live document. Existing containers get
//! their `innerHTML` replaced; unknown ids become new containers under their
//! declared parent. The applier remembers which containers it manages so a
//! `sync` payload can remove the ones the server no longer reports.

use std::collections::BTreeSet;

use glance_dom::{Document, NodeId};
use glance_html::set_inner_html;

use crate::payload::{RefreshMode, RefreshPayload, RefreshTarget};

/// Why a target was not applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The container was managed earlier but is gone from the document
    Vanished,
    /// The declared parent does not exist
    ParentMissing(String),
    /// The fragment could not be placed
    Rejected(String),
}

/// What one `apply` did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchReport {
    pub replaced: Vec<String>,
    pub inserted: Vec<String>,
    pub removed: Vec<String>,
    pub skipped: Vec<(String, SkipReason)>,
}

impl PatchReport {
    /// Containers whose content now comes from the payload
    pub fn applied(&self) -> impl Iterator<Item = &str> {
        self.replaced.iter().chain(&self.inserted).map(String::as_str)
    }

    /// Whether the document was left untouched
    pub fn is_noop(&self) -> bool {
        self.replaced.is_empty() && self.inserted.is_empty() && self.removed.is_empty()
    }
}

enum Outcome {
    Replaced,
    Inserted,
    Skipped(SkipReason),
}

/// Applies payloads and tracks the containers it manages
#[derive(Debug, Clone, Default)]
pub struct PatchApplier {
    tracked: BTreeSet<String>,
}

impl PatchApplier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start out managing containers already on the page
    pub fn with_tracked<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tracked: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn track(&mut self, id: &str) {
        self.tracked.insert(id.to_string());
    }

    pub fn is_tracked(&self, id: &str) -> bool {
        self.tracked.contains(id)
    }

    /// Managed container ids, sorted
    pub fn tracked(&self) -> impl Iterator<Item = &str> {
        self.tracked.iter().map(String::as_str)
    }

    /// Apply a payload to the document
    pub fn apply(&mut self, doc: &mut Document, payload: &RefreshPayload, mode: RefreshMode) -> PatchReport {
        let mut report = PatchReport::default();
        let mut applied = BTreeSet::new();

        for target in payload.iter() {
            match self.apply_target(doc, target) {
                Outcome::Replaced => {
                    report.replaced.push(target.id.clone());
                    applied.insert(target.id.clone());
                }
                Outcome::Inserted => {
                    report.inserted.push(target.id.clone());
                    applied.insert(target.id.clone());
                }
                Outcome::Skipped(reason) => {
                    tracing::debug!("skipping refresh target {}: {:?}", target.id, reason);
                    self.tracked.remove(&target.id);
                    report.skipped.push((target.id.clone(), reason));
                }
            }
        }

        match mode {
            RefreshMode::Sync => {
                for stale in self.tracked.difference(&applied) {
                    if let Some(node) = doc.get_element_by_id(stale) {
                        if let Err(e) = doc.tree_mut().remove(node) {
                            tracing::debug!("failed to remove container {}: {}", stale, e);
                            continue;
                        }
                    }
                    tracing::debug!("removed container {}", stale);
                    report.removed.push(stale.clone());
                }
                self.tracked = applied;
            }
            RefreshMode::Merge => self.tracked.extend(applied),
        }

        tracing::debug!(
            "patch applied: {} replaced, {} inserted, {} removed, {} skipped",
            report.replaced.len(),
            report.inserted.len(),
            report.removed.len(),
            report.skipped.len()
        );
        report
    }

    fn apply_target(&self, doc: &mut Document, target: &RefreshTarget) -> Outcome {
        if let Some(node) = doc.get_element_by_id(&target.id) {
            return match set_inner_html(doc, node, &target.html) {
                Ok(()) => Outcome::Replaced,
                Err(e) => Outcome::Skipped(SkipReason::Rejected(e.to_string())),
            };
        }

        // Gone since the last refresh: the page removed it on purpose
        if self.tracked.contains(&target.id) {
            return Outcome::Skipped(SkipReason::Vanished);
        }

        let parent = match &target.parent_id {
            Some(parent_id) => match doc.get_element_by_id(parent_id) {
                Some(parent) => parent,
                None => return Outcome::Skipped(SkipReason::ParentMissing(parent_id.clone())),
            },
            None => doc.body(),
        };

        match insert_container(doc, parent, target) {
            Ok(()) => Outcome::Inserted,
            Err(reason) => Outcome::Skipped(SkipReason::Rejected(reason)),
        }
    }
}

fn insert_container(doc: &mut Document, parent: NodeId, target: &RefreshTarget) -> Result<(), String> {
    let reference = target
        .index
        .and_then(|index| doc.tree().element_children(parent).nth(index));

    let tree = doc.tree_mut();
    let container = tree.create_element(target.container_tag());
    tree.set_attribute(container, "id", &target.id)
        .map_err(|e| e.to_string())?;
    tree.insert_before(parent, container, reference)
        .map_err(|e| e.to_string())?;

    if let Err(e) = set_inner_html(doc, container, &target.html) {
        let _ = doc.tree_mut().remove(container);
        return Err(e.to_string());
    }
    tracing::debug!("inserted container {} <{}>", target.id, target.container_tag());
    Ok(())
}
