//! Refresh payload
//!
//! The server answers a refresh with a JSON object mapping container ids to
//! fragments:
//!
//! ```json
//! { "pipeline_1": { "html": "<b>passed</b>" },
//!   "pipeline_9": { "html": "<b>new</b>", "parentId": "pipelines", "index": 0, "type": "li" } }
//! ```
//!
//! Key order is significant (insertions happen in payload order), so the
//! object is decoded with a visitor instead of into a map.

use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Tag used for containers created without an explicit `type`
pub const DEFAULT_CONTAINER_TAG: &str = "div";

/// How a payload treats tracked containers it does not mention
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefreshMode {
    /// The payload is the complete set: unmentioned containers are removed
    Sync,
    /// The payload is a delta: unmentioned containers are left alone
    #[default]
    Merge,
}

/// One container update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshTarget {
    pub id: String,
    pub html: String,
    pub parent_id: Option<String>,
    pub index: Option<usize>,
    pub kind: Option<String>,
}

impl RefreshTarget {
    pub fn new(id: &str, html: &str) -> Self {
        Self {
            id: id.to_string(),
            html: html.to_string(),
            parent_id: None,
            index: None,
            kind: None,
        }
    }

    pub fn with_parent(mut self, parent_id: &str) -> Self {
        self.parent_id = Some(parent_id.to_string());
        self
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    pub fn with_kind(mut self, kind: &str) -> Self {
        self.kind = Some(kind.to_string());
        self
    }

    /// Tag for a newly created container
    ///
    /// Anything that is not a plain tag name falls back to `div`.
    pub fn container_tag(&self) -> &str {
        match self.kind.as_deref() {
            Some(tag) if is_tag_name(tag) => tag,
            _ => DEFAULT_CONTAINER_TAG,
        }
    }
}

fn is_tag_name(tag: &str) -> bool {
    let mut chars = tag.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
}

/// Wire shape of one entry
#[derive(Deserialize)]
#[serde(untagged)]
enum WireTarget {
    Html(String),
    Full {
        html: String,
        #[serde(default, rename = "parentId")]
        parent_id: Option<String>,
        #[serde(default)]
        index: Option<usize>,
        #[serde(default, rename = "type")]
        kind: Option<String>,
    },
}

impl WireTarget {
    fn into_target(self, id: String) -> RefreshTarget {
        match self {
            WireTarget::Html(html) => RefreshTarget {
                id,
                html,
                parent_id: None,
                index: None,
                kind: None,
            },
            WireTarget::Full {
                html,
                parent_id,
                index,
                kind,
            } => RefreshTarget {
                id,
                html,
                parent_id: parent_id.filter(|p| !p.is_empty()),
                index,
                kind,
            },
        }
    }
}

/// Ordered set of container updates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshPayload {
    targets: Vec<RefreshTarget>,
}

impl RefreshPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a response body
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Add a target; a repeated id replaces the earlier entry in place
    pub fn insert(&mut self, target: RefreshTarget) {
        match self.targets.iter_mut().find(|t| t.id == target.id) {
            Some(slot) => *slot = target,
            None => self.targets.push(target),
        }
    }

    pub fn with(mut self, target: RefreshTarget) -> Self {
        self.insert(target);
        self
    }

    pub fn get(&self, id: &str) -> Option<&RefreshTarget> {
        self.targets.iter().find(|t| t.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RefreshTarget> {
        self.targets.iter()
    }

    /// Container ids in payload order
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.targets.iter().map(|t| t.id.as_str())
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

impl<'de> Deserialize<'de> for RefreshPayload {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(PayloadVisitor)
    }
}

struct PayloadVisitor;

impl<'de> Visitor<'de> for PayloadVisitor {
    type Value = RefreshPayload;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an object mapping container ids to fragments")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
        let mut payload = RefreshPayload::new();
        while let Some((id, wire)) = map.next_entry::<String, WireTarget>()? {
            if id.is_empty() {
                return Err(de::Error::custom("empty container id"));
            }
            payload.insert(wire.into_target(id));
        }
        Ok(payload)
    }
}
