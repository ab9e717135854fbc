//! Glance DOM - Document Object Model
//!
//! Arena-allocated DOM tree used as the live page for partial refreshes.
//! Node ids are generational: once a subtree is replaced, ids handed out
//! for the old nodes stop resolving instead of aliasing the new ones.

mod attributes;
mod classlist;
mod document;
mod forms;
mod generation;
mod node;
mod query;
mod tree;

pub use attributes::{Attr, Attributes};
pub use classlist::ClassList;
pub use document::Document;
pub use forms::{ControlKind, FormState, InputKind};
pub use generation::Generation;
pub use node::{ElementData, Node, NodeData};
pub use query::Selector;
pub use tree::{Children, Descendants, DomTree};

/// Node identifier (slot index plus slot generation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: Generation,
}

impl NodeId {
    /// Root (document) node ID
    pub const ROOT: NodeId = NodeId { index: 0, generation: Generation::INITIAL };

    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId { index: u32::MAX, generation: Generation::INITIAL };

    /// Check if this id refers to a slot at all
    #[inline]
    pub fn is_valid(self) -> bool {
        self.index != u32::MAX
    }

    /// Raw slot index
    #[inline]
    pub fn index(self) -> u32 {
        self.index
    }

    /// Slot generation this id was issued for
    #[inline]
    pub fn generation(self) -> Generation {
        self.generation
    }
}

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// Node id is stale or was never issued
    #[error("Node not found")]
    NotFound,

    /// Inserting a node under itself or one of its descendants
    #[error("Hierarchy request error")]
    HierarchyRequest,

    /// Operation requires an element node
    #[error("Invalid node type")]
    InvalidNodeType,

    /// Reference node is not a child of the given parent
    #[error("Node is not a child")]
    NotAChild,
}
