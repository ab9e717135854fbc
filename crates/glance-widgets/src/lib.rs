//! Glance Widgets
//!
//! Widgets keep their state in the DOM (classes and form state) rather than
//! in Rust values, so whatever a refresh puts back is what they read next.

mod dirty;
mod pagination_view;
mod tabs;
mod tri_state;

pub use dirty::DirtyTracker;
pub use pagination_view::{PageLink, PaginationView};
pub use tabs::TabSet;
pub use tri_state::TriStateToggle;

use glance_dom::DomError;

/// Widget error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WidgetError {
    #[error("Element not found: {0}")]
    MissingElement(String),

    #[error("Unknown tab: {0}")]
    UnknownTab(String),

    #[error("Invalid widget states: {0}")]
    InvalidStates(String),

    #[error(transparent)]
    Dom(#[from] DomError),
}
