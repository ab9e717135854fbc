//! Glance Refresh
//!
//! Keeps regions of a server-rendered page current without reloading it.
//! A `Refresher` polls an endpoint that answers with HTML fragments keyed by
//! container id, patches them into the live `Document`, and carries form
//! state and sticky classes across each replacement.

pub mod guard;
pub mod pagination;
pub mod params;
pub mod patch;
pub mod payload;
pub mod registry;
pub mod scheduler;

pub use guard::{PreservedState, Snapshot, StateGuard};
pub use pagination::{Pagination, PaginationFields};
pub use params::{ParamBuilder, ParamSource, ParamValue, Params};
pub use patch::{PatchApplier, PatchReport, SkipReason};
pub use payload::{RefreshMode, RefreshPayload, RefreshTarget};
pub use registry::RefresherRegistry;
pub use scheduler::{CycleOutcome, Refresher, RefresherConfig};

use glance_net::NetError;

/// Refresh cycle failure
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RefreshError {
    #[error("Transport error: {0}")]
    Transport(#[from] NetError),

    #[error("Server responded with status {status}")]
    Server { status: u16 },

    #[error("Invalid refresh payload: {0}")]
    Decode(String),
}

impl RefreshError {
    /// HTTP status, when the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            RefreshError::Server { status } => Some(*status),
            _ => None,
        }
    }
}
