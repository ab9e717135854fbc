//! Glance
//!
//! Partial page refreshes for server-rendered dashboards. This crate ties
//! the pieces together: configuration, a `Dashboard` owning the page and its
//! refreshers, and logging setup.
//!
//! # Example
//!
//! ```no_run
//! use glance::{Config, Dashboard, RegionConfig};
//!
//! let config = Config::new()
//!     .base_url("http://ci.local/go/")
//!     .region(RegionConfig::new("pipelines", "dashboard/refresh"));
//! let transport = config.http_transport().unwrap();
//! let dashboard = smol::block_on(Dashboard::open(&config, "dashboard", transport)).unwrap();
//! dashboard.start();
//! dashboard.run_until(smol::future::pending::<()>());
//! ```

mod config;
mod dashboard;

pub use config::{Config, ConfigError, ParamConfig, RegionConfig};
pub use dashboard::Dashboard;

pub use glance_dom::{Document, NodeId, Selector};
pub use glance_net::{HttpTransport, Method, MockTransport, NetError, Transport};
pub use glance_refresh::{
    CycleOutcome, Pagination, PaginationFields, ParamBuilder, ParamValue, PatchReport, RefreshError,
    RefreshMode, RefreshPayload, RefreshTarget, Refresher, RefresherConfig, RefresherRegistry, StateGuard,
};
pub use glance_widgets::{DirtyTracker, PageLink, PaginationView, TabSet, TriStateToggle, WidgetError};

use tracing_subscriber::EnvFilter;

/// Dashboard error
#[derive(Debug, thiserror::Error)]
pub enum GlanceError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Net(#[from] NetError),

    #[error("Failed to load page {url}: status {status}")]
    Page { url: String, status: u16 },
}

/// Install a `tracing` subscriber filtered by `RUST_LOG` (default `info`)
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
