//! Configuration
//!
//! JSON configuration for a dashboard: transport settings, defaults shared
//! by every region, and the refreshed regions themselves.
//!
//! ```json
//! {
//!   "baseUrl": "http://ci.local/go/",
//!   "intervalMs": 10000,
//!   "stickyClasses": ["expanded"],
//!   "regions": [
//!     { "name": "pipelines", "url": "dashboard/refresh", "mode": "sync",
//!       "containers": ["pipeline_1"],
//!       "params": [{ "source": "currentTab", "key": "tab", "container": "tabs" }] }
//!   ]
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use glance_net::{HttpTransport, Method, NetError};
use glance_refresh::{PaginationFields, ParamBuilder, ParamValue, RefreshMode, RefresherConfig};
use serde::{Deserialize, Serialize};

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Invalid transport settings: {0}")]
    Transport(#[from] NetError),
}

/// Dashboard configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Base URL region URLs are resolved against
    pub base_url: Option<String>,
    pub user_agent: String,
    pub request_timeout_ms: u64,
    /// Default refresh interval; zero means on demand only
    pub interval_ms: u64,
    /// Default refresh mode
    pub mode: RefreshMode,
    /// Classes preserved across refreshes in every region
    pub sticky_classes: Vec<String>,
    pub regions: Vec<RegionConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: None,
            user_agent: concat!("glance/", env!("CARGO_PKG_VERSION")).into(),
            request_timeout_ms: 30_000,
            interval_ms: 10_000,
            mode: RefreshMode::default(),
            sticky_classes: Vec::new(),
            regions: Vec::new(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read and validate a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn base_url(mut self, url: &str) -> Self {
        self.base_url = Some(url.to_string());
        self
    }

    pub fn user_agent(mut self, ua: &str) -> Self {
        self.user_agent = ua.to_string();
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    pub fn interval_ms(mut self, ms: u64) -> Self {
        self.interval_ms = ms;
        self
    }

    pub fn mode(mut self, mode: RefreshMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn sticky_class(mut self, class: &str) -> Self {
        self.sticky_classes.push(class.to_string());
        self
    }

    pub fn region(mut self, region: RegionConfig) -> Self {
        self.regions.push(region);
        self
    }

    /// Check region names and URLs
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid("requestTimeoutMs must be positive".into()));
        }
        for (i, region) in self.regions.iter().enumerate() {
            if region.name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("region #{i} has no name")));
            }
            if region.url.trim().is_empty() {
                return Err(ConfigError::Invalid(format!("region {} has no url", region.name)));
            }
            if self.regions[..i].iter().any(|r| r.name == region.name) {
                return Err(ConfigError::Invalid(format!("duplicate region {}", region.name)));
            }
        }
        Ok(())
    }

    /// HTTP transport with these settings
    pub fn http_transport(&self) -> Result<HttpTransport, ConfigError> {
        let mut builder = HttpTransport::builder()
            .user_agent(&self.user_agent)
            .timeout(Duration::from_millis(self.request_timeout_ms));
        if let Some(base) = &self.base_url {
            builder = builder.base_url(base)?;
        }
        Ok(builder.build()?)
    }

    /// Refresher settings for one region, with defaults filled in
    pub fn refresher_config(&self, region: &RegionConfig) -> RefresherConfig {
        let mut config = RefresherConfig::new(&region.url)
            .method(region.method)
            .interval_ms(region.interval_ms.unwrap_or(self.interval_ms))
            .mode(region.mode.unwrap_or(self.mode))
            .params(region.param_builder());
        for class in self.sticky_classes.iter().chain(&region.sticky_classes) {
            config = config.sticky_class(class);
        }
        for id in &region.containers {
            config = config.track(id);
        }
        config
    }
}

/// One refreshed region of the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionConfig {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub method: Method,
    /// Overrides the default interval
    #[serde(default)]
    pub interval_ms: Option<u64>,
    /// Overrides the default mode
    #[serde(default)]
    pub mode: Option<RefreshMode>,
    /// Containers already on the page that this region manages
    #[serde(default)]
    pub containers: Vec<String>,
    #[serde(default)]
    pub sticky_classes: Vec<String>,
    #[serde(default)]
    pub params: Vec<ParamConfig>,
}

impl RegionConfig {
    pub fn new(name: &str, url: &str) -> Self {
        Self {
            name: name.to_string(),
            url: url.to_string(),
            method: Method::Get,
            interval_ms: None,
            mode: None,
            containers: Vec::new(),
            sticky_classes: Vec::new(),
            params: Vec::new(),
        }
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn interval_ms(mut self, ms: u64) -> Self {
        self.interval_ms = Some(ms);
        self
    }

    pub fn mode(mut self, mode: RefreshMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn container(mut self, id: &str) -> Self {
        self.containers.push(id.to_string());
        self
    }

    pub fn param(mut self, param: ParamConfig) -> Self {
        self.params.push(param);
        self
    }

    pub fn param_builder(&self) -> ParamBuilder {
        self.params
            .iter()
            .fold(ParamBuilder::new(), |builder, param| param.apply(builder))
    }
}

/// Declarative parameter source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "camelCase")]
pub enum ParamConfig {
    /// Value of the element with id `element`
    Field { key: String, element: String },
    Constant { key: String, value: ParamValue },
    /// Ids of the start / per-page / count hidden inputs
    #[serde(rename_all = "camelCase")]
    Pagination {
        start: String,
        per_page: String,
        count: String,
    },
    CurrentTab {
        key: String,
        container: String,
        #[serde(default = "default_current_class")]
        class: String,
    },
    Form { form: String },
}

fn default_current_class() -> String {
    "current".to_string()
}

impl ParamConfig {
    fn apply(&self, builder: ParamBuilder) -> ParamBuilder {
        match self {
            ParamConfig::Field { key, element } => builder.field(key, element),
            ParamConfig::Constant { key, value } => builder.constant(key, value.clone()),
            ParamConfig::Pagination { start, per_page, count } => {
                builder.pagination(PaginationFields::new(start, per_page, count))
            }
            ParamConfig::CurrentTab { key, container, class } => builder.current_tab(key, container, class),
            ParamConfig::Form { form } => builder.form(form),
        }
    }
}
