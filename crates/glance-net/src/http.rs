//! HTTP transport
//!
//! reqwest's blocking client run on smol's blocking thread pool, so a slow
//! server never stalls the executor that owns the DOM.

use std::time::Duration;

use url::Url;

use crate::{Method, NetError, Request, Response, Transport};

/// Transport configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// User agent string
    pub user_agent: String,
    /// Whole-request timeout
    pub timeout: Duration,
    /// Base URL relative request URLs are resolved against
    pub base_url: Option<Url>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!("glance/", env!("CARGO_PKG_VERSION")).into(),
            timeout: Duration::from_secs(30),
            base_url: None,
        }
    }
}

/// HTTP transport builder
pub struct HttpTransportBuilder {
    config: HttpConfig,
}

impl HttpTransportBuilder {
    pub fn new() -> Self {
        Self {
            config: HttpConfig::default(),
        }
    }

    pub fn user_agent(mut self, ua: &str) -> Self {
        self.config.user_agent = ua.to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn base_url(mut self, base: &str) -> Result<Self, NetError> {
        let url = Url::parse(base).map_err(|e| NetError::InvalidUrl(format!("{base}: {e}")))?;
        self.config.base_url = Some(url);
        Ok(self)
    }

    pub fn build(self) -> Result<HttpTransport, NetError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(self.config.user_agent.clone())
            .timeout(self.config.timeout)
            .build()
            .map_err(|e| NetError::Network(e.to_string()))?;

        Ok(HttpTransport {
            client,
            config: self.config,
        })
    }
}

impl Default for HttpTransportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::blocking::Client,
    config: HttpConfig,
}

impl HttpTransport {
    /// Create a transport with default settings
    pub fn new() -> Result<Self, NetError> {
        Self::builder().build()
    }

    /// Create a transport builder
    pub fn builder() -> HttpTransportBuilder {
        HttpTransportBuilder::new()
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Resolve a possibly relative request URL
    pub fn resolve(&self, url: &str) -> Result<Url, NetError> {
        let resolved = match &self.config.base_url {
            Some(base) => base.join(url),
            None => Url::parse(url),
        };
        resolved.map_err(|e| NetError::InvalidUrl(format!("{url}: {e}")))
    }
}

impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<Response, NetError> {
        let url = self.resolve(&request.url)?;
        tracing::info!("HTTP {} {}", request.method, url);

        let client = self.client.clone();
        smol::unblock(move || execute(&client, url, request)).await
    }
}

fn execute(client: &reqwest::blocking::Client, url: Url, request: Request) -> Result<Response, NetError> {
    let mut builder = match request.method {
        Method::Get => client.get(url),
        Method::Post => client.post(url),
    };
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(body) = request.body {
        builder = builder.body(body);
    }

    let response = builder.send().map_err(map_reqwest_error)?;
    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let body = response.bytes().map_err(map_reqwest_error)?.to_vec();

    tracing::debug!("HTTP {} ({} bytes)", status, body.len());
    Ok(Response { status, headers, body })
}

fn map_reqwest_error(err: reqwest::Error) -> NetError {
    if err.is_timeout() {
        NetError::Timeout
    } else {
        NetError::Network(err.to_string())
    }
}
