//! Glance Networking
//!
//! The `Transport` seam the refresher talks through, a reqwest-backed HTTP
//! implementation, and a scriptable mock.

pub mod http;
pub mod mock;
mod request;

pub use http::{HttpTransport, HttpTransportBuilder};
pub use mock::MockTransport;
pub use request::{Method, Request};
pub use url::Url;

use std::future::Future;
use std::rc::Rc;

/// HTTP Response
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl Response {
    /// Build a response with a body and no headers
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: body.into(),
        }
    }

    /// Check if response is successful (2xx)
    pub fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Get header value (case-insensitive)
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Get body as text
    pub fn text(&self) -> Result<String, NetError> {
        String::from_utf8(self.body.clone()).map_err(|e| NetError::Decode(e.to_string()))
    }

    /// Decode body as JSON
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, NetError> {
        serde_json::from_slice(&self.body).map_err(|e| NetError::Decode(e.to_string()))
    }
}

/// Network error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NetError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Decode error: {0}")]
    Decode(String),
}

/// Something that can carry a request to the server and bring back a reply
///
/// Futures are not required to be `Send`: the refresher runs on a
/// single-threaded executor next to the DOM it patches.
pub trait Transport {
    /// Send a request and wait for the full response
    fn send(&self, request: Request) -> impl Future<Output = Result<Response, NetError>>;
}

impl<T: Transport> Transport for Rc<T> {
    fn send(&self, request: Request) -> impl Future<Output = Result<Response, NetError>> {
        (**self).send(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_success_range() {
        assert!(Response::new(200, "").is_success());
        assert!(Response::new(204, "").is_success());
        assert!(!Response::new(304, "").is_success());
        assert!(!Response::new(500, "").is_success());
    }

    #[test]
    fn test_response_header_lookup() {
        let mut resp = Response::new(200, "{}");
        resp.headers.push(("Content-Type".into(), "application/json".into()));
        assert_eq!(resp.header("content-type"), Some("application/json"));
        assert_eq!(resp.header("etag"), None);
    }

    #[test]
    fn test_response_json() {
        let resp = Response::new(200, r#"{"a": 1}"#);
        let value: serde_json::Value = resp.json().unwrap();
        assert_eq!(value["a"], 1);

        let bad = Response::new(200, "not json");
        assert!(matches!(bad.json::<serde_json::Value>(), Err(NetError::Decode(_))));
    }
}
