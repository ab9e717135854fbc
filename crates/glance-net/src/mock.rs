//! Mock transport
//!
//! Scripted replies for tests and demos. A reply can also be held back
//! until the test releases it, which is how in-flight requests are
//! simulated.

use std::cell::RefCell;
use std::collections::VecDeque;

use smol::channel::{self, Receiver, Sender};

use crate::{NetError, Request, Response, Transport};

enum Reply {
    Ready(Result<Response, NetError>),
    Held(Receiver<Result<Response, NetError>>),
}

/// Transport that answers from a script
#[derive(Default)]
pub struct MockTransport {
    script: RefCell<VecDeque<Reply>>,
    fallback: RefCell<Option<Result<Response, NetError>>>,
    requests: RefCell<Vec<Request>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with the given status and body
    pub fn push_response(&self, status: u16, body: &str) {
        self.push_result(Ok(Response::new(status, body)));
    }

    /// Queue a transport failure
    pub fn push_error(&self, err: NetError) {
        self.push_result(Err(err));
    }

    /// Queue an arbitrary result
    pub fn push_result(&self, result: Result<Response, NetError>) {
        self.script.borrow_mut().push_back(Reply::Ready(result));
    }

    /// Queue a reply that stays pending until a value is sent on the
    /// returned channel (or the sender is dropped, which reads as a network
    /// failure)
    pub fn push_held(&self) -> Sender<Result<Response, NetError>> {
        let (tx, rx) = channel::bounded(1);
        self.script.borrow_mut().push_back(Reply::Held(rx));
        tx
    }

    /// Reply used once the script runs dry
    pub fn set_fallback(&self, status: u16, body: &str) {
        *self.fallback.borrow_mut() = Some(Ok(Response::new(status, body)));
    }

    /// Every request sent so far
    pub fn requests(&self) -> Vec<Request> {
        self.requests.borrow().clone()
    }

    /// Number of requests sent so far
    pub fn request_count(&self) -> usize {
        self.requests.borrow().len()
    }

    /// Replies still queued
    pub fn pending_replies(&self) -> usize {
        self.script.borrow().len()
    }
}

impl Transport for MockTransport {
    async fn send(&self, request: Request) -> Result<Response, NetError> {
        tracing::debug!("mock {} {}", request.method, request.url);
        self.requests.borrow_mut().push(request);

        let next = self.script.borrow_mut().pop_front();
        match next {
            Some(Reply::Ready(result)) => result,
            Some(Reply::Held(rx)) => rx
                .recv()
                .await
                .unwrap_or_else(|_| Err(NetError::Network("held reply dropped".into()))),
            None => self
                .fallback
                .borrow()
                .clone()
                .unwrap_or_else(|| Err(NetError::Network("no scripted reply".into()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_order() {
        let mock = MockTransport::new();
        mock.push_response(200, "one");
        mock.push_error(NetError::Timeout);

        smol::block_on(async {
            let first = mock.send(Request::get("/a")).await.unwrap();
            assert_eq!(first.body, b"one");
            assert_eq!(mock.send(Request::get("/b")).await.unwrap_err(), NetError::Timeout);
            assert!(mock.send(Request::get("/c")).await.is_err());
        });
        assert_eq!(mock.request_count(), 3);
        assert_eq!(mock.requests()[1].url, "/b");
    }

    #[test]
    fn test_fallback() {
        let mock = MockTransport::new();
        mock.set_fallback(200, "{}");
        smol::block_on(async {
            for _ in 0..3 {
                assert!(mock.send(Request::get("/r")).await.unwrap().is_success());
            }
        });
    }

    #[test]
    fn test_held_reply() {
        let mock = MockTransport::new();
        let release = mock.push_held();

        smol::block_on(async {
            release.send(Ok(Response::new(503, ""))).await.unwrap();
            let resp = mock.send(Request::get("/r")).await.unwrap();
            assert_eq!(resp.status, 503);
        });
    }

    #[test]
    fn test_dropped_hold_is_network_error() {
        let mock = MockTransport::new();
        drop(mock.push_held());
        let result = smol::block_on(mock.send(Request::get("/r")));
        assert!(matches!(result, Err(NetError::Network(_))));
    }
}
