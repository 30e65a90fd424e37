//! Scripted transport for testing.
//!
//! [`MockTransport`] answers requests from per-route scripts instead of the
//! network, records every call, and can hold a response back until the test
//! releases it. That makes arrival order, coalescing, and cache behavior
//! deterministic.
//!
//! ```
//! use luzia_core::api::mock::{MockTransport, MOCK_BASE_URL};
//! use luzia_core::api::HttpClient;
//! use reqwest::Method;
//! use serde_json::json;
//!
//! let mock = MockTransport::new();
//! mock.respond_json(Method::GET, "/dashboard/overview", 200, json!({"total_usuarios": 12}));
//!
//! let client = HttpClient::builder(MOCK_BASE_URL).transport(mock.clone()).build()?;
//! # let _ = client;
//! assert_eq!(mock.calls(Method::GET, "/dashboard/overview"), 0);
//! # Ok::<(), luzia_core::api::ApiError>(())
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::{BoxFuture, FutureExt};
use reqwest::{Method, StatusCode};
use serde_json::Value;
use tokio::sync::oneshot;

use super::transport::{HttpRequest, HttpResponse, Transport};
use super::ApiError;

/// Base URL the mock answers for.
pub const MOCK_BASE_URL: &str = "http://mock.local/api/v1";

#[derive(Debug, Clone)]
enum Outcome {
    Response(HttpResponse),
    Failure(String),
}

impl Outcome {
    fn json(status: u16, body: &Value) -> Self {
        Outcome::Response(HttpResponse {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            content_type: Some("application/json".to_string()),
            body: body.to_string().into_bytes(),
        })
    }

    fn text(status: u16, body: &str) -> Self {
        Outcome::Response(HttpResponse {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            content_type: Some("text/plain".to_string()),
            body: body.as_bytes().to_vec(),
        })
    }

    fn into_result(self) -> Result<HttpResponse, ApiError> {
        match self {
            Outcome::Response(response) => Ok(response),
            Outcome::Failure(message) => Err(ApiError::Transport(message)),
        }
    }
}

enum Scripted {
    Ready(Outcome),
    Deferred(oneshot::Receiver<Outcome>),
}

struct Route {
    method: Method,
    url: String,
    replies: VecDeque<Scripted>,
    /// The only reply left has been served and is now repeating.
    repeating: bool,
}

#[derive(Default)]
struct MockState {
    routes: Vec<Route>,
    calls: Vec<HttpRequest>,
}

/// Holds back one scripted response until released.
pub struct MockGate {
    tx: oneshot::Sender<Outcome>,
}

impl MockGate {
    pub fn respond_json(self, status: u16, body: Value) {
        let _ = self.tx.send(Outcome::json(status, &body));
    }

    pub fn respond_text(self, status: u16, body: &str) {
        let _ = self.tx.send(Outcome::text(status, body));
    }

    pub fn fail(self, message: &str) {
        let _ = self.tx.send(Outcome::Failure(message.to_string()));
    }
}

/// A [`Transport`] driven by per-route scripts.
///
/// Replies for a route are consumed in order; the last ready reply repeats
/// until a new reply is scripted for the route. Unscripted routes answer 404.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full URL for a path (query included) under [`MOCK_BASE_URL`].
    pub fn url(path: &str) -> String {
        format!("{}{}", MOCK_BASE_URL, path)
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn push(&self, method: Method, path: &str, reply: Scripted) {
        let url = Self::url(path);
        let mut state = self.state();
        match state
            .routes
            .iter_mut()
            .find(|r| r.method == method && r.url == url)
        {
            Some(route) => {
                if route.repeating {
                    route.replies.clear();
                    route.repeating = false;
                }
                route.replies.push_back(reply)
            }
            None => state.routes.push(Route {
                method,
                url,
                replies: VecDeque::from([reply]),
                repeating: false,
            }),
        }
    }

    pub fn respond_json(&self, method: Method, path: &str, status: u16, body: Value) {
        self.push(method, path, Scripted::Ready(Outcome::json(status, &body)));
    }

    pub fn respond_text(&self, method: Method, path: &str, status: u16, body: &str) {
        self.push(method, path, Scripted::Ready(Outcome::text(status, body)));
    }

    /// The route fails at the transport level (connection refused, offline).
    pub fn fail(&self, method: Method, path: &str, message: &str) {
        self.push(
            method,
            path,
            Scripted::Ready(Outcome::Failure(message.to_string())),
        );
    }

    /// The next call to the route waits until the returned gate is released.
    pub fn defer(&self, method: Method, path: &str) -> MockGate {
        let (tx, rx) = oneshot::channel();
        self.push(method, path, Scripted::Deferred(rx));
        MockGate { tx }
    }

    /// Number of requests sent for `method` + `path`.
    pub fn calls(&self, method: Method, path: &str) -> usize {
        let url = Self::url(path);
        self.state()
            .calls
            .iter()
            .filter(|c| c.method == method && c.url == url)
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.state().calls.len()
    }

    /// Every request sent so far, in order.
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.state().calls.clone()
    }

    fn next_reply(&self, request: &HttpRequest) -> Option<Scripted> {
        let mut state = self.state();
        state.calls.push(request.clone());

        let route = state
            .routes
            .iter_mut()
            .find(|r| r.method == request.method && r.url == request.url)?;
        let last = route.replies.len() == 1;
        match route.replies.front()? {
            Scripted::Ready(outcome) if last => {
                let reply = Scripted::Ready(outcome.clone());
                route.repeating = true;
                Some(reply)
            }
            _ => route.replies.pop_front(),
        }
    }
}

impl Transport for MockTransport {
    fn send(&self, request: HttpRequest) -> BoxFuture<'static, Result<HttpResponse, ApiError>> {
        match self.next_reply(&request) {
            Some(Scripted::Ready(outcome)) => futures::future::ready(outcome.into_result()).boxed(),
            Some(Scripted::Deferred(rx)) => async move {
                match rx.await {
                    Ok(outcome) => outcome.into_result(),
                    Err(_) => Err(ApiError::Transport("mock gate dropped".to_string())),
                }
            }
            .boxed(),
            None => {
                let not_found = Outcome::json(404, &serde_json::json!({"detail": "Not Found"}));
                futures::future::ready(not_found.into_result()).boxed()
            }
        }
    }
}
