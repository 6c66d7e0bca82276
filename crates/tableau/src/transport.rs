//! HTTP transport for the Tableau REST API.
//!
//! The [`Transport`] trait is the single point where requests leave the
//! process. [`HttpTransport`] talks to a real server through `ureq`;
//! [`MockTransport`] replays scripted responses for tests.
//!
//! # Testing
//!
//! ```
//! use tableau::transport::{Method, MockTransport, Request, Transport};
//!
//! let mock = MockTransport::new();
//! mock.respond(Method::Get, "/groups", 200, r#"{"groups":{"group":[]}}"#);
//!
//! let body = mock.send(&Request::get("/groups")).unwrap();
//! assert!(!body.is_empty());
//! assert_eq!(mock.requests().len(), 1);
//! ```

use crate::error::{Error, Result};
use crate::session::Session;
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Fixed timeout for every request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const JSON: &str = "application/json";

/// HTTP method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        })
    }
}

/// Which API root a path is relative to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// `{server}/api/{version}/sites/{siteId}`
    Site,
    /// `{server}/api/{version}`
    Server,
}

/// A request relative to one of the API roots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    pub scope: Scope,
    pub path: String,
    pub body: Option<Vec<u8>>,
    /// Overrides the default `application/json`.
    pub content_type: Option<String>,
}

impl Request {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            scope: Scope::Site,
            path: path.into(),
            body: None,
            content_type: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Resolve the path against the server root instead of the site root.
    pub fn server_scoped(mut self) -> Self {
        self.scope = Scope::Server;
        self
    }

    /// Attach a JSON body.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        self.body = Some(serde_json::to_vec(body)?);
        Ok(self)
    }

    /// Attach a raw body with its content type.
    pub fn with_body(mut self, body: Vec<u8>, content_type: impl Into<String>) -> Self {
        self.body = Some(body);
        self.content_type = Some(content_type.into());
        self
    }

    /// Body as UTF-8 text, for logs and assertions.
    pub fn body_text(&self) -> String {
        self.body
            .as_deref()
            .map(|b| String::from_utf8_lossy(b).into_owned())
            .unwrap_or_default()
    }
}

/// Sends requests and returns response bodies.
///
/// Statuses other than 200, 201 and 204 come back as [`Error::Http`].
pub trait Transport: Send + Sync {
    fn send(&self, request: &Request) -> Result<Vec<u8>>;
}

/// Map a status/body pair onto the success rule shared by every transport.
pub fn check_status(status: u16, body: Vec<u8>) -> Result<Vec<u8>> {
    match status {
        200 | 201 | 204 => Ok(body),
        _ => Err(Error::Http {
            status,
            body: String::from_utf8_lossy(&body).into_owned(),
        }),
    }
}

// =============================================================================
// ureq transport
// =============================================================================

/// Transport backed by a blocking `ureq` agent.
pub struct HttpTransport {
    agent: ureq::Agent,
    /// `{server}/api/{version}`
    api_base: String,
    session: Option<Session>,
}

impl HttpTransport {
    /// Unauthenticated transport, only good for server-scoped calls like sign-in.
    #[must_use]
    pub fn new(api_base: impl Into<String>) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(REQUEST_TIMEOUT))
            .http_status_as_error(false)
            .build();
        Self {
            agent: ureq::Agent::new_with_config(config),
            api_base: api_base.into().trim_end_matches('/').to_string(),
            session: None,
        }
    }

    /// Attach the session returned by sign-in.
    #[must_use]
    pub fn with_session(mut self, session: Session) -> Self {
        self.session = Some(session);
        self
    }

    /// Get the current API base URL.
    #[must_use]
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn url(&self, request: &Request) -> Result<String> {
        match request.scope {
            Scope::Server => Ok(format!("{}{}", self.api_base, request.path)),
            Scope::Site => {
                let session = self
                    .session
                    .as_ref()
                    .ok_or_else(|| Error::Config("not signed in to a site".into()))?;
                Ok(format!(
                    "{}/sites/{}{}",
                    self.api_base, session.site_id, request.path
                ))
            }
        }
    }

    fn headers<B>(&self, builder: ureq::RequestBuilder<B>, request: &Request) -> ureq::RequestBuilder<B> {
        let builder = builder
            .header("Accept", JSON)
            .header("Content-Type", request.content_type.as_deref().unwrap_or(JSON));
        match &self.session {
            Some(session) => builder.header("X-Tableau-Auth", session.token.as_str()),
            None => builder,
        }
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: &Request) -> Result<Vec<u8>> {
        let url = self.url(request)?;
        log::debug!("{} {}", request.method, url);

        let body = request.body.as_deref().unwrap_or_default();
        let response = match request.method {
            Method::Get => self.headers(self.agent.get(&url), request).call(),
            Method::Delete => self.headers(self.agent.delete(&url), request).call(),
            Method::Post => self.headers(self.agent.post(&url), request).send(body),
            Method::Put => self.headers(self.agent.put(&url), request).send(body),
        };

        let mut response = response?;
        let status = response.status().as_u16();
        let bytes = response
            .body_mut()
            .read_to_vec()
            .map_err(|e| Error::Network(e.to_string()))?;

        log::debug!("{} {} -> {}", request.method, url, status);
        check_status(status, bytes)
    }
}

// =============================================================================
// Scripted transport
// =============================================================================

type Route = (Method, String);

/// Scripted in-memory transport.
///
/// Responses are queued per `(method, path)` and served in FIFO order; the
/// last response for a route is repeated once the queue drains to one. Every
/// request is recorded. Clones share state, so a test can hand one clone to
/// a client and inspect the other.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    routes: Arc<Mutex<HashMap<Route, VecDeque<(u16, Vec<u8>)>>>>,
    requests: Arc<Mutex<Vec<Request>>>,
}

impl MockTransport {
    /// Create a new empty mock transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `method path` (path includes any query string).
    pub fn respond(&self, method: Method, path: &str, status: u16, body: &str) -> &Self {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry((method, path.to_string()))
            .or_default()
            .push_back((status, body.as_bytes().to_vec()));
        self
    }

    /// Queue a JSON response built with `serde_json::json!`.
    pub fn respond_json(&self, method: Method, path: &str, status: u16, body: &serde_json::Value) -> &Self {
        self.respond(method, path, status, &body.to_string())
    }

    /// All requests sent so far, oldest first.
    pub fn requests(&self) -> Vec<Request> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// `"METHOD path"` for every request sent so far.
    pub fn calls(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: &Request) -> Result<Vec<u8>> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        let mut routes = self.routes.lock().unwrap_or_else(PoisonError::into_inner);
        let queue = routes
            .get_mut(&(request.method, request.path.clone()))
            .ok_or_else(|| {
                Error::Network(format!("no mock response for {} {}", request.method, request.path))
            })?;
        let (status, body) = if queue.len() > 1 {
            queue.pop_front().unwrap_or_default()
        } else {
            queue.front().cloned().unwrap_or_default()
        };
        check_status(status, body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_status_success_codes() {
        for status in [200, 201, 204] {
            assert!(check_status(status, b"ok".to_vec()).is_ok());
        }
    }

    #[test]
    fn test_check_status_error_carries_body() {
        let err = check_status(400, b"bad things".to_vec()).unwrap_err();
        match err {
            Error::Http { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "bad things");
            }
            _ => panic!("Expected Error::Http"),
        }
    }

    #[test]
    fn test_check_status_202_is_error() {
        assert!(check_status(202, Vec::new()).is_err());
    }

    #[test]
    fn test_request_builders() {
        let req = Request::put("/groups/1")
            .json(&serde_json::json!({"group": {"name": "x"}}))
            .unwrap();
        assert_eq!(req.method, Method::Put);
        assert_eq!(req.scope, Scope::Site);
        assert_eq!(req.body_text(), r#"{"group":{"name":"x"}}"#);
        assert!(req.content_type.is_none());

        let req = Request::get("/sites").server_scoped();
        assert_eq!(req.scope, Scope::Server);
    }

    #[test]
    fn test_http_transport_site_url_requires_session() {
        let transport = HttpTransport::new("https://tableau.example.com/api/3.19/");
        assert_eq!(transport.api_base(), "https://tableau.example.com/api/3.19");
        assert!(transport.url(&Request::get("/groups")).is_err());
        assert_eq!(
            transport.url(&Request::get("/sites").server_scoped()).unwrap(),
            "https://tableau.example.com/api/3.19/sites"
        );

        let transport = transport.with_session(Session {
            site_id: "s1".into(),
            token: "t".into(),
        });
        assert_eq!(
            transport.url(&Request::get("/groups")).unwrap(),
            "https://tableau.example.com/api/3.19/sites/s1/groups"
        );
    }

    #[test]
    fn test_mock_fifo_then_repeat() {
        let mock = MockTransport::new();
        mock.respond(Method::Get, "/x", 200, "first")
            .respond(Method::Get, "/x", 200, "second");

        assert_eq!(mock.send(&Request::get("/x")).unwrap(), b"first");
        assert_eq!(mock.send(&Request::get("/x")).unwrap(), b"second");
        assert_eq!(mock.send(&Request::get("/x")).unwrap(), b"second");
        assert_eq!(mock.calls(), vec!["GET /x", "GET /x", "GET /x"]);
    }

    #[test]
    fn test_mock_unscripted_route_fails() {
        let mock = MockTransport::new();
        let err = mock.send(&Request::delete("/groups/1")).unwrap_err();
        assert!(err.to_string().contains("no mock response for DELETE /groups/1"));
        assert_eq!(mock.requests().len(), 1);
    }

    #[test]
    fn test_mock_status_error() {
        let mock = MockTransport::new();
        mock.respond(Method::Delete, "/groups/1", 404, "Group not found");
        let err = mock.send(&Request::delete("/groups/1")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_mock_clones_share_state() {
        let mock = MockTransport::new();
        let clone = mock.clone();
        clone.respond(Method::Get, "/x", 204, "");
        mock.send(&Request::get("/x")).unwrap();
        assert_eq!(clone.requests().len(), 1);
    }
}
