//! The transport port.
//!
//! The clients never talk HTTP directly. They describe each call as an
//! [`ApiRequest`] and hand it to a [`Transport`], which performs exactly one
//! exchange and returns the [`RawResponse`] untouched, or a [`TransportError`]
//! if no response was received. Status interpretation and payload decoding
//! belong to [`crate::client::RestClient`], not to the transport.
//!
//! The production implementation lives in the `transport` crate (over
//! `reqwest`); tests use [`crate::testing::StubTransport`].

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::RequestId;

// ---------------------------------------------------------------------------
// Request descriptor
// ---------------------------------------------------------------------------

/// HTTP method of an [`ApiRequest`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// Returns the method name as sent on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body of an [`ApiRequest`].
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body.
    Empty,
    /// JSON document; sent with `Content-Type: application/json`.
    Json(serde_json::Value),
    /// URL-encoded form; sent with `Content-Type: application/x-www-form-urlencoded`.
    Form(Vec<(String, String)>),
}

/// Everything a transport needs to perform one exchange.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// Correlation id, also sent as the `X-Request-Id` header.
    pub id: RequestId,
    pub method: Method,
    /// Service root, e.g. `https://iam.bqws.io`.
    pub base_url: String,
    /// Unescaped path segments appended to `base_url`.
    ///
    /// The transport is responsible for percent-encoding each segment.
    pub path: Vec<String>,
    /// Query parameters, unescaped.
    pub query: Vec<(String, String)>,
    /// Extra headers, in insertion order.
    pub headers: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ApiRequest {
    /// Returns the path as `/seg/seg/...` without escaping. Used for logging.
    pub fn path_string(&self) -> String {
        let mut out = String::new();
        for segment in &self.path {
            out.push('/');
            out.push_str(segment);
        }
        out
    }

    /// Returns the first header with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }

    /// Returns the first query value with the given key.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

// ---------------------------------------------------------------------------
// Raw response
// ---------------------------------------------------------------------------

/// An HTTP response as received, before any interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    /// Response headers; names are stored lowercase.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    /// Creates a response with the given status and no headers or body.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// Creates a response carrying a JSON body.
    pub fn json(status: u16, body: &serde_json::Value) -> Self {
        Self::new(status)
            .with_header("content-type", "application/json")
            .with_body(body.to_string())
    }

    /// Adds a header. The name is lowercased.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.push((name.to_ascii_lowercase(), value.into()));
        self
    }

    /// Replaces the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the first header with the given name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        find_header(&self.headers, name)
    }
}

fn find_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

// ---------------------------------------------------------------------------
// Port
// ---------------------------------------------------------------------------

/// Failure to complete an HTTP exchange.
///
/// A response with an error status is *not* a transport error; it is returned
/// as a [`RawResponse`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TransportError {
    /// The request URL could not be built from the base URL and path.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// No response within the configured timeout.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection could not be established or was lost mid-exchange.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Any other transport failure (TLS, body read, ...).
    #[error("Transport failure: {0}")]
    Other(String),
}

/// Performs HTTP exchanges on behalf of the clients.
///
/// Implementations must be safe to share across tasks; the clients hold one
/// behind an `Arc` and may issue calls concurrently.
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Performs one exchange.
    async fn execute(&self, request: ApiRequest) -> Result<RawResponse, TransportError>;
}
