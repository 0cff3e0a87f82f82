//! Typed request dispatch shared by every client.
//!
//! A client operation describes its endpoint as a [`Call`] and hands it to a
//! [`RestClient`], which stamps a [`RequestId`], attaches the bearer token,
//! performs exactly one [`Transport::execute`] and folds the outcome into
//! `Result<_, ApiError>`:
//!
//! | Outcome | Result |
//! |---------|--------|
//! | transport failure | `Err`, `status: None`, `error: "transport_error"` |
//! | non-2xx | `Err` built by [`ApiError::from_status`] |
//! | 2xx, payload decodes | `Ok(value)` |
//! | 2xx, payload does not decode | `Err`, `error: "invalid_response"` |

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, debug_span, warn, Instrument};

use crate::errors::INVALID_REQUEST;
use crate::transport::{ApiRequest, Method, RawResponse, RequestBody, Transport};
use crate::{ApiError, RequestId, Secret};

/// Version prefix of every service path.
pub const API_VERSION: &str = "v1.0";

// ---------------------------------------------------------------------------
// Call description
// ---------------------------------------------------------------------------

/// One endpoint invocation, before it is bound to a service root.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "a Call does nothing until passed to a RestClient"]
pub struct Call {
    method: Method,
    path: Vec<String>,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: RequestBody,
}

impl Call {
    /// Describes a call to `/v1.0/<path...>`.
    pub fn new(method: Method, path: &[&str]) -> Self {
        let mut segments = Vec::with_capacity(path.len() + 1);
        segments.push(API_VERSION.to_owned());
        segments.extend(path.iter().map(|s| (*s).to_owned()));
        Self {
            method,
            path: segments,
            query: Vec::new(),
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: &[&str]) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn post(path: &[&str]) -> Self {
        Self::new(Method::Post, path)
    }

    pub fn put(path: &[&str]) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn delete(path: &[&str]) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Appends query parameters.
    pub fn query(mut self, pairs: Vec<(String, String)>) -> Self {
        self.query.extend(pairs);
        self
    }

    /// Appends a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets a JSON body.
    ///
    /// # Errors
    ///
    /// Returns an `invalid_request` [`ApiError`] if `body` cannot be
    /// represented as JSON (e.g. a map with non-string keys).
    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::new(None, INVALID_REQUEST, Some(e.to_string())))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    /// Sets a URL-encoded form body.
    pub fn form(mut self, pairs: Vec<(String, String)>) -> Self {
        self.body = RequestBody::Form(pairs);
        self
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Binds [`Call`]s to one service root and a shared [`Transport`].
///
/// Immutable and cheap to clone; clones share the transport.
#[derive(Debug, Clone)]
pub struct RestClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    access_token: Option<Secret>,
}

impl RestClient {
    /// Creates a dispatcher for the service at `base_url`.
    ///
    /// A trailing `/` on `base_url` is ignored.
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            transport,
            base_url,
            access_token: None,
        }
    }

    /// Returns a copy that sends `Authorization: Bearer <token>` on every call.
    pub fn with_access_token(&self, token: impl Into<Secret>) -> Self {
        Self {
            access_token: Some(token.into()),
            ..self.clone()
        }
    }

    /// Returns a copy that sends no `Authorization` header.
    pub fn anonymous(&self) -> Self {
        Self {
            access_token: None,
            ..self.clone()
        }
    }

    /// Performs the call and returns the raw 2xx response.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] for transport failures and non-2xx statuses.
    pub async fn execute(&self, call: Call) -> Result<RawResponse, ApiError> {
        let request = self.bind(call);
        let span = debug_span!(
            "corbel.request",
            request_id = %request.id,
            method = %request.method,
            path = %request.path_string(),
        );

        async move {
            let response = self.transport.execute(request).await.map_err(|err| {
                warn!(error = %err, "transport failure");
                ApiError::from(err)
            })?;

            if response.is_success() {
                debug!(status = response.status, "request succeeded");
                return Ok(response);
            }

            let err = ApiError::from_status(response.status, &response.body);
            warn!(status = response.status, error = %err.error, "service returned an error");
            Err(err)
        }
        .instrument(span)
        .await
    }

    /// Performs the call and decodes the JSON payload.
    ///
    /// # Errors
    ///
    /// As [`RestClient::execute`], plus `invalid_response` when the payload
    /// does not decode into `T`.
    pub async fn fetch<T: DeserializeOwned>(&self, call: Call) -> Result<T, ApiError> {
        let response = self.execute(call).await?;
        serde_json::from_slice(&response.body).map_err(|e| {
            warn!(status = response.status, error = %e, "undecodable response payload");
            ApiError::invalid_response(response.status, format!("undecodable payload: {e}"))
        })
    }

    /// Performs the call, ignoring any payload.
    ///
    /// # Errors
    ///
    /// As [`RestClient::execute`].
    pub async fn submit(&self, call: Call) -> Result<(), ApiError> {
        self.execute(call).await.map(|_| ())
    }

    /// Performs a create call and returns the id of the new resource.
    ///
    /// The id is the last path segment of the `Location` response header.
    ///
    /// # Errors
    ///
    /// As [`RestClient::execute`], plus `invalid_response` when the header is
    /// missing or has no final segment.
    pub async fn create(&self, call: Call) -> Result<String, ApiError> {
        let collection = call.path.last().cloned().unwrap_or_default();
        let response = self.execute(call).await?;
        match response
            .header("location")
            .and_then(|location| id_from_location(location, &collection))
        {
            Some(id) => Ok(id.to_owned()),
            None => {
                warn!(status = response.status, "create response without usable Location");
                Err(ApiError::invalid_response(
                    response.status,
                    "missing or malformed Location header",
                ))
            }
        }
    }

    fn bind(&self, call: Call) -> ApiRequest {
        let id = RequestId::new_random();

        let mut headers = Vec::with_capacity(call.headers.len() + 3);
        headers.push(("accept".to_owned(), "application/json".to_owned()));
        headers.push(("x-request-id".to_owned(), id.to_string()));
        if let Some(token) = &self.access_token {
            headers.push((
                "authorization".to_owned(),
                format!("Bearer {}", token.expose()),
            ));
        }
        headers.extend(call.headers);

        ApiRequest {
            id,
            method: call.method,
            base_url: self.base_url.clone(),
            path: call.path,
            query: call.query,
            headers,
            body: call.body,
        }
    }
}

/// Extracts the resource id from a `Location` header value.
///
/// Accepts absolute and relative locations; ignores a trailing `/`, query
/// string and fragment. The host of an absolute location is never an id, nor
/// is `collection`, the segment the resource was posted to.
pub fn id_from_location<'a>(location: &'a str, collection: &str) -> Option<&'a str> {
    let end = location
        .find(|c: char| c == '?' || c == '#')
        .unwrap_or(location.len());
    let mut path = &location[..end];
    if let Some((_, rest)) = path.split_once("://") {
        path = &rest[rest.find('/')?..];
    }
    let id = path.trim_end_matches('/').rsplit('/').next()?;
    if id.is_empty() || id.contains(':') || id == collection {
        None
    } else {
        Some(id)
    }
}
