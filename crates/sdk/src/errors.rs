//! The single error type surfaced by every client operation.
//!
//! [`ApiError`] is produced whenever a remote call fails: the transport could
//! not complete the exchange, the service answered with a non-success status,
//! or the payload could not be decoded. Callers branch on the `Err` arm; no
//! operation panics or retries.
//!
//! The service reports failures as a JSON body of the form
//! `{"error": "not_found", "errorDescription": "..."}`. When such a body is
//! present its fields are carried through unchanged.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::transport::TransportError;

/// Reason code for failures where no HTTP exchange completed.
pub const TRANSPORT_ERROR: &str = "transport_error";

/// Reason code for a success status whose payload could not be decoded.
pub const INVALID_RESPONSE: &str = "invalid_response";

/// Reason code for a request body that could not be encoded.
pub const INVALID_REQUEST: &str = "invalid_request";

/// Reason code for an authentication assertion that could not be signed.
pub const INVALID_ASSERTION: &str = "invalid_assertion";

/// Structured failure value returned by the remote service or transport layer.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[error("{error} (status {}): {}", display_status(.status), .error_description.as_deref().unwrap_or("no description"))]
pub struct ApiError {
    /// HTTP status of the failed response.
    ///
    /// `None` when the failure happened before a response was received.
    pub status: Option<u16>,

    /// Machine-readable reason (e.g. `"not_found"`, `"unauthorized"`).
    pub error: String,

    /// Human-readable detail, when the service or transport supplied one.
    pub error_description: Option<String>,
}

/// Wire shape of a service error body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    error: Option<String>,
    error_description: Option<String>,
}

impl ApiError {
    /// Creates an [`ApiError`] from its parts.
    pub fn new(
        status: Option<u16>,
        error: impl Into<String>,
        error_description: Option<String>,
    ) -> Self {
        Self {
            status,
            error: error.into(),
            error_description,
        }
    }

    /// Builds the error for a non-success response.
    ///
    /// Uses the service's `error` / `errorDescription` body when it parses;
    /// otherwise the reason is `http_<status>` and the raw body text, if any,
    /// becomes the description.
    pub fn from_status(status: u16, body: &[u8]) -> Self {
        if let Ok(ErrorBody {
            error: Some(error),
            error_description,
        }) = serde_json::from_slice::<ErrorBody>(body)
        {
            return Self::new(Some(status), error, error_description);
        }

        let text = String::from_utf8_lossy(body).trim().to_owned();
        let description = if text.is_empty() { None } else { Some(text) };
        Self::new(Some(status), format!("http_{status}"), description)
    }

    /// Builds the error for a success response whose payload was unusable.
    pub fn invalid_response(status: u16, detail: impl Into<String>) -> Self {
        Self::new(Some(status), INVALID_RESPONSE, Some(detail.into()))
    }

    /// Returns `true` if no HTTP response was received.
    pub fn is_transport(&self) -> bool {
        self.error == TRANSPORT_ERROR
    }
}

impl From<TransportError> for ApiError {
    fn from(err: TransportError) -> Self {
        Self::new(None, TRANSPORT_ERROR, Some(err.to_string()))
    }
}

fn display_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "none".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_error_body_is_carried_unchanged() {
        let body = br#"{"error":"not_found","errorDescription":"No such user"}"#;
        let err = ApiError::from_status(404, body);
        assert_eq!(err.status, Some(404));
        assert_eq!(err.error, "not_found");
        assert_eq!(err.error_description.as_deref(), Some("No such user"));
    }

    #[test]
    fn unstructured_body_falls_back_to_status_reason() {
        let err = ApiError::from_status(502, b"Bad Gateway\n");
        assert_eq!(err.error, "http_502");
        assert_eq!(err.error_description.as_deref(), Some("Bad Gateway"));

        let empty = ApiError::from_status(500, b"");
        assert_eq!(empty.error, "http_500");
        assert_eq!(empty.error_description, None);
    }

    #[test]
    fn transport_failure_has_no_status() {
        let err = ApiError::from(TransportError::Connection("connection refused".into()));
        assert!(err.is_transport());
        assert_eq!(err.status, None);
        assert!(err.to_string().contains("connection refused"));
    }
}
