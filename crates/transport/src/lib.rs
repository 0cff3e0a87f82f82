//! Corbel SDK HTTP infrastructure adapter.
//!
//! Implements the [`sdk::Transport`] trait over [`reqwest`]. One
//! [`HttpTransport`] owns one connection pool; share it between the IAM and
//! notifications clients behind an `Arc`.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** URL assembly, percent-encoding, TLS, timeouts and
//! connection reuse live here. The transport performs exactly one exchange per
//! call and never interprets status codes: a 404 is a successful exchange
//! returned as a [`sdk::RawResponse`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, trace};

use sdk::{ApiRequest, Method, RawResponse, RequestBody, Transport, TransportError};

/// Default total time allowed for one exchange.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Default time allowed to establish a connection.
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;

/// HTTP client settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Total time allowed for one exchange, in milliseconds.
    pub timeout_ms: u64,
    /// Time allowed to establish a connection, in milliseconds.
    pub connect_timeout_ms: u64,
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout_ms: DEFAULT_TIMEOUT_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            user_agent: concat!("corbel-sdk-rs/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

/// The HTTP client could not be constructed.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// [`Transport`] over a pooled [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Builds a transport with its own connection pool.
    ///
    /// # Errors
    ///
    /// Returns [`BuildError`] if the TLS backend cannot be initialised.
    pub fn new(config: &TransportConfig) -> Result<Self, BuildError> {
        let timeout = Duration::from_millis(config.timeout_ms);
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()?;
        debug!(?timeout, user_agent = %config.user_agent, "HTTP transport ready");
        Ok(Self { client, timeout })
    }

    /// Builds the request URL: base URL, percent-encoded path segments, query.
    fn url(request: &ApiRequest) -> Result<Url, TransportError> {
        let invalid = |reason: String| TransportError::InvalidUrl {
            url: request.base_url.clone(),
            reason,
        };

        let mut url = Url::parse(&request.base_url).map_err(|e| invalid(e.to_string()))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|()| invalid("URL cannot be a base".to_owned()))?;
            segments.pop_if_empty().extend(&request.path);
        }
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }

    fn classify(&self, err: reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout(self.timeout)
        } else if err.is_connect() {
            TransportError::Connection(err.to_string())
        } else {
            TransportError::Other(err.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<RawResponse, TransportError> {
        let url = Self::url(&request)?;
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };
        trace!(%method, %url, "sending request");

        let mut builder = self.client.request(method, url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Form(pairs) => builder.form(pairs),
        };

        let response = builder.send().await.map_err(|e| self.classify(e))?;
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_owned(), v.to_owned()))
            })
            .collect();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.classify(e))?
            .to_vec();

        trace!(status, bytes = body.len(), "response received");
        Ok(RawResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use sdk::RequestId;

    use super::*;

    fn request(base_url: &str, path: &[&str], query: &[(&str, &str)]) -> ApiRequest {
        ApiRequest {
            id: RequestId::new_random(),
            method: Method::Get,
            base_url: base_url.to_owned(),
            path: path.iter().map(|s| (*s).to_owned()).collect(),
            query: query
                .iter()
                .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
                .collect(),
            headers: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    #[test]
    fn path_segments_are_percent_encoded() {
        let req = request("https://iam.test", &["v1.0", "username", "ana maría/x"], &[]);
        let url = HttpTransport::url(&req).unwrap();
        assert_eq!(
            url.as_str(),
            "https://iam.test/v1.0/username/ana%20mar%C3%ADa%2Fx"
        );
    }

    #[test]
    fn base_path_is_kept() {
        let req = request("https://gw.test/corbel", &["v1.0", "user", "me"], &[]);
        let url = HttpTransport::url(&req).unwrap();
        assert_eq!(url.as_str(), "https://gw.test/corbel/v1.0/user/me");
    }

    #[test]
    fn query_pairs_round_trip() {
        let query = r#"[{"$eq":{"country":"ES"}}]"#;
        let req = request("https://iam.test", &["v1.0", "user"], &[("api:query", query)]);
        let url = HttpTransport::url(&req).unwrap();

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs, vec![("api:query".to_owned(), query.to_owned())]);
    }

    #[test]
    fn unparsable_base_url_is_invalid_url() {
        let req = request("not a url", &["v1.0"], &[]);
        assert!(matches!(
            HttpTransport::url(&req),
            Err(TransportError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn default_config_has_version_user_agent() {
        let cfg = TransportConfig::default();
        assert!(cfg.user_agent.starts_with("corbel-sdk-rs/"));
        assert_eq!(cfg.timeout_ms, DEFAULT_TIMEOUT_MS);
    }
}
