//! Service endpoint configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Default IAM service root.
pub const DEFAULT_IAM_URL: &str = "https://iam.bqws.io";

/// Default notifications service root.
pub const DEFAULT_NOTIFICATIONS_URL: &str = "https://notifications.bqws.io";

/// Audience the IAM service expects in token-endpoint assertions.
pub const DEFAULT_AUDIENCE: &str = "http://iam.bqws.io";

/// An endpoint configuration value is unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} must be an http or https URL with a host, got '{value}': {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },
}

/// Where the services live.
///
/// Missing fields fall back to the public defaults, so an empty
/// `[endpoints]` table is valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// IAM service root, without the `/v1.0` prefix.
    pub iam_url: String,
    /// Notifications service root, without the `/v1.0` prefix.
    pub notifications_url: String,
    /// `aud` claim of the token-endpoint assertion.
    pub audience: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            iam_url: DEFAULT_IAM_URL.to_owned(),
            notifications_url: DEFAULT_NOTIFICATIONS_URL.to_owned(),
            audience: DEFAULT_AUDIENCE.to_owned(),
        }
    }
}

impl EndpointConfig {
    /// Checks that both service roots are http(s) URLs and the audience is set.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_url("iam_url", &self.iam_url)?;
        check_url("notifications_url", &self.notifications_url)?;
        if self.audience.trim().is_empty() {
            return Err(ConfigError::Empty { field: "audience" });
        }
        Ok(())
    }
}

fn check_url(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Empty { field });
    }
    let invalid = |reason: String| ConfigError::InvalidUrl {
        field,
        value: value.to_owned(),
        reason,
    };
    let url = Url::parse(value).map_err(|e| invalid(e.to_string()))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme '{}'", url.scheme())));
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(invalid("missing host".to_owned()));
    }
    Ok(())
}
