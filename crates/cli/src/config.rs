//! CLI configuration file.
//!
//! ```toml
//! [endpoints]
//! iam_url = "https://iam.example.com"
//!
//! [transport]
//! timeout_ms = 10000
//!
//! [credentials]
//! client_id = "my-client"
//!
//! [telemetry]
//! otlp_endpoint = "http://127.0.0.1:4317"
//! ```
//!
//! Every section is optional. Command line flags and `CORBEL_*` environment
//! variables take precedence over `[credentials]`.

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use sdk::{EndpointConfig, Secret};
use transport::TransportConfig;

/// File read when `--config` is not given, if it exists.
pub const DEFAULT_CONFIG_FILE: &str = "corbel.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub endpoints: EndpointConfig,
    pub transport: TransportConfig,
    pub credentials: CredentialsConfig,
    pub telemetry: TelemetryConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CredentialsConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<Secret>,
    pub access_token: Option<Secret>,
}

#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TelemetryConfig {
    /// OTLP gRPC collector. Spans are exported only when set.
    pub otlp_endpoint: Option<String>,
    pub service_name: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            otlp_endpoint: None,
            service_name: "corbel-cli".to_owned(),
        }
    }
}

impl CliConfig {
    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        let config: Self = toml::from_str(raw).context("invalid configuration")?;
        config.endpoints.validate()?;
        Ok(config)
    }
}

/// Loads `path`, or [`DEFAULT_CONFIG_FILE`] if present, or the defaults.
pub fn load(path: Option<&Path>) -> anyhow::Result<CliConfig> {
    let path = match path {
        Some(path) => path,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => Path::new(DEFAULT_CONFIG_FILE),
        None => return Ok(CliConfig::default()),
    };
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    CliConfig::from_toml(&raw).with_context(|| format!("in {}", path.display()))
}

#[cfg(test)]
mod tests {
    use sdk::config::DEFAULT_NOTIFICATIONS_URL;

    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = CliConfig::from_toml("").unwrap();
        assert_eq!(config.endpoints, EndpointConfig::default());
        assert_eq!(config.transport, TransportConfig::default());
        assert!(config.credentials.client_id.is_none());
        assert!(config.telemetry.otlp_endpoint.is_none());
        assert_eq!(config.telemetry.service_name, "corbel-cli");
    }

    #[test]
    fn partial_sections_keep_remaining_defaults() {
        let config = CliConfig::from_toml(
            r#"
            [endpoints]
            iam_url = "https://iam.example.com"

            [transport]
            timeout_ms = 2500

            [credentials]
            client_id = "client-1"
            client_secret = "s3cret"
            "#,
        )
        .unwrap();

        assert_eq!(config.endpoints.iam_url, "https://iam.example.com");
        assert_eq!(config.endpoints.notifications_url, DEFAULT_NOTIFICATIONS_URL);
        assert_eq!(config.transport.timeout_ms, 2500);
        assert_eq!(
            config.transport.connect_timeout_ms,
            TransportConfig::default().connect_timeout_ms
        );
        assert_eq!(config.credentials.client_id.as_deref(), Some("client-1"));
        assert_eq!(
            config.credentials.client_secret.as_ref().map(Secret::expose),
            Some("s3cret")
        );
    }

    #[test]
    fn unknown_sections_are_rejected() {
        assert!(CliConfig::from_toml("[logging]\nlevel = \"debug\"").is_err());
        assert!(CliConfig::from_toml("[telemetry]\nendpoint = \"http://x\"").is_err());
    }

    #[test]
    fn invalid_endpoint_url_is_rejected() {
        let err = CliConfig::from_toml("[endpoints]\niam_url = \"ftp://iam\"").unwrap_err();
        assert!(format!("{err:#}").contains("iam_url"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let err = load(Some(Path::new("/nonexistent/corbel.toml"))).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }
}
