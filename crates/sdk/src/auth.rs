//! Authentication inputs and outputs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{Secret, Timestamp, UserId};

/// Default lifetime of the signed assertion sent to the token endpoint.
///
/// The IAM service rejects assertions valid for longer than an hour.
pub const DEFAULT_ASSERTION_EXPIRATION: Duration = Duration::from_secs(3600);

/// Identity of the application calling the IAM service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCredentials {
    pub client_id: String,
    /// Shared secret; signs the token-endpoint assertion.
    pub client_secret: Secret,
}

impl ClientCredentials {
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<Secret>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

/// Identity of an end user, for password-based authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCredentials {
    pub username: String,
    pub password: Secret,
}

impl UserCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<Secret>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Recognised options for an authentication call.
///
/// All fields are optional; [`AuthenticationOptions::default`] requests the
/// client's default scopes with the default assertion lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct AuthenticationOptions {
    /// Scopes to request. `None` lets the service grant the client defaults.
    pub scope: Option<Vec<String>>,
    /// Lifetime of the signed assertion.
    pub expiration: Duration,
    /// Device the session is bound to.
    pub device_id: Option<String>,
    /// Application version reported to the service.
    pub version: Option<String>,
}

impl Default for AuthenticationOptions {
    fn default() -> Self {
        Self {
            scope: None,
            expiration: DEFAULT_ASSERTION_EXPIRATION,
            device_id: None,
            version: None,
        }
    }
}

impl AuthenticationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scope(mut self, scopes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.scope = Some(scopes.into_iter().map(Into::into).collect());
        self
    }

    pub fn expiration(mut self, expiration: Duration) -> Self {
        self.expiration = expiration;
        self
    }

    pub fn device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// Tokens issued by a successful authentication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationResponse {
    /// Bearer token for subsequent calls.
    pub access_token: Secret,
    /// When `access_token` stops being accepted.
    pub expires_at: Timestamp,
    /// Longer-lived token for [`crate::Iam::authentication_refresh`].
    ///
    /// Only issued for user authentications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<Secret>,
    /// The authenticated user, when the service reports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
}

impl AuthenticationResponse {
    /// Returns `true` once the access token has expired.
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_past()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_decodes_camel_case_wire_format() {
        let resp: AuthenticationResponse = serde_json::from_str(
            r#"{"accessToken":"at-1","expiresAt":4102444800000,"refreshToken":"rt-1"}"#,
        )
        .unwrap();
        assert_eq!(resp.access_token.expose(), "at-1");
        assert_eq!(resp.refresh_token.as_ref().map(Secret::expose), Some("rt-1"));
        assert_eq!(resp.user_id, None);
        assert!(!resp.is_expired());
    }

    #[test]
    fn options_builder_sets_fields() {
        let opts = AuthenticationOptions::new()
            .scope(["iam:user:read", "iam:user:write"])
            .expiration(Duration::from_secs(300))
            .device_id("d-1");
        assert_eq!(opts.scope.as_ref().map(Vec::len), Some(2));
        assert_eq!(opts.expiration, Duration::from_secs(300));
        assert_eq!(opts.device_id.as_deref(), Some("d-1"));
        assert_eq!(opts.version, None);
    }

    #[test]
    fn credentials_debug_hides_secrets() {
        let creds = UserCredentials::new("ana", "s3cret");
        assert!(!format!("{creds:?}").contains("s3cret"));
    }
}
