//! JWT-bearer assertions for the IAM token endpoint.
//!
//! The token endpoint does not take credentials directly. The client signs a
//! short-lived HS256 JWT with its secret, carrying the user's credentials or a
//! refresh token as claims, and posts it as
//! `grant_type=urn:ietf:params:oauth:grant-type:jwt-bearer&assertion=<jwt>`.

use chrono::{DateTime, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use tracing::warn;

use sdk::errors::INVALID_ASSERTION;
use sdk::{ApiError, AuthenticationOptions, ClientCredentials, UserCredentials};

/// OAuth2 grant type for assertion-based token requests.
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// What the assertion asks the service to authenticate.
#[derive(Debug, Clone, Copy)]
pub enum Grant<'a> {
    /// The client itself.
    Client,
    /// An end user, by username and password.
    User(&'a UserCredentials),
    /// Whoever the refresh token was issued to.
    Refresh(&'a str),
}

/// Claims of a token-endpoint assertion.
///
/// Not `Debug`: holds the user's password in clear.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionClaims {
    /// Client id.
    pub iss: String,
    pub aud: String,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
    /// Requested scopes, space separated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(
        rename = "basic_auth.username",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub basic_auth_username: Option<String>,
    #[serde(
        rename = "basic_auth.password",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub basic_auth_password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl AssertionClaims {
    /// Builds the claims for `grant`, expiring `options.expiration` after `now`.
    pub fn new(
        client: &ClientCredentials,
        grant: Grant<'_>,
        options: &AuthenticationOptions,
        audience: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let lifetime = i64::try_from(options.expiration.as_secs()).unwrap_or(i64::MAX);

        let (basic_auth_username, basic_auth_password, refresh_token) = match grant {
            Grant::Client => (None, None, None),
            Grant::User(user) => (
                Some(user.username.clone()),
                Some(user.password.expose().to_owned()),
                None,
            ),
            Grant::Refresh(token) => (None, None, Some(token.to_owned())),
        };

        Self {
            iss: client.client_id.clone(),
            aud: audience.to_owned(),
            exp: now.timestamp().saturating_add(lifetime),
            scope: options
                .scope
                .as_ref()
                .filter(|scopes| !scopes.is_empty())
                .map(|scopes| scopes.join(" ")),
            basic_auth_username,
            basic_auth_password,
            refresh_token,
            device_id: options.device_id.clone(),
            version: options.version.clone(),
        }
    }
}

/// Signs an assertion with the client secret.
///
/// # Errors
///
/// Returns an `invalid_assertion` [`ApiError`] if signing fails; no request is
/// made in that case.
pub fn sign_assertion(
    client: &ClientCredentials,
    grant: Grant<'_>,
    options: &AuthenticationOptions,
    audience: &str,
) -> Result<String, ApiError> {
    let claims = AssertionClaims::new(client, grant, options, audience, Utc::now());
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(client.client_secret.expose().as_bytes()),
    )
    .map_err(|e| {
        warn!(client_id = %client.client_id, error = %e, "could not sign assertion");
        ApiError::new(None, INVALID_ASSERTION, Some(format!("jwt encode: {e}")))
    })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use jsonwebtoken::{decode, DecodingKey, Validation};

    use super::*;

    fn client() -> ClientCredentials {
        ClientCredentials::new("client-1", "client-secret")
    }

    #[test]
    fn user_grant_carries_basic_auth_claims() {
        let user = UserCredentials::new("ana", "pw");
        let options = AuthenticationOptions::new()
            .scope(["iam:user:read", "iam:user:write"])
            .expiration(Duration::from_secs(300))
            .device_id("d-1");
        let now = Utc::now();

        let claims = AssertionClaims::new(&client(), Grant::User(&user), &options, "aud", now);
        assert_eq!(claims.iss, "client-1");
        assert_eq!(claims.exp, now.timestamp() + 300);
        assert_eq!(claims.scope.as_deref(), Some("iam:user:read iam:user:write"));
        assert_eq!(claims.basic_auth_username.as_deref(), Some("ana"));
        assert_eq!(claims.basic_auth_password.as_deref(), Some("pw"));
        assert_eq!(claims.refresh_token, None);
        assert_eq!(claims.device_id.as_deref(), Some("d-1"));
    }

    #[test]
    fn refresh_grant_carries_only_the_refresh_token() {
        let claims = AssertionClaims::new(
            &client(),
            Grant::Refresh("rt-1"),
            &AuthenticationOptions::default(),
            "aud",
            Utc::now(),
        );
        assert_eq!(claims.refresh_token.as_deref(), Some("rt-1"));
        assert_eq!(claims.basic_auth_username, None);
        assert_eq!(claims.scope, None);

        let wire = serde_json::to_value(&claims).unwrap();
        assert!(wire.get("basic_auth.username").is_none());
    }

    #[test]
    fn signed_assertion_verifies_with_client_secret() {
        let token = sign_assertion(
            &client(),
            Grant::Client,
            &AuthenticationOptions::default(),
            "http://iam.bqws.io",
        )
        .unwrap();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&["http://iam.bqws.io"]);
        let data = decode::<AssertionClaims>(
            &token,
            &DecodingKey::from_secret(b"client-secret"),
            &validation,
        )
        .unwrap();
        assert_eq!(data.claims.iss, "client-1");
    }
}
