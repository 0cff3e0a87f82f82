//! [`IamClient`]: the [`sdk::Iam`] implementation.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use sdk::errors::INVALID_RESPONSE;
use sdk::{
    ApiError, AuthenticationOptions, AuthenticationResponse, Call, ClientCredentials, Device,
    EndpointConfig, Group, GroupId, Iam, RequestParams, RestClient, Scope, ScopeId, Secret,
    Transport, User, UserCredentials, UserId,
};

use crate::assertion::{sign_assertion, Grant, JWT_BEARER_GRANT};

/// Path segment addressing the token's own user.
const ME: &str = "me";

/// Client for the IAM service.
///
/// Immutable; [`IamClient::with_access_token`] and
/// [`IamClient::authenticated`] return new clients sharing the transport.
#[derive(Debug, Clone)]
pub struct IamClient {
    rest: RestClient,
    audience: String,
}

impl IamClient {
    /// Creates an unauthenticated client for `endpoints.iam_url`.
    pub fn new(transport: Arc<dyn Transport>, endpoints: &EndpointConfig) -> Self {
        Self {
            rest: RestClient::new(transport, endpoints.iam_url.clone()),
            audience: endpoints.audience.clone(),
        }
    }

    /// Returns a client whose calls carry `token` as bearer credentials.
    pub fn with_access_token(&self, token: impl Into<Secret>) -> Self {
        Self {
            rest: self.rest.with_access_token(token),
            audience: self.audience.clone(),
        }
    }

    /// Returns a client bound to the access token of `response`.
    pub fn authenticated(&self, response: &AuthenticationResponse) -> Self {
        self.with_access_token(response.access_token.clone())
    }

    async fn request_token(
        &self,
        client_credentials: &ClientCredentials,
        grant: Grant<'_>,
        options: &AuthenticationOptions,
    ) -> Result<AuthenticationResponse, ApiError> {
        let assertion = sign_assertion(client_credentials, grant, options, &self.audience)?;
        let call = Call::post(&["oauth", "token"]).form(vec![
            ("grant_type".to_owned(), JWT_BEARER_GRANT.to_owned()),
            ("assertion".to_owned(), assertion),
        ]);
        let response: AuthenticationResponse = self.rest.anonymous().fetch(call).await?;
        debug!(expires_at = %response.expires_at, "token issued");
        Ok(response)
    }
}

#[async_trait]
impl Iam for IamClient {
    // ----------------- Authentication ------------

    #[instrument(level = "debug", skip_all, fields(client_id = %client_credentials.client_id))]
    async fn authenticate(
        &self,
        client_credentials: &ClientCredentials,
        user_credentials: Option<&UserCredentials>,
        options: &AuthenticationOptions,
    ) -> Result<AuthenticationResponse, ApiError> {
        let grant = match user_credentials {
            Some(user) => Grant::User(user),
            None => Grant::Client,
        };
        self.request_token(client_credentials, grant, options).await
    }

    #[instrument(level = "debug", skip_all, fields(client_id = %client_credentials.client_id))]
    async fn authentication_refresh(
        &self,
        client_credentials: &ClientCredentials,
        refresh_token: &str,
        options: &AuthenticationOptions,
    ) -> Result<AuthenticationResponse, ApiError> {
        self.request_token(client_credentials, Grant::Refresh(refresh_token), options)
            .await
    }

    // ----------------- Scopes ----------------------

    async fn get_scope(&self, id: &ScopeId) -> Result<Scope, ApiError> {
        self.rest.fetch(Call::get(&["scope", id.as_str()])).await
    }

    // ----------------- Users -----------------------

    async fn create_user(&self, user: &User) -> Result<UserId, ApiError> {
        let id = self.rest.create(Call::post(&["user"]).json(user)?).await?;
        UserId::new(id).ok_or_else(|| ApiError::new(None, INVALID_RESPONSE, None))
    }

    #[instrument(level = "debug", skip_all, fields(user_id = %id))]
    async fn get_user_by_id(&self, id: &UserId) -> Result<User, ApiError> {
        self.rest.fetch(Call::get(&["user", id.as_str()])).await
    }

    async fn get_user_id_by_username(&self, username: &str) -> Result<User, ApiError> {
        self.rest.fetch(Call::get(&["username", username])).await
    }

    async fn get_user(&self) -> Result<User, ApiError> {
        self.rest.fetch(Call::get(&["user", ME])).await
    }

    async fn update_user(&self, user: &User) -> Result<(), ApiError> {
        let target = user.id.as_ref().map_or(ME, UserId::as_str);
        self.rest
            .submit(Call::put(&["user", target]).json(user)?)
            .await
    }

    #[instrument(level = "debug", skip_all, fields(user_id = %user_id))]
    async fn get_user_devices(&self, user_id: &UserId) -> Result<Vec<Device>, ApiError> {
        self.rest
            .fetch(Call::get(&["user", user_id.as_str(), "device"]))
            .await
    }

    #[instrument(level = "debug", skip_all, fields(user_id = %user_id, groups = groups.len()))]
    async fn add_groups_to_user(
        &self,
        user_id: &UserId,
        groups: &[GroupId],
    ) -> Result<(), ApiError> {
        self.rest
            .submit(Call::put(&["user", user_id.as_str(), "group"]).json(groups)?)
            .await
    }

    #[instrument(level = "debug", skip_all, fields(user_id = %user_id, group_id = %group_id))]
    async fn delete_group_to_user(
        &self,
        user_id: &UserId,
        group_id: &GroupId,
    ) -> Result<(), ApiError> {
        self.rest
            .submit(Call::delete(&[
                "user",
                user_id.as_str(),
                "group",
                group_id.as_str(),
            ]))
            .await
    }

    async fn find_users(&self, params: &RequestParams) -> Result<Vec<User>, ApiError> {
        self.rest
            .fetch(Call::get(&["user"]).query(params.to_query_pairs()))
            .await
    }

    // ----------------- Groups ----------------------

    async fn create_group(&self, group: &Group) -> Result<GroupId, ApiError> {
        let id = self.rest.create(Call::post(&["group"]).json(group)?).await?;
        GroupId::new(id).ok_or_else(|| ApiError::new(None, INVALID_RESPONSE, None))
    }
}
