//! Client port traits.
//!
//! [`Iam`] and [`Notifications`] are the SDK's public surface: one async
//! method per remote capability. Both are object-safe so applications can
//! hold `Arc<dyn Iam>` and substitute fakes in their own tests.
//!
//! Every method performs exactly one remote call, never retries, and reports
//! any failure as `Err(ApiError)`.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::{
    ApiError, AuthenticationOptions, AuthenticationResponse, ClientCredentials, Device, Group,
    GroupId, NotificationId, RequestParams, Scope, ScopeId, User, UserCredentials, UserId,
};

/// Identity and access management operations.
#[async_trait]
pub trait Iam: Send + Sync {
    // ----------------- Authentication ------------

    /// Obtains tokens for the client, optionally on behalf of a user.
    ///
    /// Without `user_credentials` the token represents the client alone.
    async fn authenticate(
        &self,
        client_credentials: &ClientCredentials,
        user_credentials: Option<&UserCredentials>,
        options: &AuthenticationOptions,
    ) -> Result<AuthenticationResponse, ApiError>;

    /// Exchanges a refresh token for a new access token.
    async fn authentication_refresh(
        &self,
        client_credentials: &ClientCredentials,
        refresh_token: &str,
        options: &AuthenticationOptions,
    ) -> Result<AuthenticationResponse, ApiError>;

    // ----------------- Scopes ----------------------

    async fn get_scope(&self, id: &ScopeId) -> Result<Scope, ApiError>;

    // ----------------- Users -----------------------

    /// Creates a user and returns its server-assigned id.
    async fn create_user(&self, user: &User) -> Result<UserId, ApiError>;

    async fn get_user_by_id(&self, id: &UserId) -> Result<User, ApiError>;

    /// Looks a user up by username. The service typically fills only `id`.
    async fn get_user_id_by_username(&self, username: &str) -> Result<User, ApiError>;

    /// Returns the user the access token was issued for.
    async fn get_user(&self) -> Result<User, ApiError>;

    /// Replaces the stored user. A user without `id` updates the token's user.
    async fn update_user(&self, user: &User) -> Result<(), ApiError>;

    async fn get_user_devices(&self, user_id: &UserId) -> Result<Vec<Device>, ApiError>;

    async fn add_groups_to_user(&self, user_id: &UserId, groups: &[GroupId])
        -> Result<(), ApiError>;

    async fn delete_group_to_user(&self, user_id: &UserId, group_id: &GroupId)
        -> Result<(), ApiError>;

    /// Queries users. No match is `Ok(vec![])`, not an error.
    async fn find_users(&self, params: &RequestParams) -> Result<Vec<User>, ApiError>;

    // ----------------- Groups ----------------------

    /// Creates a group and returns its server-assigned id.
    async fn create_group(&self, group: &Group) -> Result<GroupId, ApiError>;
}

/// Notification dispatch.
#[async_trait]
pub trait Notifications: Send + Sync {
    /// Renders notification template `id` with `properties` and delivers it to
    /// `recipient`.
    async fn send_notification(
        &self,
        id: &NotificationId,
        recipient: &str,
        properties: &HashMap<String, String>,
    ) -> Result<(), ApiError>;
}
