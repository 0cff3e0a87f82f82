//! Corbel notifications client.
//!
//! Implements the [`sdk::Notifications`] trait over the notifications
//! service's REST API. A notification is a server-side template identified by
//! [`sdk::NotificationId`]; sending one supplies the recipient and the
//! template's properties.
//!
//! ## Architectural Layer
//!
//! **Client adapter.** HTTP is reached only through [`sdk::Transport`].

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::instrument;

use sdk::{
    ApiError, Call, EndpointConfig, NotificationId, Notifications, RestClient, Secret, Transport,
};

/// Body of `POST /v1.0/notification/send`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendNotification<'a> {
    notification_id: &'a NotificationId,
    recipient: &'a str,
    properties: &'a HashMap<String, String>,
}

/// Client for the notifications service.
#[derive(Debug, Clone)]
pub struct NotificationsClient {
    rest: RestClient,
}

impl NotificationsClient {
    /// Creates an unauthenticated client for `endpoints.notifications_url`.
    pub fn new(transport: Arc<dyn Transport>, endpoints: &EndpointConfig) -> Self {
        Self {
            rest: RestClient::new(transport, endpoints.notifications_url.clone()),
        }
    }

    /// Returns a client whose calls carry `token` as bearer credentials.
    pub fn with_access_token(&self, token: impl Into<Secret>) -> Self {
        Self {
            rest: self.rest.with_access_token(token),
        }
    }
}

#[async_trait]
impl Notifications for NotificationsClient {
    #[instrument(level = "debug", skip_all, fields(notification_id = %id, properties = properties.len()))]
    async fn send_notification(
        &self,
        id: &NotificationId,
        recipient: &str,
        properties: &HashMap<String, String>,
    ) -> Result<(), ApiError> {
        let body = SendNotification {
            notification_id: id,
            recipient,
            properties,
        };
        self.rest
            .submit(Call::post(&["notification", "send"]).json(&body)?)
            .await
    }
}
