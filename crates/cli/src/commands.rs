//! Subcommand execution: one client call per subcommand, result as JSON.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{bail, Context as _};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use iam::IamClient;
use notifications::NotificationsClient;
use sdk::{
    AuthenticationOptions, ClientCredentials, GroupId, Iam, NotificationId, Notifications,
    RequestParams, ScopeId, UserCredentials, UserId,
};

use crate::args::{
    AuthCommand, Command, FindArgs, GroupCommand, NotificationCommand, ScopeCommand, TokenArgs,
    UserCommand,
};

/// Everything a subcommand may need.
pub struct Context {
    pub iam: IamClient,
    pub notifications: NotificationsClient,
    pub client_credentials: Option<ClientCredentials>,
}

impl Context {
    fn client_credentials(&self) -> anyhow::Result<&ClientCredentials> {
        self.client_credentials.as_ref().context(
            "client credentials required: pass --client-id/--client-secret, \
             set CORBEL_CLIENT_ID/CORBEL_CLIENT_SECRET, or fill [credentials]",
        )
    }
}

/// Runs `command`. `None` means the call succeeded with nothing to print.
pub async fn execute(command: Command, ctx: &Context) -> anyhow::Result<Option<Value>> {
    match command {
        Command::Auth { command } => auth(command, ctx).await,
        Command::Scope {
            command: ScopeCommand::Get { id },
        } => {
            let id = parse_id(id, "scope id", ScopeId::new)?;
            output(&ctx.iam.get_scope(&id).await?)
        }
        Command::User { command } => user(command, &ctx.iam).await,
        Command::Group {
            command: GroupCommand::Create { group },
        } => {
            let id = ctx.iam.create_group(&read_json(&group)?).await?;
            output(&json!({ "id": id }))
        }
        Command::Notification {
            command:
                NotificationCommand::Send {
                    id,
                    recipient,
                    properties,
                },
        } => {
            let id = parse_id(id, "notification id", NotificationId::new)?;
            let properties: HashMap<String, String> = properties.into_iter().collect();
            ctx.notifications
                .send_notification(&id, &recipient, &properties)
                .await?;
            Ok(None)
        }
    }
}

async fn auth(command: AuthCommand, ctx: &Context) -> anyhow::Result<Option<Value>> {
    let client = ctx.client_credentials()?;
    let response = match command {
        AuthCommand::Login {
            username,
            password,
            options,
        } => {
            let user = match (username, password) {
                (Some(username), Some(password)) => Some(UserCredentials::new(username, password)),
                (Some(_), None) => bail!("--password is required with --username"),
                (None, _) => None,
            };
            ctx.iam
                .authenticate(client, user.as_ref(), &token_options(options))
                .await?
        }
        AuthCommand::Refresh {
            refresh_token,
            options,
        } => {
            ctx.iam
                .authentication_refresh(client, &refresh_token, &token_options(options))
                .await?
        }
    };
    output(&response)
}

async fn user(command: UserCommand, iam: &IamClient) -> anyhow::Result<Option<Value>> {
    match command {
        UserCommand::Create { user } => {
            let id = iam.create_user(&read_json(&user)?).await?;
            output(&json!({ "id": id }))
        }
        UserCommand::Get { id } => {
            let id = parse_id(id, "user id", UserId::new)?;
            output(&iam.get_user_by_id(&id).await?)
        }
        UserCommand::ByUsername { username } => {
            output(&iam.get_user_id_by_username(&username).await?)
        }
        UserCommand::Me => output(&iam.get_user().await?),
        UserCommand::Update { user } => {
            iam.update_user(&read_json(&user)?).await?;
            Ok(None)
        }
        UserCommand::Devices { id } => {
            let id = parse_id(id, "user id", UserId::new)?;
            output(&iam.get_user_devices(&id).await?)
        }
        UserCommand::AddGroups { id, groups } => {
            let id = parse_id(id, "user id", UserId::new)?;
            let groups = groups
                .into_iter()
                .map(|g| parse_id(g, "group id", GroupId::new))
                .collect::<anyhow::Result<Vec<_>>>()?;
            iam.add_groups_to_user(&id, &groups).await?;
            Ok(None)
        }
        UserCommand::RemoveGroup { id, group } => {
            let id = parse_id(id, "user id", UserId::new)?;
            let group = parse_id(group, "group id", GroupId::new)?;
            iam.delete_group_to_user(&id, &group).await?;
            Ok(None)
        }
        UserCommand::Find(args) => output(&iam.find_users(&find_params(args)).await?),
    }
}

fn token_options(args: TokenArgs) -> AuthenticationOptions {
    let mut options =
        AuthenticationOptions::new().expiration(Duration::from_secs(args.expiration_secs));
    if !args.scopes.is_empty() {
        options = options.scope(args.scopes);
    }
    if let Some(device_id) = args.device_id {
        options = options.device_id(device_id);
    }
    if let Some(version) = args.client_version {
        options = options.version(version);
    }
    options
}

fn find_params(args: FindArgs) -> RequestParams {
    RequestParams {
        query: args.query,
        search: args.search,
        sort: args.sort,
        aggregation: args.aggregation,
        page: args.page,
        page_size: args.page_size,
    }
}

fn parse_id<T>(raw: String, what: &str, make: impl FnOnce(String) -> Option<T>) -> anyhow::Result<T> {
    make(raw).with_context(|| format!("{what} must not be empty"))
}

/// Parses inline JSON, or the contents of a file when `raw` is `@path`.
fn read_json<T: DeserializeOwned>(raw: &str) -> anyhow::Result<T> {
    match raw.strip_prefix('@') {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {path}"))?;
            serde_json::from_str(&text).with_context(|| format!("invalid JSON in {path}"))
        }
        None => serde_json::from_str(raw).context("invalid JSON argument"),
    }
}

fn output<T: Serialize>(value: &T) -> anyhow::Result<Option<Value>> {
    Ok(Some(serde_json::to_value(value)?))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use sdk::testing::StubTransport;
    use sdk::{ApiError, EndpointConfig, Method, RawResponse, RequestBody, Sort};

    use super::*;

    fn context(stub: &Arc<StubTransport>, with_client: bool) -> Context {
        let endpoints = EndpointConfig {
            iam_url: "https://iam.test".into(),
            notifications_url: "https://notifications.test".into(),
            ..EndpointConfig::default()
        };
        Context {
            iam: IamClient::new(stub.clone(), &endpoints).with_access_token("tok"),
            notifications: NotificationsClient::new(stub.clone(), &endpoints)
                .with_access_token("tok"),
            client_credentials: with_client.then(|| ClientCredentials::new("client-1", "secret")),
        }
    }

    #[tokio::test]
    async fn user_create_prints_new_id() {
        let stub = Arc::new(StubTransport::new());
        stub.respond(
            RawResponse::new(201).with_header("location", "https://iam.test/v1.0/user/u-9"),
        );

        let out = execute(
            Command::User {
                command: UserCommand::Create {
                    user: r#"{"username":"ana","email":"ana@example.com"}"#.into(),
                },
            },
            &context(&stub, false),
        )
        .await
        .unwrap();

        assert_eq!(out, Some(json!({"id": "u-9"})));
        let req = stub.only_request();
        assert_eq!(req.method, Method::Post);
        assert_eq!(
            req.body,
            RequestBody::Json(json!({"username": "ana", "email": "ana@example.com"}))
        );
    }

    #[tokio::test]
    async fn add_groups_sends_every_group() {
        let stub = Arc::new(StubTransport::new());
        stub.respond(RawResponse::new(204));

        let out = execute(
            Command::User {
                command: UserCommand::AddGroups {
                    id: "u-1".into(),
                    groups: vec!["g-1".into(), "g-2".into()],
                },
            },
            &context(&stub, false),
        )
        .await
        .unwrap();

        assert_eq!(out, None);
        let req = stub.only_request();
        assert_eq!(req.path_string(), "/v1.0/user/u-1/group");
        assert_eq!(req.body, RequestBody::Json(json!(["g-1", "g-2"])));
    }

    #[tokio::test]
    async fn find_passes_sort_and_paging() {
        let stub = Arc::new(StubTransport::new());
        stub.respond(RawResponse::json(200, &json!([{"id": "u-1"}])));

        let out = execute(
            Command::User {
                command: UserCommand::Find(FindArgs {
                    query: None,
                    search: Some("ana".into()),
                    sort: Some(Sort::desc("username")),
                    aggregation: None,
                    page: Some(1),
                    page_size: Some(10),
                }),
            },
            &context(&stub, false),
        )
        .await
        .unwrap();

        assert_eq!(out, Some(json!([{"id": "u-1"}])));
        let req = stub.only_request();
        assert_eq!(req.query_value("api:search"), Some("ana"));
        assert_eq!(req.query_value("api:sort"), Some(r#"{"username":"desc"}"#));
        assert_eq!(req.query_value("api:pageSize"), Some("10"));
    }

    #[tokio::test]
    async fn notification_send_collects_properties() {
        let stub = Arc::new(StubTransport::new());
        stub.respond(RawResponse::new(200));

        execute(
            Command::Notification {
                command: NotificationCommand::Send {
                    id: "welcome".into(),
                    recipient: "ana@example.com".into(),
                    properties: vec![("name".into(), "Ana".into())],
                },
            },
            &context(&stub, false),
        )
        .await
        .unwrap();

        let req = stub.only_request();
        assert_eq!(req.base_url, "https://notifications.test");
        assert_eq!(
            req.body,
            RequestBody::Json(json!({
                "notificationId": "welcome",
                "recipient": "ana@example.com",
                "properties": {"name": "Ana"}
            }))
        );
    }

    #[tokio::test]
    async fn auth_without_client_credentials_makes_no_call() {
        let stub = Arc::new(StubTransport::new());

        let err = execute(
            Command::Auth {
                command: AuthCommand::Refresh {
                    refresh_token: "ref-1".into(),
                    options: TokenArgs {
                        scopes: Vec::new(),
                        expiration_secs: 3600,
                        device_id: None,
                        client_version: None,
                    },
                },
            },
            &context(&stub, false),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("client credentials required"));
        assert!(stub.requests().is_empty());
    }

    #[tokio::test]
    async fn api_error_survives_as_source() {
        let stub = Arc::new(StubTransport::new());
        stub.respond(RawResponse::json(
            404,
            &json!({"error": "not_found", "errorDescription": "No such scope"}),
        ));

        let err = execute(
            Command::Scope {
                command: ScopeCommand::Get { id: "s-1".into() },
            },
            &context(&stub, false),
        )
        .await
        .unwrap_err();

        let api = err.downcast_ref::<ApiError>().unwrap();
        assert_eq!(api.status, Some(404));
        assert_eq!(api.error, "not_found");
    }

    #[tokio::test]
    async fn empty_id_is_rejected_before_dispatch() {
        let stub = Arc::new(StubTransport::new());

        let err = execute(
            Command::User {
                command: UserCommand::Get { id: String::new() },
            },
            &context(&stub, false),
        )
        .await
        .unwrap_err();

        assert!(err.to_string().contains("user id"));
        assert!(stub.requests().is_empty());
    }

    #[test]
    fn read_json_reports_bad_input() {
        assert!(read_json::<Value>("{not json").is_err());
        assert!(read_json::<Value>("@/nonexistent/user.json").is_err());
        assert_eq!(read_json::<Value>(r#"{"a":1}"#).unwrap(), json!({"a": 1}));
    }
}
