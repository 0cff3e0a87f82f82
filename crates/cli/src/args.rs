//! Command line surface.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use sdk::Sort;

#[derive(Debug, Parser)]
#[command(
    name = "corbel",
    version,
    about = "Command line client for the Corbel IAM and notifications services"
)]
pub struct Cli {
    /// TOML configuration file. Defaults to `corbel.toml` when present.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log output format (written to stderr).
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    #[arg(long, env = "CORBEL_CLIENT_ID", global = true)]
    pub client_id: Option<String>,

    #[arg(long, env = "CORBEL_CLIENT_SECRET", hide_env_values = true, global = true)]
    pub client_secret: Option<String>,

    /// Bearer token used for every non-auth call.
    #[arg(long, env = "CORBEL_ACCESS_TOKEN", hide_env_values = true, global = true)]
    pub access_token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Obtain or refresh access tokens.
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
    /// Inspect scopes.
    Scope {
        #[command(subcommand)]
        command: ScopeCommand,
    },
    /// Manage users.
    User {
        #[command(subcommand)]
        command: UserCommand,
    },
    /// Manage groups.
    Group {
        #[command(subcommand)]
        command: GroupCommand,
    },
    /// Send notifications.
    Notification {
        #[command(subcommand)]
        command: NotificationCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum AuthCommand {
    /// Request a token for the client, or for a user when `--username` is given.
    Login {
        #[arg(long, requires = "password")]
        username: Option<String>,
        #[arg(long, env = "CORBEL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        #[command(flatten)]
        options: TokenArgs,
    },
    /// Exchange a refresh token for a new access token.
    Refresh {
        #[arg(long)]
        refresh_token: String,
        #[command(flatten)]
        options: TokenArgs,
    },
}

#[derive(Debug, Args)]
pub struct TokenArgs {
    /// Requested scopes (comma separated or repeated).
    #[arg(long = "scope", value_delimiter = ',')]
    pub scopes: Vec<String>,
    /// Assertion lifetime in seconds.
    #[arg(long, default_value_t = 3600)]
    pub expiration_secs: u64,
    #[arg(long)]
    pub device_id: Option<String>,
    /// Client application version reported to the IAM service.
    #[arg(long)]
    pub client_version: Option<String>,
}

#[derive(Debug, Subcommand)]
pub enum ScopeCommand {
    Get { id: String },
}

#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// Create a user from JSON (inline or `@file`); prints the new id.
    Create { user: String },
    Get { id: String },
    ByUsername { username: String },
    /// The user owning the access token.
    Me,
    /// Update a user from JSON (inline or `@file`). Without an `id` the
    /// token's own user is updated.
    Update { user: String },
    Devices { id: String },
    AddGroups {
        id: String,
        #[arg(required = true)]
        groups: Vec<String>,
    },
    RemoveGroup { id: String, group: String },
    Find(FindArgs),
}

#[derive(Debug, Args)]
pub struct FindArgs {
    /// Query expression (JSON).
    #[arg(long)]
    pub query: Option<String>,
    /// Free-text search.
    #[arg(long)]
    pub search: Option<String>,
    /// `field` or `field:asc|desc`.
    #[arg(long, value_parser = parse_sort)]
    pub sort: Option<Sort>,
    /// Aggregation expression (JSON).
    #[arg(long)]
    pub aggregation: Option<String>,
    #[arg(long)]
    pub page: Option<u32>,
    #[arg(long)]
    pub page_size: Option<u32>,
}

#[derive(Debug, Subcommand)]
pub enum GroupCommand {
    /// Create a group from JSON (inline or `@file`); prints the new id.
    Create { group: String },
}

#[derive(Debug, Subcommand)]
pub enum NotificationCommand {
    Send {
        id: String,
        recipient: String,
        /// Template property as `key=value`; may be repeated.
        #[arg(long = "property", value_parser = parse_property)]
        properties: Vec<(String, String)>,
    },
}

pub fn parse_sort(raw: &str) -> Result<Sort, String> {
    let (field, direction) = raw.split_once(':').unwrap_or((raw, "asc"));
    if field.is_empty() {
        return Err("sort field must not be empty".into());
    }
    match direction {
        "asc" => Ok(Sort::asc(field)),
        "desc" => Ok(Sort::desc(field)),
        other => Err(format!("unknown sort direction '{other}' (expected asc or desc)")),
    }
}

pub fn parse_property(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_owned(), value.to_owned())),
        _ => Err(format!("expected key=value, got '{raw}'")),
    }
}
