//! Corbel CLI entry point.
//!
//! This binary is the composition root. Responsibilities:
//!
//! 1. **Parse configuration**: load the TOML file (`--config`, else
//!    `corbel.toml` if present) and merge credentials from flags and
//!    `CORBEL_*` environment variables.
//! 2. **Wire observability**: install `tracing-subscriber` on stderr and, when
//!    `[telemetry] otlp_endpoint` is set, an OpenTelemetry OTLP exporter.
//! 3. **Construct infrastructure**: one [`transport::HttpTransport`] shared by
//!    the [`iam::IamClient`] and [`notifications::NotificationsClient`].
//! 4. **Run one subcommand** and print its result as pretty JSON on stdout.
//!
//! Exit status is `0` on success, `2` when the service (or the transport)
//! reported an [`sdk::ApiError`], which is printed as JSON on stderr, and `1`
//! for any other failure.

mod args;
mod commands;
mod config;
mod telemetry;

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use iam::IamClient;
use notifications::NotificationsClient;
use sdk::{ApiError, ClientCredentials, Secret, Transport};
use transport::HttpTransport;

use crate::args::Cli;
use crate::commands::Context;
use crate::config::CliConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => return report(&err),
    };
    let telemetry = match telemetry::init(cli.log_format, &config.telemetry) {
        Ok(telemetry) => telemetry,
        Err(err) => return report(&err),
    };

    let outcome = run(cli, config).await;
    telemetry.shutdown();

    match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => report(&err),
    }
}

async fn run(cli: Cli, config: CliConfig) -> anyhow::Result<()> {
    let transport: Arc<dyn Transport> = Arc::new(HttpTransport::new(&config.transport)?);

    let access_token = cli
        .access_token
        .map(Secret::from)
        .or(config.credentials.access_token);
    let client_id = cli.client_id.or(config.credentials.client_id);
    let client_secret = cli
        .client_secret
        .map(Secret::from)
        .or(config.credentials.client_secret);

    let mut iam = IamClient::new(transport.clone(), &config.endpoints);
    let mut notifications = NotificationsClient::new(transport, &config.endpoints);
    if let Some(token) = access_token {
        iam = iam.with_access_token(token.clone());
        notifications = notifications.with_access_token(token);
    }

    let ctx = Context {
        iam,
        notifications,
        client_credentials: client_id
            .zip(client_secret)
            .map(|(id, secret)| ClientCredentials::new(id, secret)),
    };

    if let Some(value) = commands::execute(cli.command, &ctx).await? {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}

fn report(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<ApiError>() {
        Some(api) => {
            let body = serde_json::to_string_pretty(api).unwrap_or_else(|_| api.to_string());
            eprintln!("{body}");
            ExitCode::from(2)
        }
        None => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
