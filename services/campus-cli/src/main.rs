//! Campus CLI
//!
//! Command-line client for the school-administration REST API:
//! 1. Loads config and the stored session
//! 2. Builds an `ApiClient` with the bearer/refresh middleware installed
//! 3. Issues the requested call and prints the response body
//!
//! Expired access tokens are refreshed transparently. A failed refresh or a
//! token the server keeps rejecting clears the stored session.

mod cli;
mod config;
mod metrics;

use anyhow::{Context, Result};
use api_client::{ApiClient, ApiRequest, ApiResponse};
use session_auth::{Session, SessionStore, StoredSession};
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Command;
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // JSON logs on stderr so stdout carries only the response body
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = cli::parse(&args)?;

    let prometheus = if invocation.print_metrics {
        Some(metrics::install_recorder().context("failed to install metrics recorder")?)
    } else {
        None
    };

    let config_path = Config::resolve_path(invocation.config_path.as_deref());
    debug!(path = %config_path.display(), "loading configuration");
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    let outcome = run(&config, invocation.command).await;

    if let Some(handle) = prometheus {
        eprintln!("{}", handle.render());
    }

    println!("{}", outcome?);
    Ok(())
}

/// Execute one command and return what should be printed to stdout.
async fn run(config: &Config, command: Command) -> Result<String> {
    let store = Arc::new(
        SessionStore::load(config.auth.session_file.clone())
            .await
            .context("failed to load session")?,
    );

    match command {
        Command::Login {
            access,
            refresh,
            expires_in,
        } => {
            let session = Session {
                access,
                refresh,
                expires: session_auth::expiry_from_now(expires_in),
            };
            store
                .replace(session)
                .await
                .context("failed to store session")?;
            info!(path = %store.path().display(), "session stored");
            Ok("session stored".into())
        }
        Command::Logout => {
            store.clear().await.context("failed to clear session")?;
            Ok("logged out".into())
        }
        Command::Status => Ok(status(&store).await),
        Command::Request { method, path, body } => {
            let client = build_client(config, store)?;
            let mut request = ApiRequest::new(method, path);
            request.body = body;
            let response = client.send(request).await?;
            Ok(render_body(&response))
        }
    }
}

/// Wire the bearer/refresh middleware onto a client for the configured API.
fn build_client(config: &Config, store: Arc<SessionStore>) -> Result<ApiClient> {
    let http = reqwest::Client::builder()
        .timeout(config.request_timeout())
        .build()
        .context("failed to build token endpoint client")?;
    let handlers = Arc::new(StoredSession::new(
        store,
        http,
        config.auth.token_endpoint.as_str(),
        config.auth.client_id.as_str(),
    ));

    let builder = ApiClient::builder()
        .base_url(config.api.base_url.as_str())
        .timeout(config.request_timeout())
        .user_agent(concat!("campus/", env!("CARGO_PKG_VERSION")));
    let (builder, _coordinator) = auth_refresh::install(builder, handlers, config.refresh_timeout());

    builder.build().context("failed to build API client")
}

async fn status(store: &SessionStore) -> String {
    let report = match store.get().await {
        Some(session) => serde_json::json!({
            "logged_in": true,
            "expired": session.is_expired(session_auth::now_millis()),
            "expires": session.expires,
        }),
        None => serde_json::json!({ "logged_in": false }),
    };
    serde_json::to_string_pretty(&report).unwrap_or_else(|_| report.to_string())
}

/// Pretty JSON when the body decodes, raw text otherwise.
fn render_body(response: &ApiResponse) -> String {
    match response.json::<serde_json::Value>() {
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string()),
        Err(_) => response.text(),
    }
}
