// This is the entry point of the Drive log API.
//
// **Architecture Overview:**
// - `core/` = Business logic (log parsing, the Drive port, the log service)
// - `infra/` = Implementations of core traits (Google credentials, Drive HTTP client)
// - `http/` = axum routes and handlers
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Serve the HTTP API

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with several mod.rs files that all look the same.
#[path = "core/core_layer.rs"]
mod core;
#[path = "http/http_layer.rs"]
mod http;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::core::drive_logs::{DriveApi, DriveLogService};
use crate::http::AppState;
use crate::infra::google_drive::{token_provider, GoogleDriveClient};

const DEFAULT_LOG_FILTER: &str = "info,drive_log_api=debug";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .init();

    let config = AppConfig::from_env().context("Invalid configuration")?;

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // The credential provider is built once and handed to the Drive client;
    // the client goes into the service, the service into the router state.

    tracing::info!("Authenticating with Google...");
    let auth = token_provider(&config.auth)
        .await
        .context("Failed to set up Google credentials")?;

    let drive: Box<dyn DriveApi> = Box::new(GoogleDriveClient::new(auth));
    let logs = Arc::new(DriveLogService::new(drive, config.root_folder_id.clone()));
    tracing::info!(root_folder_id = logs.root_folder_id(), "Log service ready");

    let app = http::router(AppState { logs });

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(%addr, "Drive log API listening");

    axum::serve(listener, app).await?;
    Ok(())
}
