//! # agora-server
//!
//! HTTP backend for the Agora social feed.
//!
//! This binary provides:
//! - **Posts** with likes and comments, stored as one JSON document per post
//! - **Users** whose display name and avatar are copied onto what they write
//! - **REST API** (axum) under `/api/posts` and `/api/users`
//!
//! Callers are authenticated upstream; the resolved user id arrives in the
//! `x-user-id` header (configurable via `IDENTITY_HEADER`).

mod api;
mod auth;
mod config;
mod error;
mod service;

use agora_shared::constants::APP_NAME;
use agora_store::Database;
use tokio::signal::{self, ctrl_c};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::api::AppState;
use crate::config::ServerConfig;
use crate::service::SharedDb;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,agora_server=debug")),
        )
        .init();

    info!("Starting {} server v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Open the document store
    // -----------------------------------------------------------------------
    let database = match &config.database_path {
        Some(path) => Database::open_at(path)?,
        None => Database::new()?,
    };
    let db = SharedDb::new(database);

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server until a shutdown signal arrives
    // -----------------------------------------------------------------------
    let http_addr = config.http_addr;
    let app_state = AppState::new(db.clone(), config);

    if let Err(e) = api::serve(app_state, http_addr, shutdown_signal()).await {
        tracing::error!(error = %e, "HTTP server failed");
        return Err(e);
    }

    // -----------------------------------------------------------------------
    // 5. Teardown
    // -----------------------------------------------------------------------
    db.close()?;
    info!("Server shut down cleanly");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
