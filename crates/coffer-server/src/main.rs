//! # coffer-server
//!
//! HTTP backend for Coffer, a small personal file store.
//!
//! This binary provides:
//! - **Accounts**: registration, login and logout with bcrypt-hashed
//!   passwords and expiring session tokens
//! - **File storage**: upload, download, rename, delete and list binary
//!   files owned by the logged-in user, kept in SQLite
//! - **REST API** (axum) with health and instance info endpoints

mod api;
mod auth;
mod config;
mod error;
mod extract;

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::EnvFilter;

use coffer_store::Database;

use crate::api::AppState;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,coffer_server=debug")),
        )
        .init();

    info!("Starting Coffer server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Open the database (runs pending migrations)
    // -----------------------------------------------------------------------
    let path = config.database_path.clone();
    let pool_size = config.db_pool_size;
    let db = tokio::task::spawn_blocking(move || Database::open_at(&path, pool_size)).await??;

    let http_addr = config.http_addr;
    let app_state = AppState {
        db,
        config: Arc::new(config),
    };

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    tokio::select! {
        result = api::serve(app_state, http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
