//! # Poker Night API server
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PWA ───► HTTP (8000) ───► routes ───► services ───► SQLite            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use anyhow::Context;
use tracing::{error, info, warn};

use pokernight_api::{create_router, logging, ApiConfig, AppState};
use pokernight_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    info!("Starting Poker Night API server...");

    let config = ApiConfig::load().context("Invalid configuration")?;
    info!(
        bind_addr = %config.bind_addr,
        database = %config.database_path.display(),
        version = %config.app_version,
        "Configuration loaded"
    );

    if config.uses_dev_secret() {
        warn!("POKERNIGHT_JWT_SECRET is not set; using the development secret");
    }
    if config.admin_password_hash.is_none() {
        warn!("POKERNIGHT_ADMIN_PASSWORD_HASH is not set; admin login is disabled");
    }

    if let Some(parent) = config.database_path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Cannot create {}", parent.display()))?;
        }
    }

    // Connects and applies pending migrations
    let db = Database::new(DbConfig::new(config.database_path.clone()))
        .await
        .context("Failed to open database")?;
    info!("Database ready");

    let bind_addr = config.bind_addr;
    let state = AppState::new(db.clone(), config);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("Cannot bind {}", bind_addr))?;
    info!(%bind_addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
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

    info!("Shutdown signal received, starting graceful shutdown...");
}
