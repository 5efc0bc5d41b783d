//! # Till API server binary
//!
//! ```text
//! load ApiConfig ──► init tracing ──► open SQLite (migrate) ──► serve
//!                                                             until SIGINT/SIGTERM
//! ```

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{info, warn};

use till_api::{build_app, init_tracing, ApiConfig, AppState, JwtManager};
use till_db::Database;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ApiConfig::load(None).context("Failed to load configuration")?;
    init_tracing(config.logging.json);

    info!("Starting Till API server...");
    info!(
        bind = %config.bind_address(),
        database = %config.database.path.display(),
        max_connections = config.database.max_connections,
        sale_max_attempts = config.sales.max_attempts,
        "Configuration loaded"
    );

    let db = Database::new(config.db_config())
        .await
        .context("Failed to open database")?;
    info!("Database ready");

    let jwt = JwtManager::new(&config.auth.jwt_secret, config.auth.token_lifetime_secs);
    let app = build_app(AppState::new(db.clone(), jwt));

    let listener = TcpListener::bind(config.bind_address())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_address()))?;
    info!(addr = %config.bind_address(), "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Resolves on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
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
                warn!(error = %e, "Failed to install SIGTERM handler");
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
