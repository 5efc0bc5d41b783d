use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::warn;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    /// Embedded migrations not yet applied. `None` if the count failed.
    pub pending_migrations: Option<usize>,
    pub version: &'static str,
}

/// `GET /health`, unauthenticated. 503 when the database does not answer
/// or is behind the binary's schema.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let database = state.db.health_check().await;
    let pending_migrations = if database {
        match state.db.migration_status().await {
            Ok((total, applied)) => Some(total.saturating_sub(applied)),
            Err(e) => {
                warn!(error = %e, "Could not read migration status");
                None
            }
        }
    } else {
        None
    };

    let healthy = database && pending_migrations == Some(0);
    let (status, label) = if healthy {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };

    (
        status,
        Json(HealthResponse {
            status: label,
            database,
            pending_migrations,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
