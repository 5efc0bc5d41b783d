//! # Till API
//!
//! Multi-tenant HTTP server for Till POS.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           Till API Routes                               │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  /sales        │  │  /products     │  │  /inventory                ││
//! │  │                │  │  /categories   │  │                            ││
//! │  │ • POST (atomic)│  │ • CRUD, search │  │ • levels, low-stock        ││
//! │  │ • GET list/id  │  │ • by sku/code  │  │ • adjust, history, audit   ││
//! │  └────────────────┘  └────────────────┘  └────────────────────────────┘│
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐                                │
//! │  │  /reports      │  │  /health       │                                │
//! │  │ • daily, range │  │ (no auth)      │                                │
//! │  │ • by-product   │  │                │                                │
//! │  └────────────────┘  └────────────────┘                                │
//! │                                                                         │
//! │  Bearer JWT ──► AuthUser { user, tenant, role } ──► TenantScope        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config`]. Environment variables:
//! - `TILL_CONFIG` - path of the TOML config file
//! - `TILL_PORT` - HTTP port (default: 8080)
//! - `TILL_DATABASE_PATH` - SQLite file (default: ./till.db)
//! - `TILL_JWT_SECRET` - Secret for JWT validation (required)
//! - `TILL_LOG_JSON` - JSON log lines
//! - `RUST_LOG` - log filter (default: `info,till_api=debug,till_db=debug,sqlx=warn`)

use std::sync::Arc;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use till_db::Database;

pub mod auth;
pub mod config;
pub mod error;
pub mod extract;
pub mod routes;

// Re-exports
pub use auth::{AuthUser, Claims, JwtManager};
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub jwt: Arc<JwtManager>,
}

impl AppState {
    pub fn new(db: Database, jwt: JwtManager) -> Self {
        AppState {
            db,
            jwt: Arc::new(jwt),
        }
    }
}

/// Builds the full HTTP router.
pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(routes::health::health))
        .merge(routes::router())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` wins over the default filter.
pub fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,till_api=debug,till_db=debug,sqlx=warn"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(true);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
