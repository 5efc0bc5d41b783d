//! HTTP routes, one file per area.
//!
//! Handlers stay thin: authenticate, check the permission, call the
//! tenant-scoped repository, map the result.

use axum::Router;
use serde::Deserialize;

use crate::AppState;

pub mod categories;
pub mod health;
pub mod inventory;
pub mod products;
pub mod reports;
pub mod sales;
pub mod settings;
pub mod suppliers;

/// Every authenticated route.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(sales::router())
        .merge(products::router())
        .merge(categories::router())
        .merge(inventory::router())
        .merge(reports::router())
        .merge(suppliers::router())
        .merge(settings::router())
}

/// `?skip&limit` for paged lists.
#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    50
}
