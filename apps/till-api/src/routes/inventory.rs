//! `/inventory`: stock levels and the movement ledger.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use till_core::{MovementType, Page, Permission, StockDiscrepancy, StockLevel, StockMovement};
use till_db::repository::stock::DEFAULT_HISTORY_LIMIT;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery};
use crate::routes::PageQuery;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/inventory", get(inventory))
        .route("/inventory/low-stock", get(low_stock))
        .route("/inventory/adjust", post(adjust))
        .route("/inventory/history/{product_id}", get(history))
        .route("/inventory/audit", get(audit))
}

#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    pub product_id: String,
    /// Signed, non-zero.
    pub quantity: i64,
    /// `adjustment` (default), `purchase` or `return`.
    #[serde(default = "default_movement_type")]
    pub movement_type: MovementType,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_movement_type() -> MovementType {
    MovementType::Adjustment
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_history_limit")]
    pub limit: i64,
}

fn default_history_limit() -> i64 {
    DEFAULT_HISTORY_LIMIT
}

pub async fn inventory(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> ApiResult<Json<Page<StockLevel>>> {
    user.require(Permission::InventoryRead)?;
    Ok(Json(user.scope(&state).stock().inventory(page.skip, page.limit).await?))
}

pub async fn low_stock(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<StockLevel>>> {
    user.require(Permission::InventoryRead)?;
    Ok(Json(user.scope(&state).stock().low_stock().await?))
}

pub async fn adjust(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<AdjustRequest>,
) -> ApiResult<(StatusCode, Json<StockMovement>)> {
    user.require(Permission::InventoryWrite)?;
    let movement = user
        .scope(&state)
        .stock()
        .adjust_stock(
            &req.product_id,
            req.quantity,
            req.movement_type,
            Some(user.user_id.as_str()),
            req.notes.as_deref(),
        )
        .await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

pub async fn history(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<String>,
    ApiQuery(query): ApiQuery<HistoryQuery>,
) -> ApiResult<Json<Vec<StockMovement>>> {
    user.require(Permission::InventoryRead)?;
    Ok(Json(user.scope(&state).stock().history(&product_id, query.limit).await?))
}

/// Products whose stock disagrees with their movements. Empty when healthy.
pub async fn audit(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<StockDiscrepancy>>> {
    user.require(Permission::InventoryWrite)?;
    Ok(Json(user.scope(&state).stock().verify_consistency().await?))
}
