//! `/suppliers`: who the tenant buys from.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use till_core::{NewSupplier, Permission, Supplier, SupplierPatch};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiQuery};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/suppliers", get(list_suppliers).post(create_supplier))
        .route("/suppliers/search", get(search_suppliers))
        .route(
            "/suppliers/{id}",
            get(get_supplier).patch(update_supplier).delete(delete_supplier),
        )
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: String,
    #[serde(default = "default_search_limit")]
    pub limit: i64,
}

fn default_search_limit() -> i64 {
    20
}

pub async fn list_suppliers(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<Supplier>>> {
    user.require(Permission::SuppliersRead)?;
    Ok(Json(user.scope(&state).suppliers().list().await?))
}

pub async fn search_suppliers(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> ApiResult<Json<Vec<Supplier>>> {
    user.require(Permission::SuppliersRead)?;
    Ok(Json(user.scope(&state).suppliers().search(&query.q, query.limit).await?))
}

pub async fn get_supplier(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Supplier>> {
    user.require(Permission::SuppliersRead)?;
    Ok(Json(user.scope(&state).suppliers().get(&id).await?))
}

pub async fn create_supplier(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<NewSupplier>,
) -> ApiResult<(StatusCode, Json<Supplier>)> {
    user.require(Permission::SuppliersWrite)?;
    let supplier = user.scope(&state).suppliers().create(req).await?;
    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn update_supplier(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<SupplierPatch>,
) -> ApiResult<Json<Supplier>> {
    user.require(Permission::SuppliersWrite)?;
    if patch.is_empty() {
        return Err(ApiError::validation("Patch contains no fields"));
    }
    Ok(Json(user.scope(&state).suppliers().update(&id, &patch).await?))
}

pub async fn delete_supplier(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    user.require(Permission::SuppliersWrite)?;
    user.scope(&state).suppliers().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
