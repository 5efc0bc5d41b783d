//! `/products`: catalog reads and writes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use till_core::{NewProduct, Page, Permission, Product, ProductPatch};

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::extract::{ApiJson, ApiQuery};
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/search", get(search_products))
        .route("/products/sku/{sku}", get(get_by_sku))
        .route("/products/barcode/{barcode}", get(get_by_barcode))
        .route(
            "/products/{id}",
            get(get_product).patch(update_product).delete(delete_product),
        )
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub include_inactive: bool,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    /// Remove the row instead of deactivating it.
    #[serde(default)]
    pub hard: bool,
}

fn default_limit() -> i64 {
    50
}

pub async fn list_products(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<Page<Product>>> {
    user.require(Permission::ProductsRead)?;
    let page = user
        .scope(&state)
        .products()
        .list(query.skip, query.limit, query.include_inactive)
        .await?;
    Ok(Json(page))
}

pub async fn search_products(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> ApiResult<Json<Vec<Product>>> {
    user.require(Permission::ProductsRead)?;
    Ok(Json(user.scope(&state).products().search(&query.q, query.limit).await?))
}

pub async fn get_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    user.require(Permission::ProductsRead)?;
    Ok(Json(user.scope(&state).products().get(&id).await?))
}

pub async fn get_by_sku(
    State(state): State<AppState>,
    user: AuthUser,
    Path(sku): Path<String>,
) -> ApiResult<Json<Product>> {
    user.require(Permission::ProductsRead)?;
    user.scope(&state)
        .products()
        .get_by_sku(&sku)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product", &sku))
}

pub async fn get_by_barcode(
    State(state): State<AppState>,
    user: AuthUser,
    Path(barcode): Path<String>,
) -> ApiResult<Json<Product>> {
    user.require(Permission::ProductsRead)?;
    user.scope(&state)
        .products()
        .get_by_barcode(&barcode)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Product", &barcode))
}

pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<NewProduct>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    user.require(Permission::ProductsWrite)?;
    let product = user
        .scope(&state)
        .products()
        .create(req, Some(user.user_id.as_str()))
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<ProductPatch>,
) -> ApiResult<Json<Product>> {
    user.require(Permission::ProductsWrite)?;
    if patch.is_empty() {
        return Err(ApiError::validation("Patch contains no fields"));
    }
    Ok(Json(user.scope(&state).products().update(&id, &patch).await?))
}

/// Deactivates by default; `?hard=true` deletes the row.
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiQuery(query): ApiQuery<DeleteQuery>,
) -> ApiResult<StatusCode> {
    user.require(Permission::ProductsWrite)?;
    let products = user.scope(&state).products();
    if query.hard {
        products.delete(&id).await?;
    } else {
        products.deactivate(&id).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}
