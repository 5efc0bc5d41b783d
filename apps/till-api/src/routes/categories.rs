use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use till_core::{Category, CategoryPatch, NewCategory, Permission};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(list_categories).post(create_category))
        .route(
            "/categories/{id}",
            get(get_category).patch(update_category).delete(delete_category),
        )
}

pub async fn list_categories(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<Vec<Category>>> {
    user.require(Permission::ProductsRead)?;
    Ok(Json(user.scope(&state).categories().list().await?))
}

pub async fn get_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Category>> {
    user.require(Permission::ProductsRead)?;
    Ok(Json(user.scope(&state).categories().get(&id).await?))
}

pub async fn create_category(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(req): ApiJson<NewCategory>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    user.require(Permission::ProductsWrite)?;
    let category = user.scope(&state).categories().create(&req).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn update_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    ApiJson(patch): ApiJson<CategoryPatch>,
) -> ApiResult<Json<Category>> {
    user.require(Permission::ProductsWrite)?;
    Ok(Json(user.scope(&state).categories().update(&id, &patch).await?))
}

pub async fn delete_category(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    user.require(Permission::ProductsWrite)?;
    user.scope(&state).categories().delete(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
