//! `/sales`: ring up a sale, read sales back.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use tracing::info;

use till_core::{NewSale, Page, Permission, Sale};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery};
use crate::routes::PageQuery;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/sales", get(list_sales).post(create_sale))
        .route("/sales/{id}", get(get_sale))
}

/// `POST /sales`: the whole sale commits atomically or nothing does.
///
/// The cashier is the token's subject, never a body field.
pub async fn create_sale(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(cart): ApiJson<NewSale>,
) -> ApiResult<(StatusCode, Json<Sale>)> {
    user.require(Permission::SalesWrite)?;

    let sale = user.scope(&state).processor().create_sale(&user.user_id, &cart).await?;

    info!(
        tenant_id = %user.tenant_id,
        sale_number = %sale.sale_number,
        "POST /sales"
    );
    Ok((StatusCode::CREATED, Json(sale)))
}

pub async fn get_sale(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<Sale>> {
    user.require(Permission::SalesRead)?;
    Ok(Json(user.scope(&state).sales().get(&id).await?))
}

pub async fn list_sales(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(page): ApiQuery<PageQuery>,
) -> ApiResult<Json<Page<Sale>>> {
    user.require(Permission::SalesRead)?;
    Ok(Json(user.scope(&state).sales().list(page.skip, page.limit).await?))
}
