//! `/reports`: rollups over completed sales.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use till_core::{DailySummary, Permission, ProductSales, RangeReport};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::ApiQuery;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/reports/daily", get(daily))
        .route("/reports/by-product", get(by_product))
        .route("/reports/range", get(range))
}

#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    /// Defaults to today (UTC).
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

pub async fn daily(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<DailyQuery>,
) -> ApiResult<Json<DailySummary>> {
    user.require(Permission::ReportsRead)?;
    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());
    Ok(Json(user.scope(&state).reports().daily_summary(date).await?))
}

pub async fn by_product(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<RangeQuery>,
) -> ApiResult<Json<Vec<ProductSales>>> {
    user.require(Permission::ReportsRead)?;
    let rows = user
        .scope(&state)
        .reports()
        .sales_by_product(query.start_date, query.end_date)
        .await?;
    Ok(Json(rows))
}

pub async fn range(
    State(state): State<AppState>,
    user: AuthUser,
    ApiQuery(query): ApiQuery<RangeQuery>,
) -> ApiResult<Json<RangeReport>> {
    user.require(Permission::ReportsRead)?;
    let report = user
        .scope(&state)
        .reports()
        .range_report(query.start_date, query.end_date)
        .await?;
    Ok(Json(report))
}
