//! `/settings`: business details, VAT rates, receipt template.
//!
//! Owners and managers read; only owners write.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use till_core::{AllSettings, BusinessInfo, Permission, ReceiptTemplate, VatRates};

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/settings", get(all_settings))
        .route("/settings/business", get(business).put(update_business))
        .route("/settings/vat-rates", get(vat_rates).put(update_vat_rates))
        .route("/settings/receipt", get(receipt).put(update_receipt))
}

pub async fn all_settings(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<AllSettings>> {
    user.require(Permission::SettingsRead)?;
    Ok(Json(user.scope(&state).settings().all().await?))
}

pub async fn business(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<BusinessInfo>> {
    user.require(Permission::SettingsRead)?;
    Ok(Json(user.scope(&state).settings().business_info().await?))
}

pub async fn update_business(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(info): ApiJson<BusinessInfo>,
) -> ApiResult<Json<BusinessInfo>> {
    user.require(Permission::SettingsWrite)?;
    Ok(Json(user.scope(&state).settings().update_business_info(info).await?))
}

pub async fn vat_rates(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<VatRates>> {
    user.require(Permission::SettingsRead)?;
    Ok(Json(user.scope(&state).settings().vat_rates().await?))
}

pub async fn update_vat_rates(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(rates): ApiJson<VatRates>,
) -> ApiResult<Json<VatRates>> {
    user.require(Permission::SettingsWrite)?;
    Ok(Json(user.scope(&state).settings().update_vat_rates(rates).await?))
}

pub async fn receipt(
    State(state): State<AppState>,
    user: AuthUser,
) -> ApiResult<Json<ReceiptTemplate>> {
    user.require(Permission::SettingsRead)?;
    Ok(Json(user.scope(&state).settings().receipt_template().await?))
}

pub async fn update_receipt(
    State(state): State<AppState>,
    user: AuthUser,
    ApiJson(template): ApiJson<ReceiptTemplate>,
) -> ApiResult<Json<ReceiptTemplate>> {
    user.require(Permission::SettingsWrite)?;
    Ok(Json(user.scope(&state).settings().update_receipt_template(template).await?))
}
