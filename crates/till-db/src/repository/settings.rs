//! # Settings Repository
//!
//! One tenant's configuration. Business details are columns on the tenant
//! row; the rest are JSON documents in `tenant_settings`, upserted whole.

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::{DbError, DbResult};
use crate::repository::tenant::TENANT_COLUMNS;
use till_core::settings::SettingKey;
use till_core::{AllSettings, BusinessInfo, ReceiptTemplate, Tenant, VatRates};

#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl SettingsRepository {
    pub fn new(pool: SqlitePool, tenant_id: String) -> Self {
        SettingsRepository { pool, tenant_id }
    }

    // =========================================================================
    // Business info (tenant row)
    // =========================================================================

    pub async fn business_info(&self) -> DbResult<BusinessInfo> {
        let sql = format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE id = ?1");
        let tenant = sqlx::query_as::<_, Tenant>(&sql)
            .bind(&self.tenant_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Tenant", &self.tenant_id))?;

        Ok(BusinessInfo {
            name: tenant.name,
            address: tenant.address,
            phone: tenant.phone,
            email: tenant.email,
            vat_number: tenant.vat_number,
            currency: tenant.currency,
        })
    }

    pub async fn update_business_info(&self, mut info: BusinessInfo) -> DbResult<BusinessInfo> {
        info.normalize()?;

        let result = sqlx::query(
            r#"
            UPDATE tenants
            SET name = ?1, address = ?2, phone = ?3, email = ?4, vat_number = ?5, currency = ?6
            WHERE id = ?7
            "#,
        )
        .bind(&info.name)
        .bind(&info.address)
        .bind(&info.phone)
        .bind(&info.email)
        .bind(&info.vat_number)
        .bind(&info.currency)
        .bind(&self.tenant_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Tenant", &self.tenant_id));
        }

        info!(tenant_id = %self.tenant_id, "Business info updated");
        Ok(info)
    }

    // =========================================================================
    // JSON documents
    // =========================================================================

    pub async fn vat_rates(&self) -> DbResult<VatRates> {
        self.load(SettingKey::VatRates).await
    }

    pub async fn update_vat_rates(&self, rates: VatRates) -> DbResult<VatRates> {
        rates.validate()?;
        self.store(SettingKey::VatRates, &rates).await?;
        Ok(rates)
    }

    pub async fn receipt_template(&self) -> DbResult<ReceiptTemplate> {
        self.load(SettingKey::ReceiptTemplate).await
    }

    pub async fn update_receipt_template(
        &self,
        template: ReceiptTemplate,
    ) -> DbResult<ReceiptTemplate> {
        template.validate()?;
        self.store(SettingKey::ReceiptTemplate, &template).await?;
        Ok(template)
    }

    pub async fn all(&self) -> DbResult<AllSettings> {
        Ok(AllSettings {
            business: self.business_info().await?,
            vat_rates: self.vat_rates().await?,
            receipt: self.receipt_template().await?,
        })
    }

    /// Reads a document, falling back to its default when absent.
    async fn load<T: DeserializeOwned + Default>(&self, key: SettingKey) -> DbResult<T> {
        let raw: Option<String> = sqlx::query_scalar(
            "SELECT value FROM tenant_settings WHERE tenant_id = ?1 AND key = ?2",
        )
        .bind(&self.tenant_id)
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await?;

        match raw {
            None => Ok(T::default()),
            Some(raw) => serde_json::from_str(&raw).map_err(|e| {
                warn!(tenant_id = %self.tenant_id, key = key.as_str(), error = %e, "Unreadable setting");
                DbError::Internal(format!("setting {} is not valid JSON: {e}", key.as_str()))
            }),
        }
    }

    async fn store<T: Serialize>(&self, key: SettingKey, value: &T) -> DbResult<()> {
        let raw = serde_json::to_string(value)
            .map_err(|e| DbError::Internal(format!("cannot encode {}: {e}", key.as_str())))?;

        sqlx::query(
            r#"
            INSERT INTO tenant_settings (tenant_id, key, value, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT (tenant_id, key)
            DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(&self.tenant_id)
        .bind(key.as_str())
        .bind(&raw)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        info!(tenant_id = %self.tenant_id, key = key.as_str(), "Setting stored");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::setup;

    #[tokio::test]
    async fn test_defaults_when_nothing_stored() {
        let (db, tenant, _) = setup().await;
        let all = db.tenant(&tenant.id).settings().all().await.unwrap();

        assert_eq!(all.business.name, "Corner Shop");
        assert_eq!(all.business.currency, "GBP");
        assert_eq!(all.vat_rates, VatRates::default());
        assert_eq!(all.receipt, ReceiptTemplate::default());
    }

    #[tokio::test]
    async fn test_documents_upsert() {
        let (db, tenant, _) = setup().await;
        let settings = db.tenant(&tenant.id).settings();

        let rates = VatRates {
            standard_bps: 2100,
            reduced_bps: 600,
            zero_bps: 0,
        };
        settings.update_vat_rates(rates).await.unwrap();
        settings
            .update_vat_rates(VatRates {
                standard_bps: 2300,
                ..rates
            })
            .await
            .unwrap();
        assert_eq!(settings.vat_rates().await.unwrap().standard_bps, 2300);

        let template = ReceiptTemplate {
            header: Some("Corner Shop".into()),
            footer: Some("Thank you!".into()),
            show_vat_breakdown: false,
        };
        settings.update_receipt_template(template.clone()).await.unwrap();
        assert_eq!(settings.receipt_template().await.unwrap(), template);

        let invalid = VatRates {
            standard_bps: 20_000,
            ..rates
        };
        assert!(matches!(
            settings.update_vat_rates(invalid).await,
            Err(DbError::Domain(_))
        ));
    }

    #[tokio::test]
    async fn test_business_info_writes_tenant_row() {
        let (db, tenant, _) = setup().await;
        let settings = db.tenant(&tenant.id).settings();

        let info = BusinessInfo {
            name: "Corner Shop Ltd".into(),
            address: Some("1 High Street".into()),
            phone: None,
            email: Some("hello@corner.test".into()),
            vat_number: Some("GB123456789".into()),
            currency: "eur".into(),
        };
        let saved = settings.update_business_info(info).await.unwrap();
        assert_eq!(saved.currency, "EUR");

        let tenant = db.tenants().get(&tenant.id).await.unwrap();
        assert_eq!(tenant.name, "Corner Shop Ltd");
        assert_eq!(tenant.vat_number.as_deref(), Some("GB123456789"));
        assert_eq!(tenant.currency, "EUR");
    }

    #[tokio::test]
    async fn test_settings_are_per_tenant() {
        let (db, tenant, _) = setup().await;
        let other = db.tenants().create("Other", None).await.unwrap();

        db.tenant(&tenant.id)
            .settings()
            .update_receipt_template(ReceiptTemplate {
                footer: Some("Mine".into()),
                ..ReceiptTemplate::default()
            })
            .await
            .unwrap();

        let theirs = db.tenant(&other.id).settings().receipt_template().await.unwrap();
        assert_eq!(theirs.footer, None);
    }
}
