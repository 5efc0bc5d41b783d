//! # Supplier Repository
//!
//! CRUD over one tenant's suppliers. Deletes are hard: nothing else in the
//! schema references a supplier.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::escape_like;
use till_core::validation::{validate_page, validate_search_query};
use till_core::{NewSupplier, Supplier, SupplierPatch, ValidationError};

const SUPPLIER_COLUMNS: &str = "id, tenant_id, name, contact_person, email, phone, address, city, \
     postal_code, country, tax_number, registration_number, bank_account, bank_name, \
     payment_terms, min_order_amount_cents, delivery_days, notes, is_active, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool, tenant_id: String) -> Self {
        SupplierRepository { pool, tenant_id }
    }

    pub async fn create(&self, req: NewSupplier) -> DbResult<Supplier> {
        req.validate()?;

        let supplier = req.into_supplier(
            Uuid::new_v4().to_string(),
            self.tenant_id.clone(),
            Utc::now(),
        );

        let sql = format!(
            "INSERT INTO suppliers ({SUPPLIER_COLUMNS}) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21)"
        );
        sqlx::query(&sql)
            .bind(&supplier.id)
            .bind(&supplier.tenant_id)
            .bind(&supplier.name)
            .bind(&supplier.contact_person)
            .bind(&supplier.email)
            .bind(&supplier.phone)
            .bind(&supplier.address)
            .bind(&supplier.city)
            .bind(&supplier.postal_code)
            .bind(&supplier.country)
            .bind(&supplier.tax_number)
            .bind(&supplier.registration_number)
            .bind(&supplier.bank_account)
            .bind(&supplier.bank_name)
            .bind(&supplier.payment_terms)
            .bind(supplier.min_order_amount_cents)
            .bind(supplier.delivery_days)
            .bind(&supplier.notes)
            .bind(supplier.is_active)
            .bind(supplier.created_at)
            .bind(supplier.updated_at)
            .execute(&self.pool)
            .await?;

        info!(tenant_id = %self.tenant_id, supplier_id = %supplier.id, "Supplier created");
        Ok(supplier)
    }

    pub async fn get(&self, id: &str) -> DbResult<Supplier> {
        let sql =
            format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = ?1 AND tenant_id = ?2");
        sqlx::query_as::<_, Supplier>(&sql)
            .bind(id)
            .bind(&self.tenant_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Supplier", id))
    }

    /// All suppliers, active or not, by name.
    pub async fn list(&self) -> DbResult<Vec<Supplier>> {
        let sql =
            format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE tenant_id = ?1 ORDER BY name");
        let suppliers = sqlx::query_as::<_, Supplier>(&sql)
            .bind(&self.tenant_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(suppliers)
    }

    /// Name, email or phone substring match.
    pub async fn search(&self, query: &str, limit: i64) -> DbResult<Vec<Supplier>> {
        let query = validate_search_query(query)?;
        if query.is_empty() {
            return Err(ValidationError::Required {
                field: "q".to_string(),
            }
            .into());
        }
        validate_page(0, limit)?;

        debug!(tenant_id = %self.tenant_id, query = %query, limit, "Searching suppliers");

        let pattern = format!("%{}%", escape_like(&query));
        let sql = format!(
            r#"SELECT {SUPPLIER_COLUMNS} FROM suppliers
               WHERE tenant_id = ?1
                 AND (name LIKE ?2 ESCAPE '\'
                      OR email LIKE ?2 ESCAPE '\'
                      OR phone LIKE ?2 ESCAPE '\')
               ORDER BY name LIMIT ?3"#
        );
        let suppliers = sqlx::query_as::<_, Supplier>(&sql)
            .bind(&self.tenant_id)
            .bind(&pattern)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(suppliers)
    }

    pub async fn update(&self, id: &str, patch: &SupplierPatch) -> DbResult<Supplier> {
        patch.validate()?;

        let mut supplier = self.get(id).await?;
        patch.apply(&mut supplier, Utc::now());

        sqlx::query(
            r#"
            UPDATE suppliers SET
                name = ?1, contact_person = ?2, email = ?3, phone = ?4, address = ?5,
                city = ?6, postal_code = ?7, country = ?8, tax_number = ?9,
                registration_number = ?10, bank_account = ?11, bank_name = ?12,
                payment_terms = ?13, min_order_amount_cents = ?14, delivery_days = ?15,
                notes = ?16, is_active = ?17, updated_at = ?18
            WHERE id = ?19 AND tenant_id = ?20
            "#,
        )
        .bind(&supplier.name)
        .bind(&supplier.contact_person)
        .bind(&supplier.email)
        .bind(&supplier.phone)
        .bind(&supplier.address)
        .bind(&supplier.city)
        .bind(&supplier.postal_code)
        .bind(&supplier.country)
        .bind(&supplier.tax_number)
        .bind(&supplier.registration_number)
        .bind(&supplier.bank_account)
        .bind(&supplier.bank_name)
        .bind(&supplier.payment_terms)
        .bind(supplier.min_order_amount_cents)
        .bind(supplier.delivery_days)
        .bind(&supplier.notes)
        .bind(supplier.is_active)
        .bind(supplier.updated_at)
        .bind(id)
        .bind(&self.tenant_id)
        .execute(&self.pool)
        .await?;

        debug!(tenant_id = %self.tenant_id, supplier_id = %id, "Supplier updated");
        Ok(supplier)
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = ?1 AND tenant_id = ?2")
            .bind(id)
            .bind(&self.tenant_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Supplier", id));
        }

        info!(tenant_id = %self.tenant_id, supplier_id = %id, "Supplier deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::setup;

    #[tokio::test]
    async fn test_crud_roundtrip() {
        let (db, tenant, _) = setup().await;
        let repo = db.tenant(&tenant.id).suppliers();

        let acme = repo
            .create(NewSupplier::new("Acme Wholesale").with_email("orders@acme.test"))
            .await
            .unwrap();
        repo.create(NewSupplier::new("Bakers Direct")).await.unwrap();

        let names: Vec<_> = repo.list().await.unwrap().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Acme Wholesale", "Bakers Direct"]);

        let patch: SupplierPatch =
            serde_json::from_str(r#"{"delivery_days":2,"email":null}"#).unwrap();
        let updated = repo.update(&acme.id, &patch).await.unwrap();
        assert_eq!(updated.delivery_days, Some(2));

        let stored = repo.get(&acme.id).await.unwrap();
        assert_eq!(stored.email, None);
        assert_eq!(stored.delivery_days, Some(2));
        assert!(stored.updated_at >= stored.created_at);

        repo.delete(&acme.id).await.unwrap();
        assert!(matches!(repo.get(&acme.id).await, Err(DbError::NotFound { .. })));
        assert!(matches!(repo.delete(&acme.id).await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_search_matches_name_email_and_phone() {
        let (db, tenant, _) = setup().await;
        let repo = db.tenant(&tenant.id).suppliers();
        repo.create(NewSupplier::new("Dairy Co").with_phone("0161 555 0100"))
            .await
            .unwrap();
        repo.create(NewSupplier::new("Fresh Farms").with_email("sales@dairyfarm.test"))
            .await
            .unwrap();
        repo.create(NewSupplier::new("100% Juice")).await.unwrap();

        assert_eq!(repo.search("dairy", 20).await.unwrap().len(), 2);
        assert_eq!(repo.search("555", 20).await.unwrap()[0].name, "Dairy Co");
        assert_eq!(repo.search("100%", 20).await.unwrap().len(), 1);
        assert_eq!(repo.search("dairy", 1).await.unwrap().len(), 1);
        assert!(repo.search("  ", 20).await.is_err());
    }

    #[tokio::test]
    async fn test_other_tenant_cannot_see_supplier() {
        let (db, tenant, _) = setup().await;
        let other = db.tenants().create("Other", None).await.unwrap();
        let acme = db
            .tenant(&tenant.id)
            .suppliers()
            .create(NewSupplier::new("Acme"))
            .await
            .unwrap();

        let theirs = db.tenant(&other.id).suppliers();
        assert!(matches!(theirs.get(&acme.id).await, Err(DbError::NotFound { .. })));
        assert!(matches!(theirs.delete(&acme.id).await, Err(DbError::NotFound { .. })));
        assert!(theirs.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_supplier_rejected() {
        let (db, tenant, _) = setup().await;
        let mut req = NewSupplier::new("Acme");
        req.min_order_amount_cents = Some(-100);
        let err = db.tenant(&tenant.id).suppliers().create(req).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(_)));
    }
}
