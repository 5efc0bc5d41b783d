//! # Tenant & User Repository
//!
//! Tenants are the isolation boundary, so their own rows are the only ones
//! reachable without a `TenantScope`. Users are tenant-scoped like
//! everything else.
//!
//! Authentication and user management live outside this crate; what is
//! here is enough to own sales and movements and to seed a database.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use till_core::validation::{validate_email, validate_name};
use till_core::settings::normalize_currency;
use till_core::{Role, Tenant, User, DEFAULT_CURRENCY};

// =============================================================================
// Tenants
// =============================================================================

pub(crate) const TENANT_COLUMNS: &str =
    "id, name, currency, address, phone, email, vat_number, is_active, created_at";

/// Repository for tenant rows.
#[derive(Debug, Clone)]
pub struct TenantRepository {
    pool: SqlitePool,
}

impl TenantRepository {
    pub fn new(pool: SqlitePool) -> Self {
        TenantRepository { pool }
    }

    /// Creates a tenant. `currency` defaults to GBP.
    pub async fn create(&self, name: &str, currency: Option<&str>) -> DbResult<Tenant> {
        validate_name("name", name, 200)?;

        let currency = normalize_currency(currency.unwrap_or(DEFAULT_CURRENCY))?;

        let tenant = Tenant {
            id: Uuid::new_v4().to_string(),
            name: name.trim().to_string(),
            currency,
            address: None,
            phone: None,
            email: None,
            vat_number: None,
            is_active: true,
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO tenants (id, name, currency, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&tenant.id)
        .bind(&tenant.name)
        .bind(&tenant.currency)
        .bind(tenant.is_active)
        .bind(tenant.created_at)
        .execute(&self.pool)
        .await?;

        info!(tenant_id = %tenant.id, name = %tenant.name, "Tenant created");
        Ok(tenant)
    }

    pub async fn get(&self, id: &str) -> DbResult<Tenant> {
        let sql = format!("SELECT {TENANT_COLUMNS} FROM tenants WHERE id = ?1");
        sqlx::query_as::<_, Tenant>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Tenant", id))
    }

    /// Deletes a tenant and, by cascade, every row it owns.
    pub async fn purge(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM tenants WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Tenant", id));
        }

        info!(tenant_id = %id, "Tenant purged");
        Ok(())
    }
}

// =============================================================================
// Users
// =============================================================================

/// Repository for one tenant's users.
#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
    tenant_id: String,
}

const USER_COLUMNS: &str = "id, tenant_id, email, full_name, role, is_active, created_at";

impl UserRepository {
    pub fn new(pool: SqlitePool, tenant_id: String) -> Self {
        UserRepository { pool, tenant_id }
    }

    /// Creates an active user. Emails are unique across all tenants.
    pub async fn create(&self, email: &str, full_name: &str, role: Role) -> DbResult<User> {
        validate_email(email)?;
        validate_name("full_name", full_name, 200)?;

        let user = User {
            id: Uuid::new_v4().to_string(),
            tenant_id: self.tenant_id.clone(),
            email: email.trim().to_ascii_lowercase(),
            full_name: full_name.trim().to_string(),
            role,
            is_active: true,
            created_at: Utc::now(),
        };

        debug!(tenant_id = %self.tenant_id, email = %user.email, "Creating user");

        sqlx::query(
            r#"
            INSERT INTO users (id, tenant_id, email, full_name, role, is_active, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&user.id)
        .bind(&user.tenant_id)
        .bind(&user.email)
        .bind(&user.full_name)
        .bind(user.role)
        .bind(user.is_active)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, &user.email),
            other => other,
        })?;

        Ok(user)
    }

    pub async fn get(&self, id: &str) -> DbResult<User> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1 AND tenant_id = ?2");
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&self.tenant_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("User", id))
    }

    pub async fn get_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1 AND tenant_id = ?2");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email.trim().to_ascii_lowercase())
            .bind(&self.tenant_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Deletes a user who has never rung up a sale.
    ///
    /// Sales reference their cashier with no ON DELETE action, so SQLite
    /// refuses the delete once the user has any; deactivate them instead.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1 AND tenant_id = ?2")
            .bind(id)
            .bind(&self.tenant_id)
            .execute(&self.pool)
            .await
            .map_err(|e| match DbError::from(e) {
                DbError::ForeignKeyViolation { .. } => DbError::ForeignKeyViolation {
                    message: format!("user {id} has recorded sales"),
                },
                other => other,
            })?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        info!(tenant_id = %self.tenant_id, user_id = %id, "User deleted");
        Ok(())
    }

    /// Marks a user inactive. Their sales keep pointing at them.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result =
            sqlx::query("UPDATE users SET is_active = 0 WHERE id = ?1 AND tenant_id = ?2")
                .bind(id)
                .bind(&self.tenant_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("User", id));
        }

        debug!(tenant_id = %self.tenant_id, user_id = %id, "User deactivated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::setup;

    #[tokio::test]
    async fn test_tenant_defaults_and_validation() {
        let (db, tenant, _) = setup().await;
        assert_eq!(tenant.currency, "GBP");
        assert!(tenant.is_active);

        let eur = db.tenants().create("Café", Some("eur")).await.unwrap();
        assert_eq!(eur.currency, "EUR");

        assert!(db.tenants().create("Bad", Some("EURO")).await.is_err());
        assert!(db.tenants().create("  ", None).await.is_err());
    }

    #[tokio::test]
    async fn test_users_are_tenant_scoped() {
        let (db, tenant, owner) = setup().await;
        let other = db.tenants().create("Other Shop", None).await.unwrap();

        let found = db.tenant(&tenant.id).users().get(&owner.id).await.unwrap();
        assert_eq!(found.role, Role::Owner);

        let err = db.tenant(&other.id).users().get(&owner.id).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));

        let by_email = db
            .tenant(&tenant.id)
            .users()
            .get_by_email("OWNER@corner.test")
            .await
            .unwrap();
        assert!(by_email.is_some());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let (db, tenant, _) = setup().await;
        let err = db
            .tenant(&tenant.id)
            .users()
            .create("owner@corner.test", "Someone Else", Role::Cashier)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_delete_user_without_sales() {
        let (db, tenant, _) = setup().await;
        let users = db.tenant(&tenant.id).users();
        let temp = users.create("temp@corner.test", "Temp Till", Role::Cashier).await.unwrap();

        users.delete(&temp.id).await.unwrap();
        assert!(matches!(users.get(&temp.id).await, Err(DbError::NotFound { .. })));
        assert!(matches!(users.delete(&temp.id).await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_deactivate_user() {
        let (db, tenant, owner) = setup().await;
        let users = db.tenant(&tenant.id).users();
        users.deactivate(&owner.id).await.unwrap();
        assert!(!users.get(&owner.id).await.unwrap().is_active);
    }

    #[tokio::test]
    async fn test_purge_unknown_tenant() {
        let (db, _, _) = setup().await;
        assert!(matches!(
            db.tenants().purge("missing").await,
            Err(DbError::NotFound { .. })
        ));
    }
}
