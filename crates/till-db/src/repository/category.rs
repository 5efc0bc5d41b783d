//! # Category Repository
//!
//! Plain CRUD over one tenant's categories. Names are unique per tenant.
//! Deleting a category detaches its products (`category_id` → NULL).

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use till_core::{Category, CategoryPatch, NewCategory};

const CATEGORY_COLUMNS: &str = "id, tenant_id, name, description, created_at";

fn map_unique(err: sqlx::Error, name: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { .. } => DbError::duplicate("name", name),
        other => other,
    }
}

#[derive(Debug, Clone)]
pub struct CategoryRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl CategoryRepository {
    pub fn new(pool: SqlitePool, tenant_id: String) -> Self {
        CategoryRepository { pool, tenant_id }
    }

    pub async fn create(&self, req: &NewCategory) -> DbResult<Category> {
        req.validate()?;

        let category = Category {
            id: Uuid::new_v4().to_string(),
            tenant_id: self.tenant_id.clone(),
            name: req.name.trim().to_string(),
            description: req.description.clone(),
            created_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO categories (id, tenant_id, name, description, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&category.id)
        .bind(&category.tenant_id)
        .bind(&category.name)
        .bind(&category.description)
        .bind(category.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique(e, &category.name))?;

        info!(tenant_id = %self.tenant_id, category_id = %category.id, "Category created");
        Ok(category)
    }

    pub async fn get(&self, id: &str) -> DbResult<Category> {
        let sql =
            format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = ?1 AND tenant_id = ?2");
        sqlx::query_as::<_, Category>(&sql)
            .bind(id)
            .bind(&self.tenant_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Category", id))
    }

    /// All categories, by name.
    pub async fn list(&self) -> DbResult<Vec<Category>> {
        let sql =
            format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE tenant_id = ?1 ORDER BY name");
        let categories = sqlx::query_as::<_, Category>(&sql)
            .bind(&self.tenant_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    pub async fn update(&self, id: &str, patch: &CategoryPatch) -> DbResult<Category> {
        patch.validate()?;

        let mut category = self.get(id).await?;
        patch.apply(&mut category);

        sqlx::query("UPDATE categories SET name = ?1, description = ?2 WHERE id = ?3 AND tenant_id = ?4")
            .bind(&category.name)
            .bind(&category.description)
            .bind(id)
            .bind(&self.tenant_id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_unique(e, &category.name))?;

        debug!(tenant_id = %self.tenant_id, category_id = %id, "Category updated");
        Ok(category)
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM categories WHERE id = ?1 AND tenant_id = ?2")
            .bind(id)
            .bind(&self.tenant_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Category", id));
        }

        info!(tenant_id = %self.tenant_id, category_id = %id, "Category deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::setup;
    use till_core::NewProduct;

    fn named(name: &str) -> NewCategory {
        NewCategory {
            name: name.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_crud_roundtrip() {
        let (db, tenant, _) = setup().await;
        let repo = db.tenant(&tenant.id).categories();

        let drinks = repo.create(&named("Drinks")).await.unwrap();
        repo.create(&named("Bakery")).await.unwrap();

        let names: Vec<_> = repo.list().await.unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["Bakery", "Drinks"]);

        let patch: CategoryPatch =
            serde_json::from_str(r#"{"name":"Soft Drinks","description":"Chilled"}"#).unwrap();
        let updated = repo.update(&drinks.id, &patch).await.unwrap();
        assert_eq!(updated.name, "Soft Drinks");
        assert_eq!(repo.get(&drinks.id).await.unwrap().description.as_deref(), Some("Chilled"));
    }

    #[tokio::test]
    async fn test_duplicate_name_per_tenant() {
        let (db, tenant, _) = setup().await;
        let other = db.tenants().create("Other", None).await.unwrap();

        db.tenant(&tenant.id).categories().create(&named("Dairy")).await.unwrap();
        let err = db
            .tenant(&tenant.id)
            .categories()
            .create(&named("Dairy"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));

        db.tenant(&other.id).categories().create(&named("Dairy")).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_detaches_products() {
        let (db, tenant, _) = setup().await;
        let shop = db.tenant(&tenant.id);
        let cat = shop.categories().create(&named("Frozen")).await.unwrap();
        let product = shop
            .products()
            .create(NewProduct::new("Peas", 140).with_category(&cat.id), None)
            .await
            .unwrap();

        shop.categories().delete(&cat.id).await.unwrap();

        let product = shop.products().get(&product.id).await.unwrap();
        assert_eq!(product.category_id, None);
        assert!(matches!(shop.categories().get(&cat.id).await, Err(DbError::NotFound { .. })));
    }
}
