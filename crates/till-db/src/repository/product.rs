//! # Product Repository (Catalog Store)
//!
//! Database operations for one tenant's products.
//!
//! ## Key Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Catalog Store                                        │
//! │                                                                         │
//! │  Lookup     get / get_by_id / get_by_sku / get_by_barcode              │
//! │  Search     name or sku substring, or exact barcode (active only)      │
//! │  Listing    list(skip, limit) → Page { items, total }                  │
//! │  Create     product row + "Opening stock" movement, one transaction    │
//! │  Update     ProductPatch applied field by field (never stock)          │
//! │  Delete     deactivate (soft)  │  delete (hard, sale lines keep        │
//! │                                │  their snapshots, product_id → NULL)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The sale processor resolves products through [`find_in`] on its own
//! transaction so every read happens under the writer lock.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::escape_like;
use crate::repository::stock::{NewMovement, StockLedger};
use till_core::validation::{validate_page, validate_search_query};
use till_core::{CoreError, MovementType, NewProduct, Page, Product, ProductPatch};

const PRODUCT_COLUMNS: &str = "id, tenant_id, category_id, name, description, sku, barcode, \
                               price_cents, cost_price_cents, vat_rate_bps, stock_quantity, \
                               min_stock_level, is_active, created_at, updated_at";

/// Loads one product of `tenant_id` on an existing connection or transaction.
pub(crate) async fn find_in(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    id: &str,
) -> DbResult<Option<Product>> {
    let sql = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ?1 AND tenant_id = ?2");
    let product = sqlx::query_as::<_, Product>(&sql)
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(conn)
        .await?;
    Ok(product)
}

/// Fails with `CategoryNotFound` unless the category belongs to `tenant_id`.
///
/// The foreign key only proves the category exists somewhere.
pub(crate) async fn ensure_category(
    conn: &mut SqliteConnection,
    tenant_id: &str,
    category_id: &str,
) -> DbResult<()> {
    let found: Option<i64> =
        sqlx::query_scalar("SELECT 1 FROM categories WHERE id = ?1 AND tenant_id = ?2")
            .bind(category_id)
            .bind(tenant_id)
            .fetch_optional(conn)
            .await?;

    match found {
        Some(_) => Ok(()),
        None => Err(CoreError::CategoryNotFound(category_id.to_string()).into()),
    }
}

/// Turns `UNIQUE constraint failed: products.tenant_id, products.sku` into
/// a duplicate error naming the field and the offending value.
fn map_unique(err: sqlx::Error, product: &Product) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { field, .. } if field.contains("products.sku") => {
            DbError::duplicate("sku", product.sku.clone().unwrap_or_default())
        }
        DbError::UniqueViolation { field, .. } if field.contains("products.barcode") => {
            DbError::duplicate("barcode", product.barcode.clone().unwrap_or_default())
        }
        other => other,
    }
}

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.tenant(tenant_id).products();
///
/// let results = repo.search("milk", 20).await?;
/// let product = repo.get(&id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl ProductRepository {
    pub fn new(pool: SqlitePool, tenant_id: String) -> Self {
        ProductRepository { pool, tenant_id }
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Gets a product by id, active or not.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        find_in(&mut conn, &self.tenant_id, id).await
    }

    /// Gets a product by id or fails with `NotFound`.
    pub async fn get(&self, id: &str) -> DbResult<Product> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))
    }

    pub async fn get_by_sku(&self, sku: &str) -> DbResult<Option<Product>> {
        let sql =
            format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE sku = ?1 AND tenant_id = ?2");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(sku.trim())
            .bind(&self.tenant_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Barcode scan lookup.
    pub async fn get_by_barcode(&self, barcode: &str) -> DbResult<Option<Product>> {
        let sql =
            format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE barcode = ?1 AND tenant_id = ?2");
        let product = sqlx::query_as::<_, Product>(&sql)
            .bind(barcode.trim())
            .bind(&self.tenant_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Searches active products by name or SKU substring, or exact barcode.
    ///
    /// An empty query lists active products by name.
    pub async fn search(&self, query: &str, limit: i64) -> DbResult<Vec<Product>> {
        let query = validate_search_query(query)?;
        validate_page(0, limit)?;

        debug!(tenant_id = %self.tenant_id, query = %query, limit, "Searching products");

        let products = if query.is_empty() {
            let sql = format!(
                "SELECT {PRODUCT_COLUMNS} FROM products \
                 WHERE tenant_id = ?1 AND is_active = 1 \
                 ORDER BY name LIMIT ?2"
            );
            sqlx::query_as::<_, Product>(&sql)
                .bind(&self.tenant_id)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
        } else {
            let pattern = format!("%{}%", escape_like(&query));
            let sql = format!(
                r#"SELECT {PRODUCT_COLUMNS} FROM products
                   WHERE tenant_id = ?1 AND is_active = 1
                     AND (name LIKE ?2 ESCAPE '\'
                          OR sku LIKE ?2 ESCAPE '\'
                          OR barcode = ?3)
                   ORDER BY name LIMIT ?4"#
            );
            sqlx::query_as::<_, Product>(&sql)
                .bind(&self.tenant_id)
                .bind(&pattern)
                .bind(&query)
                .bind(limit)
                .fetch_all(&self.pool)
                .await?
        };

        debug!(count = products.len(), "Search returned products");
        Ok(products)
    }

    /// One page of products by name, with the total count.
    pub async fn list(&self, skip: i64, limit: i64, include_inactive: bool) -> DbResult<Page<Product>> {
        validate_page(skip, limit)?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE tenant_id = ?1 AND (is_active = 1 OR ?2)",
        )
        .bind(&self.tenant_id)
        .bind(include_inactive)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products \
             WHERE tenant_id = ?1 AND (is_active = 1 OR ?2) \
             ORDER BY name, id LIMIT ?3 OFFSET ?4"
        );
        let items = sqlx::query_as::<_, Product>(&sql)
            .bind(&self.tenant_id)
            .bind(include_inactive)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await?;

        Ok(Page { items, total })
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Creates a product. A non-zero opening stock is booked as an
    /// `adjustment` movement in the same transaction.
    pub async fn create(&self, req: NewProduct, user_id: Option<&str>) -> DbResult<Product> {
        req.validate()?;

        let opening_stock = req.opening_stock;
        let now = Utc::now();
        let product = req.into_product(Uuid::new_v4().to_string(), self.tenant_id.clone(), now);

        debug!(tenant_id = %self.tenant_id, name = %product.name, "Creating product");

        let mut tx = self.pool.begin().await?;

        if let Some(category_id) = &product.category_id {
            ensure_category(&mut tx, &self.tenant_id, category_id).await?;
        }

        sqlx::query(
            r#"
            INSERT INTO products (
                id, tenant_id, category_id, name, description, sku, barcode,
                price_cents, cost_price_cents, vat_rate_bps, stock_quantity,
                min_stock_level, is_active, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
        )
        .bind(&product.id)
        .bind(&product.tenant_id)
        .bind(&product.category_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.sku)
        .bind(&product.barcode)
        .bind(product.price_cents)
        .bind(product.cost_price_cents)
        .bind(product.vat_rate_bps)
        .bind(product.stock_quantity)
        .bind(product.min_stock_level)
        .bind(product.is_active)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique(e, &product))?;

        if opening_stock != 0 {
            let ledger = StockLedger::new(self.pool.clone(), self.tenant_id.clone());
            let movement = NewMovement::new(&product.id, opening_stock, MovementType::Adjustment)
                .by(user_id)
                .notes(Some("Opening stock"))
                .at(now);
            ledger.record_movement(&mut tx, &movement).await?;
        }

        let created = find_in(&mut tx, &self.tenant_id, &product.id)
            .await?
            .ok_or_else(|| DbError::Internal("product vanished after insert".to_string()))?;

        tx.commit().await?;

        info!(
            tenant_id = %self.tenant_id,
            product_id = %created.id,
            stock = created.stock_quantity,
            "Product created"
        );
        Ok(created)
    }

    /// Applies a patch. Stock is not patchable; use the stock ledger.
    pub async fn update(&self, id: &str, patch: &ProductPatch) -> DbResult<Product> {
        patch.validate()?;

        let mut tx = self.pool.begin().await?;

        let mut product = find_in(&mut tx, &self.tenant_id, id)
            .await?
            .ok_or_else(|| DbError::not_found("Product", id))?;

        if patch.is_empty() {
            return Ok(product);
        }

        if let Some(Some(category_id)) = &patch.category_id {
            ensure_category(&mut tx, &self.tenant_id, category_id).await?;
        }

        patch.apply(&mut product, Utc::now());

        sqlx::query(
            r#"
            UPDATE products SET
                category_id = ?1,
                name = ?2,
                description = ?3,
                sku = ?4,
                barcode = ?5,
                price_cents = ?6,
                cost_price_cents = ?7,
                vat_rate_bps = ?8,
                min_stock_level = ?9,
                is_active = ?10,
                updated_at = ?11
            WHERE id = ?12 AND tenant_id = ?13
            "#,
        )
        .bind(&product.category_id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(&product.sku)
        .bind(&product.barcode)
        .bind(product.price_cents)
        .bind(product.cost_price_cents)
        .bind(product.vat_rate_bps)
        .bind(product.min_stock_level)
        .bind(product.is_active)
        .bind(product.updated_at)
        .bind(&product.id)
        .bind(&self.tenant_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique(e, &product))?;

        tx.commit().await?;

        debug!(tenant_id = %self.tenant_id, product_id = %id, "Product updated");
        Ok(product)
    }

    /// Soft delete: the product stays on past sales but cannot be sold.
    pub async fn deactivate(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE products SET is_active = 0, updated_at = ?1 WHERE id = ?2 AND tenant_id = ?3",
        )
        .bind(Utc::now())
        .bind(id)
        .bind(&self.tenant_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(tenant_id = %self.tenant_id, product_id = %id, "Product deactivated");
        Ok(())
    }

    /// Hard delete. Its movements go with it; sale lines keep their
    /// snapshots and lose the product id.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = ?1 AND tenant_id = ?2")
            .bind(id)
            .bind(&self.tenant_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        info!(tenant_id = %self.tenant_id, product_id = %id, "Product deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::setup;
    use till_core::NewCategory;

    #[tokio::test]
    async fn test_create_with_opening_stock() {
        let (db, tenant, owner) = setup().await;
        let shop = db.tenant(&tenant.id);

        let product = shop
            .products()
            .create(
                NewProduct::new("Sourdough", 350).with_sku("SD-1").with_opening_stock(10),
                Some(owner.id.as_str()),
            )
            .await
            .unwrap();

        assert_eq!(product.stock_quantity, 10);
        assert_eq!(product.vat_rate_bps, 2000);

        let history = shop.stock().history(&product.id, 10).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].movement_type, MovementType::Adjustment);
        assert_eq!(history[0].quantity, 10);
    }

    #[tokio::test]
    async fn test_lookups_are_tenant_scoped() {
        let (db, tenant, _) = setup().await;
        let other = db.tenants().create("Rival", None).await.unwrap();

        let product = db
            .tenant(&tenant.id)
            .products()
            .create(
                NewProduct::new("Cola 330ml", 99).with_sku("COLA-330").with_barcode("5449000000996"),
                None,
            )
            .await
            .unwrap();

        let mine = db.tenant(&tenant.id).products();
        assert!(mine.get_by_sku("COLA-330").await.unwrap().is_some());
        assert!(mine.get_by_barcode("5449000000996").await.unwrap().is_some());

        let theirs = db.tenant(&other.id).products();
        assert!(theirs.get_by_id(&product.id).await.unwrap().is_none());
        assert!(theirs.get_by_sku("COLA-330").await.unwrap().is_none());
        assert!(matches!(theirs.get(&product.id).await, Err(DbError::NotFound { .. })));

        // The same SKU is free in another tenant.
        theirs
            .create(NewProduct::new("Their Cola", 89).with_sku("COLA-330"), None)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_duplicate_sku_names_field() {
        let (db, tenant, _) = setup().await;
        let repo = db.tenant(&tenant.id).products();

        repo.create(NewProduct::new("A", 100).with_sku("DUP-1"), None).await.unwrap();
        let err = repo
            .create(NewProduct::new("B", 100).with_sku("DUP-1"), None)
            .await
            .unwrap_err();

        match err {
            DbError::UniqueViolation { field, value } => {
                assert_eq!(field, "sku");
                assert_eq!(value, "DUP-1");
            }
            other => panic!("expected UniqueViolation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_search_matches_name_sku_and_barcode() {
        let (db, tenant, _) = setup().await;
        let repo = db.tenant(&tenant.id).products();

        repo.create(NewProduct::new("Whole Milk 2L", 155).with_sku("MLK-2L"), None)
            .await
            .unwrap();
        repo.create(NewProduct::new("Oat Drink", 180).with_barcode("7394376616037"), None)
            .await
            .unwrap();
        let gone = repo.create(NewProduct::new("Milk Chocolate", 120), None).await.unwrap();
        repo.deactivate(&gone.id).await.unwrap();

        let by_name = repo.search("milk", 20).await.unwrap();
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].name, "Whole Milk 2L");

        assert_eq!(repo.search("mlk-", 20).await.unwrap().len(), 1);
        assert_eq!(repo.search("7394376616037", 20).await.unwrap().len(), 1);
        assert_eq!(repo.search("739437", 20).await.unwrap().len(), 0);
        assert_eq!(repo.search("", 20).await.unwrap().len(), 2);
        assert!(repo.search("%", 20).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_pagination() {
        let (db, tenant, _) = setup().await;
        let repo = db.tenant(&tenant.id).products();
        for name in ["Alpha", "Bravo", "Charlie"] {
            repo.create(NewProduct::new(name, 100), None).await.unwrap();
        }
        let hidden = repo.create(NewProduct::new("Delta", 100), None).await.unwrap();
        repo.deactivate(&hidden.id).await.unwrap();

        let page = repo.list(1, 1, false).await.unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].name, "Bravo");

        assert_eq!(repo.list(0, 50, true).await.unwrap().total, 4);
        assert!(repo.list(0, 0, false).await.is_err());
        assert!(repo.list(-1, 10, false).await.is_err());
    }

    #[tokio::test]
    async fn test_patch_updates_fields_not_stock() {
        let (db, tenant, _) = setup().await;
        let shop = db.tenant(&tenant.id);
        let category = shop
            .categories()
            .create(&NewCategory {
                name: "Bakery".into(),
                description: None,
            })
            .await
            .unwrap();

        let product = shop
            .products()
            .create(
                NewProduct::new("Bagel", 90).with_barcode("123456").with_opening_stock(6),
                None,
            )
            .await
            .unwrap();

        let patch: ProductPatch = serde_json::from_value(serde_json::json!({
            "price_cents": 110,
            "barcode": null,
            "category_id": category.id,
        }))
        .unwrap();

        let updated = shop.products().update(&product.id, &patch).await.unwrap();
        assert_eq!(updated.price_cents, 110);
        assert_eq!(updated.barcode, None);
        assert_eq!(updated.category_id.as_deref(), Some(category.id.as_str()));
        assert_eq!(updated.stock_quantity, 6);

        let reloaded = shop.products().get(&product.id).await.unwrap();
        assert_eq!(reloaded.price_cents, 110);
        assert_eq!(reloaded.name, "Bagel");
    }

    #[tokio::test]
    async fn test_foreign_category_rejected() {
        let (db, tenant, _) = setup().await;
        let other = db.tenants().create("Rival", None).await.unwrap();
        let foreign = db
            .tenant(&other.id)
            .categories()
            .create(&NewCategory {
                name: "Theirs".into(),
                description: None,
            })
            .await
            .unwrap();

        let err = db
            .tenant(&tenant.id)
            .products()
            .create(NewProduct::new("Scone", 150).with_category(&foreign.id), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::CategoryNotFound(_))));
    }

    #[tokio::test]
    async fn test_soft_and_hard_delete() {
        let (db, tenant, _) = setup().await;
        let repo = db.tenant(&tenant.id).products();
        let p = repo.create(NewProduct::new("Muffin", 200), None).await.unwrap();

        repo.deactivate(&p.id).await.unwrap();
        assert!(!repo.get(&p.id).await.unwrap().is_active);

        repo.delete(&p.id).await.unwrap();
        assert!(repo.get_by_id(&p.id).await.unwrap().is_none());
        assert!(matches!(repo.delete(&p.id).await, Err(DbError::NotFound { .. })));
    }
}
