//! # Sale Repository
//!
//! Reads of committed sales, and the row inserts the sale processor runs
//! inside its transaction.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  SaleProcessor (one transaction)                                       │
//! │     └── insert_sale()  → sales row        { status: completed }        │
//! │     └── insert_item()  → sale_items rows  (name/price/VAT snapshots)   │
//! │                                                                         │
//! │  Afterwards the sale is immutable. Only `status` may ever change       │
//! │  (refunded / cancelled), and nothing in this crate changes it yet.     │
//! │                                                                         │
//! │  Reads: get(id) · get_by_number(n) · list(skip, limit)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use till_core::validation::validate_page;
use till_core::{Page, Sale, SaleItem};

const SALE_COLUMNS: &str = "id, tenant_id, user_id, sale_number, sale_date, subtotal_cents, \
                            discount_cents, vat_cents, total_cents, payment_method, \
                            cash_received_cents, change_given_cents, status, notes, created_at";

const ITEM_COLUMNS: &str = "si.id, si.sale_id, si.product_id, si.product_name, si.quantity, \
                            si.unit_price_cents, si.discount_cents, si.vat_rate_bps, \
                            si.vat_cents, si.total_cents";

/// Inserts the sale header row.
pub(crate) async fn insert_sale(conn: &mut SqliteConnection, sale: &Sale) -> DbResult<()> {
    debug!(id = %sale.id, sale_number = %sale.sale_number, "Inserting sale");

    sqlx::query(
        r#"
        INSERT INTO sales (
            id, tenant_id, user_id, sale_number, sale_date,
            subtotal_cents, discount_cents, vat_cents, total_cents,
            payment_method, cash_received_cents, change_given_cents,
            status, notes, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
        "#,
    )
    .bind(&sale.id)
    .bind(&sale.tenant_id)
    .bind(&sale.user_id)
    .bind(&sale.sale_number)
    .bind(sale.sale_date)
    .bind(sale.subtotal_cents)
    .bind(sale.discount_cents)
    .bind(sale.vat_cents)
    .bind(sale.total_cents)
    .bind(sale.payment_method)
    .bind(sale.cash_received_cents)
    .bind(sale.change_given_cents)
    .bind(sale.status)
    .bind(&sale.notes)
    .bind(sale.created_at)
    .execute(conn)
    .await?;

    Ok(())
}

/// Inserts one line with its frozen snapshots.
pub(crate) async fn insert_item(conn: &mut SqliteConnection, item: &SaleItem) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO sale_items (
            id, sale_id, product_id, product_name, quantity,
            unit_price_cents, discount_cents, vat_rate_bps, vat_cents, total_cents
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
        "#,
    )
    .bind(&item.id)
    .bind(&item.sale_id)
    .bind(&item.product_id)
    .bind(&item.product_name)
    .bind(item.quantity)
    .bind(item.unit_price_cents)
    .bind(item.discount_cents)
    .bind(item.vat_rate_bps)
    .bind(item.vat_cents)
    .bind(item.total_cents)
    .execute(conn)
    .await?;

    Ok(())
}

/// Repository for one tenant's sales.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl SaleRepository {
    pub fn new(pool: SqlitePool, tenant_id: String) -> Self {
        SaleRepository { pool, tenant_id }
    }

    /// Gets a sale with its items, or `NotFound`.
    pub async fn get(&self, id: &str) -> DbResult<Sale> {
        let sql = format!("SELECT {SALE_COLUMNS} FROM sales WHERE id = ?1 AND tenant_id = ?2");
        let mut sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(id)
            .bind(&self.tenant_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("Sale", id))?;

        sale.items = self.items(&sale.id).await?;
        Ok(sale)
    }

    /// Gets a sale by its `INV-…` number.
    pub async fn get_by_number(&self, sale_number: &str) -> DbResult<Option<Sale>> {
        let sql =
            format!("SELECT {SALE_COLUMNS} FROM sales WHERE sale_number = ?1 AND tenant_id = ?2");
        let sale = sqlx::query_as::<_, Sale>(&sql)
            .bind(sale_number)
            .bind(&self.tenant_id)
            .fetch_optional(&self.pool)
            .await?;

        match sale {
            Some(mut sale) => {
                sale.items = self.items(&sale.id).await?;
                Ok(Some(sale))
            }
            None => Ok(None),
        }
    }

    /// Items of one sale, in insertion order.
    pub async fn items(&self, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM sale_items si \
             JOIN sales s ON s.id = si.sale_id \
             WHERE si.sale_id = ?1 AND s.tenant_id = ?2 \
             ORDER BY si.rowid"
        );
        let items = sqlx::query_as::<_, SaleItem>(&sql)
            .bind(sale_id)
            .bind(&self.tenant_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(items)
    }

    /// Newest sales first, with items, and the total count.
    pub async fn list(&self, skip: i64, limit: i64) -> DbResult<Page<Sale>> {
        validate_page(skip, limit)?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales WHERE tenant_id = ?1")
            .bind(&self.tenant_id)
            .fetch_one(&self.pool)
            .await?;

        let sql = format!(
            "SELECT {SALE_COLUMNS} FROM sales WHERE tenant_id = ?1 \
             ORDER BY created_at DESC, rowid DESC LIMIT ?2 OFFSET ?3"
        );
        let mut sales = sqlx::query_as::<_, Sale>(&sql)
            .bind(&self.tenant_id)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await?;

        if sales.is_empty() {
            return Ok(Page { items: sales, total });
        }

        // One query for every item on the page.
        let placeholders = vec!["?"; sales.len()].join(", ");
        let sql = format!(
            "SELECT {ITEM_COLUMNS} FROM sale_items si \
             JOIN sales s ON s.id = si.sale_id \
             WHERE s.tenant_id = ? AND si.sale_id IN ({placeholders}) \
             ORDER BY si.rowid"
        );
        let mut query = sqlx::query_as::<_, SaleItem>(&sql).bind(&self.tenant_id);
        for sale in &sales {
            query = query.bind(&sale.id);
        }
        let items = query.fetch_all(&self.pool).await?;

        let mut by_sale: HashMap<String, Vec<SaleItem>> = HashMap::new();
        for item in items {
            by_sale.entry(item.sale_id.clone()).or_default().push(item);
        }
        for sale in &mut sales {
            sale.items = by_sale.remove(&sale.id).unwrap_or_default();
        }

        Ok(Page { items: sales, total })
    }
}
