//! # Stock Ledger
//!
//! The append-only movement log and the cached `products.stock_quantity`
//! projection it feeds.
//!
//! ## Write Path
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Stock Ledger                                    │
//! │                                                                         │
//! │  SaleProcessor (sale, −qty)        adjust_stock (adjustment/purchase/  │
//! │       │                                 │        return, ±qty)         │
//! │       │  caller's tx                    │  opens its own tx            │
//! │       └──────────────┬──────────────────┘                              │
//! │                      ▼                                                  │
//! │  record_movement(&mut tx, movement)                                    │
//! │   1. UPDATE products SET stock_quantity = stock_quantity + Δ           │
//! │      WHERE id = ? AND tenant_id = ?      (0 rows → NotFound)           │
//! │   2. INSERT INTO stock_movements (...)                                 │
//! │                                                                         │
//! │  Invariant: stock_quantity == Σ movements.quantity, per product        │
//! │  Checked by verify_consistency() / ensure_consistent()                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `record_movement` never begins or commits: it only runs inside a
//! transaction handle it is given. Stock has no floor; negative levels are
//! allowed and show up as low stock.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::Tx;
use till_core::validation::{
    validate_adjustment, validate_history_limit, validate_notes, validate_page,
};
use till_core::{
    CoreError, MovementType, Page, StockDiscrepancy, StockLevel, StockMovement, ValidationError,
};

/// Default number of history rows returned.
pub const DEFAULT_HISTORY_LIMIT: i64 = 100;

const MOVEMENT_COLUMNS: &str = "id, tenant_id, product_id, quantity, movement_type, \
                                reference_id, user_id, notes, created_at";

const LEVEL_COLUMNS: &str = "id AS product_id, name, sku, stock_quantity, min_stock_level, \
                             (stock_quantity <= min_stock_level) AS is_low_stock";

/// One movement to append.
#[derive(Debug, Clone)]
pub struct NewMovement<'a> {
    pub product_id: &'a str,
    /// Signed delta applied to `stock_quantity`.
    pub quantity: i64,
    pub movement_type: MovementType,
    pub reference_id: Option<&'a str>,
    pub user_id: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub created_at: DateTime<Utc>,
}

impl<'a> NewMovement<'a> {
    pub fn new(product_id: &'a str, quantity: i64, movement_type: MovementType) -> Self {
        NewMovement {
            product_id,
            quantity,
            movement_type,
            reference_id: None,
            user_id: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    pub fn reference(mut self, reference_id: &'a str) -> Self {
        self.reference_id = Some(reference_id);
        self
    }

    pub fn by(mut self, user_id: Option<&'a str>) -> Self {
        self.user_id = user_id;
        self
    }

    pub fn notes(mut self, notes: Option<&'a str>) -> Self {
        self.notes = notes;
        self
    }

    pub fn at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self
    }
}

/// The stock ledger for one tenant.
#[derive(Debug, Clone)]
pub struct StockLedger {
    pool: SqlitePool,
    tenant_id: String,
}

impl StockLedger {
    pub fn new(pool: SqlitePool, tenant_id: String) -> Self {
        StockLedger { pool, tenant_id }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Appends a movement and applies its delta, inside `tx`.
    ///
    /// ## Errors
    /// - Validation if the quantity is zero
    /// - `NotFound` if the product is not in this tenant
    pub async fn record_movement(
        &self,
        tx: &mut Tx<'_>,
        movement: &NewMovement<'_>,
    ) -> DbResult<StockMovement> {
        validate_adjustment(movement.quantity)?;
        validate_notes(movement.notes)?;

        debug!(
            tenant_id = %self.tenant_id,
            product_id = %movement.product_id,
            quantity = movement.quantity,
            movement_type = movement.movement_type.as_str(),
            "Recording stock movement"
        );

        let updated = sqlx::query(
            r#"
            UPDATE products
            SET stock_quantity = stock_quantity + ?1,
                updated_at = ?2
            WHERE id = ?3 AND tenant_id = ?4
            "#,
        )
        .bind(movement.quantity)
        .bind(movement.created_at)
        .bind(movement.product_id)
        .bind(&self.tenant_id)
        .execute(&mut **tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(DbError::not_found("Product", movement.product_id));
        }

        let row = StockMovement {
            id: Uuid::new_v4().to_string(),
            tenant_id: self.tenant_id.clone(),
            product_id: movement.product_id.to_string(),
            quantity: movement.quantity,
            movement_type: movement.movement_type,
            reference_id: movement.reference_id.map(str::to_string),
            user_id: movement.user_id.map(str::to_string),
            notes: movement.notes.map(str::to_string),
            created_at: movement.created_at,
        };

        sqlx::query(
            r#"
            INSERT INTO stock_movements (
                id, tenant_id, product_id, quantity, movement_type,
                reference_id, user_id, notes, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&row.id)
        .bind(&row.tenant_id)
        .bind(&row.product_id)
        .bind(row.quantity)
        .bind(row.movement_type)
        .bind(&row.reference_id)
        .bind(&row.user_id)
        .bind(&row.notes)
        .bind(row.created_at)
        .execute(&mut **tx)
        .await?;

        Ok(row)
    }

    /// Manual stock change in its own transaction.
    ///
    /// `movement_type` is `Adjustment` for corrections, `Purchase` for
    /// deliveries and `Return` for goods coming back. `Sale` movements are
    /// only ever written by the sale processor.
    pub async fn adjust_stock(
        &self,
        product_id: &str,
        quantity: i64,
        movement_type: MovementType,
        user_id: Option<&str>,
        notes: Option<&str>,
    ) -> DbResult<StockMovement> {
        if movement_type == MovementType::Sale {
            return Err(ValidationError::Inconsistent {
                field: "movement_type".to_string(),
                reason: "sale movements are recorded by sales".to_string(),
            }
            .into());
        }
        validate_adjustment(quantity)?;
        validate_notes(notes)?;

        let movement = NewMovement::new(product_id, quantity, movement_type)
            .by(user_id)
            .notes(notes);

        let mut tx = self.pool.begin().await?;
        let recorded = self.record_movement(&mut tx, &movement).await?;
        tx.commit().await?;

        info!(
            tenant_id = %self.tenant_id,
            product_id = %product_id,
            quantity,
            movement_type = movement_type.as_str(),
            "Stock adjusted"
        );

        Ok(recorded)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Current cached stock level of one product.
    pub async fn current_level(&self, product_id: &str) -> DbResult<i64> {
        sqlx::query_scalar::<_, i64>(
            "SELECT stock_quantity FROM products WHERE id = ?1 AND tenant_id = ?2",
        )
        .bind(product_id)
        .bind(&self.tenant_id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("Product", product_id))
    }

    /// Stock position of every active product, by name.
    pub async fn inventory(&self, skip: i64, limit: i64) -> DbResult<Page<StockLevel>> {
        validate_page(skip, limit)?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM products WHERE tenant_id = ?1 AND is_active = 1",
        )
        .bind(&self.tenant_id)
        .fetch_one(&self.pool)
        .await?;

        let sql = format!(
            "SELECT {LEVEL_COLUMNS} FROM products \
             WHERE tenant_id = ?1 AND is_active = 1 \
             ORDER BY name, id LIMIT ?2 OFFSET ?3"
        );
        let items = sqlx::query_as::<_, StockLevel>(&sql)
            .bind(&self.tenant_id)
            .bind(limit)
            .bind(skip)
            .fetch_all(&self.pool)
            .await?;

        Ok(Page { items, total })
    }

    /// Active products at or below their reorder level, lowest first.
    pub async fn low_stock(&self) -> DbResult<Vec<StockLevel>> {
        let sql = format!(
            "SELECT {LEVEL_COLUMNS} FROM products \
             WHERE tenant_id = ?1 AND is_active = 1 \
               AND stock_quantity <= min_stock_level \
             ORDER BY stock_quantity, name"
        );
        let levels = sqlx::query_as::<_, StockLevel>(&sql)
            .bind(&self.tenant_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(levels)
    }

    /// Movements of one product, newest first.
    pub async fn history(&self, product_id: &str, limit: i64) -> DbResult<Vec<StockMovement>> {
        validate_history_limit(limit)?;

        // Distinguish "no movements" from "no such product".
        self.current_level(product_id).await?;

        let sql = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE product_id = ?1 AND tenant_id = ?2 \
             ORDER BY created_at DESC, rowid DESC LIMIT ?3"
        );
        let movements = sqlx::query_as::<_, StockMovement>(&sql)
            .bind(product_id)
            .bind(&self.tenant_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        Ok(movements)
    }

    /// Movements written for one sale.
    pub async fn movements_for_reference(&self, reference_id: &str) -> DbResult<Vec<StockMovement>> {
        let sql = format!(
            "SELECT {MOVEMENT_COLUMNS} FROM stock_movements \
             WHERE reference_id = ?1 AND tenant_id = ?2 ORDER BY rowid"
        );
        let movements = sqlx::query_as::<_, StockMovement>(&sql)
            .bind(reference_id)
            .bind(&self.tenant_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(movements)
    }

    // =========================================================================
    // Audit
    // =========================================================================

    /// Every product whose cached stock differs from the sum of its
    /// movements. Each one is logged at error level.
    pub async fn verify_consistency(&self) -> DbResult<Vec<StockDiscrepancy>> {
        let discrepancies = sqlx::query_as::<_, StockDiscrepancy>(
            r#"
            SELECT p.id AS product_id,
                   p.stock_quantity,
                   COALESCE(SUM(m.quantity), 0) AS movements_total
            FROM products p
            LEFT JOIN stock_movements m
                   ON m.product_id = p.id AND m.tenant_id = p.tenant_id
            WHERE p.tenant_id = ?1
            GROUP BY p.id, p.stock_quantity
            HAVING p.stock_quantity <> COALESCE(SUM(m.quantity), 0)
            ORDER BY p.id
            "#,
        )
        .bind(&self.tenant_id)
        .fetch_all(&self.pool)
        .await?;

        for d in &discrepancies {
            error!(
                tenant_id = %self.tenant_id,
                product_id = %d.product_id,
                stock_quantity = d.stock_quantity,
                movements_total = d.movements_total,
                "Stock ledger inconsistency"
            );
        }

        Ok(discrepancies)
    }

    /// Fails with `ConsistencyFault` on the first divergent product.
    pub async fn ensure_consistent(&self) -> DbResult<()> {
        match self.verify_consistency().await?.into_iter().next() {
            Some(d) => Err(CoreError::ConsistencyFault {
                product_id: d.product_id,
                recorded: d.stock_quantity,
                expected: d.movements_total,
            }
            .into()),
            None => Ok(()),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
