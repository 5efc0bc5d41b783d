//! # Sale Transaction Processor
//!
//! Turns a validated cart into a committed sale: number, lines, totals,
//! and stock movements, all in one transaction or not at all.
//!
//! ## Transaction Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      create_sale(user, cart)                            │
//! │                                                                         │
//! │  cart.validate()                  ← shape only, before any I/O         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌──────────────────────── attempt n ─────────────────────────────┐    │
//! │  │ BEGIN                                                          │    │
//! │  │  1. counter upsert ... RETURNING last_seq   ← takes write lock │    │
//! │  │     → INV-YYYYMMDD-NNNN                                        │    │
//! │  │  2. cashier belongs to tenant                                  │    │
//! │  │  3. resolve every product (tenant-scoped, active)              │    │
//! │  │  4. price lines, aggregate totals, cash change                 │    │
//! │  │  5. INSERT sale, INSERT sale_items (snapshots)                 │    │
//! │  │  6. StockLedger::record_movement(−qty, sale, ref = sale.id)    │    │
//! │  │ COMMIT                                                         │    │
//! │  └────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ├── Busy / duplicate sale_number → back off, retry               │
//! │       │      after max_attempts        → DbError::Conflict             │
//! │       └── anything else                → rolled back, returned as is   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Step 1 is a write, so SQLite hands this transaction the single writer
//! lock before any product row is read. Concurrent sales on the same
//! database therefore run one after another, and stock is only ever changed
//! by an in-SQL delta.

use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::repository::product::find_in;
use crate::repository::sale::{insert_item, insert_sale};
use crate::repository::stock::{NewMovement, StockLedger};
use crate::Tx;
use till_core::numbering::format_sale_number;
use till_core::pricing::price_line;
use till_core::{
    CoreError, LinePricing, MovementType, NewSale, Product, Sale, SaleItem, SaleStatus,
    SaleTotals,
};

// =============================================================================
// Retry Policy
// =============================================================================

/// How hard `create_sale` tries before reporting a conflict.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Minimum 1.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 5,
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    fn backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.initial_backoff,
            initial_interval: self.initial_backoff,
            max_interval: self.max_backoff,
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

// =============================================================================
// Processor
// =============================================================================

/// The sale transaction processor for one tenant.
#[derive(Debug, Clone)]
pub struct SaleProcessor {
    pool: SqlitePool,
    tenant_id: String,
    retry: RetryPolicy,
    ledger: StockLedger,
}

impl SaleProcessor {
    pub fn new(pool: SqlitePool, tenant_id: String, retry: RetryPolicy) -> Self {
        let ledger = StockLedger::new(pool.clone(), tenant_id.clone());
        SaleProcessor {
            pool,
            tenant_id,
            retry,
            ledger,
        }
    }

    /// Creates a sale now, in its own transaction, retrying on contention.
    pub async fn create_sale(&self, user_id: &str, cart: &NewSale) -> DbResult<Sale> {
        self.create_sale_at(user_id, cart, Utc::now()).await
    }

    /// Like [`create_sale`](Self::create_sale) with an explicit timestamp.
    ///
    /// The UTC date of `now` picks the sale number's business day.
    pub async fn create_sale_at(
        &self,
        user_id: &str,
        cart: &NewSale,
        now: DateTime<Utc>,
    ) -> DbResult<Sale> {
        cart.validate()?;

        let max_attempts = self.retry.max_attempts.max(1);
        let mut backoff = self.retry.backoff();
        let mut attempt = 0;

        loop {
            attempt += 1;

            let result = async {
                let mut tx = self.pool.begin().await?;
                let sale = self.create_sale_in(&mut tx, user_id, cart, now).await?;
                tx.commit().await?;
                Ok::<_, DbError>(sale)
            }
            .await;

            match result {
                Ok(sale) => {
                    info!(
                        tenant_id = %self.tenant_id,
                        sale_id = %sale.id,
                        sale_number = %sale.sale_number,
                        total_cents = sale.total_cents,
                        items = sale.items.len(),
                        attempt,
                        "Sale completed"
                    );
                    return Ok(sale);
                }
                Err(err) if err.is_retryable() => {
                    if attempt >= max_attempts {
                        warn!(
                            tenant_id = %self.tenant_id,
                            attempts = attempt,
                            error = %err,
                            "Sale abandoned after repeated conflicts"
                        );
                        return Err(DbError::Conflict { attempts: attempt });
                    }

                    let delay = backoff.next_backoff().unwrap_or(self.retry.max_backoff);
                    warn!(
                        tenant_id = %self.tenant_id,
                        attempt,
                        ?delay,
                        error = %err,
                        "Sale conflicted, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Runs the whole sale inside the caller's transaction.
    ///
    /// Nothing is committed here: the caller commits, or drops `tx` to roll
    /// everything back, sale number included. No retries happen at this
    /// level.
    pub async fn create_sale_in(
        &self,
        tx: &mut Tx<'_>,
        user_id: &str,
        cart: &NewSale,
        now: DateTime<Utc>,
    ) -> DbResult<Sale> {
        cart.validate()?;

        let sale_date = now.date_naive();
        let sale_number = self.allocate_sale_number(tx, sale_date).await?;

        self.ensure_cashier(tx, user_id).await?;

        // Resolve and price every line before writing anything.
        let mut lines: Vec<(Product, LinePricing)> = Vec::with_capacity(cart.items.len());
        for line in &cart.items {
            let product = find_in(&mut **tx, &self.tenant_id, &line.product_id)
                .await?
                .ok_or_else(|| CoreError::ProductNotFound(line.product_id.clone()))?;

            if !product.is_active {
                return Err(CoreError::ProductInactive {
                    id: product.id,
                    name: product.name,
                }
                .into());
            }

            let pricing = price_line(
                &product.id,
                product.price(),
                product.vat_rate(),
                line.quantity,
                line.discount(),
            )?;
            lines.push((product, pricing));
        }

        let pricings: Vec<LinePricing> = lines.iter().map(|(_, p)| *p).collect();
        let totals = SaleTotals::compute(
            &pricings,
            cart.discount(),
            cart.payment_method,
            cart.cash_received(),
        )?;

        let sale_id = Uuid::new_v4().to_string();
        let items: Vec<SaleItem> = cart
            .items
            .iter()
            .zip(&lines)
            .map(|(line, (product, pricing))| SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale_id.clone(),
                product_id: Some(product.id.clone()),
                product_name: product.name.clone(),
                quantity: line.quantity,
                unit_price_cents: product.price_cents,
                discount_cents: line.discount_cents,
                vat_rate_bps: product.vat_rate_bps,
                vat_cents: pricing.vat.cents(),
                total_cents: pricing.total.cents(),
            })
            .collect();

        let sale = Sale {
            id: sale_id,
            tenant_id: self.tenant_id.clone(),
            user_id: user_id.to_string(),
            sale_number,
            sale_date,
            subtotal_cents: totals.subtotal.cents(),
            discount_cents: totals.discount.cents(),
            vat_cents: totals.vat.cents(),
            total_cents: totals.total.cents(),
            payment_method: cart.payment_method,
            cash_received_cents: totals.cash_received.map(|m| m.cents()),
            change_given_cents: totals.change_given.map(|m| m.cents()),
            status: SaleStatus::Completed,
            notes: cart.notes.clone(),
            created_at: now,
            items,
        };

        insert_sale(&mut **tx, &sale).await?;
        for item in &sale.items {
            insert_item(&mut **tx, item).await?;
        }

        for item in &sale.items {
            if let Some(product_id) = &item.product_id {
                let movement = NewMovement::new(product_id, -item.quantity, MovementType::Sale)
                    .reference(&sale.id)
                    .by(Some(user_id))
                    .at(now);
                self.ledger.record_movement(tx, &movement).await?;
            }
        }

        debug!(
            tenant_id = %self.tenant_id,
            sale_number = %sale.sale_number,
            subtotal_cents = sale.subtotal_cents,
            vat_cents = sale.vat_cents,
            "Sale written"
        );

        Ok(sale)
    }

    /// Bumps the tenant's counter for `day` and formats the sale number.
    async fn allocate_sale_number(&self, tx: &mut Tx<'_>, day: NaiveDate) -> DbResult<String> {
        let seq: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO sale_number_counters (tenant_id, sale_date, last_seq)
            VALUES (?1, ?2, 1)
            ON CONFLICT (tenant_id, sale_date)
            DO UPDATE SET last_seq = sale_number_counters.last_seq + 1
            RETURNING last_seq
            "#,
        )
        .bind(&self.tenant_id)
        .bind(day)
        .fetch_one(&mut **tx)
        .await?;

        Ok(format_sale_number(day, seq))
    }

    /// The cashier must be an active user of this tenant.
    async fn ensure_cashier(&self, tx: &mut Tx<'_>, user_id: &str) -> DbResult<()> {
        let found: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM users WHERE id = ?1 AND tenant_id = ?2 AND is_active = 1",
        )
        .bind(user_id)
        .bind(&self.tenant_id)
        .fetch_optional(&mut **tx)
        .await?;

        match found {
            Some(_) => Ok(()),
            None => Err(DbError::not_found("User", user_id)),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::setup;
    use till_core::{CartLine, NewProduct, PaymentMethod};

    #[tokio::test]
    async fn test_reference_sale() {
        let (db, tenant, owner) = setup().await;
        let shop = db.tenant(&tenant.id);
        let product = shop
            .products()
            .create(NewProduct::new("Widget", 1000).with_opening_stock(10), None)
            .await
            .unwrap();

        let cart = NewSale::new(vec![CartLine::new(&product.id, 2)], PaymentMethod::Cash)
            .with_cash_received(3000);
        let sale = shop.processor().create_sale(&owner.id, &cart).await.unwrap();

        assert_eq!(sale.subtotal_cents, 2000);
        assert_eq!(sale.vat_cents, 400);
        assert_eq!(sale.total_cents, 2400);
        assert_eq!(sale.cash_received_cents, Some(3000));
        assert_eq!(sale.change_given_cents, Some(600));
        assert_eq!(sale.status, SaleStatus::Completed);
        assert_eq!(sale.items.len(), 1);
        assert_eq!(sale.items[0].product_name, "Widget");
        assert!(sale.sale_number.ends_with("-0001"));

        assert_eq!(shop.stock().current_level(&product.id).await.unwrap(), 8);
    }

    #[tokio::test]
    async fn test_card_sale_records_no_cash() {
        let (db, tenant, owner) = setup().await;
        let shop = db.tenant(&tenant.id);
        let product = shop.products().create(NewProduct::new("Pen", 150), None).await.unwrap();

        let cart = NewSale::new(vec![CartLine::new(&product.id, 1)], PaymentMethod::Card);
        let sale = shop.processor().create_sale(&owner.id, &cart).await.unwrap();

        assert_eq!(sale.total_cents, 180);
        assert_eq!(sale.cash_received_cents, None);
        assert_eq!(sale.change_given_cents, None);
    }

    #[tokio::test]
    async fn test_insufficient_cash_rolls_back() {
        let (db, tenant, owner) = setup().await;
        let shop = db.tenant(&tenant.id);
        let product = shop
            .products()
            .create(NewProduct::new("Lamp", 2000).with_opening_stock(3), None)
            .await
            .unwrap();

        let cart = NewSale::new(vec![CartLine::new(&product.id, 1)], PaymentMethod::Cash)
            .with_cash_received(1000);
        let err = shop.processor().create_sale(&owner.id, &cart).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::InsufficientCash { .. })));

        assert_eq!(shop.stock().current_level(&product.id).await.unwrap(), 3);
        assert_eq!(shop.sales().list(0, 10).await.unwrap().total, 0);
    }

    #[tokio::test]
    async fn test_unknown_cashier_rejected() {
        let (db, tenant, _) = setup().await;
        let shop = db.tenant(&tenant.id);
        let product = shop.products().create(NewProduct::new("Cup", 400), None).await.unwrap();

        let cart = NewSale::new(vec![CartLine::new(&product.id, 1)], PaymentMethod::Card);
        let err = shop.processor().create_sale("ghost", &cart).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { ref entity, .. } if entity == "User"));
    }

    #[tokio::test]
    async fn test_create_sale_in_leaves_commit_to_caller() {
        let (db, tenant, owner) = setup().await;
        let shop = db.tenant(&tenant.id);
        let product = shop
            .products()
            .create(NewProduct::new("Mug", 650).with_opening_stock(5), None)
            .await
            .unwrap();
        let cart = NewSale::new(vec![CartLine::new(&product.id, 1)], PaymentMethod::Card);
        let now = Utc::now();

        // Rolled back by the caller: nothing persists, number not consumed.
        {
            let mut tx = shop.begin().await.unwrap();
            let sale = shop.processor().create_sale_in(&mut tx, &owner.id, &cart, now).await.unwrap();
            assert!(sale.sale_number.ends_with("-0001"));
            tx.rollback().await.unwrap();
        }
        assert_eq!(shop.stock().current_level(&product.id).await.unwrap(), 5);

        let mut tx = shop.begin().await.unwrap();
        let sale = shop.processor().create_sale_in(&mut tx, &owner.id, &cart, now).await.unwrap();
        tx.commit().await.unwrap();

        assert!(sale.sale_number.ends_with("-0001"));
        assert_eq!(shop.stock().current_level(&product.id).await.unwrap(), 4);
        assert_eq!(shop.sales().get(&sale.id).await.unwrap().items.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_cart_never_opens_transaction() {
        let (db, tenant, owner) = setup().await;
        let cart = NewSale::new(vec![], PaymentMethod::Card);
        let err = db
            .tenant(&tenant.id)
            .processor()
            .create_sale(&owner.id, &cart)
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::Validation(_))));
    }

    #[test]
    fn test_retry_policy_backoff_starts_at_initial() {
        let policy = RetryPolicy {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(20),
            max_backoff: Duration::from_millis(40),
        };
        let mut backoff = policy.backoff();
        let first = backoff.next_backoff().unwrap();
        // randomization_factor defaults to 0.5
        assert!(first >= Duration::from_millis(10) && first <= Duration::from_millis(30));
    }
}
