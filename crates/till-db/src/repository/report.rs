//! # Report Repository
//!
//! Read-only rollups over one tenant's `completed` sales. Refunded and
//! cancelled sales never count.
//!
//! Revenue is the VAT-inclusive sale total. Per-product revenue is the sum
//! of line totals, before any sale-level discount.

use chrono::{Duration, NaiveDate};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use till_core::report::{validate_date_range, TOP_PRODUCTS_LIMIT};
use till_core::{DailySummary, ProductSales, RangeReport};

/// (sale_date, total_sales, revenue, vat, cash, card)
type DayRow = (NaiveDate, i64, i64, i64, i64, i64);

const DAY_AGGREGATES: &str = r#"
    COUNT(*),
    COALESCE(SUM(total_cents), 0),
    COALESCE(SUM(vat_cents), 0),
    COALESCE(SUM(CASE WHEN payment_method = 'cash' THEN total_cents ELSE 0 END), 0),
    COALESCE(SUM(CASE WHEN payment_method = 'card' THEN total_cents ELSE 0 END), 0)
"#;

#[derive(Debug, Clone)]
pub struct ReportRepository {
    pool: SqlitePool,
    tenant_id: String,
}

impl ReportRepository {
    pub fn new(pool: SqlitePool, tenant_id: String) -> Self {
        ReportRepository { pool, tenant_id }
    }

    /// Takings for one business day.
    pub async fn daily_summary(&self, date: NaiveDate) -> DbResult<DailySummary> {
        debug!(tenant_id = %self.tenant_id, %date, "Daily summary");

        let sql = format!(
            "SELECT {DAY_AGGREGATES} FROM sales \
             WHERE tenant_id = ?1 AND sale_date = ?2 AND status = 'completed'"
        );
        let (total_sales, revenue, vat, cash, card): (i64, i64, i64, i64, i64) =
            sqlx::query_as(&sql)
                .bind(&self.tenant_id)
                .bind(date)
                .fetch_one(&self.pool)
                .await?;

        Ok(DailySummary {
            date,
            total_sales,
            total_revenue_cents: revenue,
            total_vat_cents: vat,
            cash_sales_cents: cash,
            card_sales_cents: card,
        })
    }

    /// Top products by revenue over an inclusive date range.
    pub async fn sales_by_product(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> DbResult<Vec<ProductSales>> {
        validate_date_range(start, end)?;

        let rows = sqlx::query_as::<_, ProductSales>(
            r#"
            SELECT si.product_id,
                   si.product_name,
                   SUM(si.quantity) AS quantity_sold,
                   SUM(si.total_cents) AS revenue_cents
            FROM sale_items si
            JOIN sales s ON s.id = si.sale_id
            WHERE s.tenant_id = ?1
              AND s.status = 'completed'
              AND s.sale_date BETWEEN ?2 AND ?3
            GROUP BY si.product_id, si.product_name
            ORDER BY revenue_cents DESC, si.product_name
            LIMIT ?4
            "#,
        )
        .bind(&self.tenant_id)
        .bind(start)
        .bind(end)
        .bind(TOP_PRODUCTS_LIMIT)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Every day of the range (empty days included), totals, top products.
    pub async fn range_report(&self, start: NaiveDate, end: NaiveDate) -> DbResult<RangeReport> {
        validate_date_range(start, end)?;

        let sql = format!(
            "SELECT sale_date, {DAY_AGGREGATES} FROM sales \
             WHERE tenant_id = ?1 AND status = 'completed' \
               AND sale_date BETWEEN ?2 AND ?3 \
             GROUP BY sale_date ORDER BY sale_date"
        );
        let rows: Vec<DayRow> = sqlx::query_as(&sql)
            .bind(&self.tenant_id)
            .bind(start)
            .bind(end)
            .fetch_all(&self.pool)
            .await?;

        let mut rows = rows.into_iter().peekable();
        let mut daily = Vec::new();
        let mut day = start;
        while day <= end {
            let summary = match rows.next_if(|row| row.0 == day) {
                Some((date, total_sales, revenue, vat, cash, card)) => DailySummary {
                    date,
                    total_sales,
                    total_revenue_cents: revenue,
                    total_vat_cents: vat,
                    cash_sales_cents: cash,
                    card_sales_cents: card,
                },
                None => DailySummary::empty(day),
            };
            daily.push(summary);
            day += Duration::days(1);
        }

        let top_products = self.sales_by_product(start, end).await?;

        Ok(RangeReport {
            start_date: start,
            end_date: end,
            total_sales: daily.iter().map(|d| d.total_sales).sum(),
            total_revenue_cents: daily.iter().map(|d| d.total_revenue_cents).sum(),
            total_vat_cents: daily.iter().map(|d| d.total_vat_cents).sum(),
            daily,
            top_products,
        })
    }
}
