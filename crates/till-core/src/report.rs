//! # Report DTOs
//!
//! Read-only rollups over completed sales. Queries live in till-db; these
//! are the shapes they return.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::validation::ValidationResult;

/// Longest range a single report may span, in days.
pub const MAX_REPORT_DAYS: i64 = 366;

/// How many products the by-product report returns.
pub const TOP_PRODUCTS_LIMIT: i64 = 20;

/// Takings for one business day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DailySummary {
    #[ts(as = "String")]
    pub date: NaiveDate,
    pub total_sales: i64,
    pub total_revenue_cents: i64,
    pub total_vat_cents: i64,
    pub cash_sales_cents: i64,
    pub card_sales_cents: i64,
}

impl DailySummary {
    /// A day with no sales.
    pub fn empty(date: NaiveDate) -> Self {
        DailySummary {
            date,
            total_sales: 0,
            total_revenue_cents: 0,
            total_vat_cents: 0,
            cash_sales_cents: 0,
            card_sales_cents: 0,
        }
    }
}

/// Sales of one product over a range, keyed by the snapshotted id and name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct ProductSales {
    /// `None` once the product has been hard-deleted.
    pub product_id: Option<String>,
    pub product_name: String,
    pub quantity_sold: i64,
    pub revenue_cents: i64,
}

/// Day-by-day breakdown of a date range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RangeReport {
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    #[ts(as = "String")]
    pub end_date: NaiveDate,
    pub total_sales: i64,
    pub total_revenue_cents: i64,
    pub total_vat_cents: i64,
    pub daily: Vec<DailySummary>,
    pub top_products: Vec<ProductSales>,
}

/// Checks an inclusive date range: ordered and at most `MAX_REPORT_DAYS` long.
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> ValidationResult<()> {
    if end < start {
        return Err(ValidationError::Inconsistent {
            field: "end_date".to_string(),
            reason: "must not be before start_date".to_string(),
        });
    }

    let days = (end - start).num_days() + 1;
    if days > MAX_REPORT_DAYS {
        return Err(ValidationError::OutOfRange {
            field: "date range (days)".to_string(),
            min: 1,
            max: MAX_REPORT_DAYS,
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_date_range_validation() {
        assert!(validate_date_range(d(2025, 1, 1), d(2025, 1, 1)).is_ok());
        assert!(validate_date_range(d(2024, 1, 1), d(2024, 12, 31)).is_ok()); // 366 days
        assert!(validate_date_range(d(2025, 1, 2), d(2025, 1, 1)).is_err());
        assert!(validate_date_range(d(2024, 1, 1), d(2025, 1, 1)).is_err());
    }
}
