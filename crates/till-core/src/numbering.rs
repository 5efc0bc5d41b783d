//! # Sale Numbers
//!
//! Human-readable, per-tenant, per-day sequential sale numbers:
//! `INV-20250301-0001`, `INV-20250301-0002`, ...
//!
//! The sequence itself is allocated by the database (an atomic counter row
//! per tenant and day); this module only owns the format.

use chrono::NaiveDate;

/// Prefix of every sale number.
pub const SALE_NUMBER_PREFIX: &str = "INV";

/// Formats a sale number. Sequences past 9999 widen rather than wrap.
///
/// ```rust
/// use chrono::NaiveDate;
/// use till_core::numbering::format_sale_number;
///
/// let day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
/// assert_eq!(format_sale_number(day, 7), "INV-20250301-0007");
/// ```
pub fn format_sale_number(day: NaiveDate, seq: i64) -> String {
    format!("{}-{}-{:04}", SALE_NUMBER_PREFIX, day.format("%Y%m%d"), seq)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()
    }

    #[test]
    fn test_format_pads_to_four_digits() {
        assert_eq!(format_sale_number(day(), 1), "INV-20251231-0001");
        assert_eq!(format_sale_number(day(), 9999), "INV-20251231-9999");
        assert_eq!(format_sale_number(day(), 10000), "INV-20251231-10000");
    }
}
