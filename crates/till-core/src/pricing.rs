//! # Pricing Calculator
//!
//! Pure functions turning catalog prices, quantities and discounts into the
//! figures stored on a sale.
//!
//! ## Formulas
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  PER LINE                                                               │
//! │    subtotal = unit_price × quantity − line_discount                     │
//! │    vat      = round(subtotal × vat_rate)      (half away from zero)     │
//! │    total    = subtotal + vat                                            │
//! │                                                                         │
//! │  PER SALE                                                               │
//! │    subtotal = Σ line.subtotal                                           │
//! │    vat      = Σ line.vat                                                │
//! │    total    = subtotal + vat − sale_discount                            │
//! │    change   = cash_received − total           (cash only)               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! VAT is rounded once per line. Sale figures are exact sums of the stored
//! line figures, so a receipt always adds up.
//!
//! ## Example
//! ```rust
//! use till_core::money::{Money, VatRate};
//! use till_core::pricing::{price_line, SaleTotals};
//! use till_core::PaymentMethod;
//!
//! let line = price_line("p-1", Money::from_cents(1000), VatRate::from_bps(2000), 2, Money::zero()).unwrap();
//! let totals = SaleTotals::compute(&[line], Money::zero(), PaymentMethod::Cash, Some(Money::from_cents(3000))).unwrap();
//!
//! assert_eq!(totals.total.cents(), 2400);
//! assert_eq!(totals.change_given.unwrap().cents(), 600);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, VatRate};
use crate::types::PaymentMethod;

// =============================================================================
// Line Pricing
// =============================================================================

/// Priced figures for one sale line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinePricing {
    /// `unit_price × quantity − discount`, VAT exclusive.
    pub subtotal: Money,
    pub vat: Money,
    /// `subtotal + vat`.
    pub total: Money,
}

/// Prices one line.
///
/// ## Errors
/// - `LineDiscountTooLarge` if `discount` exceeds `unit_price × quantity`
/// - `AmountOverflow` if the figures leave i64 range
pub fn price_line(
    product_id: &str,
    unit_price: Money,
    vat_rate: VatRate,
    quantity: i64,
    discount: Money,
) -> CoreResult<LinePricing> {
    let overflow = || CoreError::AmountOverflow {
        context: format!("line for product {}", product_id),
    };

    let gross = unit_price.checked_mul_quantity(quantity).ok_or_else(overflow)?;

    if discount > gross {
        return Err(CoreError::LineDiscountTooLarge {
            product_id: product_id.to_string(),
            amount: gross.to_string(),
            discount: discount.to_string(),
        });
    }

    let subtotal = gross - discount;
    let vat = subtotal.calculate_vat(vat_rate);
    let total = subtotal.checked_add(vat).ok_or_else(overflow)?;

    Ok(LinePricing {
        subtotal,
        vat,
        total,
    })
}

// =============================================================================
// Sale Totals
// =============================================================================

/// Aggregate figures for a whole sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleTotals {
    pub subtotal: Money,
    pub vat: Money,
    pub discount: Money,
    pub total: Money,
    /// Cash tendered, kept only for cash payments.
    pub cash_received: Option<Money>,
    /// Change owed, present only for cash payments with cash tendered.
    pub change_given: Option<Money>,
}

impl SaleTotals {
    /// Aggregates priced lines into sale totals.
    ///
    /// ## Rules
    /// - `total = Σ subtotal + Σ vat − sale_discount`, never negative
    /// - Cash: change is `cash_received − total`; tendering less than the
    ///   total is rejected. No tender recorded means no change recorded.
    /// - Card: no cash figures are recorded at all.
    pub fn compute(
        lines: &[LinePricing],
        sale_discount: Money,
        payment_method: PaymentMethod,
        cash_received: Option<Money>,
    ) -> CoreResult<SaleTotals> {
        let overflow = || CoreError::AmountOverflow {
            context: "sale totals".to_string(),
        };

        let mut subtotal = Money::zero();
        let mut vat = Money::zero();
        for line in lines {
            subtotal = subtotal.checked_add(line.subtotal).ok_or_else(overflow)?;
            vat = vat.checked_add(line.vat).ok_or_else(overflow)?;
        }

        let before_discount = subtotal.checked_add(vat).ok_or_else(overflow)?;
        if sale_discount > before_discount {
            return Err(CoreError::SaleDiscountTooLarge {
                amount: before_discount.to_string(),
                discount: sale_discount.to_string(),
            });
        }
        let total = before_discount - sale_discount;

        let (cash_received, change_given) = match (payment_method, cash_received) {
            (PaymentMethod::Cash, Some(received)) => {
                if received < total {
                    return Err(CoreError::InsufficientCash {
                        received: received.to_string(),
                        total: total.to_string(),
                    });
                }
                (Some(received), Some(received - total))
            }
            (PaymentMethod::Cash, None) => (None, None),
            (PaymentMethod::Card, _) => (None, None),
        };

        Ok(SaleTotals {
            subtotal,
            vat,
            discount: sale_discount,
            total,
            cash_received,
            change_given,
        })
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn gbp(cents: i64) -> Money {
        Money::from_cents(cents)
    }

    fn standard(price: i64, qty: i64, discount: i64) -> LinePricing {
        price_line("p", gbp(price), VatRate::from_bps(2000), qty, gbp(discount)).unwrap()
    }

    #[test]
    fn test_reference_sale() {
        // 10.00 at 20%, qty 2, paid 30.00 cash
        let line = standard(1000, 2, 0);
        assert_eq!(line.subtotal, gbp(2000));
        assert_eq!(line.vat, gbp(400));
        assert_eq!(line.total, gbp(2400));

        let totals =
            SaleTotals::compute(&[line], Money::zero(), PaymentMethod::Cash, Some(gbp(3000)))
                .unwrap();
        assert_eq!(totals.subtotal, gbp(2000));
        assert_eq!(totals.vat, gbp(400));
        assert_eq!(totals.total, gbp(2400));
        assert_eq!(totals.cash_received, Some(gbp(3000)));
        assert_eq!(totals.change_given, Some(gbp(600)));
    }

    #[test]
    fn test_line_discount_reduces_vat_base() {
        // 3 × 4.99 = 14.97, less 1.97 = 13.00, VAT 2.60
        let line = standard(499, 3, 197);
        assert_eq!(line.subtotal, gbp(1300));
        assert_eq!(line.vat, gbp(260));
        assert_eq!(line.total, gbp(1560));
    }

    #[test]
    fn test_vat_rounded_per_line() {
        // 0.99 at 17.5% = 17.325p → 17p on each line
        let a = price_line("a", gbp(99), VatRate::from_bps(1750), 1, Money::zero()).unwrap();
        let b = price_line("b", gbp(99), VatRate::from_bps(1750), 1, Money::zero()).unwrap();
        let totals = SaleTotals::compute(&[a, b], Money::zero(), PaymentMethod::Card, None).unwrap();

        assert_eq!(a.vat, gbp(17));
        assert_eq!(totals.vat, gbp(34));
        assert_eq!(totals.total, gbp(232));
    }

    #[test]
    fn test_mixed_rates_and_sale_discount() {
        let food = price_line("bread", gbp(150), VatRate::zero(), 2, Money::zero()).unwrap();
        let drink = standard(250, 1, 0);

        let totals =
            SaleTotals::compute(&[food, drink], gbp(100), PaymentMethod::Card, None).unwrap();
        assert_eq!(totals.subtotal, gbp(550));
        assert_eq!(totals.vat, gbp(50));
        assert_eq!(totals.discount, gbp(100));
        assert_eq!(totals.total, gbp(500));
    }

    #[test]
    fn test_card_never_records_cash() {
        let totals = SaleTotals::compute(
            &[standard(1000, 1, 0)],
            Money::zero(),
            PaymentMethod::Card,
            Some(gbp(5000)),
        )
        .unwrap();
        assert_eq!(totals.cash_received, None);
        assert_eq!(totals.change_given, None);
    }

    #[test]
    fn test_cash_without_tender_has_no_change() {
        let totals =
            SaleTotals::compute(&[standard(1000, 1, 0)], Money::zero(), PaymentMethod::Cash, None)
                .unwrap();
        assert_eq!(totals.change_given, None);
    }

    #[test]
    fn test_exact_cash_gives_zero_change() {
        let totals = SaleTotals::compute(
            &[standard(1000, 1, 0)],
            Money::zero(),
            PaymentMethod::Cash,
            Some(gbp(1200)),
        )
        .unwrap();
        assert_eq!(totals.change_given, Some(Money::zero()));
    }

    #[test]
    fn test_rejects_insufficient_cash() {
        let err = SaleTotals::compute(
            &[standard(1000, 1, 0)],
            Money::zero(),
            PaymentMethod::Cash,
            Some(gbp(1199)),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InsufficientCash { .. }));
    }

    #[test]
    fn test_rejects_oversized_discounts() {
        let err = price_line("p-9", gbp(100), VatRate::zero(), 2, gbp(201)).unwrap_err();
        assert!(matches!(err, CoreError::LineDiscountTooLarge { ref product_id, .. } if product_id == "p-9"));

        let err = SaleTotals::compute(&[standard(100, 1, 0)], gbp(121), PaymentMethod::Card, None)
            .unwrap_err();
        assert!(matches!(err, CoreError::SaleDiscountTooLarge { .. }));
    }

    #[test]
    fn test_full_discount_is_allowed() {
        let line = standard(100, 2, 200);
        assert_eq!(line.total, Money::zero());

        let totals =
            SaleTotals::compute(&[standard(100, 1, 0)], gbp(120), PaymentMethod::Card, None).unwrap();
        assert_eq!(totals.total, Money::zero());
    }

    #[test]
    fn test_overflow_is_an_error() {
        let err = price_line("p", gbp(i64::MAX / 2), VatRate::zero(), 3, Money::zero()).unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow { .. }));
    }
}
