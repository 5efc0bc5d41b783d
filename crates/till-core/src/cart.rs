//! # Cart Input
//!
//! The request a till submits to ring up a sale. Validation here is about
//! *shape* only (sizes, signs, lengths); whether the products exist and are
//! sellable is decided inside the sale transaction.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::PaymentMethod;
use crate::validation::{
    validate_cart_size, validate_discount_cents, validate_notes, validate_quantity,
    ValidationResult,
};

/// One requested line: which product, how many, and a line discount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CartLine {
    pub product_id: String,
    pub quantity: i64,
    /// Flat discount on the whole line, in minor units.
    #[serde(default)]
    pub discount_cents: i64,
}

impl CartLine {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        CartLine {
            product_id: product_id.into(),
            quantity,
            discount_cents: 0,
        }
    }

    pub fn with_discount(mut self, discount_cents: i64) -> Self {
        self.discount_cents = discount_cents;
        self
    }

    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }
}

/// A complete sale request.
///
/// ```json
/// {
///   "items": [{ "product_id": "…", "quantity": 2, "discount_cents": 0 }],
///   "discount_cents": 0,
///   "payment_method": "cash",
///   "cash_received_cents": 3000,
///   "notes": null
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct NewSale {
    pub items: Vec<CartLine>,
    /// Flat discount on the whole sale, in minor units.
    #[serde(default)]
    pub discount_cents: i64,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub cash_received_cents: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl NewSale {
    /// A sale with no discount, no tender and no notes.
    pub fn new(items: Vec<CartLine>, payment_method: PaymentMethod) -> Self {
        NewSale {
            items,
            discount_cents: 0,
            payment_method,
            cash_received_cents: None,
            notes: None,
        }
    }

    pub fn with_cash_received(mut self, cents: i64) -> Self {
        self.cash_received_cents = Some(cents);
        self
    }

    pub fn with_discount(mut self, cents: i64) -> Self {
        self.discount_cents = cents;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    #[inline]
    pub fn discount(&self) -> Money {
        Money::from_cents(self.discount_cents)
    }

    #[inline]
    pub fn cash_received(&self) -> Option<Money> {
        self.cash_received_cents.map(Money::from_cents)
    }

    /// Checks the request's shape before any database work.
    ///
    /// ## Rules
    /// - 1 to `MAX_CART_ITEMS` lines, each with a product id
    /// - Quantities 1 to `MAX_ITEM_QUANTITY`
    /// - Discounts and tender are never negative
    /// - Cash tender only on cash sales
    /// - Notes at most `MAX_NOTES_LEN` characters
    pub fn validate(&self) -> ValidationResult<()> {
        validate_cart_size(self.items.len())?;

        for line in &self.items {
            if line.product_id.trim().is_empty() {
                return Err(ValidationError::Required {
                    field: "product_id".to_string(),
                });
            }
            validate_quantity(line.quantity)?;
            validate_discount_cents(line.discount_cents)?;
        }

        validate_discount_cents(self.discount_cents)?;

        if let Some(received) = self.cash_received_cents {
            if self.payment_method != PaymentMethod::Cash {
                return Err(ValidationError::Inconsistent {
                    field: "cash_received".to_string(),
                    reason: "only cash payments take cash".to_string(),
                });
            }
            if received < 0 {
                return Err(ValidationError::MustNotBeNegative {
                    field: "cash_received".to_string(),
                });
            }
        }

        validate_notes(self.notes.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_CART_ITEMS;

    fn one_line() -> NewSale {
        NewSale::new(vec![CartLine::new("p-1", 2)], PaymentMethod::Cash)
    }

    #[test]
    fn test_valid_cart() {
        assert!(one_line().validate().is_ok());
        assert!(one_line().with_cash_received(3000).validate().is_ok());
    }

    #[test]
    fn test_empty_cart_rejected() {
        let sale = NewSale::new(vec![], PaymentMethod::Card);
        let err = sale.validate().unwrap_err();
        assert_eq!(err.field(), "items");
    }

    #[test]
    fn test_oversized_cart_rejected() {
        let items = (0..=MAX_CART_ITEMS).map(|i| CartLine::new(format!("p-{i}"), 1)).collect();
        assert!(NewSale::new(items, PaymentMethod::Card).validate().is_err());
    }

    #[test]
    fn test_line_checks() {
        let zero_qty = NewSale::new(vec![CartLine::new("p-1", 0)], PaymentMethod::Card);
        assert_eq!(zero_qty.validate().unwrap_err().field(), "quantity");

        let blank_id = NewSale::new(vec![CartLine::new("  ", 1)], PaymentMethod::Card);
        assert_eq!(blank_id.validate().unwrap_err().field(), "product_id");

        let negative = NewSale::new(
            vec![CartLine::new("p-1", 1).with_discount(-1)],
            PaymentMethod::Card,
        );
        assert_eq!(negative.validate().unwrap_err().field(), "discount");
    }

    #[test]
    fn test_cash_on_card_sale_rejected() {
        let sale = NewSale::new(vec![CartLine::new("p-1", 1)], PaymentMethod::Card)
            .with_cash_received(500);
        assert_eq!(sale.validate().unwrap_err().field(), "cash_received");
    }

    #[test]
    fn test_deserialize_defaults() {
        let sale: NewSale = serde_json::from_str(
            r#"{"items":[{"product_id":"p-1","quantity":3}],"payment_method":"card"}"#,
        )
        .unwrap();

        assert_eq!(sale.items[0].discount_cents, 0);
        assert_eq!(sale.discount_cents, 0);
        assert_eq!(sale.cash_received_cents, None);
        assert!(sale.validate().is_ok());
    }
}
