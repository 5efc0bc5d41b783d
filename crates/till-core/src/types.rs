//! # Domain Types
//!
//! Core domain types used throughout Till POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Tenant ─┬─► User                                                      │
//! │          ├─► Supplier                                                  │
//! │          ├─► Category ◄── Product.category_id (nullable)               │
//! │          ├─► Product ──────────────┐                                   │
//! │          │     stock_quantity      │ projection of                     │
//! │          │        ▲                ▼                                   │
//! │          │        └──── StockMovement (append-only, signed qty)        │
//! │          │                         ▲ reference_id                      │
//! │          └─► Sale ─► SaleItem ─────┘ (product_id weak, snapshots)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4, immutable, used for relations
//! - A business key where one exists: `sku`, `barcode`, `sale_number`
//!
//! Every tenant-owned row also carries `tenant_id`; the database layer binds
//! it into every query so rows of other tenants are never visible.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{Money, VatRate};
use crate::roles::Role;

// =============================================================================
// Tenant & User
// =============================================================================

/// A business using the system. The isolation boundary for all data.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Tenant {
    pub id: String,
    pub name: String,
    /// ISO 4217 code. Amounts are stored in this currency's minor unit.
    pub currency: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// VAT registration number printed on receipts.
    pub vat_number: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A person who operates the till or back office for one tenant.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub tenant_id: String,
    pub email: String,
    pub full_name: String,
    pub role: Role,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Catalog
// =============================================================================

/// A product category.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A product available for sale.
///
/// `stock_quantity` is a cached projection of the product's stock movements.
/// It is written only by the stock ledger.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Tenant this product belongs to.
    pub tenant_id: String,

    pub category_id: Option<String>,

    /// Display name shown to the cashier and on receipts.
    pub name: String,

    pub description: Option<String>,

    /// Stock Keeping Unit, unique per tenant when present.
    pub sku: Option<String>,

    /// Barcode (EAN-13, UPC-A, ...), unique per tenant when present.
    pub barcode: Option<String>,

    /// Selling price, VAT exclusive, in minor units.
    pub price_cents: i64,

    /// Purchase cost in minor units (for margin reporting).
    pub cost_price_cents: Option<i64>,

    /// VAT rate in basis points (2000 = 20.00%).
    pub vat_rate_bps: u32,

    /// Current stock level. May go negative: sales are never refused for stock.
    pub stock_quantity: i64,

    /// At or below this level the product is reported as low stock.
    pub min_stock_level: i64,

    /// Whether the product can be sold (soft delete flag).
    pub is_active: bool,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn vat_rate(&self) -> VatRate {
        VatRate::from_bps(self.vat_rate_bps)
    }

    /// Stock at or below the reorder threshold.
    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.min_stock_level
    }
}

/// A company the tenant buys stock from.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub tax_number: Option<String>,
    pub registration_number: Option<String>,
    pub bank_account: Option<String>,
    pub bank_name: Option<String>,
    pub payment_terms: Option<String>,
    pub min_order_amount_cents: Option<i64>,
    pub delivery_days: Option<i64>,
    pub notes: Option<String>,
    pub is_active: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Sale Status
// =============================================================================

/// The status of a sale.
///
/// Sales are created `Completed`. `Refunded` and `Cancelled` are the only
/// transitions a sale may ever make; nothing else about it changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum SaleStatus {
    #[default]
    Completed,
    Refunded,
    Cancelled,
}

// =============================================================================
// Payment Method
// =============================================================================

/// How the customer paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Physical cash. The only method that produces change.
    Cash,
    /// Card payment on an external terminal.
    Card,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A sale transaction with its frozen totals.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    pub tenant_id: String,
    /// Cashier who rang the sale.
    pub user_id: String,
    /// `INV-YYYYMMDD-NNNN`, unique per tenant.
    pub sale_number: String,
    /// UTC business day the sale number was allocated for.
    #[ts(as = "String")]
    pub sale_date: NaiveDate,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub vat_cents: i64,
    pub total_cents: i64,
    pub payment_method: PaymentMethod,
    /// Cash tendered. Always `None` for card payments.
    pub cash_received_cents: Option<i64>,
    /// Change returned. Only set for cash payments with cash tendered.
    pub change_given_cents: Option<i64>,
    pub status: SaleStatus,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    /// Line items, loaded separately from `sale_items`.
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub items: Vec<SaleItem>,
}

impl Sale {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
///
/// Name, unit price and VAT rate are snapshots taken when the sale was
/// created. Later catalog edits never reach them. `product_id` is a weak
/// reference that becomes `None` if the product is hard-deleted.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: Option<String>,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub discount_cents: i64,
    pub vat_rate_bps: u32,
    pub vat_cents: i64,
    /// `unit_price * quantity - discount + vat`.
    pub total_cents: i64,
}

impl SaleItem {
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Stock Movement
// =============================================================================

/// Why stock moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    Sale,
    Adjustment,
    Purchase,
    Return,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::Sale => "sale",
            MovementType::Adjustment => "adjustment",
            MovementType::Purchase => "purchase",
            MovementType::Return => "return",
        }
    }
}

/// One append-only entry in the stock ledger.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockMovement {
    pub id: String,
    pub tenant_id: String,
    pub product_id: String,
    /// Signed: negative for stock leaving, positive for stock arriving.
    pub quantity: i64,
    pub movement_type: MovementType,
    /// The sale id for `Sale` movements.
    pub reference_id: Option<String>,
    pub user_id: Option<String>,
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// A product's stock position, as listed by the inventory screens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockLevel {
    pub product_id: String,
    pub name: String,
    pub sku: Option<String>,
    pub stock_quantity: i64,
    pub min_stock_level: i64,
    pub is_low_stock: bool,
}

/// A product whose cached stock disagrees with its movement log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct StockDiscrepancy {
    pub product_id: String,
    pub stock_quantity: i64,
    pub movements_total: i64,
}

// =============================================================================
// Pagination
// =============================================================================

/// One page of a list plus the total row count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: i64, min: i64) -> Product {
        let now = Utc::now();
        Product {
            id: "p-1".to_string(),
            tenant_id: "t-1".to_string(),
            category_id: None,
            name: "Oat Milk 1L".to_string(),
            description: None,
            sku: Some("OAT-1L".to_string()),
            barcode: None,
            price_cents: 189,
            cost_price_cents: Some(120),
            vat_rate_bps: 0,
            stock_quantity: stock,
            min_stock_level: min,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_low_stock_threshold_is_inclusive() {
        assert!(product(5, 5).is_low_stock());
        assert!(product(-2, 0).is_low_stock());
        assert!(!product(6, 5).is_low_stock());
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(serde_json::to_string(&PaymentMethod::Card).unwrap(), "\"card\"");
        assert_eq!(serde_json::to_string(&SaleStatus::Completed).unwrap(), "\"completed\"");
        assert_eq!(serde_json::to_string(&MovementType::Return).unwrap(), "\"return\"");
        assert_eq!(
            serde_json::from_str::<MovementType>("\"adjustment\"").unwrap(),
            MovementType::Adjustment
        );
        assert_eq!(MovementType::Purchase.as_str(), "purchase");
    }

    #[test]
    fn test_sale_items_default_when_absent() {
        let json = serde_json::json!({
            "id": "s-1",
            "tenant_id": "t-1",
            "user_id": "u-1",
            "sale_number": "INV-20250301-0001",
            "sale_date": "2025-03-01",
            "subtotal_cents": 2000,
            "discount_cents": 0,
            "vat_cents": 400,
            "total_cents": 2400,
            "payment_method": "cash",
            "cash_received_cents": 3000,
            "change_given_cents": 600,
            "status": "completed",
            "notes": null,
            "created_at": "2025-03-01T09:30:00Z"
        });

        let sale: Sale = serde_json::from_value(json).unwrap();
        assert!(sale.items.is_empty());
        assert_eq!(sale.total().cents(), 2400);
    }
}
