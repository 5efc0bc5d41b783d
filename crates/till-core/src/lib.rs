//! # till-core: Pure Business Logic for Till POS
//!
//! Everything a sale needs to be *correct* lives here, as plain functions
//! over plain types. Nothing in this crate touches a database, a socket or
//! the clock.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Till POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  till-api (axum HTTP server)                    │   │
//! │  │     POST /sales, /inventory/adjust, /reports/daily, ...         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    till-db (Database Layer)                     │   │
//! │  │   SaleProcessor ─► StockLedger ─► repositories ─► SQLite        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ pure calls                             │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ till-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌────────┐  │   │
//! │  │   │  money  │ │ pricing │ │  cart   │ │  patch   │ │ roles  │  │   │
//! │  │   │ VatRate │ │ lines + │ │ NewSale │ │ Product- │ │ perms  │  │   │
//! │  │   │  Money  │ │ totals  │ │ checks  │ │  Patch   │ │        │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └──────────┘ └────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - `Money` (integer minor units) and `VatRate` (basis points)
//! - [`types`] - Domain entities (Tenant, Supplier, Product, Sale, StockMovement, ...)
//! - [`pricing`] - Line and sale total calculation
//! - [`cart`] - Incoming sale requests and their shape validation
//! - [`numbering`] - `INV-YYYYMMDD-NNNN` sale numbers
//! - [`patch`] - Explicit partial-update structs
//! - [`roles`] - Role to permission mapping
//! - [`settings`] - Business details, VAT rates, receipt template
//! - [`report`] - Reporting DTOs
//! - [`error`] - Domain error types
//! - [`validation`] - Field-level validators
//!
//! ## Example Usage
//!
//! ```rust
//! use till_core::money::{Money, VatRate};
//! use till_core::pricing::price_line;
//!
//! let line = price_line("p-1", Money::from_cents(1000), VatRate::from_bps(2000), 2, Money::zero()).unwrap();
//! assert_eq!(line.subtotal.cents(), 2000);
//! assert_eq!(line.vat.cents(), 400);
//! assert_eq!(line.total.cents(), 2400);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod money;
pub mod numbering;
pub mod patch;
pub mod pricing;
pub mod report;
pub mod roles;
pub mod settings;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{CartLine, NewSale};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{Money, VatRate};
pub use patch::{
    CategoryPatch, NewCategory, NewProduct, NewSupplier, ProductPatch, SupplierPatch,
};
pub use pricing::{LinePricing, SaleTotals};
pub use report::{DailySummary, ProductSales, RangeReport};
pub use roles::{Permission, Role};
pub use settings::{AllSettings, BusinessInfo, ReceiptTemplate, VatRates};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum line items allowed in a single sale.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// Catches keying mistakes (1000 typed for 10) at the till.
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Default VAT rate for new products: 20.00% (UK standard rate).
pub const DEFAULT_VAT_RATE_BPS: u32 = 2000;

/// Default tenant currency.
pub const DEFAULT_CURRENCY: &str = "GBP";
