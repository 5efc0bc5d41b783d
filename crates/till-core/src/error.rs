//! # Error Types
//!
//! Domain-specific error types for till-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  till-core errors (this file)                                          │
//! │  ├── CoreError        - Business rule failures                         │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  till-db errors (separate crate)                                       │
//! │  └── DbError          - Database failures, carries CoreError           │
//! │                                                                         │
//! │  till-api errors (app)                                                 │
//! │  └── ApiError         - What HTTP clients see                          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Client       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Product does not exist in the caller's tenant.
    ///
    /// Another tenant's product id lands here too: from inside a tenant,
    /// foreign rows do not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Product exists but has been soft-deleted.
    #[error("Product {name} ({id}) is inactive and cannot be sold")]
    ProductInactive { id: String, name: String },

    /// Sale does not exist in the caller's tenant.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Category does not exist in the caller's tenant.
    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    /// A line discount larger than the line amount.
    #[error("Discount {discount} exceeds line amount {amount} for product {product_id}")]
    LineDiscountTooLarge {
        product_id: String,
        amount: String,
        discount: String,
    },

    /// The sale-level discount would make the total negative.
    #[error("Sale discount {discount} exceeds sale amount {amount}")]
    SaleDiscountTooLarge { amount: String, discount: String },

    /// Cash tendered does not cover the total.
    #[error("Cash received {received} is less than total {total}")]
    InsufficientCash { received: String, total: String },

    /// A monetary amount overflowed i64 minor units.
    #[error("Amount out of range while pricing {context}")]
    AmountOverflow { context: String },

    /// Cached stock level disagrees with the movement log.
    #[error(
        "Stock ledger inconsistent for product {product_id}: stock_quantity {recorded}, movements sum {expected}"
    )]
    ConsistencyFault {
        product_id: String,
        recorded: i64,
        expected: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before any persistence happens.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Two fields that only make sense together, or not at all.
    #[error("{field}: {reason}")]
    Inconsistent { field: String, reason: String },
}

impl ValidationError {
    /// The field the error is about.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::MustNotBeNegative { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::Inconsistent { field, .. } => field,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
