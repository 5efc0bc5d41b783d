//! # till-db: Database Layer for Till POS
//!
//! This crate provides database access for Till POS: SQLite via sqlx,
//! tenant-scoped repositories, the stock ledger, and the sale transaction
//! processor.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Till POS Data Flow                               │
//! │                                                                         │
//! │  POST /sales (till-api)                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     till-db (THIS CRATE)                        │   │
//! │  │                                                                 │   │
//! │  │   Database ──► TenantScope ──► SaleProcessor                    │   │
//! │  │                    │              │  BEGIN                       │   │
//! │  │                    │              ├─ allocate INV number         │   │
//! │  │                    │              ├─ resolve + price lines       │   │
//! │  │                    │              ├─ insert sale + items         │   │
//! │  │                    │              ├─ StockLedger::record_movement│   │
//! │  │                    │              │  COMMIT (or roll back all)   │   │
//! │  │                    ▼                                             │   │
//! │  │   ProductRepository  CategoryRepository  SaleRepository          │   │
//! │  │   StockLedger        ReportRepository    UserRepository          │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                SQLite Database (WAL, foreign keys on)           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool, configuration, `TenantScope`
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Tenant-scoped repositories and the stock ledger
//! - [`processor`] - The atomic sale transaction
//!
//! ## Usage
//!
//! ```rust,ignore
//! use till_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("till.db")).await?;
//! let shop = db.tenant(tenant_id);
//!
//! let sale = shop.processor().create_sale(user_id, &cart).await?;
//! let low = shop.stock().low_stock().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod processor;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig, TenantScope};
pub use processor::{RetryPolicy, SaleProcessor};

pub use repository::category::CategoryRepository;
pub use repository::product::ProductRepository;
pub use repository::report::ReportRepository;
pub use repository::sale::SaleRepository;
pub use repository::settings::SettingsRepository;
pub use repository::stock::{NewMovement, StockLedger};
pub use repository::supplier::SupplierRepository;
pub use repository::tenant::{TenantRepository, UserRepository};

/// An open SQLite transaction. Dropping it without `commit()` rolls back.
pub type Tx<'a> = sqlx::Transaction<'a, sqlx::Sqlite>;
