//! # Repository Module
//!
//! Tenant-scoped repository implementations for Till POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  HTTP handler                                                          │
//! │       │                                                                 │
//! │       │  db.tenant(tid).products().search("milk", 20)                  │
//! │       ▼                                                                 │
//! │  ProductRepository { pool, tenant_id }                                 │
//! │  ├── search(&self, query, limit)                                       │
//! │  ├── get(&self, id)                                                    │
//! │  ├── create(&self, req, user)                                          │
//! │  └── update(&self, id, patch)                                          │
//! │       │                                                                 │
//! │       │  SQL with `tenant_id = ?` on every statement                   │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`tenant::TenantRepository`] - Tenant lifecycle (unscoped)
//! - [`tenant::UserRepository`] - User creation and lookup
//! - [`product::ProductRepository`] - Catalog store: lookup, search, CRUD
//! - [`category::CategoryRepository`] - Category CRUD
//! - [`supplier::SupplierRepository`] - Supplier CRUD and search
//! - [`settings::SettingsRepository`] - Business info, VAT rates, receipt template
//! - [`sale::SaleRepository`] - Sale reads and in-transaction inserts
//! - [`stock::StockLedger`] - Movement log, stock projection, audit
//! - [`report::ReportRepository`] - Read-only rollups

pub mod category;
pub mod product;
pub mod report;
pub mod sale;
pub mod settings;
pub mod stock;
pub mod supplier;
pub mod tenant;

/// Escapes `%`, `_` and `\` so user input matches literally in
/// `LIKE ? ESCAPE '\'`.
pub(crate) fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// Shared fixtures for the repository unit tests.
#[cfg(test)]
pub(crate) mod test_support {
    use till_core::{Role, Tenant, User};

    use crate::{Database, DbConfig};

    /// A fresh in-memory database with one tenant and one owner.
    pub async fn setup() -> (Database, Tenant, User) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let tenant = db.tenants().create("Corner Shop", None).await.unwrap();
        let owner = db
            .tenant(&tenant.id)
            .users()
            .create("owner@corner.test", "Olive Owner", Role::Owner)
            .await
            .unwrap();
        (db, tenant, owner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("milk"), "milk");
    }
}
