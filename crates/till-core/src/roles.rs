//! # Roles and Permissions
//!
//! Static role → permission table. The API checks a permission per route;
//! nothing below the API layer knows about roles.
//!
//! ```text
//! ┌────────────────────┬───────┬─────────┬─────────┐
//! │ permission         │ owner │ manager │ cashier │
//! ├────────────────────┼───────┼─────────┼─────────┤
//! │ products:read      │   ✓   │    ✓    │    ✓    │
//! │ products:write     │   ✓   │    ✓    │         │
//! │ sales:read         │   ✓   │    ✓    │    ✓    │
//! │ sales:write        │   ✓   │    ✓    │    ✓    │
//! │ inventory:read     │   ✓   │    ✓    │    ✓    │
//! │ inventory:write    │   ✓   │    ✓    │         │
//! │ reports:read       │   ✓   │    ✓    │         │
//! │ suppliers:read     │   ✓   │    ✓    │    ✓    │
//! │ suppliers:write    │   ✓   │    ✓    │         │
//! │ settings:read      │   ✓   │    ✓    │         │
//! │ settings:write     │   ✓   │         │         │
//! └────────────────────┴───────┴─────────┴─────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

/// A user's role within their tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Owner,
    Manager,
    Cashier,
}

/// A single capability checked at the API boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Permission {
    ProductsRead,
    ProductsWrite,
    SalesRead,
    SalesWrite,
    InventoryRead,
    InventoryWrite,
    ReportsRead,
    SuppliersRead,
    SuppliersWrite,
    SettingsRead,
    SettingsWrite,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ProductsRead => "products:read",
            Permission::ProductsWrite => "products:write",
            Permission::SalesRead => "sales:read",
            Permission::SalesWrite => "sales:write",
            Permission::InventoryRead => "inventory:read",
            Permission::InventoryWrite => "inventory:write",
            Permission::ReportsRead => "reports:read",
            Permission::SuppliersRead => "suppliers:read",
            Permission::SuppliersWrite => "suppliers:write",
            Permission::SettingsRead => "settings:read",
            Permission::SettingsWrite => "settings:write",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Role {
    /// Whether this role grants `permission`.
    pub fn has_permission(&self, permission: Permission) -> bool {
        use Permission::*;

        match self {
            Role::Owner => true,
            Role::Manager => !matches!(permission, SettingsWrite),
            Role::Cashier => matches!(
                permission,
                ProductsRead | SalesRead | SalesWrite | InventoryRead | SuppliersRead
            ),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Manager => "manager",
            Role::Cashier => "cashier",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "owner" => Ok(Role::Owner),
            "manager" => Ok(Role::Manager),
            "cashier" => Ok(Role::Cashier),
            other => Err(ValidationError::InvalidFormat {
                field: "role".to_string(),
                reason: format!("unknown role '{}', expected owner, manager or cashier", other),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_has_everything() {
        for p in [
            Permission::ProductsWrite,
            Permission::ReportsRead,
            Permission::SettingsWrite,
        ] {
            assert!(Role::Owner.has_permission(p));
        }
    }

    #[test]
    fn test_manager_cannot_change_settings() {
        assert!(Role::Manager.has_permission(Permission::InventoryWrite));
        assert!(Role::Manager.has_permission(Permission::ReportsRead));
        assert!(Role::Manager.has_permission(Permission::SuppliersWrite));
        assert!(Role::Manager.has_permission(Permission::SettingsRead));
        assert!(!Role::Manager.has_permission(Permission::SettingsWrite));
    }

    #[test]
    fn test_cashier_can_sell_but_not_adjust() {
        assert!(Role::Cashier.has_permission(Permission::SalesWrite));
        assert!(Role::Cashier.has_permission(Permission::InventoryRead));
        assert!(!Role::Cashier.has_permission(Permission::InventoryWrite));
        assert!(!Role::Cashier.has_permission(Permission::ProductsWrite));
        assert!(!Role::Cashier.has_permission(Permission::ReportsRead));
        assert!(Role::Cashier.has_permission(Permission::SuppliersRead));
        assert!(!Role::Cashier.has_permission(Permission::SuppliersWrite));
        assert!(!Role::Cashier.has_permission(Permission::SettingsRead));
    }

    #[test]
    fn test_role_parsing() {
        assert_eq!("Cashier".parse::<Role>().unwrap(), Role::Cashier);
        assert!("admin".parse::<Role>().is_err());
        assert_eq!(Role::Manager.to_string(), "manager");
    }
}
