//! # Catalog Inputs and Patches
//!
//! Creation requests and explicit partial updates for products,
//! categories and suppliers.
//!
//! ## Patch Semantics
//! ```text
//! field absent        → leave unchanged        (None)
//! field: null         → clear nullable column  (Some(None))
//! field: value        → set                    (Some(Some(v)) / Some(v))
//! ```
//!
//! `stock_quantity` is deliberately absent from `ProductPatch`: stock only
//! moves through the ledger. Unknown fields are rejected so a client trying
//! to patch stock gets an error instead of a silent no-op.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::ValidationError;
use crate::types::{Category, Product, Supplier};
use crate::validation::{
    validate_barcode, validate_email, validate_min_stock_level, validate_name, validate_notes,
    validate_price_cents, validate_product_name, validate_sku, validate_vat_rate_bps,
    ValidationResult,
};
use crate::DEFAULT_VAT_RATE_BPS;

/// Distinguishes an absent field from an explicit `null`.
fn double_option<'de, T, D>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(de).map(Some)
}

fn default_vat_rate_bps() -> u32 {
    DEFAULT_VAT_RATE_BPS
}

// =============================================================================
// Products
// =============================================================================

/// Request to create a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub barcode: Option<String>,
    pub price_cents: i64,
    #[serde(default)]
    pub cost_price_cents: Option<i64>,
    #[serde(default = "default_vat_rate_bps")]
    pub vat_rate_bps: u32,
    /// Recorded as an `adjustment` movement when non-zero.
    #[serde(default)]
    pub opening_stock: i64,
    #[serde(default)]
    pub min_stock_level: i64,
}

impl NewProduct {
    /// A product at the default VAT rate with no stock.
    pub fn new(name: impl Into<String>, price_cents: i64) -> Self {
        NewProduct {
            name: name.into(),
            category_id: None,
            description: None,
            sku: None,
            barcode: None,
            price_cents,
            cost_price_cents: None,
            vat_rate_bps: DEFAULT_VAT_RATE_BPS,
            opening_stock: 0,
            min_stock_level: 0,
        }
    }

    pub fn with_sku(mut self, sku: impl Into<String>) -> Self {
        self.sku = Some(sku.into());
        self
    }

    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = Some(barcode.into());
        self
    }

    pub fn with_vat_rate_bps(mut self, bps: u32) -> Self {
        self.vat_rate_bps = bps;
        self
    }

    pub fn with_opening_stock(mut self, qty: i64) -> Self {
        self.opening_stock = qty;
        self
    }

    pub fn with_min_stock_level(mut self, level: i64) -> Self {
        self.min_stock_level = level;
        self
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    pub fn with_cost_price(mut self, cents: i64) -> Self {
        self.cost_price_cents = Some(cents);
        self
    }

    pub fn validate(&self) -> ValidationResult<()> {
        validate_product_name(&self.name)?;
        if let Some(sku) = &self.sku {
            validate_sku(sku)?;
        }
        if let Some(barcode) = &self.barcode {
            validate_barcode(barcode)?;
        }
        validate_price_cents("price", self.price_cents)?;
        if let Some(cost) = self.cost_price_cents {
            validate_price_cents("cost_price", cost)?;
        }
        validate_vat_rate_bps(self.vat_rate_bps)?;
        validate_min_stock_level(self.min_stock_level)
    }

    /// Builds the product row. Stock starts at zero; the opening stock
    /// arrives through the ledger.
    pub fn into_product(self, id: String, tenant_id: String, now: DateTime<Utc>) -> Product {
        Product {
            id,
            tenant_id,
            category_id: self.category_id,
            name: self.name.trim().to_string(),
            description: self.description,
            sku: self.sku.map(|s| s.trim().to_string()),
            barcode: self.barcode.map(|b| b.trim().to_string()),
            price_cents: self.price_cents,
            cost_price_cents: self.cost_price_cents,
            vat_rate_bps: self.vat_rate_bps,
            stock_quantity: 0,
            min_stock_level: self.min_stock_level,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a product.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub sku: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub barcode: Option<Option<String>>,
    #[serde(default)]
    pub price_cents: Option<i64>,
    #[serde(default, deserialize_with = "double_option")]
    pub cost_price_cents: Option<Option<i64>>,
    #[serde(default)]
    pub vat_rate_bps: Option<u32>,
    #[serde(default)]
    pub min_stock_level: Option<i64>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        *self == ProductPatch::default()
    }

    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(name) = &self.name {
            validate_product_name(name)?;
        }
        if let Some(Some(sku)) = &self.sku {
            validate_sku(sku)?;
        }
        if let Some(Some(barcode)) = &self.barcode {
            validate_barcode(barcode)?;
        }
        if let Some(price) = self.price_cents {
            validate_price_cents("price", price)?;
        }
        if let Some(Some(cost)) = self.cost_price_cents {
            validate_price_cents("cost_price", cost)?;
        }
        if let Some(bps) = self.vat_rate_bps {
            validate_vat_rate_bps(bps)?;
        }
        if let Some(level) = self.min_stock_level {
            validate_min_stock_level(level)?;
        }
        Ok(())
    }

    /// Applies every present field to `product`, field by field.
    pub fn apply(&self, product: &mut Product, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            product.name = name.trim().to_string();
        }
        if let Some(category_id) = &self.category_id {
            product.category_id = category_id.clone();
        }
        if let Some(description) = &self.description {
            product.description = description.clone();
        }
        if let Some(sku) = &self.sku {
            product.sku = sku.as_ref().map(|s| s.trim().to_string());
        }
        if let Some(barcode) = &self.barcode {
            product.barcode = barcode.as_ref().map(|b| b.trim().to_string());
        }
        if let Some(price) = self.price_cents {
            product.price_cents = price;
        }
        if let Some(cost) = self.cost_price_cents {
            product.cost_price_cents = cost;
        }
        if let Some(bps) = self.vat_rate_bps {
            product.vat_rate_bps = bps;
        }
        if let Some(level) = self.min_stock_level {
            product.min_stock_level = level;
        }
        if let Some(active) = self.is_active {
            product.is_active = active;
        }
        product.updated_at = now;
    }
}

// =============================================================================
// Categories
// =============================================================================

/// Request to create a category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCategory {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl NewCategory {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_name("name", &self.name, 100)
    }
}

/// Partial update of a category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CategoryPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
}

impl CategoryPatch {
    pub fn validate(&self) -> ValidationResult<()> {
        match &self.name {
            Some(name) => validate_name("name", name, 100),
            None => Ok(()),
        }
    }

    pub fn apply(&self, category: &mut Category) {
        if let Some(name) = &self.name {
            category.name = name.trim().to_string();
        }
        if let Some(description) = &self.description {
            category.description = description.clone();
        }
    }
}

// =============================================================================
// Suppliers
// =============================================================================

fn default_true() -> bool {
    true
}

fn validate_supplier_name(name: &str) -> ValidationResult<()> {
    validate_name("name", name, 255)
}

fn validate_delivery_days(days: i64) -> ValidationResult<()> {
    if days < 0 {
        return Err(ValidationError::MustNotBeNegative {
            field: "delivery_days".to_string(),
        });
    }
    Ok(())
}

/// Request to create a supplier. Only `name` is required.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSupplier {
    pub name: String,
    #[serde(default)]
    pub contact_person: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub tax_number: Option<String>,
    #[serde(default)]
    pub registration_number: Option<String>,
    #[serde(default)]
    pub bank_account: Option<String>,
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub payment_terms: Option<String>,
    #[serde(default)]
    pub min_order_amount_cents: Option<i64>,
    #[serde(default)]
    pub delivery_days: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl NewSupplier {
    pub fn new(name: impl Into<String>) -> Self {
        NewSupplier {
            name: name.into(),
            is_active: true,
            ..Default::default()
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn validate(&self) -> ValidationResult<()> {
        validate_supplier_name(&self.name)?;
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        if let Some(amount) = self.min_order_amount_cents {
            validate_price_cents("min_order_amount", amount)?;
        }
        if let Some(days) = self.delivery_days {
            validate_delivery_days(days)?;
        }
        validate_notes(self.notes.as_deref())
    }

    pub fn into_supplier(self, id: String, tenant_id: String, now: DateTime<Utc>) -> Supplier {
        Supplier {
            id,
            tenant_id,
            name: self.name.trim().to_string(),
            contact_person: self.contact_person,
            email: self.email.map(|e| e.trim().to_string()),
            phone: self.phone,
            address: self.address,
            city: self.city,
            postal_code: self.postal_code,
            country: self.country,
            tax_number: self.tax_number,
            registration_number: self.registration_number,
            bank_account: self.bank_account,
            bank_name: self.bank_name,
            payment_terms: self.payment_terms,
            min_order_amount_cents: self.min_order_amount_cents,
            delivery_days: self.delivery_days,
            notes: self.notes,
            is_active: self.is_active,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Partial update of a supplier. Every optional column can be cleared with
/// an explicit `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SupplierPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    pub contact_person: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub city: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub postal_code: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub country: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub tax_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub registration_number: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub bank_account: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub bank_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub payment_terms: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub min_order_amount_cents: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub delivery_days: Option<Option<i64>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    #[serde(default)]
    pub is_active: Option<bool>,
}

impl SupplierPatch {
    pub fn is_empty(&self) -> bool {
        *self == SupplierPatch::default()
    }

    pub fn validate(&self) -> ValidationResult<()> {
        if let Some(name) = &self.name {
            validate_supplier_name(name)?;
        }
        if let Some(Some(email)) = &self.email {
            validate_email(email)?;
        }
        if let Some(Some(amount)) = self.min_order_amount_cents {
            validate_price_cents("min_order_amount", amount)?;
        }
        if let Some(Some(days)) = self.delivery_days {
            validate_delivery_days(days)?;
        }
        if let Some(notes) = &self.notes {
            validate_notes(notes.as_deref())?;
        }
        Ok(())
    }

    pub fn apply(&self, supplier: &mut Supplier, now: DateTime<Utc>) {
        fn set<T: Clone>(slot: &mut Option<T>, value: &Option<Option<T>>) {
            if let Some(v) = value {
                *slot = v.clone();
            }
        }

        if let Some(name) = &self.name {
            supplier.name = name.trim().to_string();
        }
        set(&mut supplier.contact_person, &self.contact_person);
        set(&mut supplier.email, &self.email);
        set(&mut supplier.phone, &self.phone);
        set(&mut supplier.address, &self.address);
        set(&mut supplier.city, &self.city);
        set(&mut supplier.postal_code, &self.postal_code);
        set(&mut supplier.country, &self.country);
        set(&mut supplier.tax_number, &self.tax_number);
        set(&mut supplier.registration_number, &self.registration_number);
        set(&mut supplier.bank_account, &self.bank_account);
        set(&mut supplier.bank_name, &self.bank_name);
        set(&mut supplier.payment_terms, &self.payment_terms);
        set(&mut supplier.min_order_amount_cents, &self.min_order_amount_cents);
        set(&mut supplier.delivery_days, &self.delivery_days);
        set(&mut supplier.notes, &self.notes);
        if let Some(active) = self.is_active {
            supplier.is_active = active;
        }
        supplier.updated_at = now;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn product() -> Product {
        NewProduct::new("Croissant", 180)
            .with_sku("CRS-1")
            .with_barcode("5000000000001")
            .into_product("p-1".to_string(), "t-1".to_string(), Utc::now())
    }

    #[test]
    fn test_new_product_defaults() {
        let req: NewProduct =
            serde_json::from_str(r#"{"name":"Croissant","price_cents":180}"#).unwrap();
        assert_eq!(req.vat_rate_bps, 2000);
        assert_eq!(req.opening_stock, 0);
        assert!(req.validate().is_ok());

        let p = req.into_product("p".into(), "t".into(), Utc::now());
        assert_eq!(p.stock_quantity, 0);
        assert!(p.is_active);
    }

    #[test]
    fn test_new_product_validation() {
        assert!(NewProduct::new("", 100).validate().is_err());
        assert!(NewProduct::new("Tea", -1).validate().is_err());
        assert!(NewProduct::new("Tea", 100).with_vat_rate_bps(12000).validate().is_err());
        assert!(NewProduct::new("Tea", 100).with_sku("bad sku").validate().is_err());
        assert!(NewProduct::new("Tea", 100).with_min_stock_level(-1).validate().is_err());
    }

    #[test]
    fn test_patch_absent_null_and_value() {
        let patch: ProductPatch =
            serde_json::from_str(r#"{"price_cents":200,"barcode":null}"#).unwrap();

        assert_eq!(patch.price_cents, Some(200));
        assert_eq!(patch.barcode, Some(None));
        assert_eq!(patch.sku, None);

        let mut p = product();
        patch.apply(&mut p, Utc::now());
        assert_eq!(p.price_cents, 200);
        assert_eq!(p.barcode, None);
        assert_eq!(p.sku.as_deref(), Some("CRS-1"));
        assert_eq!(p.name, "Croissant");
    }

    #[test]
    fn test_patch_rejects_stock_field() {
        let result = serde_json::from_str::<ProductPatch>(r#"{"stock_quantity":50}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(ProductPatch::default().is_empty());
        let patch: ProductPatch = serde_json::from_str(r#"{"is_active":false}"#).unwrap();
        assert!(!patch.is_empty());
    }

    #[test]
    fn test_patch_validation() {
        let patch = ProductPatch {
            vat_rate_bps: Some(10001),
            ..Default::default()
        };
        assert!(patch.validate().is_err());

        let patch = ProductPatch {
            sku: Some(None),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());
    }

    #[test]
    fn test_new_supplier_defaults_and_validation() {
        let req: NewSupplier = serde_json::from_str(r#"{"name":"Acme Wholesale"}"#).unwrap();
        assert!(req.is_active);
        assert!(req.validate().is_ok());

        assert!(NewSupplier::new(" ").validate().is_err());
        assert_eq!(
            NewSupplier::new("Acme").with_email("not-an-email").validate().unwrap_err().field(),
            "email"
        );

        let mut late = NewSupplier::new("Acme");
        late.delivery_days = Some(-1);
        assert_eq!(late.validate().unwrap_err().field(), "delivery_days");
    }

    #[test]
    fn test_supplier_patch_clears_and_sets() {
        let now = Utc::now();
        let mut supplier = NewSupplier::new("Acme")
            .with_email("orders@acme.test")
            .with_phone("0123")
            .into_supplier("s-1".into(), "t-1".into(), now);

        let patch: SupplierPatch =
            serde_json::from_str(r#"{"phone":null,"delivery_days":3,"is_active":false}"#).unwrap();
        assert!(!patch.is_empty());
        assert!(patch.validate().is_ok());
        patch.apply(&mut supplier, now);

        assert_eq!(supplier.phone, None);
        assert_eq!(supplier.email.as_deref(), Some("orders@acme.test"));
        assert_eq!(supplier.delivery_days, Some(3));
        assert!(!supplier.is_active);

        assert!(serde_json::from_str::<SupplierPatch>(r#"{"rating":5}"#).is_err());
    }

    #[test]
    fn test_category_patch() {
        let now = Utc::now();
        let mut c = Category {
            id: "c-1".into(),
            tenant_id: "t-1".into(),
            name: "Bakery".into(),
            description: Some("Fresh daily".into()),
            created_at: now,
        };

        let patch: CategoryPatch = serde_json::from_str(r#"{"description":null}"#).unwrap();
        patch.apply(&mut c);
        assert_eq!(c.name, "Bakery");
        assert_eq!(c.description, None);
    }
}
