//! # Tenant Settings
//!
//! What a tenant configures about itself: business details printed on
//! receipts, the VAT rates offered when pricing products, and the receipt
//! layout.
//!
//! ```text
//! BusinessInfo     ── stored on the tenant row
//! VatRates         ── tenant_settings["vat_rates"]        (JSON)
//! ReceiptTemplate  ── tenant_settings["receipt_template"] (JSON)
//! ```
//!
//! Missing documents read back as their `Default`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::validation::{validate_email, validate_name, validate_vat_rate_bps, ValidationResult};
use crate::DEFAULT_CURRENCY;

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

fn default_true() -> bool {
    true
}

/// Names of the JSON documents kept in `tenant_settings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingKey {
    VatRates,
    ReceiptTemplate,
}

impl SettingKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettingKey::VatRates => "vat_rates",
            SettingKey::ReceiptTemplate => "receipt_template",
        }
    }
}

// =============================================================================
// Business Info
// =============================================================================

/// The tenant's public business details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct BusinessInfo {
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub vat_number: Option<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl BusinessInfo {
    /// Validates and normalizes in place (currency upper-cased, name trimmed).
    pub fn normalize(&mut self) -> ValidationResult<()> {
        validate_name("name", &self.name, 200)?;
        self.name = self.name.trim().to_string();

        if let Some(email) = &self.email {
            validate_email(email)?;
        }

        self.currency = normalize_currency(&self.currency)?;
        Ok(())
    }
}

/// Upper-cases a currency code and checks it is three ASCII letters.
pub fn normalize_currency(code: &str) -> ValidationResult<String> {
    let code = code.trim().to_ascii_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ValidationError::InvalidFormat {
            field: "currency".to_string(),
            reason: "must be a 3-letter ISO 4217 code".to_string(),
        });
    }
    Ok(code)
}

// =============================================================================
// VAT Rates
// =============================================================================

/// The rates a tenant picks from when pricing products, in basis points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VatRates {
    pub standard_bps: u32,
    pub reduced_bps: u32,
    pub zero_bps: u32,
}

impl Default for VatRates {
    /// UK rates: 20%, 5%, 0%.
    fn default() -> Self {
        VatRates {
            standard_bps: 2000,
            reduced_bps: 500,
            zero_bps: 0,
        }
    }
}

impl VatRates {
    pub fn validate(&self) -> ValidationResult<()> {
        validate_vat_rate_bps(self.standard_bps)?;
        validate_vat_rate_bps(self.reduced_bps)?;
        validate_vat_rate_bps(self.zero_bps)
    }
}

// =============================================================================
// Receipt Template
// =============================================================================

/// Free text printed above and below every receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ReceiptTemplate {
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default)]
    pub footer: Option<String>,
    #[serde(default = "default_true")]
    pub show_vat_breakdown: bool,
}

impl Default for ReceiptTemplate {
    fn default() -> Self {
        ReceiptTemplate {
            header: None,
            footer: None,
            show_vat_breakdown: true,
        }
    }
}

impl ReceiptTemplate {
    pub const MAX_TEXT_LEN: usize = 1000;

    pub fn validate(&self) -> ValidationResult<()> {
        for (field, text) in [("header", &self.header), ("footer", &self.footer)] {
            if let Some(text) = text {
                if text.chars().count() > Self::MAX_TEXT_LEN {
                    return Err(ValidationError::TooLong {
                        field: field.to_string(),
                        max: Self::MAX_TEXT_LEN,
                    });
                }
            }
        }
        Ok(())
    }
}

/// Everything at once, as the settings screen loads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AllSettings {
    pub business: BusinessInfo,
    pub vat_rates: VatRates,
    pub receipt: ReceiptTemplate,
}
