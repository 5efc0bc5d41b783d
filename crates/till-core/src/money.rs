//! # Money Module
//!
//! Provides the `Money` and `VatRate` types.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004                                      │
//! │                                                                         │
//! │  A till that sums VAT over thousands of lines in f64 drifts by          │
//! │  fractions of a penny that auditors will find.                          │
//! │                                                                         │
//! │  OUR SOLUTION: integer minor units + basis-point rates                 │
//! │    £10.00 at 20.00% → 1000 × 2000 / 10000 = 200 pence                  │
//! │    Rounding happens exactly once per line, at the point of storage.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use till_core::money::{Money, VatRate};
//!
//! let price = Money::from_cents(1099);
//! let line = price * 3;
//! assert_eq!(line.cents(), 3297);
//!
//! let vat = line.calculate_vat(VatRate::from_bps(2000));
//! assert_eq!(vat.cents(), 659); // 659.4 rounds down
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Money Type
// =============================================================================

/// A monetary value in the smallest currency unit (pence for GBP).
///
/// Signed, so refunds and discounts can be represented without a second type.
/// The tenant's currency is a property of the tenant, not of the value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    #[inline]
    pub const fn from_cents(cents: i64) -> Self {
        Money(cents)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Returns the major unit portion (truncated toward zero).
    #[inline]
    pub const fn major(&self) -> i64 {
        self.0 / 100
    }

    /// Returns the minor unit portion, always 0-99.
    #[inline]
    pub const fn minor(&self) -> i64 {
        (self.0 % 100).abs()
    }

    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Calculates VAT on this amount, rounded half away from zero to whole
    /// minor units.
    ///
    /// ## Implementation
    /// `|amount| * bps` is computed in i128, then `(x + 5000) / 10000`
    /// rounds the magnitude and the sign is restored. Rounding the magnitude
    /// keeps `vat(-x) == -vat(x)`, which matters for refund lines.
    ///
    /// ```rust
    /// use till_core::money::{Money, VatRate};
    ///
    /// // £0.25 at 20% = 5p exactly
    /// assert_eq!(Money::from_cents(25).calculate_vat(VatRate::from_bps(2000)).cents(), 5);
    /// // £0.03 at 17.5% = 0.525p → 1p
    /// assert_eq!(Money::from_cents(3).calculate_vat(VatRate::from_bps(1750)).cents(), 1);
    /// ```
    pub fn calculate_vat(&self, rate: VatRate) -> Money {
        let magnitude = (self.0 as i128).abs() * rate.bps() as i128;
        let rounded = (magnitude + 5000) / 10000;
        let signed = if self.0 < 0 { -rounded } else { rounded };
        Money(signed as i64)
    }

    /// Multiplies by a quantity, returning `None` on overflow.
    #[inline]
    pub fn checked_mul_quantity(&self, qty: i64) -> Option<Money> {
        self.0.checked_mul(qty).map(Money)
    }

    /// Adds two amounts, returning `None` on overflow.
    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Plain decimal rendering (`12.50`, `-0.05`). Currency symbols belong to
/// the front end, which knows the tenant's currency and locale.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, self.major().abs(), self.minor())
    }
}

/// Parses a decimal amount with at most two fractional digits.
///
/// ```rust
/// use till_core::money::Money;
///
/// assert_eq!("10.5".parse::<Money>().unwrap().cents(), 1050);
/// assert_eq!("-0.05".parse::<Money>().unwrap().cents(), -5);
/// assert!("1.234".parse::<Money>().is_err());
/// ```
impl FromStr for Money {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "amount".to_string(),
            reason: reason.to_string(),
        };

        let s = s.trim();
        let (negative, digits) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };

        let (major_str, minor_str) = match digits.split_once('.') {
            Some((major, minor)) => (major, minor),
            None => (digits, ""),
        };

        if major_str.is_empty() || !major_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("expected a decimal number such as 12.50"));
        }
        if minor_str.len() > 2 || !minor_str.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid("at most two decimal places are allowed"));
        }

        let major: i64 = major_str
            .parse()
            .map_err(|_| invalid("amount is too large"))?;
        let minor: i64 = match minor_str.len() {
            0 => 0,
            1 => minor_str.parse::<i64>().map_err(|_| invalid("bad fraction"))? * 10,
            _ => minor_str.parse().map_err(|_| invalid("bad fraction"))?,
        };

        let cents = major
            .checked_mul(100)
            .and_then(|c| c.checked_add(minor))
            .ok_or_else(|| invalid("amount is too large"))?;

        Ok(Money(if negative { -cents } else { cents }))
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// VAT Rate
// =============================================================================

/// VAT rate in basis points: `2000` = 20.00%.
///
/// Two decimal places of percentage precision, stored exactly. Rates are
/// validated to 0..=100% before they reach a product row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VatRate(u32);

impl VatRate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        VatRate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        VatRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for VatRate {
    fn default() -> Self {
        VatRate(crate::DEFAULT_VAT_RATE_BPS)
    }
}

/// Renders as a percentage with two decimals: `20.00%`, `17.50%`.
impl fmt::Display for VatRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.cents(), 1099);
        assert_eq!(money.major(), 10);
        assert_eq!(money.minor(), 99);
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_cents(500).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::from_cents(-5).to_string(), "-0.05");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_parse() {
        assert_eq!("12".parse::<Money>().unwrap().cents(), 1200);
        assert_eq!("12.3".parse::<Money>().unwrap().cents(), 1230);
        assert_eq!("12.34".parse::<Money>().unwrap().cents(), 1234);
        assert_eq!("-1.01".parse::<Money>().unwrap().cents(), -101);

        assert!("".parse::<Money>().is_err());
        assert!("abc".parse::<Money>().is_err());
        assert!(".50".parse::<Money>().is_err());
        assert!("1.005".parse::<Money>().is_err());
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).cents(), 1500);
        assert_eq!((a - b).cents(), 500);
        assert_eq!((a * 3).cents(), 3000);
        assert_eq!((-a).cents(), -1000);

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total.cents(), 2000);
    }

    #[test]
    fn test_vat_standard_rate() {
        let amount = Money::from_cents(2000);
        assert_eq!(amount.calculate_vat(VatRate::from_bps(2000)).cents(), 400);
    }

    #[test]
    fn test_vat_rounds_half_away_from_zero() {
        // 0.5p rounds up
        assert_eq!(Money::from_cents(5).calculate_vat(VatRate::from_bps(1000)).cents(), 1);
        // 0.4p rounds down
        assert_eq!(Money::from_cents(2).calculate_vat(VatRate::from_bps(2000)).cents(), 0);
        // symmetric for negative amounts
        assert_eq!(Money::from_cents(-5).calculate_vat(VatRate::from_bps(1000)).cents(), -1);
    }

    #[test]
    fn test_vat_zero_rate() {
        assert!(Money::from_cents(999).calculate_vat(VatRate::zero()).is_zero());
    }

    #[test]
    fn test_checked_ops_detect_overflow() {
        assert!(Money::from_cents(i64::MAX).checked_mul_quantity(2).is_none());
        assert!(Money::from_cents(i64::MAX).checked_add(Money::from_cents(1)).is_none());
        assert_eq!(Money::from_cents(7).checked_mul_quantity(3), Some(Money::from_cents(21)));
    }

    #[test]
    fn test_vat_rate_display() {
        assert_eq!(VatRate::from_bps(2000).to_string(), "20.00%");
        assert_eq!(VatRate::from_bps(1750).to_string(), "17.50%");
        assert_eq!(VatRate::from_bps(5).to_string(), "0.05%");
        assert_eq!(VatRate::default().bps(), 2000);
    }
}
