//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Decimal Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In JavaScript/floating point:                                          │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  Line items may carry fractional quantities (2.5 kg × 3.10):            │
//! │    integer cents cannot hold 7.75 exactly without a rounding rule      │
//! │                                                                         │
//! │  OUR SOLUTION: base-10 Decimal                                          │
//! │    2.5 × 3.10 = 7.750 exactly, no rounding ever applied                │
//! │    price × quantity is checked, overflow is an error                   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use rust_decimal::Decimal;
//! use tally_core::money::Money;
//!
//! let price = Money::from_cents(1050); // 10.50
//! let line = price.checked_mul_quantity(Decimal::from(3)).unwrap();
//! assert_eq!(line, Money::from_cents(3150));
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};
use std::str::FromStr;

// =============================================================================
// Money Type
// =============================================================================

/// Most fractional digits a `Decimal` holds.
const MAX_SCALE: u32 = 28;

/// A monetary value held as an exact decimal.
///
/// ## Where Money is Used
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  CatalogItem.price ──► line price ──► line total (price × quantity)    │
/// │                                            │                            │
/// │                                            ▼                            │
/// │                         SaleHeader.amount (Σ line totals)               │
/// │                                            │                            │
/// │                        − SaleHeader.discount                            │
/// │                                            │                            │
/// │                                            ▼                            │
/// │                              SaleHeader.total                           │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
///
/// Serializes as a decimal string (`"10.50"`), which is also how it is
/// stored in SQLite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(Decimal);

impl Money {
    /// Wraps a decimal amount.
    #[inline]
    pub const fn new(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Creates a Money value from cents (two implied decimal places).
    ///
    /// ## Example
    /// ```rust
    /// use tally_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.to_string(), "$10.99");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// Returns the underlying decimal.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is strictly greater than zero.
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Checks if the value is strictly less than zero.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Multiplies a unit price by a quantity.
    ///
    /// ## User Workflow
    /// ```text
    /// Item: Widget 10.00
    /// Quantity: 2
    ///      │
    ///      ▼
    /// checked_mul_quantity(2) ← THIS FUNCTION
    ///      │
    ///      ▼
    /// Line Total: 20.00
    /// ```
    ///
    /// Returns `None` on overflow, and when the exact product does not fit
    /// in a `Decimal` (rust_decimal would otherwise round it).
    pub fn checked_mul_quantity(&self, quantity: Decimal) -> Option<Money> {
        let price = self.0.normalize();
        let quantity = quantity.normalize();
        let exact_scale = price.scale() + quantity.scale();
        if exact_scale > MAX_SCALE {
            return None;
        }

        price
            .checked_mul(quantity)
            .filter(|product| product.is_zero() || product.scale() == exact_scale)
            .map(Money)
    }

    /// Whether `price × quantity` needs more fractional digits than a
    /// `Decimal` can hold.
    pub fn exceeds_precision(&self, quantity: Decimal) -> bool {
        self.0.normalize().scale() + quantity.normalize().scale() > MAX_SCALE
    }

    /// Addition that reports overflow instead of panicking.
    #[inline]
    pub fn checked_add(&self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Subtraction that reports overflow instead of panicking.
    #[inline]
    pub fn checked_sub(&self, other: Money) -> Option<Money> {
        self.0.checked_sub(other.0).map(Money)
    }

    /// Canonical text used for storage: trailing zeros removed.
    ///
    /// `10.50` is stored as `"10.5"`, `20.00` as `"20"`.
    pub fn to_storage(&self) -> String {
        self.0.normalize().to_string()
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display shows money with two decimals and a currency sign.
///
/// ## Note
/// For logs and debugging. The form renderer formats for the locale.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.is_negative() { "-" } else { "" };
        write!(f, "{}${:.2}", sign, self.0.abs())
    }
}

impl FromStr for Money {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str(s.trim()).map(Money)
    }
}

impl From<Decimal> for Money {
    fn from(amount: Decimal) -> Self {
        Money(amount)
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

/// Addition of two Money values.
impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

/// Subtraction of two Money values.
impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.amount(), dec!(10.99));
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(1099)), "$10.99");
        assert_eq!(format!("{}", Money::new(dec!(5))), "$5.00");
        assert_eq!(format!("{}", Money::from_cents(-550)), "-$5.50");
        assert_eq!(format!("{}", Money::zero()), "$0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::new(dec!(10));
        let b = Money::new(dec!(5));

        assert_eq!(a + b, Money::new(dec!(15)));
        assert_eq!(a - b, Money::new(dec!(5)));

        let total: Money = vec![a, b, b].into_iter().sum();
        assert_eq!(total, Money::new(dec!(20)));
    }

    #[test]
    fn test_fractional_quantity_is_exact() {
        let price = Money::new(dec!(3.10));
        let line = price.checked_mul_quantity(dec!(2.5)).unwrap();
        assert_eq!(line, Money::new(dec!(7.75)));
    }

    #[test]
    fn test_mul_that_would_round_is_reported() {
        let price = Money::new(dec!(1.5));
        let quantity = Decimal::from_str("0.0000000000000000000000000003").unwrap();
        assert!(price.exceeds_precision(quantity));
        assert!(price.checked_mul_quantity(quantity).is_none());

        // Trailing zeros do not count against precision.
        let price = Money::new(dec!(1.50000000000000000000000000));
        assert!(!price.exceeds_precision(dec!(0.3)));
        assert_eq!(price.checked_mul_quantity(dec!(0.3)), Some(Money::new(dec!(0.45))));

        // Fits the scale but not the 96-bit mantissa.
        let price = Money::new(Decimal::from_str("7922816251426433759354395033.5").unwrap());
        assert!(price.checked_mul_quantity(dec!(1.5)).is_none());
    }

    #[test]
    fn test_mul_overflow_is_reported() {
        let price = Money::new(Decimal::MAX);
        assert!(price.checked_mul_quantity(dec!(2)).is_none());
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        let negative = Money::new(dec!(-1));
        assert!(negative.is_negative());
        assert!(!negative.is_positive());
    }

    #[test]
    fn test_storage_roundtrip_preserves_value() {
        let price = Money::new(dec!(10.50));
        assert_eq!(price.to_storage(), "10.5");
        let parsed: Money = price.to_storage().parse().unwrap();
        assert_eq!(parsed, price);

        assert_eq!(Money::new(dec!(20.00)).to_storage(), "20");
    }
}
