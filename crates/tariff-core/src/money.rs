//! # Money Module
//!
//! Provides the `Money` type for monetary amounts in minor currency units.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌                                  │
//! │                                                                         │
//! │  OUR SOLUTION: Integer minor units for every row amount                 │
//! │    Ratios (tax rates, FX rates, discount shares) are `Decimal`          │
//! │    and every product of amount × ratio is rounded back to an integer   │
//! │    exactly once, half away from zero.                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use rust_decimal::Decimal;
//! use tariff_core::money::Money;
//!
//! let price = Money::from_minor(1099);
//! let doubled = price * 2;
//! assert_eq!(doubled.minor(), 2198);
//!
//! // 10.99 × 0.5 = 5.495 → 5.50
//! let half = price.mul_ratio(Decimal::new(5, 1));
//! assert_eq!(half.minor(), 550);
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

// =============================================================================
// Money Type
// =============================================================================

/// A signed amount in the smallest currency unit (cents for CHF/EUR/USD).
///
/// Positive amounts are charges, negative amounts are reductions. The type
/// carries no currency: a [`PricingSheet`](crate::sheet::PricingSheet) owns the
/// currency code for every row it holds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units.
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Returns the absolute value.
    #[inline]
    pub const fn abs(&self) -> Self {
        Money(self.0.abs())
    }

    /// Returns the larger of the two amounts.
    #[inline]
    pub fn max(self, other: Money) -> Money {
        Money(self.0.max(other.0))
    }

    /// Returns the smaller of the two amounts.
    #[inline]
    pub fn min(self, other: Money) -> Money {
        Money(self.0.min(other.0))
    }

    /// Returns the amount as an exact decimal in minor units.
    #[inline]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::from(self.0)
    }

    /// Rounds a decimal amount of minor units to the nearest whole unit.
    ///
    /// ## Rounding
    /// Half away from zero: `2.5 → 3`, `-2.5 → -3`. Amounts outside the
    /// `i64` range saturate; they cannot occur for real prices.
    pub fn from_decimal(minor: Decimal) -> Money {
        let rounded = minor.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
        let value = rounded.to_i64().unwrap_or(if rounded.is_sign_negative() {
            i64::MIN
        } else {
            i64::MAX
        });
        Money(value)
    }

    /// Multiplies the amount by a decimal ratio and rounds the result.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use tariff_core::money::Money;
    ///
    /// let amount = Money::from_minor(20000);
    /// let tax = amount.mul_ratio(Decimal::new(77, 3)); // 7.7%
    /// assert_eq!(tax.minor(), 1540);
    /// ```
    pub fn mul_ratio(&self, ratio: Decimal) -> Money {
        Money::from_decimal(self.to_decimal() * ratio)
    }

    /// Divides the amount by a decimal divisor and rounds the result.
    ///
    /// Returns `None` for a zero divisor.
    pub fn div_ratio(&self, divisor: Decimal) -> Option<Money> {
        if divisor.is_zero() {
            return None;
        }
        Some(Money::from_decimal(self.to_decimal() / divisor))
    }

    /// Rounds the amount to a multiple of `increment` minor units.
    ///
    /// Used for cash rounding (e.g. CHF to 5 Rappen). An increment of 0 or
    /// 1 leaves the amount unchanged.
    ///
    /// ## Example
    /// ```rust
    /// use tariff_core::money::Money;
    ///
    /// assert_eq!(Money::from_minor(1072).round_to_increment(5).minor(), 1070);
    /// assert_eq!(Money::from_minor(1073).round_to_increment(5).minor(), 1075);
    /// ```
    pub fn round_to_increment(&self, increment: i64) -> Money {
        if increment <= 1 {
            return *self;
        }
        let steps = Money::from_decimal(self.to_decimal() / Decimal::from(increment));
        Money(steps.0 * increment)
    }

    /// Adds two amounts, returning `None` on overflow.
    #[inline]
    pub fn checked_add(self, other: Money) -> Option<Money> {
        self.0.checked_add(other.0).map(Money)
    }

    /// Multiplies by a quantity, returning `None` on overflow.
    #[inline]
    pub fn checked_mul(self, qty: i64) -> Option<Money> {
        self.0.checked_mul(qty).map(Money)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows the amount with two implied decimal places (for logs and debugging).
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        write!(f, "{}{}.{:02}", sign, (self.0 / 100).abs(), (self.0 % 100).abs())
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

/// Multiplication by a quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.copied().sum()
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
    fn test_display() {
        assert_eq!(Money::from_minor(1099).to_string(), "10.99");
        assert_eq!(Money::from_minor(500).to_string(), "5.00");
        assert_eq!(Money::from_minor(-550).to_string(), "-5.50");
        assert_eq!(Money::from_minor(-5).to_string(), "-0.05");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(500);

        assert_eq!((a + b).minor(), 1500);
        assert_eq!((a - b).minor(), 500);
        assert_eq!((-a).minor(), -1000);
        assert_eq!((a * 3).minor(), 3000);
    }

    #[test]
    fn test_checked_mul() {
        assert_eq!(Money::from_minor(250).checked_mul(4), Some(Money::from_minor(1000)));
        assert_eq!(Money::from_minor(250).checked_mul(i64::MAX), None);
    }

    #[test]
    fn test_rounding_is_half_away_from_zero() {
        assert_eq!(Money::from_decimal(dec!(2.5)).minor(), 3);
        assert_eq!(Money::from_decimal(dec!(-2.5)).minor(), -3);
        assert_eq!(Money::from_decimal(dec!(2.49)).minor(), 2);
    }

    #[test]
    fn test_mul_and_div_ratio() {
        let amount = Money::from_minor(20000);
        assert_eq!(amount.mul_ratio(dec!(0.5)).minor(), 10000);
        // 20000 / 1.077 = 18570.096...
        assert_eq!(amount.div_ratio(dec!(1.077)).unwrap().minor(), 18570);
        assert!(amount.div_ratio(Decimal::ZERO).is_none());
    }

    #[test]
    fn test_round_to_increment() {
        assert_eq!(Money::from_minor(1072).round_to_increment(5).minor(), 1070);
        assert_eq!(Money::from_minor(1073).round_to_increment(5).minor(), 1075);
        assert_eq!(Money::from_minor(1075).round_to_increment(10).minor(), 1080);
        assert_eq!(Money::from_minor(-1073).round_to_increment(5).minor(), -1075);
        assert_eq!(Money::from_minor(1073).round_to_increment(1).minor(), 1073);
    }

    #[test]
    fn test_sum() {
        let amounts = [Money::from_minor(1), Money::from_minor(2), Money::from_minor(-4)];
        let total: Money = amounts.iter().sum();
        assert_eq!(total.minor(), -1);
    }

    #[test]
    fn test_serializes_as_plain_integer() {
        let json = serde_json::to_string(&Money::from_minor(-250)).unwrap();
        assert_eq!(json, "-250");
    }
}
