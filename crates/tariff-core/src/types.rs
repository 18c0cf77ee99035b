//! # Domain Types
//!
//! Small value types shared by every pricing subject.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Pricing Types                                   │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    TaxRate      │   │  RowCategory    │   │    Subject      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Decimal        │   │  Item  Tax      │   │  Product        │       │
//! │  │  0.077 = 7.7%   │   │  Discount  Fee  │   │  Order          │       │
//! │  └─────────────────┘   │  Delivery       │   │  Delivery       │       │
//! │                        │  Payment        │   │  Payment        │       │
//! │                        └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate as a decimal fraction.
///
/// ## Why Decimal and not basis points?
/// Real rates such as 7.7% or 2.5% fit basis points, but rates derived from
/// amounts (an item's effective rate after rounding) do not. A fraction keeps
/// both exact enough for minor-unit rounding.
///
/// Serialized as a decimal string (`"0.077"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxRate(Decimal);

impl TaxRate {
    /// Creates a tax rate from a fraction (`0.077` = 7.7%).
    #[inline]
    pub const fn new(fraction: Decimal) -> Self {
        TaxRate(fraction)
    }

    /// Creates a tax rate from basis points (`770` = 7.7%).
    pub fn from_bps(bps: u32) -> Self {
        TaxRate(Decimal::new(i64::from(bps), 4))
    }

    /// Returns the rate as a fraction.
    #[inline]
    pub const fn fraction(&self) -> Decimal {
        self.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(Decimal::ZERO)
    }

    /// Checks if tax rate is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Tax added on top of a net amount: `amount × rate`.
    pub fn tax_on_net(&self, net: Money) -> Money {
        net.mul_ratio(self.0)
    }

    /// Tax contained in a gross amount: `amount - amount / (1 + rate)`.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use tariff_core::money::Money;
    /// use tariff_core::types::TaxRate;
    ///
    /// let rate = TaxRate::new(Decimal::new(77, 3));
    /// // 20000 - 20000 / 1.077 = 1429.9
    /// assert_eq!(rate.tax_in_gross(Money::from_minor(20000)).minor(), 1430);
    /// ```
    pub fn tax_in_gross(&self, gross: Money) -> Money {
        let divisor = Decimal::ONE + self.0;
        if divisor.is_zero() {
            return Money::zero();
        }
        Money::from_decimal(gross.to_decimal() - gross.to_decimal() / divisor)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate::zero()
    }
}

impl fmt::Display for TaxRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", (self.0 * Decimal::ONE_HUNDRED).normalize())
    }
}

// =============================================================================
// Row Category
// =============================================================================

/// The category of a calculation row.
///
/// `Item`, `Tax`, `Discount` and `Fee` exist for every subject; `Delivery`
/// and `Payment` carry provider fees on delivery, payment and order sheets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum RowCategory {
    /// Base price of the priced item(s).
    Item,
    /// Tax amount (requires a rate).
    Tax,
    /// Discount amount (requires a discount id).
    Discount,
    /// Generic surcharge.
    Fee,
    /// Delivery provider fee.
    Delivery,
    /// Payment provider fee.
    Payment,
}

impl RowCategory {
    /// All categories in declaration order.
    pub const ALL: [RowCategory; 6] = [
        RowCategory::Item,
        RowCategory::Tax,
        RowCategory::Discount,
        RowCategory::Fee,
        RowCategory::Delivery,
        RowCategory::Payment,
    ];
}

impl fmt::Display for RowCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RowCategory::Item => "item",
            RowCategory::Tax => "tax",
            RowCategory::Discount => "discount",
            RowCategory::Fee => "fee",
            RowCategory::Delivery => "delivery",
            RowCategory::Payment => "payment",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Subject
// =============================================================================

/// What a pricing sheet prices. Each subject has its own Director.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Subject {
    Product,
    Order,
    Delivery,
    Payment,
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Subject::Product => "product",
            Subject::Order => "order",
            Subject::Delivery => "delivery",
            Subject::Payment => "payment",
        };
        f.write_str(name)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
