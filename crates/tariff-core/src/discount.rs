//! # Discount Distribution
//!
//! Spreads order-level discounts across line items in proportion to their
//! gross amount while keeping each item's tax exposure.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  amount_left = total_amount_of_items      already_deducted = 0          │
//! │                                                                         │
//! │  for each discount (in order):                                          │
//! │    to_split  = rate ? total × rate : min(fixed_rate, total)             │
//! │    to_split  = max(0, to_split - already_deducted)                      │
//! │    split_now = max(0, min(amount_left, to_split))   ◄── clamp FIRST     │
//! │                                                                         │
//! │    per share: amount = split_now × ratio                                │
//! │               tax    = amount - amount / tax_divisor                    │
//! │                                                                         │
//! │    amount_left      -= Σ amount                                         │
//! │    already_deducted += Σ amount                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Share amounts are apportioned with the largest-remainder method, so the
//! shares of one discount always sum to exactly `split_now` when the ratios
//! sum to one. Over-discounting is impossible: the sum of all distributed
//! amounts never exceeds `total_amount_of_items`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::sheet::{CalculationRow, RowFields};
use crate::types::{RowCategory, TaxRate};

// =============================================================================
// Discount Share
// =============================================================================

/// One line item's allocation basis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountShare {
    /// This item's fraction of the total item gross.
    pub ratio: Decimal,

    /// `gross / (gross - tax)`. `None` when the divisor is not finite
    /// (an item that is nothing but tax).
    pub tax_divisor: Option<Decimal>,

    /// Known tax rate of the item, if it carries exactly one.
    pub tax_rate: Option<TaxRate>,

    /// Caller label copied onto the emitted rows (e.g. an order position id).
    pub label: Option<String>,
}

impl DiscountShare {
    pub fn new(ratio: Decimal, tax_divisor: Option<Decimal>) -> Self {
        DiscountShare {
            ratio,
            tax_divisor,
            tax_rate: None,
            label: None,
        }
    }

    /// Builds a share from an item's gross and tax and the total gross of
    /// all items.
    ///
    /// ## Example
    /// ```rust
    /// use rust_decimal::Decimal;
    /// use tariff_core::discount::DiscountShare;
    /// use tariff_core::money::Money;
    ///
    /// let share = DiscountShare::from_item(
    ///     Money::from_minor(20000),
    ///     Money::from_minor(1430),
    ///     Money::from_minor(40000),
    /// );
    /// assert_eq!(share.ratio, Decimal::new(5, 1));
    /// ```
    pub fn from_item(gross: Money, tax: Money, total: Money) -> Self {
        let ratio = if total.is_zero() {
            Decimal::ZERO
        } else {
            gross.to_decimal() / total.to_decimal()
        };
        let net = gross - tax;
        let tax_divisor = if net.is_zero() {
            None
        } else {
            Some(gross.to_decimal() / net.to_decimal())
        };
        DiscountShare::new(ratio, tax_divisor)
    }

    pub fn with_tax_rate(mut self, rate: TaxRate) -> Self {
        self.tax_rate = Some(rate);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Tax contained in a discount amount taken from this item.
    pub fn tax_in(&self, amount: Money) -> Money {
        match self.tax_divisor {
            Some(divisor) if !divisor.is_zero() => {
                Money::from_decimal(amount.to_decimal() - amount.to_decimal() / divisor)
            }
            _ => Money::zero(),
        }
    }

    /// The item's tax rate, derived from the divisor when not known.
    pub fn effective_tax_rate(&self) -> Option<TaxRate> {
        if self.tax_rate.is_some() {
            return self.tax_rate;
        }
        let divisor = self.tax_divisor?;
        let fraction = (divisor - Decimal::ONE).round_dp(4).normalize();
        if fraction.is_zero() {
            None
        } else {
            Some(TaxRate::new(fraction))
        }
    }
}

// =============================================================================
// Discount Configuration
// =============================================================================

/// How much a discount takes off.
///
/// Serialized externally tagged: `{"rate": "0.1"}` or `{"fixedRate": 5000}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiscountConfiguration {
    /// Fraction of the total item amount (`0.1` = 10%).
    Rate(Decimal),
    /// Absolute amount in minor units.
    FixedRate(Money),
}

/// A discount that is active for the priced subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicableDiscount {
    pub discount_id: String,
    pub configuration: DiscountConfiguration,
}

// =============================================================================
// Allocation
// =============================================================================

/// What one share receives of one discount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareAllocation {
    pub amount: Money,
    pub tax: Money,
    pub tax_rate: Option<TaxRate>,
    pub label: Option<String>,
}

/// The outcome of one discount across all shares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscountAllocation {
    pub discount_id: String,
    pub shares: Vec<ShareAllocation>,
    pub items_discount_amount: Money,
    pub items_tax_amount: Money,
}

impl DiscountAllocation {
    /// True if this discount took nothing off.
    pub fn is_empty(&self) -> bool {
        self.items_discount_amount.is_zero()
    }

    /// Rows for a pricing sheet.
    ///
    /// ## Emitted Rows
    /// ```text
    /// per share:  Discount  -amount            (gross)
    /// per rate:   Tax       -Σ tax   rate r    (tax correction)
    ///             Discount  +Σ tax             (offset, keeps gross intact)
    /// ```
    /// Every row carries the discount id, so the gross effect of the discount
    /// (`PricingSheet::discount_sum`) is exactly `-items_discount_amount`.
    pub fn to_rows(&self, adapter_key: &str) -> Vec<CalculationRow> {
        let mut rows = Vec::new();

        for share in self.shares.iter().filter(|s| !s.amount.is_zero()) {
            let mut fields = RowFields::amount(-share.amount)
                .discount(self.discount_id.clone())
                .meta("adapter", adapter_key);
            if let Some(label) = &share.label {
                fields = fields.meta("share", label.clone());
            }
            rows.push(CalculationRow::from_fields(RowCategory::Discount, fields));
        }

        let mut by_rate: Vec<(TaxRate, Money)> = Vec::new();
        for share in self.shares.iter().filter(|s| !s.tax.is_zero()) {
            let rate = share.tax_rate.unwrap_or_default();
            match by_rate.iter_mut().find(|(r, _)| *r == rate) {
                Some((_, tax)) => *tax += share.tax,
                None => by_rate.push((rate, share.tax)),
            }
        }

        for (rate, tax) in by_rate {
            rows.push(CalculationRow::from_fields(
                RowCategory::Tax,
                RowFields::amount(-tax)
                    .rate(rate)
                    .discount(self.discount_id.clone())
                    .meta("adapter", adapter_key),
            ));
            rows.push(CalculationRow::from_fields(
                RowCategory::Discount,
                RowFields::amount(tax)
                    .discount(self.discount_id.clone())
                    .meta("adapter", adapter_key),
            ));
        }

        rows
    }
}

// =============================================================================
// Distribution
// =============================================================================

/// Distributes `discounts` (in order) across `shares`.
///
/// ## Example
/// ```rust
/// use rust_decimal::Decimal;
/// use tariff_core::discount::{
///     distribute_discounts, ApplicableDiscount, DiscountConfiguration, DiscountShare,
/// };
/// use tariff_core::money::Money;
///
/// let total = Money::from_minor(40000);
/// let shares = vec![
///     DiscountShare::from_item(Money::from_minor(20000), Money::from_minor(1430), total),
///     DiscountShare::from_item(Money::from_minor(20000), Money::from_minor(1430), total),
/// ];
/// let discounts = vec![ApplicableDiscount {
///     discount_id: "spring".into(),
///     configuration: DiscountConfiguration::FixedRate(Money::from_minor(5000)),
/// }];
///
/// let allocations = distribute_discounts(total, &shares, &discounts);
/// assert_eq!(allocations[0].items_discount_amount.minor(), 5000);
/// assert_eq!(allocations[0].shares[0].amount.minor(), 2500);
/// ```
pub fn distribute_discounts(
    total_amount_of_items: Money,
    shares: &[DiscountShare],
    discounts: &[ApplicableDiscount],
) -> Vec<DiscountAllocation> {
    let mut amount_left = total_amount_of_items;
    let mut already_deducted = Money::zero();
    let mut allocations = Vec::with_capacity(discounts.len());

    for discount in discounts {
        let requested = match discount.configuration {
            DiscountConfiguration::Rate(rate) => total_amount_of_items.mul_ratio(rate),
            DiscountConfiguration::FixedRate(fixed) => fixed.min(total_amount_of_items),
        };
        let amount_to_split = (requested - already_deducted).max(Money::zero());
        let split_now = amount_left.min(amount_to_split).max(Money::zero());

        let amounts = apportion(split_now, shares);
        let share_allocations: Vec<ShareAllocation> = shares
            .iter()
            .zip(amounts)
            .map(|(share, amount)| ShareAllocation {
                amount,
                tax: share.tax_in(amount),
                tax_rate: share.effective_tax_rate(),
                label: share.label.clone(),
            })
            .collect();

        let items_discount_amount: Money = share_allocations.iter().map(|s| s.amount).sum();
        let items_tax_amount: Money = share_allocations.iter().map(|s| s.tax).sum();

        amount_left -= items_discount_amount;
        already_deducted += items_discount_amount;

        allocations.push(DiscountAllocation {
            discount_id: discount.discount_id.clone(),
            shares: share_allocations,
            items_discount_amount,
            items_tax_amount,
        });
    }

    allocations
}

/// Largest-remainder apportionment of `amount` by share ratio.
fn apportion(amount: Money, shares: &[DiscountShare]) -> Vec<Money> {
    if shares.is_empty() || amount.is_zero() {
        return vec![Money::zero(); shares.len()];
    }

    let exact: Vec<Decimal> = shares
        .iter()
        .map(|share| amount.to_decimal() * share.ratio)
        .collect();
    let mut floors: Vec<Money> = exact.iter().map(|value| Money::from_decimal(value.floor())).collect();

    let target = Money::from_decimal(exact.iter().copied().sum());
    let floored: Money = floors.iter().sum();
    let mut missing = (target - floored).minor();

    let mut order: Vec<usize> = (0..shares.len()).collect();
    // Largest fractional part first; ties keep input order.
    order.sort_by(|&a, &b| {
        let frac_a = exact[a] - exact[a].floor();
        let frac_b = exact[b] - exact[b].floor();
        frac_b.cmp(&frac_a).then(a.cmp(&b))
    });

    for index in order {
        if missing <= 0 {
            break;
        }
        floors[index] += Money::from_minor(1);
        missing -= 1;
    }

    floors
}

// =============================================================================
// Unit Tests
// =============================================================================
