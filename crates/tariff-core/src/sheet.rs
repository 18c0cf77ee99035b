//! # Pricing Sheet
//!
//! The append-only list of calculation rows every pricing pipeline produces.
//!
//! ## Sheet Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     One Director invocation                             │
//! │                                                                         │
//! │   empty sheet ──► adapter #1 ──► rows₁ appended                         │
//! │                                    │                                    │
//! │                   adapter #2 ◄─────┘ (reads rows₁, read-only)           │
//! │                        │                                                │
//! │                        ▼                                                │
//! │                  rows₂ appended ──► ... ──► final sheet                 │
//! │                                                                         │
//! │  Rows are NEVER edited. A correction is an offsetting row:              │
//! │    Item +20000  (gross, taxable)                                        │
//! │    Item  -1430  (tax extracted, not taxable)                            │
//! │    Tax   +1430  (rate 7.7%)                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Accounting Identities
//! - `gross()` is the plain sum of every row, order independent
//! - `net() == gross() - tax_sum()`
//! - `S.rows ++ S.reset_calculation()` always sums to zero

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{RowCategory, TaxRate};
use crate::validation::validate_row;

/// Opaque annotations on a row (e.g. which adapter produced it).
///
/// The engine never reads these; adapters and renderers may.
pub type RowMeta = BTreeMap<String, String>;

// =============================================================================
// Calculation Row
// =============================================================================

/// One categorized monetary delta within a sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CalculationRow {
    pub category: RowCategory,

    /// Signed amount in minor units. Positive = charge, negative = reduction.
    pub amount: Money,

    /// Whether this row participates in tax computation.
    pub is_taxable: bool,

    /// Whether `amount` already excludes tax.
    pub is_net_price: bool,

    /// Present on `Tax` rows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub rate: Option<TaxRate>,

    /// Present on `Discount` rows and on the tax correction of a discount.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<RowMeta>,
}

impl CalculationRow {
    /// Creates a non-taxable, gross row without rate, discount or meta.
    pub fn new(category: RowCategory, amount: Money) -> Self {
        CalculationRow {
            category,
            amount,
            is_taxable: false,
            is_net_price: false,
            rate: None,
            discount_id: None,
            meta: None,
        }
    }

    /// Builds a row of `category` from loose fields.
    pub fn from_fields(category: RowCategory, fields: RowFields) -> Self {
        CalculationRow {
            category,
            amount: fields.amount,
            is_taxable: fields.is_taxable,
            is_net_price: fields.is_net_price,
            rate: fields.rate,
            discount_id: fields.discount_id,
            meta: fields.meta,
        }
    }

    pub fn with_rate(mut self, rate: TaxRate) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn with_discount_id(mut self, discount_id: impl Into<String>) -> Self {
        self.discount_id = Some(discount_id.into());
        self
    }

    /// The same row with its amount negated. Every other field is preserved.
    pub fn negated(&self) -> Self {
        CalculationRow {
            amount: -self.amount,
            ..self.clone()
        }
    }

    /// Reads a meta annotation.
    pub fn meta_value(&self, key: &str) -> Option<&str> {
        self.meta.as_ref()?.get(key).map(String::as_str)
    }
}

// =============================================================================
// Row Fields
// =============================================================================

/// Field set accepted by the `add_*` methods of [`PricingSheet`].
///
/// ## Example
/// ```rust
/// use tariff_core::money::Money;
/// use tariff_core::sheet::{PricingSheet, RowFields};
///
/// let mut sheet = PricingSheet::new("CHF");
/// sheet
///     .add_item(RowFields::amount(Money::from_minor(20000)).taxable(true))
///     .unwrap();
/// assert_eq!(sheet.gross().minor(), 20000);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFields {
    pub amount: Money,
    pub is_taxable: bool,
    pub is_net_price: bool,
    pub rate: Option<TaxRate>,
    pub discount_id: Option<String>,
    pub meta: Option<RowMeta>,
}

impl RowFields {
    pub fn amount(amount: Money) -> Self {
        RowFields {
            amount,
            ..RowFields::default()
        }
    }

    pub fn taxable(mut self, is_taxable: bool) -> Self {
        self.is_taxable = is_taxable;
        self
    }

    pub fn net_price(mut self, is_net_price: bool) -> Self {
        self.is_net_price = is_net_price;
        self
    }

    pub fn rate(mut self, rate: TaxRate) -> Self {
        self.rate = Some(rate);
        self
    }

    pub fn discount(mut self, discount_id: impl Into<String>) -> Self {
        self.discount_id = Some(discount_id.into());
        self
    }

    pub fn meta(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.meta
            .get_or_insert_with(RowMeta::new)
            .insert(key.into(), value.into());
        self
    }
}

// =============================================================================
// Row Filter
// =============================================================================

/// Declarative row predicate. The default filter matches every row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RowFilter {
    pub category: Option<RowCategory>,
    pub is_taxable: Option<bool>,
    pub is_net_price: Option<bool>,
    pub discount_id: Option<String>,
}

impl RowFilter {
    /// Matches every row.
    pub fn all() -> Self {
        RowFilter::default()
    }

    /// Matches rows of one category.
    pub fn category(category: RowCategory) -> Self {
        RowFilter {
            category: Some(category),
            ..RowFilter::default()
        }
    }

    /// Matches taxable rows.
    pub fn taxable() -> Self {
        RowFilter {
            is_taxable: Some(true),
            ..RowFilter::default()
        }
    }

    /// Restricts the filter to rows tagged with `discount_id`.
    pub fn with_discount(mut self, discount_id: impl Into<String>) -> Self {
        self.discount_id = Some(discount_id.into());
        self
    }

    pub fn matches(&self, row: &CalculationRow) -> bool {
        self.category.map_or(true, |c| row.category == c)
            && self.is_taxable.map_or(true, |t| row.is_taxable == t)
            && self.is_net_price.map_or(true, |n| row.is_net_price == n)
            && self
                .discount_id
                .as_deref()
                .map_or(true, |id| row.discount_id.as_deref() == Some(id))
    }
}

// =============================================================================
// Totals
// =============================================================================

/// Options for [`PricingSheet::total`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TotalOptions {
    pub category: Option<RowCategory>,
    pub use_net_price: bool,
}

impl TotalOptions {
    pub fn gross() -> Self {
        TotalOptions::default()
    }

    pub fn net() -> Self {
        TotalOptions {
            category: None,
            use_net_price: true,
        }
    }

    pub fn category(mut self, category: RowCategory) -> Self {
        self.category = Some(category);
        self
    }
}

/// An amount together with the sheet's currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SheetTotal {
    pub amount: Money,
    pub currency_code: String,
}

/// A non-blocking configuration problem reported by an adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SheetWarning {
    pub adapter_key: String,
    pub message: String,
}

// =============================================================================
// Pricing Sheet
// =============================================================================

/// Ordered, append-only collection of calculation rows plus currency and
/// (for product sheets) quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PricingSheet {
    currency_code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    quantity: Option<i64>,
    rows: Vec<CalculationRow>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    warnings: Vec<SheetWarning>,
}

impl PricingSheet {
    /// Creates an empty sheet in `currency_code`.
    pub fn new(currency_code: impl Into<String>) -> Self {
        PricingSheet {
            currency_code: currency_code.into(),
            quantity: None,
            rows: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Sets the priced quantity (product sheets).
    pub fn with_quantity(mut self, quantity: i64) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// Creates a sheet from previously computed rows, validating each.
    pub fn from_rows(
        currency_code: impl Into<String>,
        rows: impl IntoIterator<Item = CalculationRow>,
    ) -> CoreResult<Self> {
        let mut sheet = PricingSheet::new(currency_code);
        sheet.extend(rows)?;
        Ok(sheet)
    }

    /// An empty sheet with the same currency and quantity.
    ///
    /// Adapters collect their contribution in a result sheet so every row is
    /// validated when it is added.
    pub fn result_sheet(&self) -> PricingSheet {
        PricingSheet {
            currency_code: self.currency_code.clone(),
            quantity: self.quantity,
            rows: Vec::new(),
            warnings: Vec::new(),
        }
    }

    // =========================================================================
    // Metadata
    // =========================================================================

    pub fn currency_code(&self) -> &str {
        &self.currency_code
    }

    pub fn quantity(&self) -> Option<i64> {
        self.quantity
    }

    pub fn rows(&self) -> &[CalculationRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// True iff the sheet has at least one row.
    pub fn is_valid(&self) -> bool {
        !self.rows.is_empty()
    }

    pub fn warnings(&self) -> &[SheetWarning] {
        &self.warnings
    }

    pub fn add_warning(&mut self, adapter_key: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(SheetWarning {
            adapter_key: adapter_key.into(),
            message: message.into(),
        });
    }

    pub fn into_rows(self) -> Vec<CalculationRow> {
        self.rows
    }

    // =========================================================================
    // Appending
    // =========================================================================

    /// Appends a row after validating its category-specific fields.
    pub fn push(&mut self, row: CalculationRow) -> CoreResult<()> {
        validate_row(&row).map_err(|source| CoreError::InvalidRow {
            category: row.category,
            source,
        })?;
        self.rows.push(row);
        Ok(())
    }

    /// Appends rows in order. Stops at the first invalid row.
    pub fn extend(&mut self, rows: impl IntoIterator<Item = CalculationRow>) -> CoreResult<()> {
        for row in rows {
            self.push(row)?;
        }
        Ok(())
    }

    pub fn add_item(&mut self, fields: RowFields) -> CoreResult<()> {
        self.push(CalculationRow::from_fields(RowCategory::Item, fields))
    }

    /// Appends a `Tax` row. `fields.rate` is required.
    pub fn add_tax(&mut self, fields: RowFields) -> CoreResult<()> {
        self.push(CalculationRow::from_fields(RowCategory::Tax, fields))
    }

    /// Appends a `Discount` row. `fields.discount_id` is required.
    pub fn add_discount(&mut self, fields: RowFields) -> CoreResult<()> {
        self.push(CalculationRow::from_fields(RowCategory::Discount, fields))
    }

    pub fn add_fee(&mut self, fields: RowFields) -> CoreResult<()> {
        self.push(CalculationRow::from_fields(RowCategory::Fee, fields))
    }

    pub fn add_delivery(&mut self, fields: RowFields) -> CoreResult<()> {
        self.push(CalculationRow::from_fields(RowCategory::Delivery, fields))
    }

    pub fn add_payment(&mut self, fields: RowFields) -> CoreResult<()> {
        self.push(CalculationRow::from_fields(RowCategory::Payment, fields))
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Rows matching `filter`, in original order.
    pub fn filter_by(&self, filter: &RowFilter) -> Vec<&CalculationRow> {
        self.filter_where(|row| filter.matches(row))
    }

    /// Rows matching an arbitrary predicate, in original order.
    pub fn filter_where<P>(&self, predicate: P) -> Vec<&CalculationRow>
    where
        P: Fn(&CalculationRow) -> bool,
    {
        self.rows.iter().filter(|row| predicate(row)).collect()
    }

    /// A sub-sheet with the matching rows and the same metadata.
    pub fn filtered(&self, filter: &RowFilter) -> PricingSheet {
        PricingSheet {
            rows: self.filter_by(filter).into_iter().cloned().collect(),
            ..self.result_sheet()
        }
    }

    /// Sum of `amount` over rows matching `filter`.
    pub fn sum(&self, filter: &RowFilter) -> Money {
        self.sum_where(|row| filter.matches(row))
    }

    pub fn sum_where<P>(&self, predicate: P) -> Money
    where
        P: Fn(&CalculationRow) -> bool,
    {
        self.rows
            .iter()
            .filter(|row| predicate(row))
            .map(|row| row.amount)
            .sum()
    }

    /// Sum of every row.
    pub fn gross(&self) -> Money {
        self.sum(&RowFilter::all())
    }

    /// Sum of `Tax` rows.
    pub fn tax_sum(&self) -> Money {
        self.sum(&RowFilter::category(RowCategory::Tax))
    }

    /// Gross minus every tax row.
    ///
    /// Net-price rows contribute as stored; gross-price rows contribute
    /// through their offsetting extraction rows, so the remainder is exactly
    /// the sum of all non-tax rows.
    pub fn net(&self) -> Money {
        self.gross() - self.tax_sum()
    }

    pub fn item_sum(&self) -> Money {
        self.sum(&RowFilter::category(RowCategory::Item))
    }

    /// Gross effect of discounts: every row carrying a discount id, including
    /// tax corrections. With `Some(id)` only rows of that discount.
    pub fn discount_sum(&self, discount_id: Option<&str>) -> Money {
        self.sum_where(|row| match (discount_id, row.discount_id.as_deref()) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(wanted), Some(id)) => wanted == id,
        })
    }

    /// Distinct discount ids in order of first appearance.
    pub fn discount_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = Vec::new();
        for id in self.rows.iter().filter_map(|row| row.discount_id.as_deref()) {
            if !ids.contains(&id) {
                ids.push(id);
            }
        }
        ids
    }

    /// Tax grouped by rate, in order of first appearance.
    pub fn tax_sum_by_rate(&self) -> Vec<(TaxRate, Money)> {
        let mut groups: Vec<(TaxRate, Money)> = Vec::new();
        for row in self.filter_by(&RowFilter::category(RowCategory::Tax)) {
            let rate = row.rate.unwrap_or_default();
            match groups.iter_mut().find(|(r, _)| *r == rate) {
                Some((_, amount)) => *amount += row.amount,
                None => groups.push((rate, row.amount)),
            }
        }
        groups
    }

    /// Sum filtered by category, using net or gross accounting.
    ///
    /// ## Accounting
    /// ```text
    /// category   use_net_price=true        use_net_price=false
    /// ────────   ───────────────────────   ──────────────────────────────
    /// None       net()                     gross()
    /// Tax        tax_sum()                 tax_sum()
    /// other C    sum(C)                    sum(C) + tax_sum × sum(C)/net()
    /// ```
    /// Rows of a category are net once their tax has been extracted, so the
    /// gross figure of a category re-attributes tax proportionally.
    pub fn total(&self, options: TotalOptions) -> SheetTotal {
        let amount = match options.category {
            None if options.use_net_price => self.net(),
            None => self.gross(),
            Some(RowCategory::Tax) => self.tax_sum(),
            Some(category) => {
                let base = self.sum(&RowFilter::category(category));
                if options.use_net_price {
                    base
                } else {
                    base + self.attributed_tax(base)
                }
            }
        };
        SheetTotal {
            amount,
            currency_code: self.currency_code.clone(),
        }
    }

    /// Total per unit for sheets carrying a quantity.
    pub fn unit_price(&self, use_net_price: bool) -> SheetTotal {
        let total = self.total(TotalOptions {
            category: None,
            use_net_price,
        });
        let quantity = self.quantity.unwrap_or(1).max(1);
        SheetTotal {
            amount: Money::from_decimal(total.amount.to_decimal() / Decimal::from(quantity)),
            currency_code: total.currency_code,
        }
    }

    /// One offsetting row per existing row (`amount` negated).
    ///
    /// ## Example
    /// ```rust
    /// use tariff_core::money::Money;
    /// use tariff_core::sheet::{PricingSheet, RowFields};
    ///
    /// let mut sheet = PricingSheet::new("EUR");
    /// sheet.add_item(RowFields::amount(Money::from_minor(1200))).unwrap();
    /// let offsets = sheet.reset_calculation();
    /// sheet.extend(offsets).unwrap();
    /// assert!(sheet.gross().is_zero());
    /// ```
    pub fn reset_calculation(&self) -> Vec<CalculationRow> {
        self.rows.iter().map(CalculationRow::negated).collect()
    }

    fn attributed_tax(&self, base: Money) -> Money {
        let taxed_base = self.net();
        if taxed_base.is_zero() {
            return Money::zero();
        }
        self.tax_sum()
            .mul_ratio(base.to_decimal() / taxed_base.to_decimal())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn rate() -> TaxRate {
        TaxRate::new(dec!(0.077))
    }

    /// Item 20000 gross with its 7.7% tax extracted.
    fn taxed_item_sheet() -> PricingSheet {
        let mut sheet = PricingSheet::new("CHF");
        sheet
            .add_item(RowFields::amount(Money::from_minor(20000)).taxable(true))
            .unwrap();
        sheet
            .add_item(RowFields::amount(Money::from_minor(-1430)))
            .unwrap();
        sheet
            .add_tax(RowFields::amount(Money::from_minor(1430)).rate(rate()))
            .unwrap();
        sheet
    }

    #[test]
    fn test_empty_sheet() {
        let sheet = PricingSheet::new("CHF");
        assert!(sheet.gross().is_zero());
        assert!(!sheet.is_valid());
        assert!(sheet.filter_by(&RowFilter::all()).is_empty());
        assert!(sheet.reset_calculation().is_empty());
    }

    #[test]
    fn test_add_rejects_invalid_rows() {
        let mut sheet = PricingSheet::new("CHF");
        let err = sheet
            .add_tax(RowFields::amount(Money::from_minor(10)))
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::InvalidRow {
                category: RowCategory::Tax,
                ..
            }
        ));
        assert!(sheet.add_discount(RowFields::amount(Money::from_minor(-10))).is_err());
        assert!(sheet.is_empty());
    }

    #[test]
    fn test_gross_net_and_tax() {
        let sheet = taxed_item_sheet();
        assert_eq!(sheet.gross().minor(), 20000);
        assert_eq!(sheet.tax_sum().minor(), 1430);
        assert_eq!(sheet.net().minor(), 18570);
        assert_eq!(sheet.item_sum().minor(), 18570);
    }

    #[test]
    fn test_filter_preserves_order() {
        let sheet = taxed_item_sheet();
        let items = sheet.filter_by(&RowFilter::category(RowCategory::Item));
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].amount.minor(), 20000);
        assert_eq!(items[1].amount.minor(), -1430);

        let taxable = sheet.filter_by(&RowFilter::taxable());
        assert_eq!(taxable.len(), 1);

        let big = sheet.filter_where(|row| row.amount.minor() > 1000);
        assert_eq!(big.len(), 2);
    }

    #[test]
    fn test_total_by_category() {
        let mut sheet = taxed_item_sheet();
        sheet
            .add_fee(RowFields::amount(Money::from_minor(500)).net_price(true))
            .unwrap();

        let gross = sheet.total(TotalOptions::gross());
        assert_eq!(gross.amount.minor(), 20500);
        assert_eq!(gross.currency_code, "CHF");
        assert_eq!(sheet.total(TotalOptions::net()).amount.minor(), 19070);

        let items_net = sheet.total(TotalOptions::net().category(RowCategory::Item));
        assert_eq!(items_net.amount.minor(), 18570);

        // 18570 + round(1430 × 18570 / 19070) = 18570 + 1393
        let items_gross = sheet.total(TotalOptions::gross().category(RowCategory::Item));
        assert_eq!(items_gross.amount.minor(), 19963);

        let tax = sheet.total(TotalOptions::gross().category(RowCategory::Tax));
        assert_eq!(tax.amount.minor(), 1430);
    }

    #[test]
    fn test_unit_price() {
        let mut sheet = PricingSheet::new("CHF").with_quantity(3);
        sheet
            .add_item(RowFields::amount(Money::from_minor(1000)))
            .unwrap();
        assert_eq!(sheet.unit_price(false).amount.minor(), 333);
    }

    #[test]
    fn test_discount_queries() {
        let mut sheet = taxed_item_sheet();
        sheet
            .add_discount(RowFields::amount(Money::from_minor(-1000)).discount("a"))
            .unwrap();
        sheet
            .add_tax(
                RowFields::amount(Money::from_minor(-72))
                    .rate(rate())
                    .discount("a"),
            )
            .unwrap();
        sheet
            .add_discount(RowFields::amount(Money::from_minor(72)).discount("a"))
            .unwrap();
        sheet
            .add_discount(RowFields::amount(Money::from_minor(-200)).discount("b"))
            .unwrap();

        assert_eq!(sheet.discount_sum(Some("a")).minor(), -1000);
        assert_eq!(sheet.discount_sum(None).minor(), -1200);
        assert_eq!(sheet.discount_ids(), vec!["a", "b"]);
        assert_eq!(
            sheet.sum(&RowFilter::category(RowCategory::Discount).with_discount("b")).minor(),
            -200
        );
    }

    #[test]
    fn test_tax_sum_by_rate() {
        let mut sheet = taxed_item_sheet();
        let reduced = TaxRate::new(dec!(0.025));
        sheet
            .add_tax(RowFields::amount(Money::from_minor(50)).rate(reduced))
            .unwrap();
        sheet
            .add_tax(RowFields::amount(Money::from_minor(70)).rate(rate()))
            .unwrap();

        let groups = sheet.tax_sum_by_rate();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0], (rate(), Money::from_minor(1500)));
        assert_eq!(groups[1], (reduced, Money::from_minor(50)));
    }

    #[test]
    fn test_reset_preserves_fields() {
        let sheet = taxed_item_sheet();
        let offsets = sheet.reset_calculation();
        assert_eq!(offsets.len(), 3);
        assert_eq!(offsets[0].amount.minor(), -20000);
        assert!(offsets[0].is_taxable);
        assert_eq!(offsets[2].rate, Some(rate()));
    }

    #[test]
    fn test_filtered_sub_sheet() {
        let sheet = taxed_item_sheet().with_quantity(2);
        let items = sheet.filtered(&RowFilter::category(RowCategory::Item));
        assert_eq!(items.len(), 2);
        assert_eq!(items.quantity(), Some(2));
        assert_eq!(items.currency_code(), "CHF");
    }

    #[test]
    fn test_warnings_and_serialization() {
        let mut sheet = taxed_item_sheet();
        sheet.add_warning("shop.tax", "no tax table for country XX");
        let json = serde_json::to_value(&sheet).unwrap();
        assert_eq!(json["currencyCode"], "CHF");
        assert_eq!(json["rows"][2]["rate"], "0.077");
        assert_eq!(json["warnings"][0]["adapterKey"], "shop.tax");

        let back: PricingSheet = serde_json::from_value(json).unwrap();
        assert_eq!(back, sheet);
    }

    fn arb_row() -> impl Strategy<Value = CalculationRow> {
        (-100_000i64..100_000, any::<bool>(), any::<bool>()).prop_map(|(amount, taxable, net)| {
            CalculationRow {
                is_taxable: taxable,
                is_net_price: net,
                ..CalculationRow::new(RowCategory::Item, Money::from_minor(amount))
            }
        })
    }

    proptest! {
        #[test]
        fn prop_gross_is_order_independent(rows in prop::collection::vec(arb_row(), 0..20)) {
            let forward = PricingSheet::from_rows("CHF", rows.clone()).unwrap();
            let backward = PricingSheet::from_rows("CHF", rows.into_iter().rev()).unwrap();
            prop_assert_eq!(forward.gross(), backward.gross());
            prop_assert_eq!(
                forward.sum(&RowFilter::taxable()),
                backward.sum(&RowFilter::taxable())
            );
        }

        #[test]
        fn prop_reset_zeroes_gross(rows in prop::collection::vec(arb_row(), 0..20)) {
            let mut sheet = PricingSheet::from_rows("CHF", rows).unwrap();
            let offsets = sheet.reset_calculation();
            sheet.extend(offsets).unwrap();
            prop_assert!(sheet.gross().is_zero());
        }
    }
}
