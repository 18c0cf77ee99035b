//! # Order Items
//!
//! Folds every priced position into the order sheet.
//!
//! ```text
//! position sheet (product)            order sheet
//! ────────────────────────            ─────────────────────────────────
//! Item  +20000                        Item  +18570   net, position=pos-1
//! Item   -1430                        Tax    +1430   rate 7.7%
//! Tax    +1430  rate 7.7%
//! ```
//! The order keeps each position's gross exactly: one net item row plus the
//! position's tax grouped by rate.

use async_trait::async_trait;
use tariff_core::error::CoreError;
use tariff_core::money::Money;
use tariff_core::sheet::{CalculationRow, PricingSheet, RowFields};
use tariff_core::types::RowCategory;

use crate::adapter::{annotated, AdapterRegistration, Contribution, PricingAdapter};
use crate::context::OrderContext;
use crate::error::AdapterResult;

pub const KEY: &str = "tariff.order.items";

pub struct OrderItems {
    registration: AdapterRegistration,
}

impl OrderItems {
    pub fn new() -> Self {
        OrderItems {
            registration: AdapterRegistration::new(KEY, "Order items", "1.0.0", 0),
        }
    }
}

impl Default for OrderItems {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PricingAdapter<OrderContext> for OrderItems {
    fn registration(&self) -> &AdapterRegistration {
        &self.registration
    }

    async fn is_activated_for(&self, context: &OrderContext) -> AdapterResult<bool> {
        Ok(!context.positions.is_empty())
    }

    async fn calculate(
        &self,
        context: &OrderContext,
        sheet: &PricingSheet,
    ) -> AdapterResult<Contribution> {
        let mut result = sheet.result_sheet();
        let mut warnings = Vec::new();

        for priced in &context.positions {
            let fields = RowFields::amount(Money::zero())
                .meta("position", priced.position.id.as_str())
                .meta("product", priced.product.id.as_str());
            fold_sub_sheet(&mut result, KEY, RowCategory::Item, &priced.sheet, fields)?;
            warnings.extend(
                priced
                    .sheet
                    .warnings()
                    .iter()
                    .map(|w| format!("position {}: {}", priced.position.id, w.message)),
            );
        }

        let contribution = Contribution::from(result);
        Ok(if warnings.is_empty() {
            contribution
        } else {
            contribution.with_warning(warnings.join("; "))
        })
    }
}

/// Appends a priced sub-sheet as one net row of `category` plus its tax by
/// rate. `fields` carries the annotations of the net row; its amount is
/// replaced.
pub(crate) fn fold_sub_sheet(
    result: &mut PricingSheet,
    key: &str,
    category: RowCategory,
    sub_sheet: &PricingSheet,
    fields: RowFields,
) -> Result<(), CoreError> {
    if sub_sheet.currency_code() != result.currency_code() {
        return Err(CoreError::CurrencyMismatch {
            expected: result.currency_code().to_string(),
            got: sub_sheet.currency_code().to_string(),
        });
    }

    let mut net_row = CalculationRow::from_fields(category, annotated(key, fields).net_price(true));
    net_row.amount = sub_sheet.net();
    result.push(net_row)?;

    for (rate, tax) in sub_sheet.tax_sum_by_rate() {
        if tax.is_zero() {
            continue;
        }
        result.add_tax(annotated(key, RowFields::amount(tax)).rate(rate))?;
    }
    Ok(())
}
