//! Cash rounding, the last step of a product sheet.
//!
//! ```text
//! Item  +10772   Item  -770   Tax  +770        gross 10772 → 10770
//! Item  -10772   Item  +770                    (reset of every item row)
//! Item  +10000                                 (items 10002 → 10000)
//! ```
//! The item rows are replaced by a single net row chosen so that the sheet
//! gross lands on the currency's increment. Tax rows are left untouched.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use async_trait::async_trait;
use tariff_core::sheet::{PricingSheet, RowFields, RowFilter};
use tariff_core::types::RowCategory;

use crate::adapter::{annotated, AdapterRegistration, Contribution, PricingAdapter};
use crate::context::PricingContext;
use crate::error::AdapterResult;

pub const PRODUCT_KEY: &str = "tariff.product.rounding";

pub struct Rounding<C> {
    registration: AdapterRegistration,
    increments: BTreeMap<String, i64>,
    _context: PhantomData<fn(&C)>,
}

impl<C: PricingContext> Rounding<C> {
    pub fn new(key: &str, increments: BTreeMap<String, i64>) -> Self {
        Rounding {
            registration: AdapterRegistration::new(key, "Cash rounding", "1.0.0", 100),
            increments,
            _context: PhantomData,
        }
    }

    fn increment(&self, currency_code: &str) -> Option<i64> {
        self.increments
            .get(currency_code)
            .copied()
            .filter(|increment| *increment > 1)
    }
}

#[async_trait]
impl<C: PricingContext> PricingAdapter<C> for Rounding<C> {
    fn registration(&self) -> &AdapterRegistration {
        &self.registration
    }

    async fn is_activated_for(&self, context: &C) -> AdapterResult<bool> {
        Ok(self.increment(context.currency_code()).is_some())
    }

    async fn calculate(&self, context: &C, sheet: &PricingSheet) -> AdapterResult<Contribution> {
        let Some(increment) = self.increment(context.currency_code()) else {
            return Ok(Contribution::none());
        };

        let gross = sheet.gross();
        let adjustment = gross.round_to_increment(increment) - gross;
        if adjustment.is_zero() {
            return Ok(Contribution::none());
        }

        let items = sheet.filtered(&RowFilter::category(RowCategory::Item));
        let mut result = sheet.result_sheet();
        result.extend(items.reset_calculation())?;
        result.add_item(
            annotated(&self.registration.key, RowFields::amount(items.item_sum() + adjustment))
                .net_price(true)
                .meta("increment", increment.to_string()),
        )?;
        Ok(result.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tariff_core::money::Money;
    use tariff_core::types::{Subject, TaxRate};

    struct Cash(&'static str);

    impl PricingContext for Cash {
        const SUBJECT: Subject = Subject::Product;

        fn currency_code(&self) -> &str {
            self.0
        }
    }

    fn rounding() -> Rounding<Cash> {
        Rounding::new(PRODUCT_KEY, BTreeMap::from([("CHF".to_string(), 5)]))
    }

    fn taxed_sheet(gross: i64, tax: i64) -> PricingSheet {
        let mut sheet = PricingSheet::new("CHF");
        sheet
            .add_item(RowFields::amount(Money::from_minor(gross)).taxable(true))
            .unwrap();
        sheet
            .add_item(RowFields::amount(Money::from_minor(-tax)).net_price(true))
            .unwrap();
        sheet
            .add_tax(RowFields::amount(Money::from_minor(tax)).rate(TaxRate::from_bps(770)))
            .unwrap();
        sheet
    }

    #[tokio::test]
    async fn test_activation_by_currency() {
        assert!(rounding().is_activated_for(&Cash("CHF")).await.unwrap());
        assert!(!rounding().is_activated_for(&Cash("EUR")).await.unwrap());
    }

    #[tokio::test]
    async fn test_rounds_gross_to_increment() {
        let mut sheet = taxed_sheet(10772, 770);
        let rows = rounding().calculate(&Cash("CHF"), &sheet).await.unwrap().rows;
        assert_eq!(rows.len(), 3);

        sheet.extend(rows).unwrap();
        assert_eq!(sheet.gross().minor(), 10770);
        assert_eq!(sheet.tax_sum().minor(), 770);
        assert_eq!(sheet.item_sum().minor(), 10000);
    }

    #[tokio::test]
    async fn test_already_rounded_adds_nothing() {
        let sheet = taxed_sheet(10775, 770);
        assert!(rounding()
            .calculate(&Cash("CHF"), &sheet)
            .await
            .unwrap()
            .is_empty());
    }
}
