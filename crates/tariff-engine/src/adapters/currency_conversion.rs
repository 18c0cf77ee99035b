//! Converts a base-currency catalog price into the requested currency.
//!
//! ```text
//! Item  +2500  (currency = CHF)        ← product price, base currency
//! Item  -2500  (currency = CHF)        ← reset of every item row
//! Item  +2625                          ← 2500 × 1.05 in EUR
//! ```
//!
//! Without a rate the reset stays and the converted row is replaced by a
//! configuration warning: the sheet carries no price rather than a price in
//! the wrong currency.

use std::sync::Arc;

use async_trait::async_trait;
use tariff_core::sheet::{PricingSheet, RowFields, RowFilter};
use tariff_core::types::RowCategory;

use crate::adapter::{annotated, AdapterRegistration, Contribution, PricingAdapter};
use crate::context::ProductContext;
use crate::error::{AdapterError, AdapterResult};
use crate::fx::RateCache;
use crate::lookup::price_in;

use super::product_price::SOURCE_CURRENCY;

pub const KEY: &str = "tariff.product.currency-conversion";

pub struct ProductCurrencyConversion {
    registration: AdapterRegistration,
    rates: Arc<RateCache>,
}

impl ProductCurrencyConversion {
    pub fn new(rates: Arc<RateCache>) -> Self {
        ProductCurrencyConversion {
            registration: AdapterRegistration::new(KEY, "Currency conversion", "1.0.0", 1),
            rates,
        }
    }

    /// The currency the product has to be converted from, if any.
    fn source_currency<'a>(&self, context: &'a ProductContext) -> Option<&'a str> {
        if price_in(&context.product.prices, &context.currency_code).is_some() {
            return None;
        }
        context
            .product
            .base_price()
            .map(|base| base.currency_code.as_str())
    }
}

#[async_trait]
impl PricingAdapter<ProductContext> for ProductCurrencyConversion {
    fn registration(&self) -> &AdapterRegistration {
        &self.registration
    }

    /// Activated whenever the catalog price is in another currency.
    async fn is_activated_for(&self, context: &ProductContext) -> AdapterResult<bool> {
        Ok(self.source_currency(context).is_some())
    }

    async fn calculate(
        &self,
        context: &ProductContext,
        sheet: &PricingSheet,
    ) -> AdapterResult<Contribution> {
        let items = sheet.filtered(&RowFilter::category(RowCategory::Item));
        let Some(template) = items
            .rows()
            .iter()
            .find(|row| row.meta_value(SOURCE_CURRENCY).is_some())
        else {
            return Ok(Contribution::none());
        };
        let base = template.meta_value(SOURCE_CURRENCY).unwrap_or_default().to_string();

        let mut result = sheet.result_sheet();
        result.extend(items.reset_calculation())?;

        let Some(rate) = self.rates.rate(&base, &context.currency_code).await else {
            let missing = AdapterError::RateUnavailable {
                base,
                quote: context.currency_code.clone(),
            };
            return Ok(Contribution::from(result).with_warning(missing.to_string()));
        };

        result.add_item(
            annotated(KEY, RowFields::amount(items.item_sum().mul_ratio(rate)))
                .taxable(template.is_taxable)
                .net_price(template.is_net_price)
                .meta("converted_from", base)
                .meta("rate", rate.to_string()),
        )?;
        Ok(result.into())
    }
}
