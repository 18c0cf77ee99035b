//! Catalog price of a product.

use async_trait::async_trait;
use tariff_core::error::CoreError;
use tariff_core::sheet::{PricingSheet, RowFields};

use crate::adapter::{annotated, AdapterRegistration, Contribution, PricingAdapter};
use crate::context::ProductContext;
use crate::error::{AdapterError, AdapterResult};
use crate::lookup::price_in;

pub const KEY: &str = "tariff.product.price";

/// Meta key marking a row that is still in the base currency.
pub const SOURCE_CURRENCY: &str = "currency";

/// Adds `price × quantity` as one item row.
///
/// Without a price in the requested currency the base price is used and the
/// row is tagged [`SOURCE_CURRENCY`] for the currency conversion adapter,
/// which always replaces it (with the converted amount, or with nothing).
pub struct ProductPrice {
    registration: AdapterRegistration,
}

impl ProductPrice {
    pub fn new() -> Self {
        ProductPrice {
            registration: AdapterRegistration::new(KEY, "Catalog price", "1.0.0", 0),
        }
    }
}

impl Default for ProductPrice {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PricingAdapter<ProductContext> for ProductPrice {
    fn registration(&self) -> &AdapterRegistration {
        &self.registration
    }

    async fn is_activated_for(&self, context: &ProductContext) -> AdapterResult<bool> {
        Ok(context.product.base_price().is_some())
    }

    async fn calculate(
        &self,
        context: &ProductContext,
        sheet: &PricingSheet,
    ) -> AdapterResult<Contribution> {
        let (price, converted_from) = match price_in(&context.product.prices, &context.currency_code) {
            Some(price) => (price, None),
            None => match context.product.base_price() {
                Some(base) => (base, Some(base.currency_code.as_str())),
                None => return Ok(Contribution::none()),
            },
        };

        let amount = price.amount.checked_mul(context.quantity).ok_or_else(|| {
            AdapterError::Core(CoreError::Overflow(format!(
                "{} x {} of product {}",
                price.amount, context.quantity, context.product.id
            )))
        })?;

        let mut fields = annotated(KEY, RowFields::amount(amount))
            .taxable(!context.product.tax_exempt)
            .net_price(price.is_net_price)
            .meta("product", context.product.id.as_str());
        if let Some(currency) = converted_from {
            fields = fields.meta(SOURCE_CURRENCY, currency);
        }

        let mut result = sheet.result_sheet();
        result.add_item(fields)?;
        Ok(result.into())
    }
}
