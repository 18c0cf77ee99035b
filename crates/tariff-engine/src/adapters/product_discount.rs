//! Product level discounts.
//!
//! Runs before tax: the discount rows inherit the taxable and net flags of
//! the item, so the tax adapter taxes the discounted amount.

use async_trait::async_trait;
use rust_decimal::Decimal;
use tariff_core::discount::{distribute_discounts, DiscountShare};
use tariff_core::sheet::{PricingSheet, RowFields, RowFilter};
use tariff_core::types::RowCategory;

use crate::adapter::{annotated, AdapterRegistration, Contribution, PricingAdapter};
use crate::context::ProductContext;
use crate::error::AdapterResult;

pub const KEY: &str = "tariff.product.discount";

pub struct ProductDiscount {
    registration: AdapterRegistration,
}

impl ProductDiscount {
    pub fn new() -> Self {
        ProductDiscount {
            registration: AdapterRegistration::new(KEY, "Product discount", "1.0.0", 10),
        }
    }
}

impl Default for ProductDiscount {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PricingAdapter<ProductContext> for ProductDiscount {
    fn registration(&self) -> &AdapterRegistration {
        &self.registration
    }

    async fn is_activated_for(&self, context: &ProductContext) -> AdapterResult<bool> {
        Ok(!context.discounts.is_empty() && context.product.base_price().is_some())
    }

    async fn calculate(
        &self,
        context: &ProductContext,
        sheet: &PricingSheet,
    ) -> AdapterResult<Contribution> {
        let items = sheet.filtered(&RowFilter::category(RowCategory::Item));
        let total = items.item_sum();
        if !total.is_positive() {
            return Ok(Contribution::none());
        }
        let (is_taxable, is_net_price) = items
            .rows()
            .iter()
            .rev()
            .find(|row| !row.amount.is_negative())
            .map(|row| (row.is_taxable, row.is_net_price))
            .unwrap_or((false, false));

        let share = DiscountShare::new(Decimal::ONE, None);
        let mut result = sheet.result_sheet();
        for allocation in distribute_discounts(total, &[share], &context.discounts) {
            if allocation.is_empty() {
                continue;
            }
            result.add_discount(
                annotated(KEY, RowFields::amount(-allocation.items_discount_amount))
                    .taxable(is_taxable)
                    .net_price(is_net_price)
                    .discount(allocation.discount_id),
            )?;
        }
        Ok(result.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaxCategory;
    use crate::lookup::{CatalogPrice, Product};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tariff_core::discount::{ApplicableDiscount, DiscountConfiguration};
    use tariff_core::money::Money;

    fn context(discounts: Vec<ApplicableDiscount>) -> ProductContext {
        let mut ctx = ProductContext::for_position(
            Product {
                id: "p-1".into(),
                name: "Desk".into(),
                prices: vec![CatalogPrice::gross("CHF", Money::from_minor(10000))],
                tax_category: TaxCategory::Standard,
                tax_exempt: false,
                tags: vec![],
            },
            1,
            "CHF",
            "CH",
            NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
            None,
        )
        .unwrap();
        ctx.discounts = discounts;
        ctx
    }

    fn priced_sheet() -> PricingSheet {
        let mut sheet = PricingSheet::new("CHF");
        sheet
            .add_item(RowFields::amount(Money::from_minor(10000)).taxable(true))
            .unwrap();
        sheet
    }

    #[tokio::test]
    async fn test_not_activated_without_discounts() {
        assert!(!ProductDiscount::new()
            .is_activated_for(&context(vec![]))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_rate_then_fixed() {
        let ctx = context(vec![
            ApplicableDiscount {
                discount_id: "ten".into(),
                configuration: DiscountConfiguration::Rate(dec!(0.1)),
            },
            ApplicableDiscount {
                discount_id: "fixed".into(),
                configuration: DiscountConfiguration::FixedRate(Money::from_minor(1500)),
            },
        ]);

        let rows = ProductDiscount::new()
            .calculate(&ctx, &priced_sheet())
            .await
            .unwrap()
            .rows;

        // The fixed discount only adds what the rate discount left over.
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].amount.minor(), -1000);
        assert_eq!(rows[0].discount_id.as_deref(), Some("ten"));
        assert_eq!(rows[1].amount.minor(), -500);
        assert!(rows.iter().all(|row| row.is_taxable));
    }

    #[tokio::test]
    async fn test_fixed_capped_at_item_total() {
        let ctx = context(vec![ApplicableDiscount {
            discount_id: "huge".into(),
            configuration: DiscountConfiguration::FixedRate(Money::from_minor(50000)),
        }]);
        let mut sheet = priced_sheet();
        let rows = ProductDiscount::new()
            .calculate(&ctx, &sheet)
            .await
            .unwrap()
            .rows;
        sheet.extend(rows).unwrap();
        assert!(sheet.gross().is_zero());
    }
}
