//! # Order Discount
//!
//! Spreads the order's discounts across its positions, proportional to each
//! position's gross, with the tax correction of every share.
//!
//! ## Allocation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  positions   pos-1 20000 (tax 1430)      pos-2 20000 (tax 1430)         │
//! │  shares      ratio 0.5                   ratio 0.5                      │
//! │                                                                         │
//! │  fixed 5000  Discount -2500 (pos-1)      Discount -2500 (pos-2)         │
//! │              Tax       -358 rate 7.7%    Discount  +358                 │
//! │                                                                         │
//! │  gross 40000 → 35000      tax 2860 → 2502                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use tariff_core::discount::{distribute_discounts, DiscountShare};
use tariff_core::money::Money;
use tariff_core::sheet::PricingSheet;

use crate::adapter::{AdapterRegistration, Contribution, PricingAdapter};
use crate::context::{OrderContext, PricedPosition};
use crate::error::AdapterResult;

pub const KEY: &str = "tariff.order.discount";

pub struct OrderDiscount {
    registration: AdapterRegistration,
}

impl OrderDiscount {
    pub fn new() -> Self {
        OrderDiscount {
            registration: AdapterRegistration::new(KEY, "Order discount", "1.0.0", 10),
        }
    }
}

impl Default for OrderDiscount {
    fn default() -> Self {
        Self::new()
    }
}

/// Allocation basis of each position.
fn shares(positions: &[PricedPosition], total: Money) -> Vec<DiscountShare> {
    positions
        .iter()
        .map(|priced| {
            let share = DiscountShare::from_item(priced.sheet.gross(), priced.sheet.tax_sum(), total)
                .with_label(priced.position.id.as_str());
            match priced.sheet.tax_sum_by_rate().as_slice() {
                [(rate, _)] => share.with_tax_rate(*rate),
                _ => share,
            }
        })
        .collect()
}

#[async_trait]
impl PricingAdapter<OrderContext> for OrderDiscount {
    fn registration(&self) -> &AdapterRegistration {
        &self.registration
    }

    async fn is_activated_for(&self, context: &OrderContext) -> AdapterResult<bool> {
        Ok(!context.discounts.is_empty() && !context.positions.is_empty())
    }

    async fn calculate(
        &self,
        context: &OrderContext,
        sheet: &PricingSheet,
    ) -> AdapterResult<Contribution> {
        let total: Money = context.positions.iter().map(|p| p.sheet.gross()).sum();
        if !total.is_positive() {
            return Ok(Contribution::none());
        }

        let shares = shares(&context.positions, total);
        let mut result = sheet.result_sheet();
        for allocation in distribute_discounts(total, &shares, &context.discounts) {
            if allocation.is_empty() {
                continue;
            }
            result.extend(allocation.to_rows(KEY))?;
        }
        Ok(result.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaxCategory;
    use crate::lookup::{CatalogPrice, Order, OrderPosition, Product};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tariff_core::discount::{ApplicableDiscount, DiscountConfiguration};
    use tariff_core::sheet::RowFields;
    use tariff_core::types::{RowCategory, TaxRate};

    fn position(id: &str, gross: i64, tax: i64) -> PricedPosition {
        let mut sheet = PricingSheet::new("CHF").with_quantity(1);
        sheet
            .add_item(RowFields::amount(Money::from_minor(gross)).taxable(true))
            .unwrap();
        sheet
            .add_item(RowFields::amount(Money::from_minor(-tax)).net_price(true))
            .unwrap();
        sheet
            .add_tax(RowFields::amount(Money::from_minor(tax)).rate(TaxRate::new(dec!(0.077))))
            .unwrap();
        PricedPosition {
            position: OrderPosition {
                id: id.into(),
                product_id: "p-1".into(),
                quantity: 1,
            },
            product: Product {
                id: "p-1".into(),
                name: "Chair".into(),
                prices: vec![CatalogPrice::gross("CHF", Money::from_minor(gross))],
                tax_category: TaxCategory::Standard,
                tax_exempt: false,
                tags: vec![],
            },
            sheet,
        }
    }

    fn context(positions: Vec<PricedPosition>, discounts: Vec<ApplicableDiscount>) -> OrderContext {
        OrderContext {
            order: Order {
                id: "o-1".into(),
                currency_code: "CHF".into(),
                country_code: None,
                user_id: None,
                positions: vec![],
                delivery_provider_id: None,
                payment_provider_id: None,
                ordered_on: None,
            },
            user: None,
            country_code: "CH".into(),
            pricing_date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
            positions,
            delivery: None,
            payment: None,
            discounts,
        }
    }

    fn fixed(id: &str, minor: i64) -> ApplicableDiscount {
        ApplicableDiscount {
            discount_id: id.into(),
            configuration: DiscountConfiguration::FixedRate(Money::from_minor(minor)),
        }
    }

    fn order_sheet(context: &OrderContext) -> PricingSheet {
        let mut sheet = PricingSheet::new("CHF");
        for priced in &context.positions {
            sheet.extend(priced.sheet.rows().iter().cloned()).unwrap();
        }
        sheet
    }

    #[tokio::test]
    async fn test_fixed_discount_split_evenly() {
        let ctx = context(
            vec![position("pos-1", 20000, 1430), position("pos-2", 20000, 1430)],
            vec![fixed("spring", 5000)],
        );
        let mut sheet = order_sheet(&ctx);
        let rows = OrderDiscount::new().calculate(&ctx, &sheet).await.unwrap().rows;

        let shares: Vec<_> = rows
            .iter()
            .filter(|row| row.category == RowCategory::Discount && row.amount.is_negative())
            .collect();
        assert_eq!(shares.len(), 2);
        assert!(shares.iter().all(|row| row.amount.minor() == -2500));
        assert_eq!(shares[0].meta_value("share"), Some("pos-1"));
        assert_eq!(shares[1].meta_value("share"), Some("pos-2"));

        sheet.extend(rows).unwrap();
        assert_eq!(sheet.gross().minor(), 35000);
        assert_eq!(sheet.tax_sum().minor(), 2860 - 358);
        assert_eq!(sheet.discount_sum(Some("spring")).minor(), -5000);
    }

    #[tokio::test]
    async fn test_uneven_positions() {
        let ctx = context(
            vec![position("pos-1", 30000, 2145), position("pos-2", 10000, 715)],
            vec![fixed("spring", 1000)],
        );
        let rows = OrderDiscount::new()
            .calculate(&ctx, &order_sheet(&ctx))
            .await
            .unwrap()
            .rows;

        assert_eq!(rows[0].amount.minor(), -750);
        assert_eq!(rows[1].amount.minor(), -250);
    }

    #[tokio::test]
    async fn test_never_discounts_more_than_items() {
        let ctx = context(
            vec![position("pos-1", 20000, 1430)],
            vec![fixed("a", 15000), fixed("b", 15000)],
        );
        let mut sheet = order_sheet(&ctx);
        let rows = OrderDiscount::new().calculate(&ctx, &sheet).await.unwrap().rows;
        sheet.extend(rows).unwrap();

        assert_eq!(sheet.discount_sum(Some("a")).minor(), -15000);
        assert_eq!(sheet.discount_sum(Some("b")).minor(), 0);
        assert_eq!(sheet.discount_sum(None).minor(), -15000);
    }
}
