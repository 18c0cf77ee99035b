//! # Tax
//!
//! One adapter type serves products, delivery and payment. The rate comes
//! from the country table for the context's tax category and date.
//!
//! ## Rows per Taxable Row
//! ```text
//! gross row  Item  +10770                   net row  Item  +10000
//!   offset   Item    -770   (not taxable)     tax    Tax     +770  rate 7.7%
//!   tax      Tax     +770   rate 7.7%
//! ```
//! The gross total is unchanged by a gross row; `net()` drops by the tax.
//! Both extra rows keep the discount id of the row they were derived from.
//! Rows still tagged with a base currency are left alone: currency
//! conversion either cancels them or has cancelled them already.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tariff_core::sheet::{CalculationRow, PricingSheet, RowFields};
use tariff_core::types::RowCategory;

use crate::adapter::{annotated, AdapterRegistration, Contribution, PricingAdapter};
use crate::config::{TaxCategory, TaxSettings};
use crate::context::TaxSubject;
use crate::error::AdapterResult;

use super::product_price::SOURCE_CURRENCY;

pub const PRODUCT_KEY: &str = "tariff.product.tax";
pub const DELIVERY_KEY: &str = "tariff.delivery.tax";
pub const PAYMENT_KEY: &str = "tariff.payment.tax";

pub struct Tax<C> {
    registration: AdapterRegistration,
    tax: Arc<TaxSettings>,
    _context: PhantomData<fn(&C)>,
}

impl<C: TaxSubject> Tax<C> {
    pub fn new(key: &str, tax: Arc<TaxSettings>) -> Self {
        Tax {
            registration: AdapterRegistration::new(key, "Tax", "1.0.0", 20),
            tax,
            _context: PhantomData,
        }
    }

    fn taxable_rows(sheet: &PricingSheet) -> Vec<&CalculationRow> {
        sheet.filter_where(|row| {
            row.is_taxable
                && row.category != RowCategory::Tax
                && row.meta_value(SOURCE_CURRENCY).is_none()
        })
    }
}

#[async_trait]
impl<C: TaxSubject> PricingAdapter<C> for Tax<C> {
    fn registration(&self) -> &AdapterRegistration {
        &self.registration
    }

    async fn is_activated_for(&self, context: &C) -> AdapterResult<bool> {
        Ok(!context.tax_exempt())
    }

    async fn calculate(&self, context: &C, sheet: &PricingSheet) -> AdapterResult<Contribution> {
        let country = context.tax_country();
        let Some(table) = self.tax.country(country) else {
            return Ok(Contribution::misconfigured(format!(
                "no tax table for country {country}"
            )));
        };

        let date = context.tax_date();
        let category = context.tax_category();
        let mut warning = None;
        let rate = match table.rate_for(category, date) {
            Some(rate) => rate,
            None => match table.rate_for(TaxCategory::Standard, date) {
                Some(rate) => {
                    warning = Some(format!(
                        "no {category} tax rate for {country}, using the standard rate"
                    ));
                    rate
                }
                None => {
                    return Ok(Contribution::misconfigured(format!(
                        "no standard tax rate for {country} on {date}"
                    )))
                }
            },
        };

        let key = &self.registration.key;
        let mut result = sheet.result_sheet();
        for row in Self::taxable_rows(sheet) {
            let tax = if row.is_net_price {
                rate.tax_on_net(row.amount)
            } else {
                rate.tax_in_gross(row.amount)
            };
            if tax.is_zero() {
                continue;
            }

            let with_discount = |fields: RowFields| match &row.discount_id {
                Some(id) => fields.discount(id.clone()),
                None => fields,
            };

            if !row.is_net_price {
                result.push(CalculationRow::from_fields(
                    row.category,
                    with_discount(annotated(key, RowFields::amount(-tax)).net_price(true)),
                ))?;
            }
            result.add_tax(with_discount(annotated(key, RowFields::amount(tax)).rate(rate)))?;
        }

        let contribution = Contribution::from(result);
        Ok(match warning {
            Some(message) => contribution.with_warning(message),
            None => contribution,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ProductContext;
    use crate::lookup::{CatalogPrice, Product};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tariff_core::money::Money;
    use tariff_core::types::TaxRate;

    fn context(country: &str, category: TaxCategory, date: NaiveDate) -> ProductContext {
        ProductContext::for_position(
            Product {
                id: "p-1".into(),
                name: "Book".into(),
                prices: vec![CatalogPrice::gross("CHF", Money::from_minor(10770))],
                tax_category: category,
                tax_exempt: false,
                tags: vec![],
            },
            1,
            "CHF",
            country,
            date,
            None,
        )
        .unwrap()
    }

    fn tax() -> Tax<ProductContext> {
        Tax::new(PRODUCT_KEY, Arc::new(TaxSettings::default()))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_gross_row_extracts_tax() {
        let ctx = context("CH", TaxCategory::Standard, date(2023, 6, 1));
        let mut sheet = PricingSheet::new("CHF");
        sheet
            .add_item(RowFields::amount(Money::from_minor(10770)).taxable(true))
            .unwrap();

        let contribution = tax().calculate(&ctx, &sheet).await.unwrap();
        assert!(contribution.warning.is_none());
        sheet.extend(contribution.rows).unwrap();

        assert_eq!(sheet.gross().minor(), 10770);
        assert_eq!(sheet.tax_sum().minor(), 770);
        assert_eq!(sheet.net().minor(), 10000);
        assert_eq!(sheet.tax_sum_by_rate(), vec![(TaxRate::new(dec!(0.077)), Money::from_minor(770))]);
    }

    #[tokio::test]
    async fn test_net_row_adds_tax() {
        let ctx = context("CH", TaxCategory::Standard, date(2024, 3, 1));
        let mut sheet = PricingSheet::new("CHF");
        sheet
            .add_item(RowFields::amount(Money::from_minor(10000)).taxable(true).net_price(true))
            .unwrap();

        let rows = tax().calculate(&ctx, &sheet).await.unwrap().rows;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].amount.minor(), 810);
        assert_eq!(rows[0].rate, Some(TaxRate::new(dec!(0.081))));
    }

    #[tokio::test]
    async fn test_discount_rows_keep_their_id() {
        let ctx = context("CH", TaxCategory::Standard, date(2023, 6, 1));
        let mut sheet = PricingSheet::new("CHF");
        sheet
            .add_item(RowFields::amount(Money::from_minor(10770)).taxable(true))
            .unwrap();
        sheet
            .add_discount(
                RowFields::amount(Money::from_minor(-1077))
                    .taxable(true)
                    .discount("ten"),
            )
            .unwrap();

        let rows = tax().calculate(&ctx, &sheet).await.unwrap().rows;
        sheet.extend(rows).unwrap();

        assert_eq!(sheet.gross().minor(), 9693);
        assert_eq!(sheet.discount_sum(Some("ten")).minor(), -1077);
        assert_eq!(sheet.tax_sum().minor(), 770 - 77);
    }

    #[tokio::test]
    async fn test_non_taxable_rows_are_ignored() {
        let ctx = context("CH", TaxCategory::Standard, date(2023, 6, 1));
        let mut sheet = PricingSheet::new("CHF");
        sheet.add_fee(RowFields::amount(Money::from_minor(500))).unwrap();
        assert!(tax().calculate(&ctx, &sheet).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unconverted_rows_are_not_taxed() {
        let ctx = context("CH", TaxCategory::Standard, date(2023, 6, 1));
        let mut sheet = PricingSheet::new("CHF");
        sheet
            .add_item(
                RowFields::amount(Money::from_minor(2500))
                    .taxable(true)
                    .meta(SOURCE_CURRENCY, "EUR"),
            )
            .unwrap();

        let contribution = tax().calculate(&ctx, &sheet).await.unwrap();
        assert!(contribution.rows.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_country_is_misconfigured() {
        let ctx = context("FR", TaxCategory::Standard, date(2023, 6, 1));
        let mut sheet = PricingSheet::new("CHF");
        sheet
            .add_item(RowFields::amount(Money::from_minor(10770)).taxable(true))
            .unwrap();

        let contribution = tax().calculate(&ctx, &sheet).await.unwrap();
        assert!(contribution.rows.is_empty());
        assert_eq!(contribution.warning.as_deref(), Some("no tax table for country FR"));
    }

    #[tokio::test]
    async fn test_missing_category_falls_back_to_standard() {
        let ctx = context("DE", TaxCategory::Special, date(2023, 6, 1));
        let mut sheet = PricingSheet::new("EUR");
        sheet
            .add_item(RowFields::amount(Money::from_minor(11900)).taxable(true))
            .unwrap();

        let contribution = tax().calculate(&ctx, &sheet).await.unwrap();
        assert!(contribution.warning.is_some());
        sheet.extend(contribution.rows).unwrap();
        assert_eq!(sheet.tax_sum().minor(), 1900);
    }

    #[tokio::test]
    async fn test_exempt_context_is_skipped() {
        let mut ctx = context("CH", TaxCategory::Standard, date(2023, 6, 1));
        ctx.product.tax_exempt = true;
        assert!(!tax().is_activated_for(&ctx).await.unwrap());
    }
}
