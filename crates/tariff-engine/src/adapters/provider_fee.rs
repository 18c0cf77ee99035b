//! Delivery and payment fees from a provider's fee table.

use std::marker::PhantomData;

use async_trait::async_trait;
use tariff_core::sheet::{CalculationRow, PricingSheet, RowFields};

use crate::adapter::{annotated, AdapterRegistration, Contribution, PricingAdapter};
use crate::context::{DeliveryContext, PaymentContext, ProviderSubject};
use crate::error::AdapterResult;
use crate::lookup::price_in;

pub const DELIVERY_KEY: &str = "tariff.delivery.fee";
pub const PAYMENT_KEY: &str = "tariff.payment.fee";

pub type DeliveryFee = ProviderFee<DeliveryContext>;
pub type PaymentFee = ProviderFee<PaymentContext>;

/// Adds the provider's fee in the requested currency.
///
/// A provider without a fee in that currency is a configuration problem: the
/// sheet stays empty and carries a warning.
pub struct ProviderFee<C> {
    registration: AdapterRegistration,
    _context: PhantomData<fn(&C)>,
}

impl<C: ProviderSubject> ProviderFee<C> {
    pub fn new(key: &str) -> Self {
        ProviderFee {
            registration: AdapterRegistration::new(key, "Provider fee", "1.0.0", 0),
            _context: PhantomData,
        }
    }
}

impl DeliveryFee {
    pub fn delivery() -> Self {
        Self::new(DELIVERY_KEY)
    }
}

impl PaymentFee {
    pub fn payment() -> Self {
        Self::new(PAYMENT_KEY)
    }
}

#[async_trait]
impl<C: ProviderSubject> PricingAdapter<C> for ProviderFee<C> {
    fn registration(&self) -> &AdapterRegistration {
        &self.registration
    }

    async fn is_activated_for(&self, _context: &C) -> AdapterResult<bool> {
        Ok(true)
    }

    async fn calculate(&self, context: &C, sheet: &PricingSheet) -> AdapterResult<Contribution> {
        let provider = context.provider();
        let currency = context.currency_code();
        let Some(fee) = price_in(&provider.fees, currency) else {
            return Ok(Contribution::misconfigured(format!(
                "provider {} has no fee configured for {currency}",
                provider.id
            )));
        };

        let mut result = sheet.result_sheet();
        result.push(CalculationRow::from_fields(
            C::FEE_CATEGORY,
            annotated(&self.registration.key, RowFields::amount(fee.amount))
                .taxable(!provider.tax_exempt)
                .net_price(fee.is_net_price)
                .meta("provider", provider.id.as_str()),
        ))?;
        Ok(result.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaxCategory;
    use crate::lookup::{CatalogPrice, Provider, ProviderKind};
    use chrono::NaiveDate;
    use tariff_core::money::Money;
    use tariff_core::types::RowCategory;

    fn provider(kind: ProviderKind) -> Provider {
        Provider {
            id: "post".into(),
            kind,
            fees: vec![CatalogPrice::gross("CHF", Money::from_minor(900))],
            tax_category: TaxCategory::Standard,
            tax_exempt: false,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2023, 6, 1).unwrap()
    }

    #[tokio::test]
    async fn test_delivery_fee_row() {
        let ctx = DeliveryContext::new(provider(ProviderKind::Delivery), "CHF", "CH", date()).unwrap();
        let rows = DeliveryFee::delivery()
            .calculate(&ctx, &PricingSheet::new("CHF"))
            .await
            .unwrap()
            .rows;

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].category, RowCategory::Delivery);
        assert_eq!(rows[0].amount.minor(), 900);
        assert!(rows[0].is_taxable);
        assert!(!rows[0].is_net_price);
    }

    #[tokio::test]
    async fn test_payment_fee_category() {
        let ctx = PaymentContext::new(provider(ProviderKind::Payment), "CHF", "CH", date()).unwrap();
        let rows = PaymentFee::payment()
            .calculate(&ctx, &PricingSheet::new("CHF"))
            .await
            .unwrap()
            .rows;
        assert_eq!(rows[0].category, RowCategory::Payment);
    }

    #[tokio::test]
    async fn test_missing_fee_warns() {
        let ctx = DeliveryContext::new(provider(ProviderKind::Delivery), "EUR", "DE", date()).unwrap();
        let contribution = DeliveryFee::delivery()
            .calculate(&ctx, &PricingSheet::new("EUR"))
            .await
            .unwrap();

        assert!(contribution.rows.is_empty());
        assert_eq!(
            contribution.warning.as_deref(),
            Some("provider post has no fee configured for EUR")
        );
    }
}
