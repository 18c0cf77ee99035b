//! Delivery and payment fees of an order, taken from their priced sheets.

use async_trait::async_trait;
use tariff_core::money::Money;
use tariff_core::sheet::{PricingSheet, RowFields};
use tariff_core::types::RowCategory;

use super::order_items::fold_sub_sheet;
use crate::adapter::{AdapterRegistration, Contribution, PricingAdapter};
use crate::context::{OrderContext, PricedProvider};
use crate::error::AdapterResult;

pub const DELIVERY_KEY: &str = "tariff.order.delivery";
pub const PAYMENT_KEY: &str = "tariff.order.payment";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Delivery,
    Payment,
}

impl Slot {
    fn pick(self, context: &OrderContext) -> Option<&PricedProvider> {
        match self {
            Slot::Delivery => context.delivery.as_ref(),
            Slot::Payment => context.payment.as_ref(),
        }
    }

    fn category(self) -> RowCategory {
        match self {
            Slot::Delivery => RowCategory::Delivery,
            Slot::Payment => RowCategory::Payment,
        }
    }
}

/// Folds the delivery or payment sheet into one fee row plus its tax.
pub struct OrderProvider {
    registration: AdapterRegistration,
    slot: Slot,
}

impl OrderProvider {
    pub fn delivery() -> Self {
        OrderProvider {
            registration: AdapterRegistration::new(DELIVERY_KEY, "Order delivery", "1.0.0", 20),
            slot: Slot::Delivery,
        }
    }

    pub fn payment() -> Self {
        OrderProvider {
            registration: AdapterRegistration::new(PAYMENT_KEY, "Order payment", "1.0.0", 30),
            slot: Slot::Payment,
        }
    }
}

#[async_trait]
impl PricingAdapter<OrderContext> for OrderProvider {
    fn registration(&self) -> &AdapterRegistration {
        &self.registration
    }

    async fn is_activated_for(&self, context: &OrderContext) -> AdapterResult<bool> {
        Ok(self.slot.pick(context).is_some())
    }

    async fn calculate(
        &self,
        context: &OrderContext,
        sheet: &PricingSheet,
    ) -> AdapterResult<Contribution> {
        let Some(priced) = self.slot.pick(context) else {
            return Ok(Contribution::none());
        };

        let mut result = sheet.result_sheet();
        if priced.sheet.is_valid() {
            fold_sub_sheet(
                &mut result,
                &self.registration.key,
                self.slot.category(),
                &priced.sheet,
                RowFields::amount(Money::zero()).meta("provider", priced.provider.id.as_str()),
            )?;
        }

        let warnings: Vec<&str> = priced
            .sheet
            .warnings()
            .iter()
            .map(|w| w.message.as_str())
            .collect();

        let contribution = Contribution::from(result);
        Ok(if warnings.is_empty() {
            contribution
        } else {
            contribution.with_warning(warnings.join("; "))
        })
    }
}
