//! # Order Pricing Context
//!
//! An order is priced in two stages. Its entities are hydrated first
//! ([`OrderEntities`]); then every position, the delivery and the payment are
//! priced by their own Directors and the resulting sheets are handed to the
//! order adapters inside [`OrderContext`].

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tariff_core::discount::ApplicableDiscount;
use tariff_core::sheet::PricingSheet;
use tariff_core::types::Subject;
use tariff_core::validation::validate_currency_code;

use super::{ContextDefaults, PricingContext};
use crate::error::EngineResult;
use crate::lookup::{require, EntityLookup, EntityRef, Order, OrderPosition, Product, Provider, User};

/// Full pricing of an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    pub order: EntityRef<Order>,

    /// Overrides the order's (or its user's) country for tax.
    #[serde(default)]
    pub country_code: Option<String>,

    /// Overrides the order date for tax rate validity.
    #[serde(default)]
    pub pricing_date: Option<NaiveDate>,

    /// Discounts to apply instead of the ones stored for the order.
    #[serde(default)]
    pub discounts: Option<Vec<ApplicableDiscount>>,
}

impl OrderRequest {
    pub fn new(order: impl Into<EntityRef<Order>>) -> Self {
        OrderRequest {
            order: order.into(),
            country_code: None,
            pricing_date: None,
            discounts: None,
        }
    }
}

// =============================================================================
// Stage 1: Entities
// =============================================================================

/// Everything an order references, loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderEntities {
    pub order: Order,
    pub user: Option<User>,
    pub positions: Vec<(OrderPosition, Product)>,
    pub delivery_provider: Option<Provider>,
    pub payment_provider: Option<Provider>,
    pub discounts: Vec<ApplicableDiscount>,
    pub country_code: String,
    pub pricing_date: NaiveDate,
}

impl OrderEntities {
    pub async fn resolve(
        request: OrderRequest,
        lookup: &dyn EntityLookup,
        defaults: &ContextDefaults,
    ) -> EngineResult<Self> {
        let order = request.order.resolve(lookup).await?;
        validate_currency_code(&order.currency_code)?;

        let user = match order.user_id.as_deref() {
            Some(id) => Some(require::<User>(lookup, id).await?),
            None => None,
        };

        let mut positions = Vec::with_capacity(order.positions.len());
        for position in &order.positions {
            let product = require::<Product>(lookup, &position.product_id).await?;
            positions.push((position.clone(), product));
        }

        let delivery_provider = match order.delivery_provider_id.as_deref() {
            Some(id) => Some(require::<Provider>(lookup, id).await?),
            None => None,
        };
        let payment_provider = match order.payment_provider_id.as_deref() {
            Some(id) => Some(require::<Provider>(lookup, id).await?),
            None => None,
        };

        let discounts = match request.discounts {
            Some(discounts) => discounts,
            None => lookup.find_order_discounts(&order.id).await?,
        };

        let country_code =
            defaults.country_for(request.country_code.or_else(|| order.country_code.clone()), user.as_ref());
        let pricing_date = request
            .pricing_date
            .or(order.ordered_on)
            .unwrap_or(defaults.pricing_date);

        Ok(OrderEntities {
            order,
            user,
            positions,
            delivery_provider,
            payment_provider,
            discounts,
            country_code,
            pricing_date,
        })
    }
}

// =============================================================================
// Stage 2: Context
// =============================================================================

/// A position with its product sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedPosition {
    pub position: OrderPosition,
    pub product: Product,
    pub sheet: PricingSheet,
}

/// A delivery or payment provider with its fee sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedProvider {
    pub provider: Provider,
    pub sheet: PricingSheet,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderContext {
    pub order: Order,
    pub user: Option<User>,
    pub country_code: String,
    pub pricing_date: NaiveDate,
    pub positions: Vec<PricedPosition>,
    pub delivery: Option<PricedProvider>,
    pub payment: Option<PricedProvider>,
    pub discounts: Vec<ApplicableDiscount>,
}

impl OrderContext {
    /// Combines hydrated entities with the sheets priced for them.
    pub fn new(
        entities: OrderEntities,
        positions: Vec<PricedPosition>,
        delivery: Option<PricedProvider>,
        payment: Option<PricedProvider>,
    ) -> Self {
        OrderContext {
            order: entities.order,
            user: entities.user,
            country_code: entities.country_code,
            pricing_date: entities.pricing_date,
            positions,
            delivery,
            payment,
            discounts: entities.discounts,
        }
    }
}

impl PricingContext for OrderContext {
    const SUBJECT: Subject = Subject::Order;

    fn currency_code(&self) -> &str {
        &self.order.currency_code
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TaxCategory;
    use crate::lookup::{CatalogPrice, ProviderKind};
    use crate::memory::InMemoryCatalog;
    use tariff_core::discount::DiscountConfiguration;
    use tariff_core::money::Money;

    fn defaults() -> ContextDefaults {
        ContextDefaults {
            currency_code: "CHF".into(),
            country_code: "CH".into(),
            pricing_date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
        }
    }

    fn catalog() -> InMemoryCatalog {
        InMemoryCatalog::new()
            .with_product(Product {
                id: "p-1".into(),
                name: "Chair".into(),
                prices: vec![CatalogPrice::gross("CHF", Money::from_minor(20000))],
                tax_category: TaxCategory::Standard,
                tax_exempt: false,
                tags: vec![],
            })
            .with_provider(Provider {
                id: "post".into(),
                kind: ProviderKind::Delivery,
                fees: vec![],
                tax_category: TaxCategory::Standard,
                tax_exempt: false,
            })
            .with_user(User {
                id: "u-1".into(),
                country_code: Some("DE".into()),
            })
            .with_order(Order {
                id: "o-1".into(),
                currency_code: "CHF".into(),
                country_code: None,
                user_id: Some("u-1".into()),
                positions: vec![OrderPosition {
                    id: "pos-1".into(),
                    product_id: "p-1".into(),
                    quantity: 2,
                }],
                delivery_provider_id: Some("post".into()),
                payment_provider_id: None,
                ordered_on: NaiveDate::from_ymd_opt(2024, 2, 1),
            })
            .with_order_discount(
                "o-1",
                ApplicableDiscount {
                    discount_id: "welcome".into(),
                    configuration: DiscountConfiguration::FixedRate(Money::from_minor(1000)),
                },
            )
    }

    #[tokio::test]
    async fn test_hydrates_everything() {
        let entities = OrderEntities::resolve(OrderRequest::new("o-1"), &catalog(), &defaults())
            .await
            .unwrap();

        assert_eq!(entities.positions.len(), 1);
        assert_eq!(entities.positions[0].1.name, "Chair");
        assert_eq!(entities.delivery_provider.map(|p| p.id), Some("post".to_string()));
        assert!(entities.payment_provider.is_none());
        assert_eq!(entities.discounts.len(), 1);
        assert_eq!(entities.country_code, "DE");
        assert_eq!(entities.pricing_date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
    }

    #[tokio::test]
    async fn test_request_overrides() {
        let mut request = OrderRequest::new("o-1");
        request.discounts = Some(vec![]);
        request.country_code = Some("CH".into());
        let entities = OrderEntities::resolve(request, &catalog(), &defaults())
            .await
            .unwrap();
        assert!(entities.discounts.is_empty());
        assert_eq!(entities.country_code, "CH");
    }

    #[tokio::test]
    async fn test_missing_product_fails() {
        let catalog = catalog().with_order(Order {
            id: "o-2".into(),
            currency_code: "CHF".into(),
            country_code: None,
            user_id: None,
            positions: vec![OrderPosition {
                id: "pos-1".into(),
                product_id: "gone".into(),
                quantity: 1,
            }],
            delivery_provider_id: None,
            payment_provider_id: None,
            ordered_on: None,
        });
        let err = OrderEntities::resolve(OrderRequest::new("o-2"), &catalog, &defaults())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "product 'gone' not found");
    }
}
