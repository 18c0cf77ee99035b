//! # Pricing Engine
//!
//! The process-wide entry point: owns one Director per subject, the entity
//! lookup and the exchange rate cache.
//!
//! ## Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  boot(config, lookup, fx)                                               │
//! │    validate config                                                      │
//! │    register reference adapters (4 Directors)                            │
//! │    *_director_mut() → custom adapters        (still &mut, before Arc)   │
//! │                                                                         │
//! │  Arc<PricingEngine>  ── read-only from here on, shared by requests ──   │
//! │                                                                         │
//! │  price_product / price_delivery / price_payment / price_order           │
//! │    each bounded by engine.invocation_timeout_ms                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Order Pricing
//! ```text
//! OrderEntities::resolve
//!   ├── every position  ──► Director<Product>  (order currency/country/date)
//!   ├── delivery        ──► Director<Delivery>
//!   └── payment         ──► Director<Payment>
//! OrderContext::new ──► Director<Order>
//! ```

use std::future::Future;
use std::sync::Arc;

use tariff_core::sheet::PricingSheet;
use tariff_core::types::Subject;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::adapter::PricingAdapter;
use crate::adapters;
use crate::config::EngineConfig;
use crate::context::{
    ContextDefaults, DeliveryContext, DeliveryRequest, OrderContext, OrderEntities, OrderRequest,
    PaymentContext, PaymentRequest, PricedPosition, PricedProvider, PricingContext, ProductContext,
    ProductRequest, ResolveContext,
};
use crate::director::Director;
use crate::error::{EngineError, EngineResult};
use crate::fx::{ExchangeRateProvider, RateCache};
use crate::lookup::EntityLookup;

pub struct PricingEngine {
    config: Arc<EngineConfig>,
    lookup: Arc<dyn EntityLookup>,
    rates: Arc<RateCache>,
    product: Director<ProductContext>,
    delivery: Director<DeliveryContext>,
    payment: Director<PaymentContext>,
    order: Director<OrderContext>,
}

impl PricingEngine {
    /// Validates `config` and registers the reference adapters.
    pub fn boot(
        config: EngineConfig,
        lookup: Arc<dyn EntityLookup>,
        fx: Arc<dyn ExchangeRateProvider>,
    ) -> EngineResult<Self> {
        config.validate()?;
        let rates = Arc::new(RateCache::from_config(fx, &config));

        let mut product = Director::new();
        adapters::register_product_adapters(&mut product, &config, rates.clone());
        let mut delivery = Director::new();
        adapters::register_delivery_adapters(&mut delivery, &config);
        let mut payment = Director::new();
        adapters::register_payment_adapters(&mut payment, &config);
        let mut order = Director::new();
        adapters::register_order_adapters(&mut order);

        info!(
            product_adapters = product.len(),
            delivery_adapters = delivery.len(),
            payment_adapters = payment.len(),
            order_adapters = order.len(),
            default_currency = %config.engine.default_currency,
            "Pricing engine booted"
        );

        Ok(PricingEngine {
            config: Arc::new(config),
            lookup,
            rates,
            product,
            delivery,
            payment,
            order,
        })
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn rates(&self) -> &Arc<RateCache> {
        &self.rates
    }

    /// Request defaults, dated today.
    pub fn defaults(&self) -> ContextDefaults {
        ContextDefaults::from_settings(&self.config.engine)
    }

    pub fn product_director(&self) -> &Director<ProductContext> {
        &self.product
    }

    pub fn product_director_mut(&mut self) -> &mut Director<ProductContext> {
        &mut self.product
    }

    pub fn delivery_director_mut(&mut self) -> &mut Director<DeliveryContext> {
        &mut self.delivery
    }

    pub fn payment_director_mut(&mut self) -> &mut Director<PaymentContext> {
        &mut self.payment
    }

    pub fn order_director(&self) -> &Director<OrderContext> {
        &self.order
    }

    pub fn order_director_mut(&mut self) -> &mut Director<OrderContext> {
        &mut self.order
    }

    // =========================================================================
    // Pricing
    // =========================================================================

    pub async fn price_product(&self, request: ProductRequest) -> EngineResult<PricingSheet> {
        let defaults = self.defaults();
        self.bounded(
            Subject::Product,
            self.product.actions_for(request, self.lookup.as_ref(), &defaults),
        )
        .await
    }

    pub async fn price_delivery(&self, request: DeliveryRequest) -> EngineResult<PricingSheet> {
        let defaults = self.defaults();
        self.bounded(Subject::Delivery, async {
            let context = DeliveryContext::resolve(request, self.lookup.as_ref(), &defaults).await?;
            provider_pipeline(&self.delivery, &context).await
        })
        .await
    }

    pub async fn price_payment(&self, request: PaymentRequest) -> EngineResult<PricingSheet> {
        let defaults = self.defaults();
        self.bounded(Subject::Payment, async {
            let context = PaymentContext::resolve(request, self.lookup.as_ref(), &defaults).await?;
            provider_pipeline(&self.payment, &context).await
        })
        .await
    }

    /// Prices every part of an order, then the order itself.
    pub async fn price_order(&self, request: OrderRequest) -> EngineResult<PricingSheet> {
        self.bounded(Subject::Order, self.order_pipeline(request)).await
    }

    async fn order_pipeline(&self, request: OrderRequest) -> EngineResult<PricingSheet> {
        let defaults = self.defaults();
        let entities = OrderEntities::resolve(request, self.lookup.as_ref(), &defaults).await?;
        let currency = entities.order.currency_code.clone();

        let mut positions = Vec::with_capacity(entities.positions.len());
        for (position, product) in &entities.positions {
            let context = ProductContext::for_position(
                product.clone(),
                position.quantity,
                &currency,
                &entities.country_code,
                entities.pricing_date,
                entities.user.clone(),
            )?;
            let sheet = self.product.actions(&context).await?;
            debug!(position = %position.id, gross = %sheet.gross(), "Position priced");
            positions.push(PricedPosition {
                position: position.clone(),
                product: product.clone(),
                sheet,
            });
        }

        let delivery = match &entities.delivery_provider {
            Some(provider) => {
                let context = DeliveryContext::new(
                    provider.clone(),
                    &currency,
                    &entities.country_code,
                    entities.pricing_date,
                )?;
                let sheet = provider_pipeline(&self.delivery, &context).await?;
                Some(PricedProvider {
                    provider: provider.clone(),
                    sheet,
                })
            }
            None => None,
        };

        let payment = match &entities.payment_provider {
            Some(provider) => {
                let context = PaymentContext::new(
                    provider.clone(),
                    &currency,
                    &entities.country_code,
                    entities.pricing_date,
                )?;
                let sheet = provider_pipeline(&self.payment, &context).await?;
                Some(PricedProvider {
                    provider: provider.clone(),
                    sheet,
                })
            }
            None => None,
        };

        let context = OrderContext::new(entities, positions, delivery, payment);
        self.order.actions(&context).await
    }

    /// Bounds one invocation by the configured timeout.
    async fn bounded<F>(&self, subject: Subject, invocation: F) -> EngineResult<PricingSheet>
    where
        F: Future<Output = EngineResult<PricingSheet>>,
    {
        let limit = self.config.invocation_timeout();
        match timeout(limit, invocation).await {
            Ok(result) => result,
            Err(_) => {
                let after_ms = limit.as_millis() as u64;
                warn!(%subject, after_ms, "Pricing invocation timed out");
                Err(EngineError::Timeout { subject, after_ms })
            }
        }
    }
}

/// Runs a provider Director. At least one adapter has to be activated for
/// the provider, otherwise `NoSuitableAdapter`.
async fn provider_pipeline<C: PricingContext>(
    director: &Director<C>,
    context: &C,
) -> EngineResult<PricingSheet> {
    let first = director.resolve_single(context).await?;
    debug!(subject = %C::SUBJECT, first = first.key(), "Provider pipeline starts");
    director.actions(context).await
}

// =============================================================================
// Unit Tests
// =============================================================================
