//! # Reference Adapters
//!
//! ## Pipelines (order_index)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Product    0 price ─► 1 currency-conversion ─► 10 discount             │
//! │                      ─► 20 tax ─► 100 rounding                          │
//! │  Delivery   0 fee   ─► 20 tax                                           │
//! │  Payment    0 fee   ─► 20 tax                                           │
//! │  Order      0 items ─► 10 discount ─► 20 delivery ─► 30 payment         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//! Custom adapters slot in between by picking an order index; registering
//! one of the keys below replaces the reference adapter.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::context::{DeliveryContext, OrderContext, PaymentContext, ProductContext};
use crate::director::Director;
use crate::fx::RateCache;

pub mod currency_conversion;
pub mod order_discount;
pub mod order_items;
pub mod order_provider;
pub mod product_discount;
pub mod product_price;
pub mod provider_fee;
pub mod rounding;
pub mod tax;

pub use currency_conversion::ProductCurrencyConversion;
pub use order_discount::OrderDiscount;
pub use order_items::OrderItems;
pub use order_provider::OrderProvider;
pub use product_discount::ProductDiscount;
pub use product_price::ProductPrice;
pub use provider_fee::{DeliveryFee, PaymentFee, ProviderFee};
pub use rounding::Rounding;
pub use tax::Tax;

pub fn register_product_adapters(
    director: &mut Director<ProductContext>,
    config: &EngineConfig,
    rates: Arc<RateCache>,
) {
    director.register_adapter(ProductPrice::new());
    director.register_adapter(ProductCurrencyConversion::new(rates));
    director.register_adapter(ProductDiscount::new());
    director.register_adapter(Tax::<ProductContext>::new(
        tax::PRODUCT_KEY,
        Arc::new(config.tax.clone()),
    ));
    director.register_adapter(Rounding::<ProductContext>::new(
        rounding::PRODUCT_KEY,
        config.rounding.clone(),
    ));
}

pub fn register_delivery_adapters(director: &mut Director<DeliveryContext>, config: &EngineConfig) {
    director.register_adapter(DeliveryFee::delivery());
    director.register_adapter(Tax::<DeliveryContext>::new(
        tax::DELIVERY_KEY,
        Arc::new(config.tax.clone()),
    ));
}

pub fn register_payment_adapters(director: &mut Director<PaymentContext>, config: &EngineConfig) {
    director.register_adapter(PaymentFee::payment());
    director.register_adapter(Tax::<PaymentContext>::new(
        tax::PAYMENT_KEY,
        Arc::new(config.tax.clone()),
    ));
}

pub fn register_order_adapters(director: &mut Director<OrderContext>) {
    director.register_adapter(OrderItems::new());
    director.register_adapter(OrderDiscount::new());
    director.register_adapter(OrderProvider::delivery());
    director.register_adapter(OrderProvider::payment());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::FixedRateProvider;
    use std::time::Duration;

    #[test]
    fn test_product_pipeline_order() {
        let config = EngineConfig::default();
        let rates = Arc::new(RateCache::new(
            Arc::new(FixedRateProvider::new()),
            Duration::from_secs(60),
            Duration::from_secs(1),
        ));
        let mut director = Director::new();
        register_product_adapters(&mut director, &config, rates);

        let keys: Vec<String> = director
            .sorted_adapters()
            .iter()
            .map(|adapter| adapter.key().to_string())
            .collect();
        assert_eq!(
            keys,
            vec![
                product_price::KEY,
                currency_conversion::KEY,
                product_discount::KEY,
                tax::PRODUCT_KEY,
                rounding::PRODUCT_KEY,
            ]
        );
    }

    #[test]
    fn test_order_pipeline_order() {
        let mut director = Director::new();
        register_order_adapters(&mut director);
        let indexes: Vec<i32> = director
            .sorted_adapters()
            .iter()
            .map(|adapter| adapter.order_index())
            .collect();
        assert_eq!(indexes, vec![0, 10, 20, 30]);
    }
}
