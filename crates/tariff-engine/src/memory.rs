//! # In-Memory Collaborators
//!
//! Map-backed implementations of [`EntityLookup`] and
//! [`ExchangeRateProvider`] for tests, demos and the CLI.
//!
//! ## Fixture Format (JSON)
//! ```text
//! {
//!   "products":  [{ "id": "p-1", "prices": [{ "currency_code": "CHF", "amount": 20000 }] }],
//!   "providers": [{ "id": "post", "kind": "delivery", "fees": [...] }],
//!   "users":     [{ "id": "u-1", "country_code": "CH" }],
//!   "orders":    [{ "id": "o-1", "currency_code": "CHF", "positions": [...] }],
//!   "order_discounts": { "o-1": [{ "discountId": "spring",
//!                                  "configuration": { "fixedRate": 5000 } }] },
//!   "exchange_rates":  [{ "base": "CHF", "quote": "EUR", "rate": "1.05" }]
//! }
//! ```

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tariff_core::discount::ApplicableDiscount;

use crate::error::{EngineError, EngineResult};
use crate::fx::{ExchangeRate, ExchangeRateProvider};
use crate::lookup::{EntityLookup, Order, Product, Provider, User};

// =============================================================================
// Catalog
// =============================================================================

/// Entities held in hash maps, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    products: HashMap<String, Product>,
    orders: HashMap<String, Order>,
    providers: HashMap<String, Provider>,
    users: HashMap<String, User>,
    order_discounts: HashMap<String, Vec<ApplicableDiscount>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_product(mut self, product: Product) -> Self {
        self.products.insert(product.id.clone(), product);
        self
    }

    pub fn with_order(mut self, order: Order) -> Self {
        self.orders.insert(order.id.clone(), order);
        self
    }

    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.providers.insert(provider.id.clone(), provider);
        self
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.users.insert(user.id.clone(), user);
        self
    }

    /// Appends a discount to an order's discount list.
    pub fn with_order_discount(mut self, order_id: &str, discount: ApplicableDiscount) -> Self {
        self.order_discounts
            .entry(order_id.to_string())
            .or_default()
            .push(discount);
        self
    }

    pub fn from_fixture(fixture: &Fixture) -> Self {
        let mut catalog = InMemoryCatalog::new();
        for product in &fixture.products {
            catalog = catalog.with_product(product.clone());
        }
        for order in &fixture.orders {
            catalog = catalog.with_order(order.clone());
        }
        for provider in &fixture.providers {
            catalog = catalog.with_provider(provider.clone());
        }
        for user in &fixture.users {
            catalog = catalog.with_user(user.clone());
        }
        catalog.order_discounts = fixture.order_discounts.clone();
        catalog
    }
}

#[async_trait]
impl EntityLookup for InMemoryCatalog {
    async fn find_order(&self, id: &str) -> EngineResult<Option<Order>> {
        Ok(self.orders.get(id).cloned())
    }

    async fn find_product(&self, id: &str) -> EngineResult<Option<Product>> {
        Ok(self.products.get(id).cloned())
    }

    async fn find_provider(&self, id: &str) -> EngineResult<Option<Provider>> {
        Ok(self.providers.get(id).cloned())
    }

    async fn find_user(&self, id: &str) -> EngineResult<Option<User>> {
        Ok(self.users.get(id).cloned())
    }

    async fn find_order_discounts(&self, order_id: &str) -> EngineResult<Vec<ApplicableDiscount>> {
        Ok(self
            .order_discounts
            .get(order_id)
            .cloned()
            .unwrap_or_default())
    }
}

// =============================================================================
// Exchange Rates
// =============================================================================

/// Quotes fixed rates, each valid for `validity` from the time of the call.
#[derive(Debug, Clone)]
pub struct FixedRateProvider {
    rates: HashMap<(String, String), Decimal>,
    validity: chrono::Duration,
}

impl Default for FixedRateProvider {
    fn default() -> Self {
        FixedRateProvider {
            rates: HashMap::new(),
            validity: chrono::Duration::hours(1),
        }
    }
}

impl FixedRateProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(mut self, base: &str, quote: &str, rate: Decimal) -> Self {
        self.rates.insert((base.to_string(), quote.to_string()), rate);
        self
    }

    pub fn with_validity(mut self, validity: chrono::Duration) -> Self {
        self.validity = validity;
        self
    }

    pub fn from_fixture(fixture: &Fixture) -> Self {
        fixture
            .exchange_rates
            .iter()
            .fold(FixedRateProvider::new(), |provider, quote| {
                provider.with_rate(&quote.base, &quote.quote, quote.rate)
            })
    }
}

#[async_trait]
impl ExchangeRateProvider for FixedRateProvider {
    async fn get_rate(&self, base: &str, quote: &str) -> EngineResult<Option<ExchangeRate>> {
        Ok(self
            .rates
            .get(&(base.to_string(), quote.to_string()))
            .map(|rate| ExchangeRate {
                rate: *rate,
                expires_at: Utc::now() + self.validity,
            }))
    }
}

// =============================================================================
// Fixture
// =============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureRate {
    pub base: String,
    pub quote: String,
    pub rate: Decimal,
}

/// Everything an in-memory setup needs, as one JSON document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub products: Vec<Product>,

    #[serde(default)]
    pub orders: Vec<Order>,

    #[serde(default)]
    pub providers: Vec<Provider>,

    #[serde(default)]
    pub users: Vec<User>,

    #[serde(default)]
    pub order_discounts: HashMap<String, Vec<ApplicableDiscount>>,

    #[serde(default)]
    pub exchange_rates: Vec<FixtureRate>,
}

impl Fixture {
    pub fn from_json_str(contents: &str) -> EngineResult<Self> {
        serde_json::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Invalid fixture: {}", e)))
    }

    pub fn load(path: &Path) -> EngineResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use tariff_core::discount::DiscountConfiguration;
    use tariff_core::money::Money;

    const FIXTURE: &str = r#"{
        "products": [
            { "id": "p-1", "name": "Chair",
              "prices": [{ "currency_code": "CHF", "amount": 20000 }] }
        ],
        "orders": [
            { "id": "o-1", "currency_code": "CHF",
              "positions": [{ "id": "pos-1", "product_id": "p-1", "quantity": 2 }] }
        ],
        "order_discounts": {
            "o-1": [{ "discountId": "spring", "configuration": { "fixedRate": 5000 } }]
        },
        "exchange_rates": [{ "base": "CHF", "quote": "EUR", "rate": "1.05" }]
    }"#;

    #[tokio::test]
    async fn test_fixture_catalog() {
        let fixture = Fixture::from_json_str(FIXTURE).unwrap();
        let catalog = InMemoryCatalog::from_fixture(&fixture);

        let product = catalog.find_product("p-1").await.unwrap().unwrap();
        assert_eq!(product.prices[0].amount, Money::from_minor(20000));
        assert!(catalog.find_product("p-2").await.unwrap().is_none());

        let discounts = catalog.find_order_discounts("o-1").await.unwrap();
        assert_eq!(
            discounts[0].configuration,
            DiscountConfiguration::FixedRate(Money::from_minor(5000))
        );
        assert!(catalog.find_order_discounts("o-2").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_fixture_rates() {
        let fixture = Fixture::from_json_str(FIXTURE).unwrap();
        let provider = FixedRateProvider::from_fixture(&fixture);

        let quote = provider.get_rate("CHF", "EUR").await.unwrap().unwrap();
        assert_eq!(quote.rate, dec!(1.05));
        assert!(quote.expires_at > Utc::now());
        assert!(provider.get_rate("EUR", "CHF").await.unwrap().is_none());
    }

    #[test]
    fn test_invalid_fixture() {
        let err = Fixture::from_json_str("{ \"products\": 3 }").unwrap_err();
        assert!(err.is_config_error());
    }
}
