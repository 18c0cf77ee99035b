//! # Entity Lookup
//!
//! The entity model the engine prices, and the boundary to the modules that
//! own those entities.
//!
//! ## Hydration
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Request field            EntityRef             Context field           │
//! │  ──────────────           ─────────             ─────────────           │
//! │  "p-1"             ──►    Id("p-1")     ──►     find_product("p-1")     │
//! │  { "id": "p-1" }   ──►    Loaded(p)     ──►     p (no lookup)           │
//! │                                                                         │
//! │  Unknown id → EngineError::EntityNotFound { kind, id }                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tariff_core::discount::ApplicableDiscount;
use tariff_core::money::Money;

use crate::config::TaxCategory;
use crate::error::{EngineError, EngineResult};

// =============================================================================
// Entities
// =============================================================================

/// A price list entry in one currency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogPrice {
    pub currency_code: String,
    pub amount: Money,

    /// Whether `amount` excludes tax. Catalog prices are gross by default.
    #[serde(default)]
    pub is_net_price: bool,
}

impl CatalogPrice {
    pub fn gross(currency_code: impl Into<String>, amount: Money) -> Self {
        CatalogPrice {
            currency_code: currency_code.into(),
            amount,
            is_net_price: false,
        }
    }
}

/// Finds the price for `currency_code` in a price list.
pub fn price_in<'a>(prices: &'a [CatalogPrice], currency_code: &str) -> Option<&'a CatalogPrice> {
    prices.iter().find(|p| p.currency_code == currency_code)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,

    #[serde(default)]
    pub name: String,

    /// One entry per currency. The first entry is the base price.
    #[serde(default)]
    pub prices: Vec<CatalogPrice>,

    #[serde(default)]
    pub tax_category: TaxCategory,

    /// Untaxed goods (vouchers, deposits).
    #[serde(default)]
    pub tax_exempt: bool,

    #[serde(default)]
    pub tags: Vec<String>,
}

impl Product {
    pub fn base_price(&self) -> Option<&CatalogPrice> {
        self.prices.first()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPosition {
    pub id: String,
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    pub currency_code: String,

    #[serde(default)]
    pub country_code: Option<String>,

    #[serde(default)]
    pub user_id: Option<String>,

    #[serde(default)]
    pub positions: Vec<OrderPosition>,

    #[serde(default)]
    pub delivery_provider_id: Option<String>,

    #[serde(default)]
    pub payment_provider_id: Option<String>,

    /// Date the order was placed; tax rates in force on this date apply.
    #[serde(default)]
    pub ordered_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Delivery,
    Payment,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Delivery => write!(f, "delivery"),
            ProviderKind::Payment => write!(f, "payment"),
        }
    }
}

/// A delivery or payment provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provider {
    pub id: String,
    pub kind: ProviderKind,

    /// Flat fee per currency. A provider without a fee in the priced
    /// currency is reported as misconfigured.
    #[serde(default)]
    pub fees: Vec<CatalogPrice>,

    #[serde(default)]
    pub tax_category: TaxCategory,

    #[serde(default)]
    pub tax_exempt: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,

    #[serde(default)]
    pub country_code: Option<String>,
}

// =============================================================================
// Lookup Boundary
// =============================================================================

/// Finds entities by identifier.
///
/// `Ok(None)` means "does not exist"; `Err` means the lookup itself failed.
#[async_trait]
pub trait EntityLookup: Send + Sync {
    async fn find_order(&self, id: &str) -> EngineResult<Option<Order>>;

    async fn find_product(&self, id: &str) -> EngineResult<Option<Product>>;

    async fn find_provider(&self, id: &str) -> EngineResult<Option<Provider>>;

    async fn find_user(&self, id: &str) -> EngineResult<Option<User>>;

    /// Discounts active on an order, in application order.
    async fn find_order_discounts(&self, order_id: &str) -> EngineResult<Vec<ApplicableDiscount>>;
}

/// An entity kind that can be hydrated from an identifier.
#[async_trait]
pub trait Entity: Sized + Send {
    const KIND: &'static str;

    fn id(&self) -> &str;

    async fn find(lookup: &dyn EntityLookup, id: &str) -> EngineResult<Option<Self>>;
}

#[async_trait]
impl Entity for Order {
    const KIND: &'static str = "order";

    fn id(&self) -> &str {
        &self.id
    }

    async fn find(lookup: &dyn EntityLookup, id: &str) -> EngineResult<Option<Self>> {
        lookup.find_order(id).await
    }
}

#[async_trait]
impl Entity for Product {
    const KIND: &'static str = "product";

    fn id(&self) -> &str {
        &self.id
    }

    async fn find(lookup: &dyn EntityLookup, id: &str) -> EngineResult<Option<Self>> {
        lookup.find_product(id).await
    }
}

#[async_trait]
impl Entity for Provider {
    const KIND: &'static str = "provider";

    fn id(&self) -> &str {
        &self.id
    }

    async fn find(lookup: &dyn EntityLookup, id: &str) -> EngineResult<Option<Self>> {
        lookup.find_provider(id).await
    }
}

#[async_trait]
impl Entity for User {
    const KIND: &'static str = "user";

    fn id(&self) -> &str {
        &self.id
    }

    async fn find(lookup: &dyn EntityLookup, id: &str) -> EngineResult<Option<Self>> {
        lookup.find_user(id).await
    }
}

/// Looks up an entity that must exist.
pub async fn require<T: Entity>(lookup: &dyn EntityLookup, id: &str) -> EngineResult<T> {
    T::find(lookup, id)
        .await?
        .ok_or_else(|| EngineError::not_found(T::KIND, id))
}

// =============================================================================
// Entity Reference
// =============================================================================

/// Either an identifier or an already loaded entity.
///
/// Deserializes from a bare string (`"p-1"`) or from the entity object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityRef<T> {
    Id(String),
    Loaded(T),
}

impl<T: Entity> EntityRef<T> {
    pub fn id(&self) -> &str {
        match self {
            EntityRef::Id(id) => id,
            EntityRef::Loaded(entity) => entity.id(),
        }
    }

    /// Returns the entity, loading it through `lookup` when needed.
    pub async fn resolve(self, lookup: &dyn EntityLookup) -> EngineResult<T> {
        match self {
            EntityRef::Loaded(entity) => Ok(entity),
            EntityRef::Id(id) => require(lookup, &id).await,
        }
    }
}

impl<T> From<T> for EntityRef<T> {
    fn from(entity: T) -> Self {
        EntityRef::Loaded(entity)
    }
}

macro_rules! entity_ref_from_id {
    ($($entity:ty),*) => {
        $(
            impl From<&str> for EntityRef<$entity> {
                fn from(id: &str) -> Self {
                    EntityRef::Id(id.to_string())
                }
            }
        )*
    };
}

entity_ref_from_id!(Order, Product, Provider, User);

impl<T> EntityRef<T> {
    pub fn by_id(id: impl Into<String>) -> Self {
        EntityRef::Id(id.into())
    }
}

/// Resolves an optional reference.
pub async fn resolve_optional<T: Entity>(
    reference: Option<EntityRef<T>>,
    lookup: &dyn EntityLookup,
) -> EngineResult<Option<T>> {
    match reference {
        Some(reference) => reference.resolve(lookup).await.map(Some),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryCatalog;

    fn product(id: &str) -> Product {
        Product {
            id: id.to_string(),
            name: "Espresso".to_string(),
            prices: vec![CatalogPrice::gross("CHF", Money::from_minor(450))],
            tax_category: TaxCategory::Reduced,
            tax_exempt: false,
            tags: vec![],
        }
    }

    #[tokio::test]
    async fn test_resolve_by_id_and_loaded() {
        let catalog = InMemoryCatalog::new().with_product(product("p-1"));

        let by_id: EntityRef<Product> = EntityRef::by_id("p-1");
        assert_eq!(by_id.id(), "p-1");
        let resolved = by_id.resolve(&catalog).await.unwrap();
        assert_eq!(resolved.name, "Espresso");

        let loaded = EntityRef::from(product("p-2"));
        assert_eq!(loaded.resolve(&catalog).await.unwrap().id, "p-2");
    }

    #[tokio::test]
    async fn test_unknown_id_is_not_found() {
        let catalog = InMemoryCatalog::new();
        let err = EntityRef::<Order>::by_id("o-404")
            .resolve(&catalog)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "order 'o-404' not found");
    }

    #[test]
    fn test_entity_ref_deserialization() {
        let by_id: EntityRef<User> = serde_json::from_str(r#""u-1""#).unwrap();
        assert_eq!(by_id, EntityRef::Id("u-1".into()));

        let loaded: EntityRef<User> =
            serde_json::from_str(r#"{"id": "u-2", "country_code": "DE"}"#).unwrap();
        match loaded {
            EntityRef::Loaded(user) => assert_eq!(user.country_code.as_deref(), Some("DE")),
            other => panic!("expected loaded user, got {:?}", other),
        }
    }

    #[test]
    fn test_price_in() {
        let prices = vec![
            CatalogPrice::gross("CHF", Money::from_minor(450)),
            CatalogPrice::gross("EUR", Money::from_minor(470)),
        ];
        assert_eq!(price_in(&prices, "EUR").map(|p| p.amount.minor()), Some(470));
        assert!(price_in(&prices, "USD").is_none());
    }
}
