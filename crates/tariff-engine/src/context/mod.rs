//! # Pricing Contexts
//!
//! One context type per subject. A context is the fully hydrated input of a
//! Director invocation; adapters read it and never change it.
//!
//! ## Request → Context
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  ProductRequest ──resolve──► ProductContext  ──► Director<Product>      │
//! │  DeliveryRequest ─resolve──► DeliveryContext ──► Director<Delivery>     │
//! │  PaymentRequest ──resolve──► PaymentContext  ──► Director<Payment>      │
//! │                                                                         │
//! │  OrderRequest ──► OrderEntities ──► positions priced (Product)          │
//! │                                     delivery priced  (Delivery)         │
//! │                                     payment priced   (Payment)          │
//! │                                 ──► OrderContext ──► Director<Order>    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use tariff_core::types::{RowCategory, Subject};

use crate::config::{EngineSettings, TaxCategory};
use crate::error::EngineResult;
use crate::lookup::{EntityLookup, Provider, User};

pub mod delivery;
pub mod order;
pub mod payment;
pub mod product;

pub use delivery::{DeliveryContext, DeliveryRequest};
pub use order::{OrderContext, OrderEntities, OrderRequest, PricedPosition, PricedProvider};
pub use payment::{PaymentContext, PaymentRequest};
pub use product::{ProductContext, ProductRequest};

// =============================================================================
// Context Traits
// =============================================================================

/// The input of one Director invocation.
pub trait PricingContext: Send + Sync + 'static {
    const SUBJECT: Subject;

    fn currency_code(&self) -> &str;

    /// Quantity carried by the result sheet (product sheets only).
    fn quantity(&self) -> Option<i64> {
        None
    }
}

/// A context that can be built from a request by looking up entities.
#[async_trait]
pub trait ResolveContext: PricingContext + Sized {
    type Request: Send + 'static;

    async fn resolve(
        request: Self::Request,
        lookup: &dyn EntityLookup,
        defaults: &ContextDefaults,
    ) -> EngineResult<Self>;
}

/// What the tax adapter needs to pick a rate.
pub trait TaxSubject: PricingContext {
    fn tax_country(&self) -> &str;

    fn tax_date(&self) -> NaiveDate;

    fn tax_category(&self) -> TaxCategory;

    fn tax_exempt(&self) -> bool;
}

/// Delivery and payment contexts: priced from a provider's fee table.
pub trait ProviderSubject: PricingContext {
    /// Row category of the provider fee.
    const FEE_CATEGORY: RowCategory;

    fn provider(&self) -> &Provider;
}

// =============================================================================
// Defaults
// =============================================================================

/// Values a request may leave out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextDefaults {
    pub currency_code: String,
    pub country_code: String,
    pub pricing_date: NaiveDate,
}

impl ContextDefaults {
    /// Defaults from configuration, priced as of today (UTC).
    pub fn from_settings(settings: &EngineSettings) -> Self {
        ContextDefaults {
            currency_code: settings.default_currency.clone(),
            country_code: settings.default_country.clone(),
            pricing_date: Utc::now().date_naive(),
        }
    }

    /// Explicit country first, then the user's, then the default.
    pub fn country_for(&self, explicit: Option<String>, user: Option<&User>) -> String {
        explicit
            .or_else(|| user.and_then(|u| u.country_code.clone()))
            .unwrap_or_else(|| self.country_code.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_country_precedence() {
        let defaults = ContextDefaults::from_settings(&EngineSettings::default());
        let user = User {
            id: "u-1".into(),
            country_code: Some("DE".into()),
        };

        assert_eq!(defaults.country_for(Some("AT".into()), Some(&user)), "AT");
        assert_eq!(defaults.country_for(None, Some(&user)), "DE");
        assert_eq!(defaults.country_for(None, None), "CH");
    }
}
