//! Payment pricing context.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tariff_core::types::{RowCategory, Subject};
use tariff_core::validation::validate_currency_code;

use super::{ContextDefaults, PricingContext, ProviderSubject, ResolveContext, TaxSubject};
use crate::config::TaxCategory;
use crate::error::{EngineError, EngineResult};
use crate::lookup::{resolve_optional, EntityLookup, EntityRef, Provider, ProviderKind, User};

/// Fee lookup for a payment provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub provider: EntityRef<Provider>,

    #[serde(default)]
    pub currency_code: Option<String>,

    #[serde(default)]
    pub country_code: Option<String>,

    #[serde(default)]
    pub user: Option<EntityRef<User>>,

    #[serde(default)]
    pub pricing_date: Option<NaiveDate>,
}

impl PaymentRequest {
    pub fn new(provider: impl Into<EntityRef<Provider>>) -> Self {
        PaymentRequest {
            provider: provider.into(),
            currency_code: None,
            country_code: None,
            user: None,
            pricing_date: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentContext {
    pub provider: Provider,
    pub currency_code: String,
    pub country_code: String,
    pub pricing_date: NaiveDate,
}

impl PaymentContext {
    /// Fails if `provider` is not a payment provider.
    pub fn new(
        provider: Provider,
        currency_code: &str,
        country_code: &str,
        pricing_date: NaiveDate,
    ) -> EngineResult<Self> {
        if provider.kind != ProviderKind::Payment {
            return Err(EngineError::not_found("payment provider", provider.id));
        }
        Ok(PaymentContext {
            provider,
            currency_code: currency_code.to_string(),
            country_code: country_code.to_string(),
            pricing_date,
        })
    }
}

impl PricingContext for PaymentContext {
    const SUBJECT: Subject = Subject::Payment;

    fn currency_code(&self) -> &str {
        &self.currency_code
    }
}

impl ProviderSubject for PaymentContext {
    const FEE_CATEGORY: RowCategory = RowCategory::Payment;

    fn provider(&self) -> &Provider {
        &self.provider
    }
}

impl TaxSubject for PaymentContext {
    fn tax_country(&self) -> &str {
        &self.country_code
    }

    fn tax_date(&self) -> NaiveDate {
        self.pricing_date
    }

    fn tax_category(&self) -> TaxCategory {
        self.provider.tax_category
    }

    fn tax_exempt(&self) -> bool {
        self.provider.tax_exempt
    }
}

#[async_trait]
impl ResolveContext for PaymentContext {
    type Request = PaymentRequest;

    async fn resolve(
        request: PaymentRequest,
        lookup: &dyn EntityLookup,
        defaults: &ContextDefaults,
    ) -> EngineResult<Self> {
        let currency_code = request
            .currency_code
            .unwrap_or_else(|| defaults.currency_code.clone());
        validate_currency_code(&currency_code)?;

        let provider = request.provider.resolve(lookup).await?;
        let user = resolve_optional(request.user, lookup).await?;
        let country_code = defaults.country_for(request.country_code, user.as_ref());

        PaymentContext::new(
            provider,
            &currency_code,
            &country_code,
            request.pricing_date.unwrap_or(defaults.pricing_date),
        )
    }
}
