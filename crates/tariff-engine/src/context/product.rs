//! Product pricing context.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tariff_core::discount::ApplicableDiscount;
use tariff_core::types::Subject;
use tariff_core::validation::{validate_currency_code, validate_quantity};
use tariff_core::DEFAULT_QUANTITY;

use super::{ContextDefaults, PricingContext, ResolveContext, TaxSubject};
use crate::config::TaxCategory;
use crate::error::{EngineError, EngineResult};
use crate::lookup::{resolve_optional, EntityLookup, EntityRef, Product, User};

/// Price lookup for one product.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductRequest {
    pub product: EntityRef<Product>,

    #[serde(default)]
    pub quantity: Option<i64>,

    #[serde(default)]
    pub currency_code: Option<String>,

    #[serde(default)]
    pub country_code: Option<String>,

    #[serde(default)]
    pub user: Option<EntityRef<User>>,

    #[serde(default)]
    pub pricing_date: Option<NaiveDate>,

    /// Product level discounts (promotions, vouchers), in application order.
    #[serde(default)]
    pub discounts: Vec<ApplicableDiscount>,
}

impl ProductRequest {
    pub fn new(product: impl Into<EntityRef<Product>>) -> Self {
        ProductRequest {
            product: product.into(),
            quantity: None,
            currency_code: None,
            country_code: None,
            user: None,
            pricing_date: None,
            discounts: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProductContext {
    pub product: Product,
    pub quantity: i64,
    pub currency_code: String,
    pub country_code: String,
    pub pricing_date: NaiveDate,
    pub user: Option<User>,
    pub discounts: Vec<ApplicableDiscount>,
}

impl ProductContext {
    /// A context for an order position, priced in the order's terms.
    pub fn for_position(
        product: Product,
        quantity: i64,
        currency_code: &str,
        country_code: &str,
        pricing_date: NaiveDate,
        user: Option<User>,
    ) -> EngineResult<Self> {
        validate_quantity(quantity)?;
        Ok(ProductContext {
            product,
            quantity,
            currency_code: currency_code.to_string(),
            country_code: country_code.to_string(),
            pricing_date,
            user,
            discounts: Vec::new(),
        })
    }
}

impl PricingContext for ProductContext {
    const SUBJECT: Subject = Subject::Product;

    fn currency_code(&self) -> &str {
        &self.currency_code
    }

    fn quantity(&self) -> Option<i64> {
        Some(self.quantity)
    }
}

impl TaxSubject for ProductContext {
    fn tax_country(&self) -> &str {
        &self.country_code
    }

    fn tax_date(&self) -> NaiveDate {
        self.pricing_date
    }

    fn tax_category(&self) -> TaxCategory {
        self.product.tax_category
    }

    fn tax_exempt(&self) -> bool {
        self.product.tax_exempt
    }
}

#[async_trait]
impl ResolveContext for ProductContext {
    type Request = ProductRequest;

    async fn resolve(
        request: ProductRequest,
        lookup: &dyn EntityLookup,
        defaults: &ContextDefaults,
    ) -> EngineResult<Self> {
        let quantity = request.quantity.unwrap_or(DEFAULT_QUANTITY);
        let currency_code = request
            .currency_code
            .unwrap_or_else(|| defaults.currency_code.clone());
        validate_currency_code(&currency_code)?;

        let product = request.product.resolve(lookup).await?;
        let user = resolve_optional(request.user, lookup).await?;
        let country_code = defaults.country_for(request.country_code, user.as_ref());

        let mut context = ProductContext::for_position(
            product,
            quantity,
            &currency_code,
            &country_code,
            request.pricing_date.unwrap_or(defaults.pricing_date),
            user,
        )?;
        context.discounts = request.discounts;
        Ok(context)
    }
}
