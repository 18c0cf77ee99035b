//! Argument types and helpers for the subcommands.

use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use tariff_core::discount::{ApplicableDiscount, DiscountConfiguration};
use tariff_core::money::Money;
use tariff_core::sheet::{PricingSheet, TotalOptions};
use tariff_core::types::RowCategory;
use tariff_engine::lookup::EntityRef;
use tariff_engine::{
    DeliveryRequest, EngineConfig, FixedRateProvider, Fixture, InMemoryCatalog, OrderRequest,
    PaymentRequest, PricingEngine, ProductRequest,
};
use tracing::info;

#[derive(Args)]
pub struct ProductArgs {
    /// Product id
    pub product: String,

    #[arg(short, long)]
    pub quantity: Option<i64>,

    #[arg(long)]
    pub currency: Option<String>,

    #[arg(long)]
    pub country: Option<String>,

    #[arg(long)]
    pub user: Option<String>,

    /// Pricing date (YYYY-MM-DD), selects the tax rates in force
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Discount as ID:10% or ID:500 (minor units). Repeatable, applied in order.
    #[arg(long = "discount")]
    pub discounts: Vec<String>,
}

impl ProductArgs {
    pub fn into_request(self) -> Result<ProductRequest> {
        let discounts = self
            .discounts
            .iter()
            .map(|spec| parse_discount(spec))
            .collect::<Result<Vec<_>>>()?;

        let mut request = ProductRequest::new(self.product.as_str());
        request.quantity = self.quantity;
        request.currency_code = self.currency;
        request.country_code = self.country;
        request.user = self.user.map(EntityRef::by_id);
        request.pricing_date = self.date;
        request.discounts = discounts;
        Ok(request)
    }
}

#[derive(Args)]
pub struct OrderArgs {
    /// Order id
    pub order: String,

    #[arg(long)]
    pub country: Option<String>,

    /// Overrides the order date
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// Ignore the discounts stored for the order
    #[arg(long)]
    pub no_discounts: bool,
}

impl OrderArgs {
    pub fn into_request(self) -> OrderRequest {
        let mut request = OrderRequest::new(self.order.as_str());
        request.country_code = self.country;
        request.pricing_date = self.date;
        if self.no_discounts {
            request.discounts = Some(Vec::new());
        }
        request
    }
}

#[derive(Args)]
pub struct ProviderArgs {
    /// Provider id
    pub provider: String,

    #[arg(long)]
    pub currency: Option<String>,

    #[arg(long)]
    pub country: Option<String>,

    #[arg(long)]
    pub user: Option<String>,

    #[arg(long)]
    pub date: Option<NaiveDate>,
}

impl ProviderArgs {
    pub fn into_delivery_request(self) -> DeliveryRequest {
        let mut request = DeliveryRequest::new(self.provider.as_str());
        request.currency_code = self.currency;
        request.country_code = self.country;
        request.user = self.user.map(EntityRef::by_id);
        request.pricing_date = self.date;
        request
    }

    pub fn into_payment_request(self) -> PaymentRequest {
        let mut request = PaymentRequest::new(self.provider.as_str());
        request.currency_code = self.currency;
        request.country_code = self.country;
        request.user = self.user.map(EntityRef::by_id);
        request.pricing_date = self.date;
        request
    }
}

/// Boots the engine over the fixture (or an empty catalog).
pub fn boot(config: EngineConfig, fixture: Option<&Path>) -> Result<PricingEngine> {
    let fixture = match fixture {
        Some(path) => Fixture::load(path)
            .with_context(|| format!("Failed to load fixture {}", path.display()))?,
        None => Fixture::default(),
    };
    info!(
        products = fixture.products.len(),
        orders = fixture.orders.len(),
        providers = fixture.providers.len(),
        "Fixture loaded"
    );

    let engine = PricingEngine::boot(
        config,
        Arc::new(InMemoryCatalog::from_fixture(&fixture)),
        Arc::new(FixedRateProvider::from_fixture(&fixture)),
    )?;
    Ok(engine)
}

/// Parses `ID:10%` (rate) or `ID:500` (fixed, minor units).
pub fn parse_discount(input: &str) -> Result<ApplicableDiscount> {
    let Some((id, value)) = input.split_once(':') else {
        bail!("discount '{}' must look like ID:10% or ID:500", input);
    };
    if id.trim().is_empty() {
        bail!("discount '{}' has no id", input);
    }

    let configuration = match value.strip_suffix('%') {
        Some(percent) => {
            let percent: Decimal = percent
                .trim()
                .parse()
                .with_context(|| format!("invalid percentage in '{}'", input))?;
            DiscountConfiguration::Rate(percent / Decimal::ONE_HUNDRED)
        }
        None => {
            let minor: i64 = value
                .trim()
                .parse()
                .with_context(|| format!("invalid amount in '{}'", input))?;
            DiscountConfiguration::FixedRate(Money::from_minor(minor))
        }
    };

    Ok(ApplicableDiscount {
        discount_id: id.trim().to_string(),
        configuration,
    })
}

/// Human readable totals of a sheet.
pub fn summary(sheet: &PricingSheet) -> String {
    let currency = sheet.currency_code();
    let mut out = String::new();
    let _ = writeln!(out, "gross     {} {}", sheet.gross(), currency);
    let _ = writeln!(out, "net       {} {}", sheet.net(), currency);
    let _ = writeln!(out, "tax       {} {}", sheet.tax_sum(), currency);
    for (rate, amount) in sheet.tax_sum_by_rate() {
        let _ = writeln!(out, "  @ {:<6} {} {}", rate.to_string(), amount, currency);
    }
    for category in [RowCategory::Discount, RowCategory::Delivery, RowCategory::Payment] {
        let total = sheet.total(TotalOptions::gross().category(category));
        if !total.amount.is_zero() {
            let _ = writeln!(out, "{:<9} {} {}", category.to_string(), total.amount, currency);
        }
    }
    if let Some(quantity) = sheet.quantity() {
        let _ = writeln!(out, "unit      {} {} (x{})", sheet.unit_price(false).amount, currency, quantity);
    }
    for warning in sheet.warnings() {
        let _ = writeln!(out, "warning   [{}] {}", warning.adapter_key, warning.message);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tariff_core::sheet::RowFields;

    #[test]
    fn test_parse_discounts() {
        let rate = parse_discount("spring:10%").unwrap();
        assert_eq!(rate.discount_id, "spring");
        assert_eq!(
            rate.configuration,
            DiscountConfiguration::Rate(Decimal::new(1, 1))
        );

        let fixed = parse_discount("voucher:500").unwrap();
        assert_eq!(
            fixed.configuration,
            DiscountConfiguration::FixedRate(Money::from_minor(500))
        );

        assert!(parse_discount("nocolon").is_err());
        assert!(parse_discount(":10%").is_err());
        assert!(parse_discount("x:ten").is_err());
    }

    #[test]
    fn test_summary_lists_warnings() {
        let mut sheet = PricingSheet::new("CHF");
        sheet.add_item(RowFields::amount(Money::from_minor(1000))).unwrap();
        sheet.add_warning("tariff.product.tax", "no tax table for country FR");

        let text = summary(&sheet);
        assert!(text.contains("gross     10.00 CHF"));
        assert!(text.contains("[tariff.product.tax] no tax table for country FR"));
    }

    #[tokio::test]
    async fn test_demo_fixture_prices_order() {
        let fixture = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../demos/catalog.json");
        let engine = boot(EngineConfig::default(), Some(&fixture)).unwrap();

        let sheet = engine
            .price_order(OrderArgs {
                order: "o-2".into(),
                country: None,
                date: None,
                no_discounts: false,
            }
            .into_request())
            .await
            .unwrap();

        assert!(sheet.is_valid());
        assert!(sheet.warnings().is_empty());
        assert!(sheet.rows().iter().any(|row| row.category == RowCategory::Delivery));
        assert!(sheet.rows().iter().any(|row| row.category == RowCategory::Payment));
        assert_eq!(sheet.discount_ids(), vec!["loyalty", "welcome"]);
    }
}
