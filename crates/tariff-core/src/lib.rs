//! # tariff-core: Pure Pricing Primitives
//!
//! This crate holds the data side of the pricing engine: calculation rows,
//! pricing sheets and the discount distribution math. Everything here is
//! synchronous and deterministic.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tariff Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    tariff-cli / host application                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ PricingEngine::price_*                 │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tariff-engine (async)                        │   │
//! │  │    Director ──► adapters ──► EntityLookup / ExchangeRates      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tariff-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   sheet   │  │   money   │  │ discount  │  │ validation│  │   │
//! │  │   │   Row     │  │   Money   │  │  shares   │  │ row rules │  │   │
//! │  │   │   Sheet   │  │  TaxRate  │  │  split    │  │  codes    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO ASYNC • NO LOGGING • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Integer minor-unit amounts with decimal ratio math
//! - [`types`] - Tax rates, row categories, pricing subjects
//! - [`sheet`] - Calculation rows and the pricing sheet
//! - [`discount`] - Proportional discount distribution
//! - [`validation`] - Row and input rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use rust_decimal::Decimal;
//! use tariff_core::{Money, PricingSheet, RowFields, TaxRate};
//!
//! let rate = TaxRate::new(Decimal::new(77, 3));
//! let gross = Money::from_minor(20000);
//! let tax = rate.tax_in_gross(gross);
//!
//! let mut sheet = PricingSheet::new("CHF");
//! sheet.add_item(RowFields::amount(gross).taxable(true)).unwrap();
//! sheet.add_item(RowFields::amount(-tax)).unwrap();
//! sheet.add_tax(RowFields::amount(tax).rate(rate)).unwrap();
//!
//! assert_eq!(sheet.gross().minor(), 20000);
//! assert_eq!(sheet.net().minor(), 18570);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod discount;
pub mod error;
pub mod money;
pub mod sheet;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use discount::{
    distribute_discounts, ApplicableDiscount, DiscountAllocation, DiscountConfiguration,
    DiscountShare,
};
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use sheet::{
    CalculationRow, PricingSheet, RowFields, RowFilter, RowMeta, SheetTotal, SheetWarning,
    TotalOptions,
};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Currency used when neither the request nor the configuration names one.
pub const DEFAULT_CURRENCY: &str = "CHF";

/// Quantity priced when a product request does not carry one.
pub const DEFAULT_QUANTITY: i64 = 1;
