//! # tariff-engine: Adapter Pipeline for Tariff
//!
//! Four Directors, one per pricing subject, fold ordered adapters over a
//! [`PricingSheet`](tariff_core::PricingSheet).
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          PricingEngine                                  │
//! │                                                                         │
//! │  Request ──► Context (hydrated through EntityLookup)                    │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                    Director<C>                                   │  │
//! │  │                                                                  │  │
//! │  │  sorted_adapters() ─► is_activated_for ─► calculate (in order)  │  │
//! │  │                                                                  │  │
//! │  │  sheet₀ = ∅   sheetₙ = sheetₙ₋₁ ++ adapterₙ.calculate(sheetₙ₋₁) │  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                 │                                                       │
//! │                 ▼                                                       │
//! │  PricingSheet (rows + warnings)                                         │
//! │                                                                         │
//! │  COLLABORATORS:                                                        │
//! │  • EntityLookup          - orders, products, providers, users          │
//! │  • ExchangeRateProvider  - behind a short-TTL RateCache                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`adapter`] - The adapter contract
//! - [`adapters`] - Reference adapters and their registration
//! - [`config`] - Engine configuration (TOML + env)
//! - [`context`] - Per-subject requests and hydrated contexts
//! - [`director`] - Registry and pipeline executor
//! - [`engine`] - `PricingEngine` facade with invocation timeouts
//! - [`error`] - Engine and adapter errors
//! - [`fx`] - Exchange rate boundary and cache
//! - [`lookup`] - Entity model and lookup boundary
//! - [`memory`] - In-memory lookup, fixed rates, JSON fixtures
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tariff_engine::{EngineConfig, InMemoryCatalog, FixedRateProvider, OrderRequest, PricingEngine};
//!
//! let engine = PricingEngine::boot(
//!     EngineConfig::load_or_default(None),
//!     Arc::new(InMemoryCatalog::new()),
//!     Arc::new(FixedRateProvider::new()),
//! )?;
//!
//! let sheet = engine.price_order(OrderRequest::new("o-1")).await?;
//! println!("gross {} tax {}", sheet.gross(), sheet.tax_sum());
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod adapter;
pub mod adapters;
pub mod config;
pub mod context;
pub mod director;
pub mod engine;
pub mod error;
pub mod fx;
pub mod lookup;
pub mod memory;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use adapter::{AdapterRegistration, Contribution, PricingAdapter};
pub use config::{EngineConfig, TaxCategory};
pub use context::{
    ContextDefaults, DeliveryContext, DeliveryRequest, OrderContext, OrderRequest,
    PaymentContext, PaymentRequest, PricingContext, ProductContext, ProductRequest,
    ResolveContext,
};
pub use director::{AdapterHandle, Director};
pub use engine::PricingEngine;
pub use error::{AdapterError, AdapterResult, EngineError, EngineResult};
pub use fx::{ExchangeRate, ExchangeRateProvider, RateCache};
pub use lookup::{CatalogPrice, EntityLookup, EntityRef, Order, OrderPosition, Product, Provider, ProviderKind, User};
pub use memory::{FixedRateProvider, Fixture, InMemoryCatalog};
