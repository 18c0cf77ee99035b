//! # Adapter Contract
//!
//! An adapter is a named, versioned plugin that contributes rows to one
//! pricing subject.
//!
//! ## Invocation States
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  NotEvaluated ──is_activated_for──► Skipped        (false or Err)       │
//! │       │                                                                 │
//! │       └──────────────────────────► Activated                            │
//! │                                        │ calculate(context, sheet)      │
//! │                                        ▼                                │
//! │                                    Calculated ──Err──► invocation fails │
//! │                                        │                                │
//! │                                        ▼                                │
//! │                                    Contributed   (rows appended)        │
//! │                                                                         │
//! │  Skipped and Contributed are terminal. There is no retry.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Writing an Adapter
//! ```rust,ignore
//! struct GiftWrap { registration: AdapterRegistration }
//!
//! #[async_trait]
//! impl PricingAdapter<ProductContext> for GiftWrap {
//!     fn registration(&self) -> &AdapterRegistration { &self.registration }
//!
//!     async fn is_activated_for(&self, ctx: &ProductContext) -> AdapterResult<bool> {
//!         Ok(ctx.product.tags.iter().any(|t| t == "gift"))
//!     }
//!
//!     async fn calculate(&self, _: &ProductContext, sheet: &PricingSheet)
//!         -> AdapterResult<Contribution>
//!     {
//!         let mut result = sheet.result_sheet();
//!         result.add_fee(RowFields::amount(Money::from_minor(300)))?;
//!         Ok(result.into())
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tariff_core::sheet::{CalculationRow, PricingSheet, RowFields};

use crate::context::PricingContext;
use crate::error::AdapterResult;

// =============================================================================
// Registration
// =============================================================================

/// Identity and position of an adapter in its Director.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterRegistration {
    /// Globally unique key. Re-registering a key replaces the adapter.
    pub key: String,
    pub label: String,
    pub version: String,

    /// Lower runs first. Ties are broken by `key`.
    pub order_index: i32,
}

impl AdapterRegistration {
    pub fn new(
        key: impl Into<String>,
        label: impl Into<String>,
        version: impl Into<String>,
        order_index: i32,
    ) -> Self {
        AdapterRegistration {
            key: key.into(),
            label: label.into(),
            version: version.into(),
            order_index,
        }
    }
}

// =============================================================================
// Contribution
// =============================================================================

/// What one `calculate` step adds to the running sheet.
///
/// `warning` is the configuration sentinel: an activated adapter that cannot
/// do its job (missing tax table, provider without fee) reports it here
/// instead of failing the whole invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contribution {
    pub rows: Vec<CalculationRow>,
    pub warning: Option<String>,
}

impl Contribution {
    pub fn none() -> Self {
        Contribution::default()
    }

    pub fn rows(rows: Vec<CalculationRow>) -> Self {
        Contribution {
            rows,
            warning: None,
        }
    }

    /// No rows, only a configuration warning.
    pub fn misconfigured(message: impl Into<String>) -> Self {
        Contribution {
            rows: Vec::new(),
            warning: Some(message.into()),
        }
    }

    pub fn with_warning(mut self, message: impl Into<String>) -> Self {
        self.warning = Some(message.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() && self.warning.is_none()
    }
}

impl From<PricingSheet> for Contribution {
    fn from(result: PricingSheet) -> Self {
        Contribution::rows(result.into_rows())
    }
}

// =============================================================================
// Adapter Trait
// =============================================================================

/// A pricing plugin for the subject described by `C`.
///
/// Adapters are plain values without shared mutable state. They never edit
/// the sheet they are given; they return only their own new rows.
#[async_trait]
pub trait PricingAdapter<C: PricingContext>: Send + Sync {
    fn registration(&self) -> &AdapterRegistration;

    fn key(&self) -> &str {
        &self.registration().key
    }

    fn order_index(&self) -> i32 {
        self.registration().order_index
    }

    /// Whether the adapter applies to `context`. Must not have side effects.
    ///
    /// An `Err` is logged and counts as "not activated".
    async fn is_activated_for(&self, context: &C) -> AdapterResult<bool>;

    /// The adapter's contribution given every row of the earlier adapters.
    ///
    /// An `Err` aborts the whole Director invocation.
    async fn calculate(&self, context: &C, sheet: &PricingSheet) -> AdapterResult<Contribution>;
}

/// Row fields annotated with the producing adapter.
pub(crate) fn annotated(key: &str, fields: RowFields) -> RowFields {
    fields.meta("adapter", key)
}
