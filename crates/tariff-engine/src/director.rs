//! # Director
//!
//! The per-subject adapter registry and pipeline executor.
//!
//! ## Invocation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Director::actions(context)                         │
//! │                                                                         │
//! │  sorted_adapters()        (order_index ASC, key ASC)                    │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  is_activated_for(ctx) ── false / Err ──► skipped (Err: warn!)          │
//! │        │ true                                                           │
//! │        ▼                                                                │
//! │  sheet = empty(currency, quantity)                                      │
//! │  for adapter in activated:                                              │
//! │      contribution = adapter.calculate(ctx, &sheet).await                │
//! │          Err ──► EngineError::Calculation { adapter_key } (abort)       │
//! │      sheet += contribution.rows                                         │
//! │      contribution.warning ──► sheet.warnings                            │
//! │        │                                                                │
//! │        ▼                                                                │
//! │  final sheet                                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Registry Lifetime
//! Adapters are registered through `&mut self` during boot. After that the
//! Director is shared behind an `Arc` and only read, so concurrent invocations
//! need no locking.

use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;

use tariff_core::sheet::PricingSheet;
use tracing::{debug, error, info_span, warn, Instrument};
use uuid::Uuid;

use crate::adapter::PricingAdapter;
use crate::context::{ContextDefaults, PricingContext, ResolveContext};
use crate::error::{EngineError, EngineResult};
use crate::lookup::EntityLookup;

/// Shared handle to a registered adapter.
pub type AdapterHandle<C> = Arc<dyn PricingAdapter<C>>;

pub struct Director<C: PricingContext> {
    adapters: HashMap<String, AdapterHandle<C>>,
    _subject: PhantomData<fn(&C)>,
}

impl<C: PricingContext> Default for Director<C> {
    fn default() -> Self {
        Director {
            adapters: HashMap::new(),
            _subject: PhantomData,
        }
    }
}

impl<C: PricingContext> Director<C> {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Registry
    // =========================================================================

    /// Registers an adapter under its key. An existing key is replaced.
    pub fn register_adapter<A>(&mut self, adapter: A)
    where
        A: PricingAdapter<C> + 'static,
    {
        self.register_shared(Arc::new(adapter));
    }

    /// Registers an already shared adapter.
    pub fn register_shared(&mut self, adapter: AdapterHandle<C>) {
        let key = adapter.key().to_string();
        if self.adapters.contains_key(&key) {
            warn!(subject = %C::SUBJECT, adapter = %key, "Replacing registered adapter");
        } else {
            debug!(subject = %C::SUBJECT, adapter = %key, order_index = adapter.order_index(), "Adapter registered");
        }
        self.adapters.insert(key, adapter);
    }

    /// All adapters, ascending by `order_index`, ties by `key`.
    pub fn sorted_adapters(&self) -> Vec<AdapterHandle<C>> {
        let mut adapters: Vec<AdapterHandle<C>> = self.adapters.values().cloned().collect();
        adapters.sort_by(|a, b| {
            a.order_index()
                .cmp(&b.order_index())
                .then_with(|| a.key().cmp(b.key()))
        });
        adapters
    }

    pub fn get(&self, key: &str) -> Option<AdapterHandle<C>> {
        self.adapters.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.adapters.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    // =========================================================================
    // Invocation
    // =========================================================================

    /// Sorted adapters that are activated for `context`.
    ///
    /// An activation error is logged and the adapter is skipped.
    pub async fn activated_adapters(&self, context: &C) -> Vec<AdapterHandle<C>> {
        let mut activated = Vec::new();
        for adapter in self.sorted_adapters() {
            match adapter.is_activated_for(context).await {
                Ok(true) => {
                    debug!(adapter = adapter.key(), "Adapter activated");
                    activated.push(adapter);
                }
                Ok(false) => debug!(adapter = adapter.key(), "Adapter skipped"),
                Err(e) => warn!(
                    adapter = adapter.key(),
                    error = %e,
                    "Activation check failed, skipping adapter"
                ),
            }
        }
        activated
    }

    /// Runs the pipeline for an already hydrated context.
    pub async fn actions(&self, context: &C) -> EngineResult<PricingSheet> {
        let span = info_span!(
            "pricing",
            subject = %C::SUBJECT,
            calculation_id = %Uuid::new_v4()
        );
        self.fold(context).instrument(span).await
    }

    /// Hydrates `request` and runs the pipeline.
    pub async fn actions_for(
        &self,
        request: C::Request,
        lookup: &dyn EntityLookup,
        defaults: &ContextDefaults,
    ) -> EngineResult<PricingSheet>
    where
        C: ResolveContext,
    {
        let context = C::resolve(request, lookup, defaults).await?;
        self.actions(&context).await
    }

    /// The first activated adapter, for subjects priced by exactly one.
    pub async fn resolve_single(&self, context: &C) -> EngineResult<AdapterHandle<C>> {
        self.activated_adapters(context)
            .await
            .into_iter()
            .next()
            .ok_or(EngineError::NoSuitableAdapter {
                subject: C::SUBJECT,
            })
    }

    async fn fold(&self, context: &C) -> EngineResult<PricingSheet> {
        let mut sheet = PricingSheet::new(context.currency_code());
        if let Some(quantity) = context.quantity() {
            sheet = sheet.with_quantity(quantity);
        }

        for adapter in self.activated_adapters(context).await {
            let key = adapter.key().to_string();

            let contribution = adapter.calculate(context, &sheet).await.map_err(|e| {
                error!(adapter = %key, error = %e, "Adapter calculation failed");
                EngineError::Calculation {
                    adapter_key: key.clone(),
                    message: e.to_string(),
                }
            })?;

            if let Some(message) = contribution.warning {
                warn!(adapter = %key, %message, "Adapter reported a configuration problem");
                sheet.add_warning(key.as_str(), message);
            }

            let count = contribution.rows.len();
            sheet.extend(contribution.rows).map_err(|e| {
                error!(adapter = %key, error = %e, "Adapter returned an invalid row");
                EngineError::Calculation {
                    adapter_key: key.clone(),
                    message: e.to_string(),
                }
            })?;
            debug!(adapter = %key, rows = count, gross = %sheet.gross(), "Adapter contributed");
        }

        Ok(sheet)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
