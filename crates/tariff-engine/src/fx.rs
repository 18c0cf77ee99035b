//! # Exchange Rates
//!
//! Boundary to the external FX service plus a short-TTL cache in front of it.
//!
//! ## Cache Behavior
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  rate(base, quote)                                                      │
//! │                                                                         │
//! │  base == quote ───────────────────────────────────────► Some(1)         │
//! │  cached and fresh ────────────────────────────────────► Some(rate)      │
//! │  provider answers within lookup_timeout ──► cache ────► Some(rate)      │
//! │      kept for min(cache_ttl, expires_at - now)                          │
//! │  provider: no rate / error / too slow ────────────────► None + warn     │
//! │                                                                         │
//! │  None makes the converting adapter skip itself for this invocation.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::time::{timeout, Instant};
use tracing::{debug, warn};

use crate::config::EngineConfig;
use crate::error::EngineResult;

/// One quote from the FX service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Units of `quote` per unit of `base`.
    pub rate: Decimal,
    pub expires_at: DateTime<Utc>,
}

/// The external exchange rate service.
#[async_trait]
pub trait ExchangeRateProvider: Send + Sync {
    /// `Ok(None)` when the pair is not quoted.
    async fn get_rate(&self, base: &str, quote: &str) -> EngineResult<Option<ExchangeRate>>;
}

#[derive(Debug, Clone, Copy)]
struct CachedRate {
    rate: Decimal,
    valid_until: Instant,
}

/// Short-TTL cache of exchange rates.
///
/// Shared by every invocation; all access goes through a `tokio` `RwLock`.
pub struct RateCache {
    provider: Arc<dyn ExchangeRateProvider>,
    ttl: Duration,
    lookup_timeout: Duration,
    entries: RwLock<HashMap<(String, String), CachedRate>>,
}

impl RateCache {
    pub fn new(
        provider: Arc<dyn ExchangeRateProvider>,
        ttl: Duration,
        lookup_timeout: Duration,
    ) -> Self {
        RateCache {
            provider,
            ttl,
            lookup_timeout,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn from_config(provider: Arc<dyn ExchangeRateProvider>, config: &EngineConfig) -> Self {
        Self::new(provider, config.fx_cache_ttl(), config.fx_lookup_timeout())
    }

    /// Rate to convert `base` amounts into `quote`, or `None` on a miss.
    pub async fn rate(&self, base: &str, quote: &str) -> Option<Decimal> {
        if base == quote {
            return Some(Decimal::ONE);
        }

        let key = (base.to_string(), quote.to_string());
        {
            let entries = self.entries.read().await;
            if let Some(cached) = entries.get(&key) {
                if cached.valid_until > Instant::now() {
                    return Some(cached.rate);
                }
            }
        }

        let quote_result = match timeout(self.lookup_timeout, self.provider.get_rate(base, quote)).await {
            Ok(Ok(Some(quote_result))) => quote_result,
            Ok(Ok(None)) => {
                warn!(base, quote, "No exchange rate quoted");
                return None;
            }
            Ok(Err(e)) => {
                warn!(base, quote, error = %e, "Exchange rate lookup failed");
                return None;
            }
            Err(_) => {
                warn!(
                    base,
                    quote,
                    timeout_ms = self.lookup_timeout.as_millis() as u64,
                    "Exchange rate lookup timed out"
                );
                return None;
            }
        };

        let remaining = (quote_result.expires_at - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO);
        if remaining.is_zero() {
            warn!(base, quote, expires_at = %quote_result.expires_at, "Exchange rate already expired");
            return None;
        }

        let keep_for = self.ttl.min(remaining);
        debug!(base, quote, rate = %quote_result.rate, ?keep_for, "Caching exchange rate");
        self.entries.write().await.insert(
            key,
            CachedRate {
                rate: quote_result.rate,
                valid_until: Instant::now() + keep_for,
            },
        );

        Some(quote_result.rate)
    }

    /// Drops every cached rate.
    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
