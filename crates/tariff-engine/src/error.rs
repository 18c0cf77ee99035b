//! # Engine Error Types
//!
//! Error types for adapters and Director invocations.
//!
//! ## Error Categories
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Engine Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Hydration      │  │  Calculation    │  │     Configuration       │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  EntityNotFound │  │  Calculation    │  │  Config                 │ │
//! │  │  Lookup         │  │  Timeout        │  │  NoSuitableAdapter      │ │
//! │  │                 │  │  Core           │  │                         │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  AdapterError (what a single adapter returns)                          │
//! │  ─────────────────────────────────────────────                         │
//! │  Inside is_activated_for → logged, adapter treated as skipped          │
//! │  Inside calculate        → EngineError::Calculation, pipeline aborts   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use tariff_core::error::{CoreError, ValidationError};
use tariff_core::types::Subject;
use thiserror::Error;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Result type alias for adapter operations.
pub type AdapterResult<T> = Result<T, AdapterError>;

// =============================================================================
// Engine Error
// =============================================================================

/// Everything a caller of a Director or of the `PricingEngine` can see.
#[derive(Debug, Error)]
pub enum EngineError {
    // =========================================================================
    // Hydration Errors
    // =========================================================================
    /// A referenced entity does not exist.
    #[error("{kind} '{id}' not found")]
    EntityNotFound { kind: String, id: String },

    /// The entity lookup itself failed.
    #[error("Entity lookup failed: {0}")]
    Lookup(String),

    // =========================================================================
    // Calculation Errors
    // =========================================================================
    /// An adapter failed inside `calculate`. The whole invocation is aborted.
    #[error("Adapter '{adapter_key}' failed: {message}")]
    Calculation { adapter_key: String, message: String },

    /// The invocation did not finish in time.
    #[error("Pricing {subject} timed out after {after_ms} ms")]
    Timeout { subject: Subject, after_ms: u64 },

    /// Sheet level failure outside any adapter.
    #[error(transparent)]
    Core(#[from] CoreError),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// The subject requires exactly one adapter and none is activated.
    #[error("No suitable adapter registered for {subject}")]
    NoSuitableAdapter { subject: Subject },

    /// Invalid engine configuration.
    #[error("Invalid engine configuration: {0}")]
    Config(String),
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Core(CoreError::Validation(err))
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::Config(err.to_string())
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for EngineError {
    fn from(err: toml::ser::Error) -> Self {
        EngineError::Config(err.to_string())
    }
}

// =============================================================================
// Error Categorization
// =============================================================================

impl EngineError {
    /// Creates a not-found error for an entity kind.
    pub fn not_found(kind: &str, id: impl Into<String>) -> Self {
        EngineError::EntityNotFound {
            kind: kind.to_string(),
            id: id.into(),
        }
    }

    /// Returns true if this error indicates a configuration problem.
    ///
    /// Callers surface these as setup problems, not as transient faults.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            EngineError::Config(_) | EngineError::NoSuitableAdapter { .. }
        )
    }

    /// Returns true if an adapter aborted the calculation.
    pub fn is_calculation_error(&self) -> bool {
        matches!(self, EngineError::Calculation { .. } | EngineError::Core(_))
    }

    /// The adapter that aborted the calculation, if any.
    pub fn adapter_key(&self) -> Option<&str> {
        match self {
            EngineError::Calculation { adapter_key, .. } => Some(adapter_key),
            _ => None,
        }
    }
}

// =============================================================================
// Adapter Error
// =============================================================================

/// What a single adapter reports.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The adapter is missing configuration it cannot work without.
    #[error("Misconfigured: {0}")]
    Misconfigured(String),

    /// No exchange rate is available for the pair.
    #[error("No exchange rate for {base}/{quote}")]
    RateUnavailable { base: String, quote: String },

    /// A row could not be added to the result sheet.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The adapter needed an entity that could not be resolved.
    #[error(transparent)]
    Engine(Box<EngineError>),

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

impl From<EngineError> for AdapterError {
    fn from(err: EngineError) -> Self {
        AdapterError::Engine(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors() {
        assert!(EngineError::Config("bad".into()).is_config_error());
        assert!(EngineError::NoSuitableAdapter {
            subject: Subject::Order
        }
        .is_config_error());
        assert!(!EngineError::not_found("product", "p-1").is_config_error());
    }

    #[test]
    fn test_calculation_errors_carry_adapter_key() {
        let err = EngineError::Calculation {
            adapter_key: "shop.tax".into(),
            message: "rate table missing".into(),
        };
        assert!(err.is_calculation_error());
        assert_eq!(err.adapter_key(), Some("shop.tax"));
        assert_eq!(err.to_string(), "Adapter 'shop.tax' failed: rate table missing");
    }

    #[test]
    fn test_error_display() {
        let err = EngineError::not_found("order", "o-42");
        assert_eq!(err.to_string(), "order 'o-42' not found");

        let err = EngineError::Timeout {
            subject: Subject::Product,
            after_ms: 250,
        };
        assert_eq!(err.to_string(), "Pricing product timed out after 250 ms");
    }

    #[test]
    fn test_core_error_converts() {
        let core = CoreError::Validation(ValidationError::Required {
            field: "rate".into(),
        });
        let adapter: AdapterError = core.into();
        assert!(adapter.to_string().contains("rate is required"));
    }
}
