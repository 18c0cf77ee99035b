//! # Error Types
//!
//! Domain-specific error types for tariff-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tariff-core errors (this file)                                        │
//! │  ├── CoreError        - Sheet and arithmetic failures                  │
//! │  └── ValidationError  - Row / input field violations                   │
//! │                                                                         │
//! │  tariff-engine errors (separate crate)                                 │
//! │  ├── AdapterError     - What a single adapter reports                  │
//! │  └── EngineError      - What callers of a Director see                 │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → AdapterError → EngineError        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::types::RowCategory;

// =============================================================================
// Core Error
// =============================================================================

/// Pricing sheet and arithmetic errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A row violates the rules of its category.
    #[error("Invalid {category} row: {source}")]
    InvalidRow {
        category: RowCategory,
        #[source]
        source: ValidationError,
    },

    /// Two sheets with different currencies were combined.
    #[error("Currency mismatch: expected {expected}, got {got}")]
    CurrencyMismatch { expected: String, got: String },

    /// An amount left the representable range.
    #[error("Amount overflow: {0}")]
    Overflow(String),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Field validation errors.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Field is not allowed in this context.
    #[error("{field} is not allowed on {context}")]
    NotAllowed { field: String, context: String },

    /// Invalid format (e.g., invalid currency code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
