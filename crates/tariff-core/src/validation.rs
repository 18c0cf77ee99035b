//! # Validation Module
//!
//! Field rules for calculation rows and sheet metadata.
//!
//! ## Row Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Category   rate            discount_id                                │
//! │  ────────   ─────────────   ───────────────────────────────            │
//! │  Tax        REQUIRED        optional (tax correction of a discount)    │
//! │  Discount   not allowed     REQUIRED                                   │
//! │  others     not allowed     not allowed                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use tariff_core::validation::{validate_currency_code, validate_quantity};
//!
//! validate_currency_code("CHF").unwrap();
//! assert!(validate_quantity(0).is_err());
//! ```

use crate::error::ValidationError;
use crate::sheet::CalculationRow;
use crate::types::RowCategory;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validates the category-specific fields of a row.
pub fn validate_row(row: &CalculationRow) -> ValidationResult<()> {
    match row.category {
        RowCategory::Tax => {
            if row.rate.is_none() {
                return Err(ValidationError::Required {
                    field: "rate".to_string(),
                });
            }
        }
        RowCategory::Discount => {
            if row.rate.is_some() {
                return Err(not_allowed("rate", row.category));
            }
            match row.discount_id.as_deref() {
                Some(id) if !id.trim().is_empty() => {}
                _ => {
                    return Err(ValidationError::Required {
                        field: "discount_id".to_string(),
                    })
                }
            }
        }
        other => {
            if row.rate.is_some() {
                return Err(not_allowed("rate", other));
            }
            if row.discount_id.is_some() {
                return Err(not_allowed("discount_id", other));
            }
        }
    }
    Ok(())
}

/// Validates an ISO 4217 style currency code (three uppercase letters).
pub fn validate_currency_code(code: &str) -> ValidationResult<()> {
    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "currency_code".to_string(),
        });
    }
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
        return Err(ValidationError::InvalidFormat {
            field: "currency_code".to_string(),
            reason: format!("expected three uppercase letters, got '{}'", code),
        });
    }
    Ok(())
}

/// Validates a priced quantity.
pub fn validate_quantity(quantity: i64) -> ValidationResult<()> {
    if quantity <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    Ok(())
}

fn not_allowed(field: &str, category: RowCategory) -> ValidationError {
    ValidationError::NotAllowed {
        field: field.to_string(),
        context: format!("{} rows", category),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;
    use crate::types::TaxRate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tax_requires_rate() {
        let row = CalculationRow::new(RowCategory::Tax, Money::from_minor(100));
        assert!(matches!(
            validate_row(&row),
            Err(ValidationError::Required { .. })
        ));

        let row = row.with_rate(TaxRate::new(dec!(0.077)));
        assert!(validate_row(&row).is_ok());
    }

    #[test]
    fn test_discount_requires_discount_id() {
        let row = CalculationRow::new(RowCategory::Discount, Money::from_minor(-100));
        assert!(validate_row(&row).is_err());

        let row = row.clone().with_discount_id("   ");
        assert!(validate_row(&row).is_err());

        let row = CalculationRow::new(RowCategory::Discount, Money::from_minor(-100))
            .with_discount_id("summer-sale");
        assert!(validate_row(&row).is_ok());
    }

    #[test]
    fn test_item_rejects_tax_fields() {
        let row = CalculationRow::new(RowCategory::Item, Money::from_minor(100))
            .with_rate(TaxRate::new(dec!(0.1)));
        let err = validate_row(&row).unwrap_err();
        assert_eq!(err.to_string(), "rate is not allowed on item rows");
    }

    #[test]
    fn test_currency_code() {
        assert!(validate_currency_code("EUR").is_ok());
        assert!(validate_currency_code("").is_err());
        assert!(validate_currency_code("eur").is_err());
        assert!(validate_currency_code("EURO").is_err());
    }

    #[test]
    fn test_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
    }
}
