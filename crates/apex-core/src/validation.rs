//! # Validation Module
//!
//! Field-level validation for document requests.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Form / API client                                            │
//! │  └── Raw text, anything goes                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: money::coerce_decimal                                        │
//! │  └── Text → Decimal, unparsable becomes the default                    │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: THIS MODULE                                                  │
//! │  └── Business rules on the coerced values                              │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 4: Database (SQLite)                                            │
//! │  └── CHECK (quantity > 0), NOT NULL, foreign keys                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use apex_core::validation::{validate_description, validate_quantity};
//! use rust_decimal::Decimal;
//!
//! assert_eq!(validate_description(Some("  Widget ")).unwrap(), "Widget");
//! assert_eq!(validate_quantity(Decimal::new(25, 1)).unwrap(), 2);
//! ```

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Highest accepted VAT rate, in percent.
const MAX_VAT_RATE: i64 = 100;

// =============================================================================
// Line Item Validators
// =============================================================================

/// Validates and trims a line item description.
///
/// ## Example
/// ```rust
/// use apex_core::validation::validate_description;
///
/// assert!(validate_description(Some("Iphone 15 Pro")).is_ok());
/// assert!(validate_description(Some("   ")).is_err());
/// assert!(validate_description(None).is_err());
/// ```
pub fn validate_description(description: Option<&str>) -> ValidationResult<String> {
    let description = description.map(str::trim).unwrap_or_default();

    if description.is_empty() {
        return Err(ValidationError::required("Description"));
    }

    Ok(description.to_string())
}

/// Validates a coerced quantity and returns its integer part for storage.
///
/// ## Rules
/// - Must be greater than zero
/// - The stored integer is the truncated value, which must also be
///   greater than zero (`0.5` is rejected)
pub fn validate_quantity(quantity: Decimal) -> ValidationResult<i64> {
    if quantity <= Decimal::ZERO {
        return Err(ValidationError::QuantityNotPositive);
    }

    let whole = quantity.trunc().to_i64().ok_or_else(|| ValidationError::AmountTooLarge {
        field: "Quantity".to_string(),
    })?;

    if whole <= 0 {
        return Err(ValidationError::QuantityNotPositive);
    }

    Ok(whole)
}

/// Validates a coerced unit price (zero is allowed).
pub fn validate_unit_price(unit_price: Decimal) -> ValidationResult<()> {
    if unit_price < Decimal::ZERO {
        return Err(ValidationError::NegativeUnitPrice);
    }
    Ok(())
}

// =============================================================================
// Document Validators
// =============================================================================

/// Validates a VAT rate given in percent.
///
/// ## Example
/// ```rust
/// use apex_core::validation::validate_vat_rate;
/// use rust_decimal::Decimal;
///
/// assert!(validate_vat_rate(Decimal::from(16)).is_ok());
/// assert!(validate_vat_rate(Decimal::from(100)).is_ok());
/// assert!(validate_vat_rate(Decimal::from(101)).is_err());
/// ```
pub fn validate_vat_rate(vat_rate: Decimal) -> ValidationResult<()> {
    if vat_rate < Decimal::ZERO || vat_rate > Decimal::from(MAX_VAT_RATE) {
        return Err(ValidationError::OutOfRange {
            field: "VAT rate".to_string(),
            min: "0".to_string(),
            max: MAX_VAT_RATE.to_string(),
        });
    }
    Ok(())
}

/// Validates a document id (UUID v4 string).
pub fn validate_document_id(id: &str) -> ValidationResult<()> {
    uuid::Uuid::parse_str(id).map_err(|e| ValidationError::InvalidFormat {
        field: "document id".to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
