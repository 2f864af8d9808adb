//! # Domain Errors
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  raw row ──► ValidationError ──┐                                        │
//! │              (Item 2: ...)     ├──► CoreError ──► DbError / EngineError │
//! │  stored TEXT ► CorruptAmount ──┘                                        │
//! │                                                                         │
//! │  A ValidationError rejects the whole request. Nothing is stored.        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Unparsable numeric input is not an error: [`crate::money::coerce_decimal`]
//! substitutes a default and logs a warning.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Errors raised by the pure document rules.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A stored monetary column could not be read back as a decimal.
    ///
    /// ## When This Occurs
    /// - Hand-edited database rows
    /// - Rows written by an older schema that stored floats
    #[error("Corrupt amount in {field}: '{value}'")]
    CorruptAmount { field: String, value: String },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Why a request was rejected. The message is shown to the user as-is.
///
/// Any of these aborts the whole request: no document and no line item is
/// persisted when validation fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Coerced quantity is zero or negative.
    #[error("Quantity must be greater than 0")]
    QuantityNotPositive,

    /// Coerced unit price is negative.
    #[error("Unit price must be zero or positive")]
    NegativeUnitPrice,

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: String,
        min: String,
        max: String,
    },

    /// An amount does not fit in a 96-bit decimal.
    #[error("{field} is too large")]
    AmountTooLarge { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// An edit left no usable rows.
    #[error("At least one item is required")]
    NoItems,

    /// A failure on a specific line item (1-based).
    #[error("Item {line}: {error}")]
    Line {
        line: usize,
        error: Box<ValidationError>,
    },
}

impl ValidationError {
    /// Creates a Required error for a field.
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    /// Wraps this error with the 1-based line it occurred on.
    pub fn at_line(self, line: usize) -> Self {
        ValidationError::Line {
            line,
            error: Box::new(self),
        }
    }

    /// Returns the innermost error, looking through line wrappers.
    pub fn root_cause(&self) -> &ValidationError {
        match self {
            ValidationError::Line { error, .. } => error.root_cause(),
            other => other,
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(
            ValidationError::required("Description").to_string(),
            "Description is required"
        );
        assert_eq!(
            ValidationError::QuantityNotPositive.to_string(),
            "Quantity must be greater than 0"
        );
        assert_eq!(
            ValidationError::NegativeUnitPrice.to_string(),
            "Unit price must be zero or positive"
        );
    }

    #[test]
    fn test_line_wrapper() {
        let err = ValidationError::NegativeUnitPrice.at_line(3);
        assert_eq!(err.to_string(), "Item 3: Unit price must be zero or positive");
        assert_eq!(err.root_cause(), &ValidationError::NegativeUnitPrice);
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::NoItems.into();
        assert!(matches!(core_err, CoreError::Validation(ValidationError::NoItems)));
    }
}
