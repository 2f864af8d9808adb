//! # Money Module
//!
//! Decimal coercion and quantization for monetary values.
//!
//! ## Why Decimal?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In binary floating point:                                              │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │    19.99 × 3 = 59.969999999999999   ❌ cent drift across many lines     │
//! │                                                                         │
//! │  OUR SOLUTION: rust_decimal                                             │
//! │    19.99 × 3 = 59.97 exactly (base-10 mantissa + scale)                 │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## The Normalization Boundary
//! ```text
//!   raw form text ("12.50", "", "None", "abc", 3)
//!        │
//!        ▼
//!   coerce_decimal(input, default)   ← THIS MODULE, never fails
//!        │
//!        ▼
//!   Decimal ──► totals calculators ──► quantize() ──► stored / rendered
//! ```
//! Raw strings never reach the totals calculator.

use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;
use tracing::warn;

use crate::error::{CoreError, CoreResult};
use crate::MONEY_SCALE;

/// Zero with two decimal places (`0.00`).
pub const ZERO_MONEY: Decimal = Decimal::from_parts(0, 0, 0, false, MONEY_SCALE);

/// Literal some form libraries submit for an empty optional field.
const NONE_LITERAL: &str = "None";

// =============================================================================
// Coercion
// =============================================================================

/// Converts untrusted input into an exact decimal, falling back to `default`.
///
/// ## Rules
/// - `None`, `""` and the literal `"None"` return `default` silently
/// - anything else is parsed as an exact decimal (surrounding whitespace
///   ignored, scientific notation accepted)
/// - unparsable input returns `default` and logs a warning
///
/// This function never fails and never panics.
///
/// ## Example
/// ```rust
/// use apex_core::money::coerce_decimal;
/// use rust_decimal::Decimal;
///
/// assert_eq!(coerce_decimal(Some("12.50"), Decimal::ZERO).to_string(), "12.50");
/// assert_eq!(coerce_decimal(Some("abc"), Decimal::ZERO), Decimal::ZERO);
/// assert_eq!(coerce_decimal(None, Decimal::ONE), Decimal::ONE);
/// ```
pub fn coerce_decimal(input: Option<&str>, default: Decimal) -> Decimal {
    let raw = match input {
        None => return default,
        Some(raw) if raw.is_empty() || raw == NONE_LITERAL => return default,
        Some(raw) => raw,
    };

    let trimmed = raw.trim();
    match Decimal::from_str(trimmed).or_else(|_| Decimal::from_scientific(trimmed)) {
        Ok(value) => value,
        Err(e) => {
            warn!(input = %raw, error = %e, fallback = %default, "Failed to convert input to decimal");
            default
        }
    }
}

/// Coerces with a zero default, the ordinary case for quantities and prices.
#[inline]
pub fn coerce_or_zero(input: Option<&str>) -> Decimal {
    coerce_decimal(input, Decimal::ZERO)
}

// =============================================================================
// Quantization
// =============================================================================

/// Rounds to two decimal places, half away from zero, and fixes the scale.
///
/// ## Example
/// ```rust
/// use apex_core::money::quantize;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(quantize(Decimal::from_str("0.125").unwrap()).to_string(), "0.13");
/// assert_eq!(quantize(Decimal::from_str("-0.125").unwrap()).to_string(), "-0.13");
/// assert_eq!(quantize(Decimal::from(16)).to_string(), "16.00");
/// ```
pub fn quantize(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(MONEY_SCALE);
    rounded
}

/// Parses a decimal that was written by this system (stored columns).
///
/// Unlike [`coerce_decimal`], this is strict: stored amounts must round-trip.
pub fn parse_stored(field: &str, value: &str) -> CoreResult<Decimal> {
    Decimal::from_str(value).map_err(|_| CoreError::CorruptAmount {
        field: field.to_string(),
        value: value.to_string(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_empty_inputs_return_default() {
        let default = dec!(7.5);
        assert_eq!(coerce_decimal(None, default), default);
        assert_eq!(coerce_decimal(Some(""), default), default);
        assert_eq!(coerce_decimal(Some("None"), default), default);
    }

    #[test]
    fn test_garbage_returns_default() {
        assert_eq!(coerce_decimal(Some("abc"), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(coerce_decimal(Some("12,50"), dec!(1)), dec!(1));
        assert_eq!(coerce_decimal(Some("1.2.3"), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_parses_exact_decimal() {
        let value = coerce_or_zero(Some("12.50"));
        assert_eq!(value, dec!(12.50));
        assert_eq!(value.to_string(), "12.50");

        assert_eq!(coerce_or_zero(Some(" 3 ")), dec!(3));
        assert_eq!(coerce_or_zero(Some("-0.01")), dec!(-0.01));
        assert_eq!(coerce_or_zero(Some("1e2")), dec!(100));
    }

    #[test]
    fn test_quantize_half_up() {
        assert_eq!(quantize(dec!(2.675)), dec!(2.68));
        assert_eq!(quantize(dec!(2.665)), dec!(2.67));
        assert_eq!(quantize(dec!(2.664)), dec!(2.66));
        assert_eq!(quantize(dec!(100)).to_string(), "100.00");
    }

    #[test]
    fn test_zero_money_scale() {
        assert_eq!(ZERO_MONEY.to_string(), "0.00");
        assert!(ZERO_MONEY.is_zero());
    }

    #[test]
    fn test_parse_stored() {
        assert_eq!(parse_stored("subtotal", "59.97").unwrap(), dec!(59.97));

        let err = parse_stored("subtotal", "not-a-number").unwrap_err();
        assert_eq!(err.to_string(), "Corrupt amount in subtotal: 'not-a-number'");
    }
}
