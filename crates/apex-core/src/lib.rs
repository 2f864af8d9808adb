//! # apex-core: Pure Business Logic for APEX Documents
//!
//! This crate is the **heart** of document issuing. It contains the
//! numbering, pricing, and versioning rules as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     APEX Documents Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Callers (route handlers, apex-cli)                 │   │
//! │  │    raw form fields ──► GenerateRequest / EditRequest            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 apex-engine (DocumentService)                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ apex-core (THIS CRATE) ★                        │   │
//! │  │                                                                 │   │
//! │  │  ┌─────────┐ ┌─────────┐ ┌──────────┐ ┌─────────┐ ┌────────┐ │   │
//! │  │  │  money  │ │ totals  │ │numbering │ │ lineage │ │ types  │ │   │
//! │  │  │coercion │ │ lines + │ │ APEX-... │ │ root +  │ │Document│ │   │
//! │  │  │quantize │ │   VAT   │ │ numbers  │ │ version │ │LineItem│ │   │
//! │  │  └─────────┘ └─────────┘ └──────────┘ └─────────┘ └────────┘ │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS              │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    apex-db (Database Layer)                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Document, LineItem, DocumentType, ...)
//! - [`money`] - Decimal coercion and 2-place quantization
//! - [`totals`] - Line item and document total calculators
//! - [`numbering`] - Document number composition
//! - [`lineage`] - Version lineage resolution
//! - [`validation`] - Field-level validation rules
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use apex_core::money::coerce_decimal;
//! use apex_core::totals::compute_document_totals;
//! use apex_core::DocumentType;
//!
//! let subtotal = coerce_decimal(Some("100.00"), Default::default());
//! let vat_rate = coerce_decimal(Some("16"), Default::default());
//!
//! let totals = compute_document_totals(subtotal, vat_rate, DocumentType::Invoice).unwrap();
//! assert_eq!(totals.vat_amount.to_string(), "16.00");
//! assert_eq!(totals.total_amount.to_string(), "116.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod lineage;
pub mod money;
pub mod numbering;
pub mod totals;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use numbering::DocumentNumber;
pub use rust_decimal::Decimal;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Brand prefix at the front of every document number.
pub const DEFAULT_NUMBER_BRAND: &str = "APEX";

/// VAT rate applied when a request carries none (percent).
pub const DEFAULT_VAT_RATE_PERCENT: i64 = 16;

/// Decimal places kept on every quantized monetary amount.
pub const MONEY_SCALE: u32 = 2;
