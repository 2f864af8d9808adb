//! # Document Numbering
//!
//! Composes human-readable document numbers.
//!
//! ## Number Anatomy
//! ```text
//!   APEX - INV - IE15 - SEP25 - 001 - v2
//!    │      │     │       │      │     │
//!    │      │     │       │      │     └── version suffix (edits only)
//!    │      │     │       │      └──────── daily sequence, per type, 3 digits
//!    │      │     │       └─────────────── issue month + 2-digit year (UTC)
//!    │      │     └─────────────────────── product code from the first item
//!    │      └───────────────────────────── type prefix (INV / PROF / DN / DOC)
//!    └──────────────────────────────────── brand
//! ```
//!
//! The sequence itself is allocated by the store; this module only formats.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use std::fmt;

use crate::types::DocumentType;

/// Product code used when a document has no items.
pub const GENERIC_PRODUCT_CODE: &str = "GEN";

/// Prefix for a type name that is not recognised.
pub const UNKNOWN_TYPE_PREFIX: &str = "DOC";

const PRODUCT_CODE_LEN: usize = 4;

// =============================================================================
// Number Parts
// =============================================================================

/// Returns the number prefix for a document type name.
///
/// ## Example
/// ```rust
/// use apex_core::numbering::prefix_for;
///
/// assert_eq!(prefix_for("invoice"), "INV");
/// assert_eq!(prefix_for("Proforma"), "PROF");
/// assert_eq!(prefix_for("receipt"), "DOC");
/// ```
pub fn prefix_for(document_type: &str) -> &'static str {
    document_type
        .parse::<DocumentType>()
        .map(|t| t.prefix())
        .unwrap_or(UNKNOWN_TYPE_PREFIX)
}

/// Derives the product code from a line item description.
///
/// Each word contributes its first and last character (or its only
/// character); hyphens separate words. The result is cut to four characters.
///
/// ## Example
/// ```rust
/// use apex_core::numbering::product_code;
///
/// assert_eq!(product_code(Some("Iphone 15 Pro")), "IE15");
/// assert_eq!(product_code(None), "GEN");
/// ```
pub fn product_code(first_description: Option<&str>) -> String {
    let Some(description) = first_description else {
        return GENERIC_PRODUCT_CODE.to_string();
    };

    let code: String = description
        .to_uppercase()
        .replace('-', " ")
        .split_whitespace()
        .flat_map(|word| {
            let mut chars = word.chars();
            let first = chars.next();
            let last = chars.last();
            first.into_iter().chain(last)
        })
        .take(PRODUCT_CODE_LEN)
        .collect();

    if code.is_empty() {
        GENERIC_PRODUCT_CODE.to_string()
    } else {
        code
    }
}

/// Month-year stamp, e.g. `SEP25`.
pub fn month_year_stamp(date: NaiveDate) -> String {
    date.format("%b%y").to_string().to_uppercase()
}

/// Midnight UTC of the day containing `at`. Start of the daily sequence window.
pub fn day_start(at: DateTime<Utc>) -> DateTime<Utc> {
    at.date_naive().and_time(NaiveTime::MIN).and_utc()
}

// =============================================================================
// Document Number
// =============================================================================

/// A composed document number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentNumber {
    pub brand: String,
    pub prefix: String,
    pub product_code: String,
    pub month_year: String,
    pub sequence: i64,
    pub version: Option<i64>,
}

impl DocumentNumber {
    /// Builds the base number for a new document.
    ///
    /// `sequence` is the already-allocated daily sequence (1 for the first
    /// document of that type today).
    pub fn compose(
        brand: &str,
        document_type: &str,
        first_description: Option<&str>,
        issued_at: DateTime<Utc>,
        sequence: i64,
    ) -> Self {
        DocumentNumber {
            brand: brand.to_string(),
            prefix: prefix_for(document_type).to_string(),
            product_code: product_code(first_description),
            month_year: month_year_stamp(issued_at.date_naive()),
            sequence,
            version: None,
        }
    }

    /// Adds the `-v{n}` suffix carried by edited versions.
    pub fn with_version(mut self, version: i64) -> Self {
        self.version = Some(version);
        self
    }
}

impl fmt::Display for DocumentNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}-{}-{:03}",
            self.brand, self.prefix, self.product_code, self.month_year, self.sequence
        )?;
        if let Some(version) = self.version {
            write!(f, "-v{}", version)?;
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sept_15() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 15, 14, 30, 0).unwrap()
    }

    #[test]
    fn test_product_code_rules() {
        assert_eq!(product_code(Some("Iphone 15 Pro")), "IE15");
        assert_eq!(product_code(Some("usb-c cable")), "UBCC");
        assert_eq!(product_code(Some("A B")), "AB");
        assert_eq!(product_code(Some("x")), "X");
        assert_eq!(product_code(Some("   ")), "GEN");
    }

    #[test]
    fn test_month_year_stamp() {
        assert_eq!(month_year_stamp(sept_15().date_naive()), "SEP25");
        let jan = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        assert_eq!(month_year_stamp(jan), "JAN24");
    }

    #[test]
    fn test_day_start() {
        let start = day_start(sept_15());
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 9, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_compose_first_of_day() {
        let number = DocumentNumber::compose("APEX", "invoice", Some("Iphone 15 Pro"), sept_15(), 1);
        assert_eq!(number.to_string(), "APEX-INV-IE15-SEP25-001");
    }

    #[test]
    fn test_compose_with_version_and_unknown_type() {
        let number = DocumentNumber::compose("APEX", "delivery_note", None, sept_15(), 12).with_version(2);
        assert_eq!(number.to_string(), "APEX-DN-GEN-SEP25-012-v2");

        let unknown = DocumentNumber::compose("APEX", "memo", None, sept_15(), 1);
        assert_eq!(unknown.prefix, "DOC");
    }

    #[test]
    fn test_sequence_beyond_three_digits() {
        let number = DocumentNumber::compose("APEX", "proforma", Some("Desk"), sept_15(), 1000);
        assert_eq!(number.to_string(), "APEX-PROF-DK-SEP25-1000");
    }
}
