//! # Totals Calculators
//!
//! Line-item extension and document VAT/total computation.
//!
//! ## Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  [RawLineItem]                                                          │
//! │       │  coerce_decimal (qty, price)                                    │
//! │       │  validate_* (description, qty > 0, price ≥ 0)                   │
//! │       ▼                                                                 │
//! │  compute_line_items ──► [LineItem] + subtotal (exact)                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  compute_document_totals                                                │
//! │       subtotal = quantize(Σ total_price)                                │
//! │       vat      = quantize(subtotal × rate / 100)                        │
//! │       total    = quantize(subtotal + vat)                               │
//! │                                                                         │
//! │  Delivery notes: no prices, every amount 0.00                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All-or-nothing: the first invalid line aborts the whole batch.

use rust_decimal::Decimal;
use tracing::debug;

use crate::error::ValidationError;
use crate::money::{coerce_or_zero, quantize, ZERO_MONEY};
use crate::types::{DocumentType, LineItem, RawLineItem};
use crate::validation::{
    validate_description, validate_quantity, validate_unit_price, validate_vat_rate,
    ValidationResult,
};

// =============================================================================
// Result Types
// =============================================================================

/// Validated items plus their exact running subtotal.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemTotals {
    pub items: Vec<LineItem>,
    pub subtotal: Decimal,
}

/// Document-level amounts, all quantized to two places.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DocumentTotals {
    pub subtotal: Decimal,
    pub vat_rate: Decimal,
    pub vat_amount: Decimal,
    pub total_amount: Decimal,
}

impl DocumentTotals {
    /// Every amount 0.00 (delivery notes).
    pub const fn zero() -> Self {
        DocumentTotals {
            subtotal: ZERO_MONEY,
            vat_rate: ZERO_MONEY,
            vat_amount: ZERO_MONEY,
            total_amount: ZERO_MONEY,
        }
    }
}

/// Items and totals for a whole document.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedDocument {
    pub items: Vec<LineItem>,
    pub totals: DocumentTotals,
}

// =============================================================================
// Line Items
// =============================================================================

/// Normalizes raw rows into line items and sums the subtotal.
///
/// Errors carry the 1-based line number.
///
/// ## Example
/// ```rust
/// use apex_core::totals::compute_line_items;
/// use apex_core::{DocumentType, RawLineItem};
///
/// let rows = vec![RawLineItem::new("Widget", "3", Some("19.99"))];
/// let priced = compute_line_items(DocumentType::Invoice, &rows).unwrap();
/// assert_eq!(priced.subtotal.to_string(), "59.97");
/// ```
pub fn compute_line_items(
    document_type: DocumentType,
    rows: &[RawLineItem],
) -> ValidationResult<ItemTotals> {
    let mut items = Vec::with_capacity(rows.len());
    let mut subtotal = Decimal::ZERO;

    for (index, row) in rows.iter().enumerate() {
        let line = index + 1;
        let (item, extended) = price_row(document_type, row).map_err(|e| e.at_line(line))?;

        if let Some(extended) = extended {
            subtotal = subtotal.checked_add(extended).ok_or_else(|| {
                ValidationError::AmountTooLarge {
                    field: "Subtotal".to_string(),
                }
            })?;
        }
        items.push(item);
    }

    debug!(
        document_type = %document_type,
        lines = items.len(),
        subtotal = %subtotal,
        "Line items computed"
    );

    Ok(ItemTotals { items, subtotal })
}

fn price_row(
    document_type: DocumentType,
    row: &RawLineItem,
) -> ValidationResult<(LineItem, Option<Decimal>)> {
    let description = validate_description(row.description.as_deref())?;

    let quantity = coerce_or_zero(row.quantity.as_deref());
    let stored_quantity = validate_quantity(quantity)?;

    let comment = row
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string);

    if !document_type.is_priced() {
        let item = LineItem {
            description,
            quantity: stored_quantity,
            unit_price: None,
            total_price: None,
            comment,
        };
        return Ok((item, None));
    }

    let unit_price = coerce_or_zero(row.unit_price.as_deref());
    validate_unit_price(unit_price)?;

    // Extended with the untruncated quantity.
    let total_price = quantity
        .checked_mul(unit_price)
        .ok_or_else(|| ValidationError::AmountTooLarge {
            field: "Line total".to_string(),
        })?;

    let item = LineItem {
        description,
        quantity: stored_quantity,
        unit_price: Some(unit_price),
        total_price: Some(total_price),
        comment,
    };
    Ok((item, Some(total_price)))
}

// =============================================================================
// Document Totals
// =============================================================================

/// Computes VAT and grand total from a subtotal.
///
/// The VAT rate is assumed already validated (0-100); see
/// [`price_document`] for the validating entry point.
pub fn compute_document_totals(
    subtotal: Decimal,
    vat_rate: Decimal,
    document_type: DocumentType,
) -> ValidationResult<DocumentTotals> {
    if !document_type.is_priced() {
        return Ok(DocumentTotals::zero());
    }

    // VAT from the exact subtotal; vat has two places, so the stored
    // total still equals stored subtotal + vat.
    let vat_amount = subtotal
        .checked_mul(vat_rate)
        .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED))
        .map(quantize)
        .ok_or_else(|| ValidationError::AmountTooLarge {
            field: "VAT amount".to_string(),
        })?;
    let total_amount = subtotal
        .checked_add(vat_amount)
        .map(quantize)
        .ok_or_else(|| ValidationError::AmountTooLarge {
            field: "Total amount".to_string(),
        })?;

    Ok(DocumentTotals {
        subtotal: quantize(subtotal),
        vat_rate,
        vat_amount,
        total_amount,
    })
}

/// Validates the VAT rate, prices every row and totals the document.
pub fn price_document(
    document_type: DocumentType,
    rows: &[RawLineItem],
    vat_rate: Decimal,
) -> ValidationResult<PricedDocument> {
    if document_type.is_priced() {
        validate_vat_rate(vat_rate)?;
    }

    let ItemTotals { items, subtotal } = compute_line_items(document_type, rows)?;
    let totals = compute_document_totals(subtotal, vat_rate, document_type)?;

    Ok(PricedDocument { items, totals })
}

/// Drops blank rows submitted by an edit form; fails if nothing remains.
pub fn retain_filled_rows(rows: Vec<RawLineItem>) -> ValidationResult<Vec<RawLineItem>> {
    let filled: Vec<RawLineItem> = rows.into_iter().filter(|row| !row.is_blank()).collect();
    if filled.is_empty() {
        return Err(ValidationError::NoItems);
    }
    Ok(filled)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn row(description: &str, quantity: &str, unit_price: &str) -> RawLineItem {
        RawLineItem::new(description, quantity, Some(unit_price))
    }

    #[test]
    fn test_extended_price_is_exact() {
        let priced = compute_line_items(DocumentType::Invoice, &[row("Widget", "3", "19.99")]).unwrap();
        assert_eq!(priced.items[0].total_price, Some(dec!(59.97)));
        assert_eq!(priced.subtotal, dec!(59.97));
    }

    #[test]
    fn test_fractional_quantity_truncated_for_storage_only() {
        let priced = compute_line_items(DocumentType::Invoice, &[row("Cable", "2.5", "10")]).unwrap();
        assert_eq!(priced.items[0].quantity, 2);
        assert_eq!(priced.items[0].total_price, Some(dec!(25.0)));
    }

    #[test]
    fn test_missing_price_defaults_to_zero() {
        let rows = vec![RawLineItem::new("Freebie", "1", None)];
        let priced = compute_line_items(DocumentType::Proforma, &rows).unwrap();
        assert_eq!(priced.items[0].unit_price, Some(Decimal::ZERO));
        assert_eq!(priced.subtotal, Decimal::ZERO);
    }

    #[test]
    fn test_rejections_have_distinct_messages() {
        let zero = compute_line_items(DocumentType::Invoice, &[row("A", "0", "1")]).unwrap_err();
        let negative = compute_line_items(DocumentType::Invoice, &[row("A", "-1", "1")]).unwrap_err();
        let price = compute_line_items(DocumentType::Invoice, &[row("A", "1", "-0.01")]).unwrap_err();
        let blank = compute_line_items(DocumentType::Invoice, &[row(" ", "1", "1")]).unwrap_err();

        assert_eq!(zero.root_cause(), &ValidationError::QuantityNotPositive);
        assert_eq!(negative.root_cause(), &ValidationError::QuantityNotPositive);
        assert_eq!(price.root_cause(), &ValidationError::NegativeUnitPrice);
        assert_eq!(blank.root_cause(), &ValidationError::required("Description"));
        assert_ne!(zero.to_string(), price.to_string());
    }

    #[test]
    fn test_error_reports_line_number() {
        let rows = vec![row("Ok", "1", "1"), row("Bad", "abc", "1")];
        let err = compute_line_items(DocumentType::Invoice, &rows).unwrap_err();
        assert_eq!(err.to_string(), "Item 2: Quantity must be greater than 0");
    }

    #[test]
    fn test_document_totals() {
        let totals = compute_document_totals(dec!(100.00), dec!(16), DocumentType::Invoice).unwrap();
        assert_eq!(totals.vat_amount.to_string(), "16.00");
        assert_eq!(totals.total_amount.to_string(), "116.00");
    }

    #[test]
    fn test_vat_rounds_half_up() {
        // 10.05 × 5% = 0.5025 → 0.50; 0.25 × 10% = 0.025 → 0.03
        let a = compute_document_totals(dec!(10.05), dec!(5), DocumentType::Invoice).unwrap();
        assert_eq!(a.vat_amount, dec!(0.50));
        let b = compute_document_totals(dec!(0.25), dec!(10), DocumentType::Invoice).unwrap();
        assert_eq!(b.vat_amount, dec!(0.03));
        assert_eq!(b.total_amount, dec!(0.28));
    }

    #[test]
    fn test_vat_uses_unrounded_subtotal() {
        // 0.994 × 51% = 0.50694 → 0.51; 0.994 + 0.51 = 1.504 → 1.50
        let totals = compute_document_totals(dec!(0.994), dec!(51), DocumentType::Invoice).unwrap();
        assert_eq!(totals.subtotal, dec!(0.99));
        assert_eq!(totals.vat_amount, dec!(0.51));
        assert_eq!(totals.total_amount, dec!(1.50));
        assert_eq!(totals.total_amount, totals.subtotal + totals.vat_amount);

        // 1.5 × 0.663 = 0.9945
        let priced = price_document(DocumentType::Invoice, &[row("Bolt", "1.5", "0.663")], dec!(51)).unwrap();
        assert_eq!(priced.items[0].total_price, Some(dec!(0.9945)));
        assert_eq!(priced.totals.subtotal, dec!(0.99));
        assert_eq!(priced.totals.vat_amount, dec!(0.51));
        assert_eq!(priced.totals.total_amount, dec!(1.50));
    }

    #[test]
    fn test_delivery_note_is_never_priced() {
        let rows = vec![row("Pallet", "4", "250.00")];
        let priced = price_document(DocumentType::DeliveryNote, &rows, dec!(16)).unwrap();

        assert_eq!(priced.items[0].unit_price, None);
        assert_eq!(priced.items[0].total_price, None);
        assert_eq!(priced.totals.subtotal.to_string(), "0.00");
        assert_eq!(priced.totals.vat_amount.to_string(), "0.00");
        assert_eq!(priced.totals.total_amount.to_string(), "0.00");
    }

    #[test]
    fn test_price_document_validates_vat_rate() {
        let err = price_document(DocumentType::Invoice, &[row("A", "1", "1")], dec!(150)).unwrap_err();
        assert!(matches!(err, ValidationError::OutOfRange { .. }));

        // Ignored for delivery notes
        assert!(price_document(DocumentType::DeliveryNote, &[row("A", "1", "1")], dec!(150)).is_ok());
    }

    #[test]
    fn test_empty_items_price_to_zero() {
        let priced = price_document(DocumentType::Invoice, &[], dec!(16)).unwrap();
        assert!(priced.items.is_empty());
        assert_eq!(priced.totals.total_amount.to_string(), "0.00");
    }

    #[test]
    fn test_retain_filled_rows() {
        let rows = vec![RawLineItem::default(), row("Kept", "1", "1"), RawLineItem::default()];
        assert_eq!(retain_filled_rows(rows).unwrap().len(), 1);
        assert_eq!(
            retain_filled_rows(vec![RawLineItem::default()]),
            Err(ValidationError::NoItems)
        );
    }
}
