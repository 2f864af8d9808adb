//! # Domain Types
//!
//! Core domain types used throughout APEX document issuing.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  RawLineItem    │   │    LineItem     │   │    Document     │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  description?   │──►│  description    │◄──│  id (UUID)      │       │
//! │  │  quantity? text │   │  quantity i64   │   │  document_number│       │
//! │  │  unit_price?    │   │  unit_price?    │   │  totals (dec)   │       │
//! │  │  (untrusted)    │   │  total_price?   │   │  version/root   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │  DocumentType   │   │ DocumentStatus  │   │  DocumentData   │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  Invoice        │   │  Pending        │   │  what the       │       │
//! │  │  Proforma       │   │  Sent / Paid    │   │  renderer sees  │       │
//! │  │  DeliveryNote   │   │  Overdue / ...  │   │                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every document has:
//! - `id`: UUID v4 - immutable, used for database relations and lineage roots
//! - `document_number`: `APEX-INV-IE15-SEP25-001` - human-readable, printed

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;

// =============================================================================
// Document Type
// =============================================================================

/// The kind of document being issued. Fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    /// Tax invoice.
    Invoice,
    /// Proforma invoice (quotation).
    #[serde(alias = "proforma_invoice")]
    Proforma,
    /// Delivery note. Never priced.
    DeliveryNote,
}

impl DocumentType {
    /// All document types, in display order.
    pub const ALL: [DocumentType; 3] = [
        DocumentType::Invoice,
        DocumentType::Proforma,
        DocumentType::DeliveryNote,
    ];

    /// Canonical storage name.
    pub const fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Invoice => "invoice",
            DocumentType::Proforma => "proforma",
            DocumentType::DeliveryNote => "delivery_note",
        }
    }

    /// Prefix used in document numbers.
    pub const fn prefix(&self) -> &'static str {
        match self {
            DocumentType::Invoice => "INV",
            DocumentType::Proforma => "PROF",
            DocumentType::DeliveryNote => "DN",
        }
    }

    /// Whether line items carry prices and the document carries totals.
    #[inline]
    pub const fn is_priced(&self) -> bool {
        !matches!(self, DocumentType::DeliveryNote)
    }
}

impl fmt::Display for DocumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentType {
    type Err = ValidationError;

    /// Case-insensitive; `proforma_invoice` is accepted for proforma.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "invoice" => Ok(DocumentType::Invoice),
            "proforma" | "proforma_invoice" => Ok(DocumentType::Proforma),
            "delivery_note" => Ok(DocumentType::DeliveryNote),
            _ => Err(ValidationError::NotAllowed {
                field: "document_type".to_string(),
                allowed: DocumentType::ALL.iter().map(|t| t.as_str().to_string()).collect(),
            }),
        }
    }
}

// =============================================================================
// Document Status
// =============================================================================

/// Where a document is in its billing lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    #[default]
    Pending,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

impl DocumentStatus {
    pub const ALL: [DocumentStatus; 5] = [
        DocumentStatus::Pending,
        DocumentStatus::Sent,
        DocumentStatus::Paid,
        DocumentStatus::Overdue,
        DocumentStatus::Cancelled,
    ];

    /// Label shown to users ("Pending", "Paid", ...).
    pub const fn label(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "Pending",
            DocumentStatus::Sent => "Sent",
            DocumentStatus::Paid => "Paid",
            DocumentStatus::Overdue => "Overdue",
            DocumentStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for DocumentStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        DocumentStatus::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "status".to_string(),
                allowed: DocumentStatus::ALL.iter().map(|s| s.label().to_string()).collect(),
            })
    }
}

// =============================================================================
// Line Items
// =============================================================================

/// A line item exactly as submitted by a form or API client.
///
/// Numeric fields are kept as text: they only become decimals through
/// [`crate::money::coerce_decimal`]. JSON numbers, strings and nulls are all
/// accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RawLineItem {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub quantity: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub unit_price: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

impl RawLineItem {
    /// Convenience constructor used by tests and the CLI.
    pub fn new(description: &str, quantity: &str, unit_price: Option<&str>) -> Self {
        RawLineItem {
            description: Some(description.to_string()),
            quantity: Some(quantity.to_string()),
            unit_price: unit_price.map(str::to_string),
            comment: None,
        }
    }

    /// True when the row carries neither a description nor a quantity.
    ///
    /// Edit forms submit trailing empty rows; these are dropped before
    /// validation.
    pub fn is_blank(&self) -> bool {
        let empty = |v: &Option<String>| v.as_deref().map_or(true, |s| s.trim().is_empty());
        empty(&self.description) && empty(&self.quantity)
    }
}

/// Accepts a JSON string, number, bool or null and keeps its text form.
///
/// Use with `#[serde(default, deserialize_with = "apex_core::types::lenient_text")]`
/// on any `Option<String>` field that will be coerced to a decimal.
pub fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// A validated, priced line item. Never mutated after totals are computed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LineItem {
    /// Trimmed, non-empty.
    pub description: String,
    /// Integer part of the coerced quantity. Always > 0.
    pub quantity: i64,
    /// Absent on delivery notes.
    #[ts(as = "Option<String>")]
    pub unit_price: Option<Decimal>,
    /// `quantity × unit_price` using the untruncated quantity. Absent on
    /// delivery notes.
    #[ts(as = "Option<String>")]
    pub total_price: Option<Decimal>,
    pub comment: Option<String>,
}

// =============================================================================
// Header Metadata
// =============================================================================

/// Who the document is for and who signs it. Printed, never computed on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(default)]
pub struct DocumentHeader {
    pub client_name: Option<String>,
    pub client_address: Option<String>,
    pub po_number: Option<String>,
    #[ts(as = "Option<String>")]
    pub issue_date: Option<NaiveDate>,
    #[ts(as = "Option<String>")]
    pub due_date: Option<NaiveDate>,
    pub signed_by_name: Option<String>,
    pub signed_by_function: Option<String>,
}

// =============================================================================
// Document
// =============================================================================

/// A stored document with its items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Document {
    pub id: String,
    pub document_type: DocumentType,
    /// Generated once, never changed.
    pub document_number: String,
    pub status: DocumentStatus,
    #[ts(as = "String")]
    pub subtotal: Decimal,
    #[ts(as = "String")]
    pub vat_rate: Decimal,
    #[ts(as = "String")]
    pub vat_amount: Decimal,
    #[ts(as = "String")]
    pub total_amount: Decimal,
    /// Starts at 1; +1 per edit within a lineage.
    pub version: i64,
    /// `None` for an original document.
    pub lineage_root_id: Option<String>,
    pub header: DocumentHeader,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    pub items: Vec<LineItem>,
}

/// A fully computed document that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDocument {
    pub document_type: DocumentType,
    pub document_number: String,
    pub status: DocumentStatus,
    pub subtotal: Decimal,
    pub vat_rate: Decimal,
    pub vat_amount: Decimal,
    pub total_amount: Decimal,
    pub version: i64,
    pub lineage_root_id: Option<String>,
    pub header: DocumentHeader,
    pub created_at: DateTime<Utc>,
    pub items: Vec<LineItem>,
}

/// One row of a search or lineage listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DocumentSummary {
    pub id: String,
    pub document_type: DocumentType,
    pub document_number: String,
    pub status: DocumentStatus,
    #[ts(as = "String")]
    pub total_amount: Decimal,
    pub version: i64,
    pub lineage_root_id: Option<String>,
    pub client_name: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Renderer Input
// =============================================================================

/// The finalized document handed to a renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DocumentData {
    pub document_number: String,
    pub document_type: DocumentType,
    pub status: DocumentStatus,
    #[ts(as = "String")]
    pub subtotal: Decimal,
    #[ts(as = "String")]
    pub vat_rate: Decimal,
    #[ts(as = "String")]
    pub vat_amount: Decimal,
    #[ts(as = "String")]
    pub total_amount: Decimal,
    pub items: Vec<LineItem>,
    pub version: i64,
    pub lineage_root_id: Option<String>,
    pub header: DocumentHeader,
    #[ts(as = "String")]
    pub issued_at: DateTime<Utc>,
}

impl From<&Document> for DocumentData {
    fn from(doc: &Document) -> Self {
        DocumentData {
            document_number: doc.document_number.clone(),
            document_type: doc.document_type,
            status: doc.status,
            subtotal: doc.subtotal,
            vat_rate: doc.vat_rate,
            vat_amount: doc.vat_amount,
            total_amount: doc.total_amount,
            items: doc.items.clone(),
            version: doc.version,
            lineage_root_id: doc.lineage_root_id.clone(),
            header: doc.header.clone(),
            issued_at: doc.created_at,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
