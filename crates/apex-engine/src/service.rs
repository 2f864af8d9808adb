//! # Document Service
//!
//! Request workflows: generate, edit, and the lookups around them.
//!
//! ## Generate
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  GenerateRequest (raw text)                                             │
//! │       │                                                                 │
//! │       ▼  parse type, coerce VAT, price_document()     ← pure, may fail  │
//! │  PricedDocument                                                         │
//! │       │                                                                 │
//! │       ▼  ─── issue lock ───────────────────────────────────────────     │
//! │       │  next_sequence(type, midnight UTC)             ← atomic         │
//! │       │  DocumentNumber::compose(...)                                   │
//! │       │  store.save(NewDocument)                                        │
//! │       ▼  ──────────────────────────────────────────────────────────     │
//! │  Document                                                               │
//! │       │                                                                 │
//! │       ▼  renderer.render(DocumentData)   failure is reported, the      │
//! │  IssuedDocument                          stored document stays          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Edit
//! Same pipeline, plus `next_version(root, type)` inside the lock; the new
//! number carries a `-v{n}` suffix and the original is never touched.

use apex_core::lineage::lineage_root;
use apex_core::money::coerce_decimal;
use apex_core::numbering::day_start;
use apex_core::totals::{price_document, retain_filled_rows, PricedDocument};
use apex_core::{
    Document, DocumentData, DocumentHeader, DocumentNumber, DocumentStatus, DocumentSummary,
    DocumentType, LineItem, NewDocument, RawLineItem,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::DocumentSettings;
use crate::error::{EngineError, EngineResult};
use crate::renderer::DocumentRenderer;
use crate::store::DocumentStore;

/// Maximum rows returned by a number search.
pub const DEFAULT_SEARCH_LIMIT: i64 = 50;

// =============================================================================
// Requests & Outcomes
// =============================================================================

/// A request to issue a new document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenerateRequest {
    /// `invoice`, `proforma` (or `proforma_invoice`), `delivery_note`.
    pub document_type: String,

    #[serde(default)]
    pub items: Vec<RawLineItem>,

    /// Percent. Absent means the configured default; ignored for delivery notes.
    #[serde(default, deserialize_with = "apex_core::types::lenient_text")]
    pub vat_rate: Option<String>,

    #[serde(default)]
    pub header: DocumentHeader,
}

/// A request to issue a new version of an existing document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditRequest {
    /// Rows as submitted by the edit form. Blank rows are dropped.
    #[serde(default)]
    pub items: Vec<RawLineItem>,

    /// Percent. Absent keeps the rate of the edited document.
    #[serde(default, deserialize_with = "apex_core::types::lenient_text")]
    pub vat_rate: Option<String>,

    /// Absent keeps the header of the edited document.
    #[serde(default)]
    pub header: Option<DocumentHeader>,
}

/// A stored document and the result of rendering it.
#[derive(Debug, Clone)]
pub struct IssuedDocument {
    pub document: Document,
    /// Renderer output, when rendering succeeded.
    pub rendered: Option<Vec<u8>>,
    /// Why rendering failed. The document is stored either way.
    pub render_error: Option<String>,
}

// =============================================================================
// Service
// =============================================================================

/// Issues, versions and looks up documents.
pub struct DocumentService {
    store: Arc<dyn DocumentStore>,
    renderer: Arc<dyn DocumentRenderer>,
    clock: Arc<dyn Clock>,
    settings: DocumentSettings,
    /// Serializes number allocation + save within this process.
    issue_lock: Mutex<()>,
}

impl DocumentService {
    /// Creates a service on the system clock.
    pub fn new(
        store: Arc<dyn DocumentStore>,
        renderer: Arc<dyn DocumentRenderer>,
        settings: DocumentSettings,
    ) -> Self {
        DocumentService {
            store,
            renderer,
            clock: Arc::new(SystemClock),
            settings,
            issue_lock: Mutex::new(()),
        }
    }

    /// Replaces the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn settings(&self) -> &DocumentSettings {
        &self.settings
    }

    pub fn renderer(&self) -> &dyn DocumentRenderer {
        self.renderer.as_ref()
    }

    // =========================================================================
    // Issuing
    // =========================================================================

    /// Validates, numbers, stores and renders a new document.
    ///
    /// ## Errors
    /// - `Validation` for an unknown type, a bad line or an out-of-range VAT
    ///   rate; nothing is stored
    /// - `Database` if allocation or saving fails
    pub async fn generate(&self, request: GenerateRequest) -> EngineResult<IssuedDocument> {
        let document_type: DocumentType = request.document_type.parse()?;
        let vat_rate = coerce_decimal(request.vat_rate.as_deref(), self.settings.default_vat_rate);
        let priced = price_document(document_type, &request.items, vat_rate)?;

        debug!(
            document_type = %document_type,
            lines = priced.items.len(),
            total = %priced.totals.total_amount,
            "Generate request priced"
        );

        let document = {
            let _guard = self.issue_lock.lock().await;
            let now = self.clock.now();

            let sequence = self.store.next_sequence(document_type, day_start(now)).await?;
            let number = DocumentNumber::compose(
                &self.settings.brand,
                document_type.as_str(),
                first_description(&priced.items),
                now,
                sequence,
            );

            let new = build_document(document_type, number, priced, 1, None, request.header, now);
            self.store.save(new).await?
        };

        info!(
            id = %document.id,
            document_number = %document.document_number,
            total = %document.total_amount,
            "Document generated"
        );

        Ok(self.issue(document))
    }

    /// Issues a new version of document `id` from edited rows.
    ///
    /// The new version joins the lineage of `id` (its root, never `id`
    /// itself when `id` is already a version) with the next version number.
    pub async fn edit(&self, id: &str, request: EditRequest) -> EngineResult<IssuedDocument> {
        let original = self.get(id).await?;
        let document_type = original.document_type;

        let rows = retain_filled_rows(request.items)?;
        let vat_rate = coerce_decimal(request.vat_rate.as_deref(), original.vat_rate);
        let priced = price_document(document_type, &rows, vat_rate)?;

        let root = lineage_root(&original).to_string();
        let header = request.header.unwrap_or_else(|| original.header.clone());

        let document = {
            let _guard = self.issue_lock.lock().await;
            let now = self.clock.now();

            let version = self.store.next_version(&root, document_type).await?;
            let sequence = self.store.next_sequence(document_type, day_start(now)).await?;
            let number = DocumentNumber::compose(
                &self.settings.brand,
                document_type.as_str(),
                first_description(&priced.items),
                now,
                sequence,
            )
            .with_version(version);

            let new = build_document(document_type, number, priced, version, Some(root), header, now);
            self.store.save(new).await?
        };

        info!(
            id = %document.id,
            edited = %original.id,
            document_number = %document.document_number,
            version = document.version,
            "Document version issued"
        );

        Ok(self.issue(document))
    }

    /// Renders a stored document again.
    pub async fn render(&self, id: &str) -> EngineResult<Vec<u8>> {
        let document = self.get(id).await?;
        self.renderer.render(&DocumentData::from(&document))
    }

    fn issue(&self, document: Document) -> IssuedDocument {
        match self.renderer.render(&DocumentData::from(&document)) {
            Ok(bytes) => IssuedDocument {
                document,
                rendered: Some(bytes),
                render_error: None,
            },
            Err(e) => {
                warn!(
                    document_number = %document.document_number,
                    error = %e,
                    "Document saved, but could not be rendered"
                );
                IssuedDocument {
                    document,
                    rendered: None,
                    render_error: Some(e.to_string()),
                }
            }
        }
    }

    // =========================================================================
    // Lookups & Administration
    // =========================================================================

    /// Loads a document with its items.
    pub async fn get(&self, id: &str) -> EngineResult<Document> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| EngineError::document_not_found(id))
    }

    /// Sets the status of a document. `status` is matched case-insensitively
    /// against Pending, Sent, Paid, Overdue, Cancelled.
    pub async fn update_status(&self, id: &str, status: &str) -> EngineResult<Document> {
        let status: DocumentStatus = status.parse()?;
        self.store.update_status(id, status, self.clock.now()).await?;
        self.get(id).await
    }

    /// Documents whose number contains `query`, newest first.
    pub async fn search(&self, query: &str) -> EngineResult<Vec<DocumentSummary>> {
        self.store.search_by_number(query, DEFAULT_SEARCH_LIMIT).await
    }

    /// Deletes a document. Deleting a lineage root removes all its versions.
    pub async fn delete(&self, id: &str) -> EngineResult<()> {
        self.store.delete(id).await?;
        info!(id = %id, "Document deleted");
        Ok(())
    }

    /// Every version in the lineage of `id`, oldest first.
    pub async fn versions(&self, id: &str) -> EngineResult<Vec<DocumentSummary>> {
        let document = self.get(id).await?;
        self.store.list_lineage(lineage_root(&document)).await
    }

    /// Highest version in the lineage of `id`.
    pub async fn latest_version(&self, id: &str) -> EngineResult<i64> {
        let document = self.get(id).await?;
        let max = self
            .store
            .max_version(lineage_root(&document), document.document_type)
            .await?;
        Ok(max.unwrap_or(document.version))
    }

    /// Documents issued since midnight UTC.
    pub async fn issued_today(&self) -> EngineResult<Vec<DocumentSummary>> {
        self.store.list_created_since(self.today()).await
    }

    /// Number of documents of one type issued since midnight UTC.
    pub async fn issued_today_count(&self, document_type: DocumentType) -> EngineResult<i64> {
        self.store.count_documents(document_type, self.today()).await
    }

    fn today(&self) -> DateTime<Utc> {
        day_start(self.clock.now())
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn first_description(items: &[LineItem]) -> Option<&str> {
    items.first().map(|item| item.description.as_str())
}

fn build_document(
    document_type: DocumentType,
    number: DocumentNumber,
    priced: PricedDocument,
    version: i64,
    lineage_root_id: Option<String>,
    header: DocumentHeader,
    created_at: DateTime<Utc>,
) -> NewDocument {
    let PricedDocument { items, totals } = priced;
    NewDocument {
        document_type,
        document_number: number.to_string(),
        status: DocumentStatus::Pending,
        subtotal: totals.subtotal,
        vat_rate: totals.vat_rate,
        vat_amount: totals.vat_amount,
        total_amount: totals.total_amount,
        version,
        lineage_root_id,
        header,
        created_at,
        items,
    }
}
