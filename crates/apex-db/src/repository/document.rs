//! # Document Repository
//!
//! Database operations for documents and their line items.
//!
//! ## Document Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Document Lifecycle                                │
//! │                                                                         │
//! │  1. INSERT                                                             │
//! │     └── insert() → documents row + document_items rows, one tx        │
//! │                                                                         │
//! │  2. EDIT (never UPDATE)                                                │
//! │     └── insert() again with version + 1 and lineage_root_id set        │
//! │                                                                         │
//! │  3. STATUS                                                             │
//! │     └── update_status() → the only column that changes after insert    │
//! │                                                                         │
//! │  4. DELETE (administrative)                                            │
//! │     └── delete() → items cascade; deleting a root cascades to every    │
//! │                    later version of its lineage                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use apex_core::money::parse_stored;
use apex_core::{
    Document, DocumentHeader, DocumentStatus, DocumentSummary, DocumentType, LineItem, NewDocument,
};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};

const SELECT_DOCUMENT: &str = r#"
    SELECT
        id, document_type, document_number, status,
        subtotal, vat_rate, vat_amount, total_amount,
        version, lineage_root_id,
        client_name, client_address, po_number, issue_date, due_date,
        signed_by_name, signed_by_function,
        created_at, updated_at
    FROM documents
"#;

const SELECT_SUMMARY: &str = r#"
    SELECT
        id, document_type, document_number, status, total_amount,
        version, lineage_root_id, client_name, created_at
    FROM documents
"#;

// =============================================================================
// Row Types
// =============================================================================

/// `documents` row as stored. Amounts are decimal strings.
#[derive(Debug, sqlx::FromRow)]
struct DocumentRow {
    id: String,
    document_type: DocumentType,
    document_number: String,
    status: DocumentStatus,
    subtotal: String,
    vat_rate: String,
    vat_amount: String,
    total_amount: String,
    version: i64,
    lineage_root_id: Option<String>,
    client_name: Option<String>,
    client_address: Option<String>,
    po_number: Option<String>,
    issue_date: Option<NaiveDate>,
    due_date: Option<NaiveDate>,
    signed_by_name: Option<String>,
    signed_by_function: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DocumentRow {
    fn into_document(self, items: Vec<LineItem>) -> DbResult<Document> {
        Ok(Document {
            subtotal: parse_stored("subtotal", &self.subtotal)?,
            vat_rate: parse_stored("vat_rate", &self.vat_rate)?,
            vat_amount: parse_stored("vat_amount", &self.vat_amount)?,
            total_amount: parse_stored("total_amount", &self.total_amount)?,
            id: self.id,
            document_type: self.document_type,
            document_number: self.document_number,
            status: self.status,
            version: self.version,
            lineage_root_id: self.lineage_root_id,
            header: DocumentHeader {
                client_name: self.client_name,
                client_address: self.client_address,
                po_number: self.po_number,
                issue_date: self.issue_date,
                due_date: self.due_date,
                signed_by_name: self.signed_by_name,
                signed_by_function: self.signed_by_function,
            },
            created_at: self.created_at,
            updated_at: self.updated_at,
            items,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    description: String,
    quantity: i64,
    unit_price: Option<String>,
    total_price: Option<String>,
    comment: Option<String>,
}

impl TryFrom<ItemRow> for LineItem {
    type Error = DbError;

    fn try_from(row: ItemRow) -> DbResult<Self> {
        let unit_price = row
            .unit_price
            .as_deref()
            .map(|v| parse_stored("unit_price", v))
            .transpose()?;
        let total_price = row
            .total_price
            .as_deref()
            .map(|v| parse_stored("total_price", v))
            .transpose()?;

        Ok(LineItem {
            description: row.description,
            quantity: row.quantity,
            unit_price,
            total_price,
            comment: row.comment,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SummaryRow {
    id: String,
    document_type: DocumentType,
    document_number: String,
    status: DocumentStatus,
    total_amount: String,
    version: i64,
    lineage_root_id: Option<String>,
    client_name: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<SummaryRow> for DocumentSummary {
    type Error = DbError;

    fn try_from(row: SummaryRow) -> DbResult<Self> {
        Ok(DocumentSummary {
            total_amount: parse_stored("total_amount", &row.total_amount)?,
            id: row.id,
            document_type: row.document_type,
            document_number: row.document_number,
            status: row.status,
            version: row.version,
            lineage_root_id: row.lineage_root_id,
            client_name: row.client_name,
            created_at: row.created_at,
        })
    }
}

fn into_summaries(rows: Vec<SummaryRow>) -> DbResult<Vec<DocumentSummary>> {
    rows.into_iter().map(DocumentSummary::try_from).collect()
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for document database operations.
#[derive(Debug, Clone)]
pub struct DocumentRepository {
    pool: SqlitePool,
}

impl DocumentRepository {
    /// Creates a new DocumentRepository.
    pub fn new(pool: SqlitePool) -> Self {
        DocumentRepository { pool }
    }

    /// Inserts a document and its items in one transaction.
    ///
    /// ## Returns
    /// The stored document with its generated id.
    pub async fn insert(&self, new: &NewDocument) -> DbResult<Document> {
        let id = Uuid::new_v4().to_string();

        debug!(
            id = %id,
            document_number = %new.document_number,
            version = new.version,
            items = new.items.len(),
            "Inserting document"
        );

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO documents (
                id, document_type, document_number, status,
                subtotal, vat_rate, vat_amount, total_amount,
                version, lineage_root_id,
                client_name, client_address, po_number, issue_date, due_date,
                signed_by_name, signed_by_function,
                created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8,
                ?9, ?10,
                ?11, ?12, ?13, ?14, ?15,
                ?16, ?17,
                ?18, ?18
            )
            "#,
        )
        .bind(&id)
        .bind(new.document_type)
        .bind(&new.document_number)
        .bind(new.status)
        .bind(new.subtotal.to_string())
        .bind(new.vat_rate.to_string())
        .bind(new.vat_amount.to_string())
        .bind(new.total_amount.to_string())
        .bind(new.version)
        .bind(&new.lineage_root_id)
        .bind(&new.header.client_name)
        .bind(&new.header.client_address)
        .bind(&new.header.po_number)
        .bind(new.header.issue_date)
        .bind(new.header.due_date)
        .bind(&new.header.signed_by_name)
        .bind(&new.header.signed_by_function)
        .bind(new.created_at)
        .execute(&mut *tx)
        .await?;

        for (position, item) in new.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO document_items (
                    document_id, position, description, quantity,
                    unit_price, total_price, comment
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&id)
            .bind(position as i64)
            .bind(&item.description)
            .bind(item.quantity)
            .bind(item.unit_price.map(|p| p.to_string()))
            .bind(item.total_price.map(|p| p.to_string()))
            .bind(&item.comment)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        info!(id = %id, document_number = %new.document_number, "Document stored");

        Ok(Document {
            id,
            document_type: new.document_type,
            document_number: new.document_number.clone(),
            status: new.status,
            subtotal: new.subtotal,
            vat_rate: new.vat_rate,
            vat_amount: new.vat_amount,
            total_amount: new.total_amount,
            version: new.version,
            lineage_root_id: new.lineage_root_id.clone(),
            header: new.header.clone(),
            created_at: new.created_at,
            updated_at: new.created_at,
            items: new.items.clone(),
        })
    }

    /// Gets a document with its items.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Document>> {
        let row: Option<DocumentRow> = sqlx::query_as(&format!("{SELECT_DOCUMENT} WHERE id = ?1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let items = self.items_for(id).await?;
                Ok(Some(row.into_document(items)?))
            }
            None => Ok(None),
        }
    }

    /// Gets the items of a document in their original order.
    pub async fn items_for(&self, document_id: &str) -> DbResult<Vec<LineItem>> {
        let rows: Vec<ItemRow> = sqlx::query_as(
            r#"
            SELECT description, quantity, unit_price, total_price, comment
            FROM document_items
            WHERE document_id = ?1
            ORDER BY position
            "#,
        )
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(LineItem::try_from).collect()
    }

    /// Counts documents of one type created at or after `since`.
    pub async fn count_created_since(
        &self,
        document_type: DocumentType,
        since: DateTime<Utc>,
    ) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM documents WHERE document_type = ?1 AND created_at >= ?2",
        )
        .bind(document_type)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    /// Highest version in a lineage (the root itself included), per type.
    pub async fn max_version(
        &self,
        lineage_root_id: &str,
        document_type: DocumentType,
    ) -> DbResult<Option<i64>> {
        let max: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT MAX(version) FROM documents
            WHERE (lineage_root_id = ?1 OR id = ?1) AND document_type = ?2
            "#,
        )
        .bind(lineage_root_id)
        .bind(document_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(max)
    }

    /// Finds documents whose number contains `query` (case-insensitive),
    /// newest first.
    pub async fn search_by_number(&self, query: &str, limit: i64) -> DbResult<Vec<DocumentSummary>> {
        let rows: Vec<SummaryRow> = sqlx::query_as(&format!(
            "{SELECT_SUMMARY} WHERE instr(upper(document_number), upper(?1)) > 0 \
             ORDER BY created_at DESC, version DESC LIMIT ?2"
        ))
        .bind(query.trim())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        into_summaries(rows)
    }

    /// Lists every version of a lineage, oldest first.
    pub async fn list_lineage(&self, lineage_root_id: &str) -> DbResult<Vec<DocumentSummary>> {
        let rows: Vec<SummaryRow> = sqlx::query_as(&format!(
            "{SELECT_SUMMARY} WHERE id = ?1 OR lineage_root_id = ?1 \
             ORDER BY document_type, version"
        ))
        .bind(lineage_root_id)
        .fetch_all(&self.pool)
        .await?;

        into_summaries(rows)
    }

    /// Lists documents created at or after `since`, oldest first.
    pub async fn list_created_since(&self, since: DateTime<Utc>) -> DbResult<Vec<DocumentSummary>> {
        let rows: Vec<SummaryRow> = sqlx::query_as(&format!(
            "{SELECT_SUMMARY} WHERE created_at >= ?1 ORDER BY created_at, document_number"
        ))
        .bind(since)
        .fetch_all(&self.pool)
        .await?;

        into_summaries(rows)
    }

    /// Sets the status of one document.
    pub async fn update_status(
        &self,
        id: &str,
        status: DocumentStatus,
        updated_at: DateTime<Utc>,
    ) -> DbResult<()> {
        let result = sqlx::query("UPDATE documents SET status = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .bind(updated_at)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Document", id));
        }

        info!(id = %id, status = %status, "Document status updated");
        Ok(())
    }

    /// Deletes a document. Items cascade; so do later versions when `id` is
    /// a lineage root.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Document", id));
        }

        info!(id = %id, "Document deleted");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::{Duration, TimeZone};
    use rust_decimal_macros::dec;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 15, hour, 0, 0).unwrap()
    }

    fn invoice(number: &str, created_at: DateTime<Utc>) -> NewDocument {
        NewDocument {
            document_type: DocumentType::Invoice,
            document_number: number.to_string(),
            status: DocumentStatus::Pending,
            subtotal: dec!(59.97),
            vat_rate: dec!(16),
            vat_amount: dec!(9.60),
            total_amount: dec!(69.57),
            version: 1,
            lineage_root_id: None,
            header: DocumentHeader {
                client_name: Some("Acme Ltd".into()),
                issue_date: NaiveDate::from_ymd_opt(2025, 9, 15),
                ..Default::default()
            },
            created_at,
            items: vec![
                LineItem {
                    description: "Widget".into(),
                    quantity: 3,
                    unit_price: Some(dec!(19.99)),
                    total_price: Some(dec!(59.97)),
                    comment: None,
                },
                LineItem {
                    description: "Manual".into(),
                    quantity: 1,
                    unit_price: Some(dec!(0)),
                    total_price: Some(dec!(0)),
                    comment: Some("free".into()),
                },
            ],
        }
    }

    async fn repo() -> DocumentRepository {
        Database::new(DbConfig::in_memory()).await.unwrap().documents()
    }

    #[tokio::test]
    async fn test_insert_and_get_round_trip() {
        let repo = repo().await;
        let stored = repo.insert(&invoice("APEX-INV-WT-SEP25-001", at(9))).await.unwrap();

        let loaded = repo.get_by_id(&stored.id).await.unwrap().unwrap();
        assert_eq!(loaded, stored);
        assert_eq!(loaded.items.len(), 2);
        assert_eq!(loaded.items[0].description, "Widget");
        assert_eq!(loaded.total_amount.to_string(), "69.57");
        assert_eq!(loaded.header.client_name.as_deref(), Some("Acme Ltd"));
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let repo = repo().await;
        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_count_created_since() {
        let repo = repo().await;
        repo.insert(&invoice("A", at(1) - Duration::days(1))).await.unwrap();
        repo.insert(&invoice("B", at(8))).await.unwrap();
        repo.insert(&invoice("C", at(12))).await.unwrap();

        let midnight = at(0);
        assert_eq!(repo.count_created_since(DocumentType::Invoice, midnight).await.unwrap(), 2);
        assert_eq!(repo.count_created_since(DocumentType::Proforma, midnight).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_max_version_covers_root_and_versions() {
        let repo = repo().await;
        let root = repo.insert(&invoice("R", at(9))).await.unwrap();
        assert_eq!(repo.max_version(&root.id, DocumentType::Invoice).await.unwrap(), Some(1));

        let mut v2 = invoice("R-v2", at(10));
        v2.version = 2;
        v2.lineage_root_id = Some(root.id.clone());
        repo.insert(&v2).await.unwrap();

        assert_eq!(repo.max_version(&root.id, DocumentType::Invoice).await.unwrap(), Some(2));
        assert_eq!(repo.max_version(&root.id, DocumentType::Proforma).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_duplicate_version_rejected() {
        let repo = repo().await;
        let root = repo.insert(&invoice("R", at(9))).await.unwrap();

        let mut v2 = invoice("R-v2", at(10));
        v2.version = 2;
        v2.lineage_root_id = Some(root.id.clone());
        repo.insert(&v2).await.unwrap();

        let err = repo.insert(&v2).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_search_by_number() {
        let repo = repo().await;
        repo.insert(&invoice("APEX-INV-WT-SEP25-001", at(9))).await.unwrap();
        repo.insert(&invoice("APEX-INV-DK-SEP25-002", at(10))).await.unwrap();

        let found = repo.search_by_number("wt-sep", 20).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].document_number, "APEX-INV-WT-SEP25-001");

        let all = repo.search_by_number("SEP25", 20).await.unwrap();
        assert_eq!(all[0].document_number, "APEX-INV-DK-SEP25-002");
    }

    #[tokio::test]
    async fn test_update_status() {
        let repo = repo().await;
        let doc = repo.insert(&invoice("A", at(9))).await.unwrap();

        repo.update_status(&doc.id, DocumentStatus::Paid, at(11)).await.unwrap();
        let loaded = repo.get_by_id(&doc.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, DocumentStatus::Paid);
        assert_eq!(loaded.updated_at, at(11));

        let err = repo.update_status("missing", DocumentStatus::Sent, at(11)).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_root_cascades() {
        let repo = repo().await;
        let root = repo.insert(&invoice("R", at(9))).await.unwrap();
        let mut v2 = invoice("R-v2", at(10));
        v2.version = 2;
        v2.lineage_root_id = Some(root.id.clone());
        let v2 = repo.insert(&v2).await.unwrap();

        assert_eq!(repo.list_lineage(&root.id).await.unwrap().len(), 2);

        repo.delete(&root.id).await.unwrap();
        assert!(repo.get_by_id(&v2.id).await.unwrap().is_none());
        assert!(repo.items_for(&root.id).await.unwrap().is_empty());
        assert!(repo.items_for(&v2.id).await.unwrap().is_empty());

        assert!(matches!(repo.delete(&root.id).await, Err(DbError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_list_created_since() {
        let repo = repo().await;
        repo.insert(&invoice("OLD", at(1) - Duration::days(2))).await.unwrap();
        repo.insert(&invoice("NEW", at(9))).await.unwrap();

        let today = repo.list_created_since(at(0)).await.unwrap();
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].document_number, "NEW");
        assert_eq!(today[0].total_amount, dec!(69.57));
    }
}
