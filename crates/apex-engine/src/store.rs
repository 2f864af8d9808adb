//! # Document Store
//!
//! The persistence seam of the engine.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  DocumentService ──► dyn DocumentStore                                  │
//! │                           │                                             │
//! │                           ├── apex_db::Database (SQLite, production)    │
//! │                           └── any other backend implementing the trait │
//! │                                                                         │
//! │  next_sequence / next_version MUST be atomic: two concurrent callers    │
//! │  never receive the same value.                                          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use apex_core::{Document, DocumentStatus, DocumentSummary, DocumentType, NewDocument};
use apex_db::Database;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::EngineResult;

/// Storage operations the engine needs.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Number of documents of a type created at or after `created_after`.
    async fn count_documents(
        &self,
        document_type: DocumentType,
        created_after: DateTime<Utc>,
    ) -> EngineResult<i64>;

    /// Highest version stored for a lineage root (root included) and type.
    async fn max_version(
        &self,
        lineage_root_id: &str,
        document_type: DocumentType,
    ) -> EngineResult<Option<i64>>;

    /// Atomically allocates the next daily sequence for a type.
    async fn next_sequence(
        &self,
        document_type: DocumentType,
        day_start: DateTime<Utc>,
    ) -> EngineResult<i64>;

    /// Atomically allocates the next version of a lineage.
    async fn next_version(
        &self,
        lineage_root_id: &str,
        document_type: DocumentType,
    ) -> EngineResult<i64>;

    /// Persists a document with its items; returns it with its new id.
    async fn save(&self, document: NewDocument) -> EngineResult<Document>;

    /// Loads a document with its items.
    async fn get(&self, id: &str) -> EngineResult<Option<Document>>;

    /// Documents whose number contains `query`.
    async fn search_by_number(&self, query: &str, limit: i64)
        -> EngineResult<Vec<DocumentSummary>>;

    /// Every version of a lineage, oldest first.
    async fn list_lineage(&self, lineage_root_id: &str) -> EngineResult<Vec<DocumentSummary>>;

    /// Documents created at or after `since`.
    async fn list_created_since(&self, since: DateTime<Utc>) -> EngineResult<Vec<DocumentSummary>>;

    async fn update_status(
        &self,
        id: &str,
        status: DocumentStatus,
        updated_at: DateTime<Utc>,
    ) -> EngineResult<()>;

    /// Deletes a document and everything that cascades from it.
    async fn delete(&self, id: &str) -> EngineResult<()>;
}

#[async_trait]
impl DocumentStore for Database {
    async fn count_documents(
        &self,
        document_type: DocumentType,
        created_after: DateTime<Utc>,
    ) -> EngineResult<i64> {
        Ok(self.documents().count_created_since(document_type, created_after).await?)
    }

    async fn max_version(
        &self,
        lineage_root_id: &str,
        document_type: DocumentType,
    ) -> EngineResult<Option<i64>> {
        Ok(self.documents().max_version(lineage_root_id, document_type).await?)
    }

    async fn next_sequence(
        &self,
        document_type: DocumentType,
        day_start: DateTime<Utc>,
    ) -> EngineResult<i64> {
        Ok(self.counters().next_sequence(document_type, day_start).await?)
    }

    async fn next_version(
        &self,
        lineage_root_id: &str,
        document_type: DocumentType,
    ) -> EngineResult<i64> {
        Ok(self.counters().next_version(lineage_root_id, document_type).await?)
    }

    async fn save(&self, document: NewDocument) -> EngineResult<Document> {
        Ok(self.documents().insert(&document).await?)
    }

    async fn get(&self, id: &str) -> EngineResult<Option<Document>> {
        Ok(self.documents().get_by_id(id).await?)
    }

    async fn search_by_number(
        &self,
        query: &str,
        limit: i64,
    ) -> EngineResult<Vec<DocumentSummary>> {
        Ok(self.documents().search_by_number(query, limit).await?)
    }

    async fn list_lineage(&self, lineage_root_id: &str) -> EngineResult<Vec<DocumentSummary>> {
        Ok(self.documents().list_lineage(lineage_root_id).await?)
    }

    async fn list_created_since(&self, since: DateTime<Utc>) -> EngineResult<Vec<DocumentSummary>> {
        Ok(self.documents().list_created_since(since).await?)
    }

    async fn update_status(
        &self,
        id: &str,
        status: DocumentStatus,
        updated_at: DateTime<Utc>,
    ) -> EngineResult<()> {
        Ok(self.documents().update_status(id, status, updated_at).await?)
    }

    async fn delete(&self, id: &str) -> EngineResult<()> {
        Ok(self.documents().delete(id).await?)
    }
}
