//! # Counter Repository
//!
//! Atomic allocation of daily sequence numbers and lineage versions.
//!
//! ## Allocation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  seed = COUNT(*) + 1          (or MAX(version) + 1)  from documents     │
//! │                                                                         │
//! │  INSERT INTO document_sequences (type, day, last_value)                 │
//! │       VALUES (?, ?, seed)                                               │
//! │  ON CONFLICT DO UPDATE                                                  │
//! │       SET last_value = MAX(last_value + 1, excluded.last_value)         │
//! │  RETURNING last_value                                                   │
//! │                                                                         │
//! │  One statement: two concurrent callers always get distinct values.      │
//! │  MAX(...) keeps the counter ahead of rows inserted without it.          │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A value allocated for a save that later fails is not reused.

use apex_core::{lineage, DocumentType};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

/// Repository for sequence and version counters.
#[derive(Debug, Clone)]
pub struct CounterRepository {
    pool: SqlitePool,
}

impl CounterRepository {
    /// Creates a new CounterRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CounterRepository { pool }
    }

    /// Allocates the next daily sequence for a document type.
    ///
    /// `day_start` is midnight UTC of the issuing day; the first allocation
    /// of the day is seeded with the number of documents of that type
    /// already created since then, plus one.
    pub async fn next_sequence(
        &self,
        document_type: DocumentType,
        day_start: DateTime<Utc>,
    ) -> DbResult<i64> {
        let mut tx = self.pool.begin().await?;

        let issued_today: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM documents WHERE document_type = ?1 AND created_at >= ?2",
        )
        .bind(document_type)
        .bind(day_start)
        .fetch_one(&mut *tx)
        .await?;

        let sequence: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO document_sequences (document_type, day, last_value)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (document_type, day) DO UPDATE
                SET last_value = MAX(last_value + 1, excluded.last_value)
            RETURNING last_value
            "#,
        )
        .bind(document_type)
        .bind(day_start.date_naive())
        .bind(issued_today + 1)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(document_type = %document_type, sequence, "Allocated daily sequence");
        Ok(sequence)
    }

    /// Allocates the next version within a lineage.
    ///
    /// The first allocation for a root is seeded from the highest version
    /// already stored for it (the root itself is version 1).
    pub async fn next_version(
        &self,
        lineage_root_id: &str,
        document_type: DocumentType,
    ) -> DbResult<i64> {
        let mut tx = self.pool.begin().await?;

        let max_version: Option<i64> = sqlx::query_scalar(
            r#"
            SELECT MAX(version) FROM documents
            WHERE (lineage_root_id = ?1 OR id = ?1) AND document_type = ?2
            "#,
        )
        .bind(lineage_root_id)
        .bind(document_type)
        .fetch_one(&mut *tx)
        .await?;

        let version: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO lineage_versions (lineage_root_id, document_type, last_value)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (lineage_root_id, document_type) DO UPDATE
                SET last_value = MAX(last_value + 1, excluded.last_value)
            RETURNING last_value
            "#,
        )
        .bind(lineage_root_id)
        .bind(document_type)
        .bind(lineage::next_version(max_version))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(lineage_root_id = %lineage_root_id, version, "Allocated lineage version");
        Ok(version)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
