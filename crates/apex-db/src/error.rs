//! # Storage Errors
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  sqlx::Error ───────────┐                                               │
//! │  MigrateError ──────────┼──► DbError ──► EngineError (apex-engine)      │
//! │  CoreError (bad row) ───┘                                               │
//! │                                                                         │
//! │  Constraint failures are told apart by SQLite's message text:           │
//! │    "UNIQUE constraint failed: documents.version, ..." → UniqueViolation │
//! │    "FOREIGN KEY constraint failed"                    → ForeignKey...   │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use apex_core::CoreError;
use thiserror::Error;

/// Result type for storage operations.
pub type DbResult<T> = Result<T, DbError>;

#[derive(Debug, Error)]
pub enum DbError {
    /// No row with this id.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A second version with the same lineage, type and number, or a
    /// repeated item position.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Typically a lineage root id that is not stored.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A stored amount no longer parses as a decimal.
    #[error("Corrupt row: {0}")]
    Corrupt(#[from] CoreError),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// SQLite rejected the statement for a reason other than a constraint.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// No connection became free within the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    fn from_sqlite_message(message: &str) -> Self {
        if let Some(columns) = message.strip_prefix("UNIQUE constraint failed: ") {
            return DbError::UniqueViolation {
                field: columns.to_string(),
                value: "unknown".to_string(),
            };
        }
        if message.contains("FOREIGN KEY constraint failed") {
            return DbError::ForeignKeyViolation {
                message: message.to_string(),
            };
        }
        DbError::QueryFailed(message.to_string())
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => DbError::from_sqlite_message(db_err.message()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = DbError::not_found("Document", "abc");
        assert_eq!(err.to_string(), "Document not found: abc");
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[test]
    fn test_sqlite_messages_are_classified() {
        let unique = DbError::from_sqlite_message(
            "UNIQUE constraint failed: document_items.document_id, document_items.position",
        );
        assert!(matches!(
            unique,
            DbError::UniqueViolation { ref field, .. } if field.starts_with("document_items.document_id")
        ));

        let fk = DbError::from_sqlite_message("FOREIGN KEY constraint failed");
        assert!(matches!(fk, DbError::ForeignKeyViolation { .. }));

        let other = DbError::from_sqlite_message("no such table: documents");
        assert!(matches!(other, DbError::QueryFailed(_)));
    }

    #[test]
    fn test_corrupt_amount_wraps_core_error() {
        let core = CoreError::CorruptAmount {
            field: "vat_amount".into(),
            value: "1,5".into(),
        };
        let err: DbError = core.into();
        assert_eq!(err.to_string(), "Corrupt row: Corrupt amount in vat_amount: '1,5'");
    }
}
