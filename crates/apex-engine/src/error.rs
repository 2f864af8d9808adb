//! # Engine Error Types
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Engine Error Categories                           │
//! │                                                                         │
//! │  ┌─────────────────┐  ┌─────────────────┐  ┌─────────────────────────┐ │
//! │  │  Request        │  │   Storage       │  │     Configuration       │ │
//! │  │                 │  │                 │  │                         │ │
//! │  │  Validation     │  │  Database       │  │  InvalidConfig          │ │
//! │  │  NotFound       │  │  Core (corrupt) │  │  ConfigLoadFailed       │ │
//! │  │                 │  │                 │  │  ConfigSaveFailed       │ │
//! │  └─────────────────┘  └─────────────────┘  └─────────────────────────┘ │
//! │                                                                         │
//! │  Render failures are errors only when rendering is asked for directly; │
//! │  after an issue they are reported on the outcome instead.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use apex_core::{CoreError, ValidationError};
use apex_db::DbError;
use thiserror::Error;

/// Result type alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine error type covering every workflow failure.
#[derive(Debug, Error)]
pub enum EngineError {
    // =========================================================================
    // Request Errors
    // =========================================================================
    /// The request was rejected; nothing was persisted.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Document id does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    // =========================================================================
    // Storage Errors
    // =========================================================================
    /// Stored data could not be interpreted.
    #[error("Domain error: {0}")]
    Core(#[from] CoreError),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(DbError),

    // =========================================================================
    // Rendering
    // =========================================================================
    /// Renderer failed to produce output.
    #[error("Render failed: {0}")]
    Render(String),

    // =========================================================================
    // Configuration Errors
    // =========================================================================
    /// Invalid engine configuration.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Failed to load config file.
    #[error("Failed to load config: {0}")]
    ConfigLoadFailed(String),

    /// Failed to save config file.
    #[error("Failed to save config: {0}")]
    ConfigSaveFailed(String),
}

impl EngineError {
    /// Creates a NotFound error for a document id.
    pub fn document_not_found(id: impl Into<String>) -> Self {
        EngineError::NotFound {
            entity: "Document".to_string(),
            id: id.into(),
        }
    }

    /// Returns true if the caller sent bad input (as opposed to a server fault).
    pub fn is_client_error(&self) -> bool {
        matches!(self, EngineError::Validation(_) | EngineError::NotFound { .. })
    }
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<DbError> for EngineError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => EngineError::NotFound { entity, id },
            other => EngineError::Database(other),
        }
    }
}

impl From<std::io::Error> for EngineError {
    fn from(err: std::io::Error) -> Self {
        EngineError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::de::Error> for EngineError {
    fn from(err: toml::de::Error) -> Self {
        EngineError::ConfigLoadFailed(err.to_string())
    }
}

impl From<toml::ser::Error> for EngineError {
    fn from(err: toml::ser::Error) -> Self {
        EngineError::ConfigSaveFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_passes_through() {
        let err: EngineError = ValidationError::QuantityNotPositive.into();
        assert_eq!(err.to_string(), "Quantity must be greater than 0");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_db_not_found_becomes_engine_not_found() {
        let err: EngineError = DbError::not_found("Document", "abc").into();
        assert!(matches!(err, EngineError::NotFound { ref id, .. } if id == "abc"));
        assert!(err.is_client_error());
    }

    #[test]
    fn test_render_is_server_error() {
        assert!(!EngineError::Render("boom".into()).is_client_error());
    }
}
