//! # Version Lineage
//!
//! Editing never mutates a document. It issues a new version that points
//! back to the first document of its lineage.
//!
//! ```text
//!   v1  id=A  root=None          ◄── lineage root
//!    │
//!    ├─ edit ──► v2  id=B  root=A
//!    │
//!    └─ edit B ► v3  id=C  root=A   (root is always A, never B)
//! ```
//!
//! Version allocation itself is atomic in the store; it seeds each lineage
//! counter with [`next_version`] of the highest stored version.

use crate::types::Document;

/// Id of the lineage a document belongs to.
#[inline]
pub fn lineage_root(document: &Document) -> &str {
    document.lineage_root_id.as_deref().unwrap_or(&document.id)
}

/// Next version after the highest one found (1 if none).
#[inline]
pub fn next_version(max_version: Option<i64>) -> i64 {
    max_version.map_or(1, |max| max + 1)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::ZERO_MONEY;
    use crate::types::{DocumentHeader, DocumentStatus, DocumentType};
    use chrono::Utc;

    fn document(id: &str, root: Option<&str>, version: i64) -> Document {
        Document {
            id: id.to_string(),
            document_type: DocumentType::Invoice,
            document_number: "APEX-INV-GEN-SEP25-001".to_string(),
            status: DocumentStatus::Pending,
            subtotal: ZERO_MONEY,
            vat_rate: ZERO_MONEY,
            vat_amount: ZERO_MONEY,
            total_amount: ZERO_MONEY,
            version,
            lineage_root_id: root.map(str::to_string),
            header: DocumentHeader::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            items: Vec::new(),
        }
    }

    #[test]
    fn test_original_is_its_own_root() {
        let v1 = document("A", None, 1);
        assert_eq!(lineage_root(&v1), "A");
        assert_eq!(next_version(Some(v1.version)), 2);
    }

    #[test]
    fn test_edit_of_edit_keeps_root() {
        let v2 = document("B", Some("A"), 2);
        assert_eq!(lineage_root(&v2), "A");
        assert_eq!(next_version(Some(v2.version)), 3);
    }

    #[test]
    fn test_next_version_without_history() {
        assert_eq!(next_version(None), 1);
        assert_eq!(next_version(Some(4)), 5);
    }
}
