//! # Repository Module
//!
//! Database repository implementations for APEX Documents.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  DocumentService (apex-engine)                                          │
//! │       │                                                                 │
//! │       │  db.counters().next_sequence(Invoice, day_start)                │
//! │       │  db.documents().insert(&new_document)                           │
//! │       ▼                                                                 │
//! │  CounterRepository            DocumentRepository                        │
//! │  ├── next_sequence            ├── insert / get_by_id / items_for        │
//! │  └── next_version             ├── count_created_between / max_version   │
//! │                               ├── search_by_number / list_lineage       │
//! │                               └── update_status / delete                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite Database                                                        │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod counter;
pub mod document;
