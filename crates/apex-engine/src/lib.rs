//! # apex-engine: Document Workflows
//!
//! Turns raw request fields into numbered, priced, stored and rendered
//! documents.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   GenerateRequest ──┐                                                   │
//! │                     ├──► DocumentService ──► DocumentStore (apex-db)    │
//! │   EditRequest ──────┘          │                                        │
//! │                                ├──► Clock (UTC "now")                   │
//! │                                └──► DocumentRenderer (JSON, PDF, ...)   │
//! │                                                                         │
//! │   EngineConfig: defaults ◄── apex.toml ◄── APEX_* environment           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use apex_engine::{DocumentService, EngineConfig, GenerateRequest, JsonRenderer};
//! use apex_db::Database;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = EngineConfig::load(None)?;
//! let db = Database::new(config.db_config()).await?;
//!
//! let service = DocumentService::new(
//!     Arc::new(db),
//!     Arc::new(JsonRenderer),
//!     config.documents.clone(),
//! );
//!
//! let issued = service
//!     .generate(GenerateRequest {
//!         document_type: "invoice".into(),
//!         ..Default::default()
//!     })
//!     .await?;
//! println!("{}", issued.document.document_number);
//! # Ok(())
//! # }
//! ```

pub mod clock;
pub mod config;
pub mod error;
pub mod renderer;
pub mod service;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{DatabaseSettings, DocumentSettings, EngineConfig};
pub use error::{EngineError, EngineResult};
pub use renderer::{DocumentRenderer, JsonRenderer};
pub use service::{DocumentService, EditRequest, GenerateRequest, IssuedDocument};
pub use store::DocumentStore;
