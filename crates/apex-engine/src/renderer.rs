//! # Document Renderers
//!
//! A renderer turns the finalized [`DocumentData`] into bytes. The engine
//! never inspects the output: PDF layout lives behind this trait.

use apex_core::DocumentData;

use crate::error::{EngineError, EngineResult};

/// Produces the printable form of a document.
pub trait DocumentRenderer: Send + Sync {
    /// Renders one document.
    fn render(&self, data: &DocumentData) -> EngineResult<Vec<u8>>;

    /// File extension for rendered output, without the dot.
    fn file_extension(&self) -> &'static str;
}

/// Renders the document data as pretty-printed JSON.
///
/// Used by the CLI and by front ends that lay the document out themselves.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl DocumentRenderer for JsonRenderer {
    fn render(&self, data: &DocumentData) -> EngineResult<Vec<u8>> {
        serde_json::to_vec_pretty(data).map_err(|e| EngineError::Render(e.to_string()))
    }

    fn file_extension(&self) -> &'static str {
        "json"
    }
}
