use serde_json::Value;
use wikirag_core::domain::DocumentChunk;
use wikirag_core::error::AppError;

pub mod hf_rows;
pub mod local;

pub use hf_rows::HfDatasetSource;
pub use local::LocalCorpusFile;

/// A document collection that can be materialized in full, once, at index
/// build time.
pub trait CorpusSource {
    /// Human-readable identity recorded in the index manifest.
    fn label(&self) -> String;
    fn load(&self) -> Result<Vec<DocumentChunk>, AppError>;
}

/// Turn one dataset record into a chunk: `context` is the text, `id` the
/// stable identifier. Records without usable text are skipped.
pub(crate) fn chunk_from_record(
    record: &Value,
    fallback_id: impl FnOnce() -> String,
) -> Option<DocumentChunk> {
    let text = record.get("context")?.as_str()?.trim();
    if text.is_empty() {
        return None;
    }
    let id = match record.get("id") {
        Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        _ => fallback_id(),
    };
    Some(DocumentChunk::new(id, text))
}
