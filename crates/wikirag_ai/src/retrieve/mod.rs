use wikirag_core::domain::{DocumentChunk, TOP_K};
use wikirag_core::error::AppError;

use crate::embeddings::{EmbedTask, Embedder};
use crate::index::VectorIndex;

/// Top-K nearest-neighbour lookup over a loaded index. No re-ranking,
/// deduplication or score threshold.
pub struct Retriever<'a> {
    index: &'a VectorIndex,
    embedder: &'a dyn Embedder,
    top_k: usize,
}

impl<'a> Retriever<'a> {
    pub fn new(index: &'a VectorIndex, embedder: &'a dyn Embedder) -> Self {
        Self::with_top_k(index, embedder, TOP_K)
    }

    pub fn with_top_k(index: &'a VectorIndex, embedder: &'a dyn Embedder, top_k: usize) -> Self {
        Self {
            index,
            embedder,
            top_k: top_k.max(1),
        }
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Queries are embedded with the model recorded in the index manifest.
    pub fn retrieve(&self, query: &str) -> Result<Vec<DocumentChunk>, AppError> {
        let q = query.trim();
        if q.is_empty() {
            return Err(AppError::new("AI_RETRIEVAL_FAILED", "Query must not be empty"));
        }
        if self.index.is_empty() {
            return Ok(Vec::new());
        }
        let qv = self
            .embedder
            .embed(self.index.embed_model(), EmbedTask::Query, q)?;
        let hits = self.index.search(&qv, self.top_k)?;
        tracing::debug!(query = q, hits = hits.len(), "retrieved passages");
        Ok(hits
            .into_iter()
            .filter_map(|(row, _score)| self.index.chunk(row).cloned())
            .collect())
    }
}
