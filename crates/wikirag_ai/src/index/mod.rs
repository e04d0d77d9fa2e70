use serde::{Deserialize, Serialize};
use wikirag_core::domain::DocumentChunk;
use wikirag_core::error::AppError;

mod similarity;
pub mod store;

pub use store::IndexStore;

pub const FORMAT_VERSION: u32 = 1;

/// Written last during a build; its presence marks a complete index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IndexManifest {
    pub format_version: u32,
    /// Fingerprint of the embedding collaborator the vectors came from.
    pub embed_model: String,
    pub dims: u32,
    pub chunk_count: u32,
    pub corpus: String,
    pub vectors_sha256: String,
    pub built_at: String, // RFC3339
}

/// Exhaustive cosine-similarity index over chunk embeddings, held in memory.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    manifest: IndexManifest,
    chunks: Vec<DocumentChunk>,
    vectors: Vec<f32>,
    norms: Vec<f32>,
}

impl VectorIndex {
    pub(crate) fn from_parts(
        manifest: IndexManifest,
        chunks: Vec<DocumentChunk>,
        vectors: Vec<f32>,
    ) -> Result<Self, AppError> {
        let dims = manifest.dims as usize;
        if chunks.len() != manifest.chunk_count as usize || vectors.len() != dims * chunks.len() {
            return Err(AppError::new(
                "AI_INDEX_CORRUPT",
                "Index vectors do not match chunk count and dims",
            )
            .with_details(format!(
                "chunks={}; manifest_chunks={}; dims={}; floats={}",
                chunks.len(),
                manifest.chunk_count,
                dims,
                vectors.len()
            )));
        }
        let norms = if dims == 0 {
            vec![0.0; chunks.len()]
        } else {
            vectors.chunks_exact(dims).map(similarity::l2_norm).collect()
        };
        Ok(Self {
            manifest,
            chunks,
            vectors,
            norms,
        })
    }

    pub fn manifest(&self) -> &IndexManifest {
        &self.manifest
    }

    pub fn embed_model(&self) -> &str {
        &self.manifest.embed_model
    }

    pub fn dims(&self) -> usize {
        self.manifest.dims as usize
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn chunk(&self, row: usize) -> Option<&DocumentChunk> {
        self.chunks.get(row)
    }

    fn row(&self, row: usize) -> &[f32] {
        let d = self.dims();
        &self.vectors[row * d..(row + 1) * d]
    }

    /// Rows of the `k` nearest chunks to `query`, best first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<(usize, f32)>, AppError> {
        if self.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        if query.len() != self.dims() {
            return Err(AppError::new(
                "AI_RETRIEVAL_FAILED",
                "Query embedding dims do not match index dims",
            )
            .with_details(format!("index_dims={}; query_dims={}", self.dims(), query.len())));
        }
        let qnorm = similarity::l2_norm(query);
        if qnorm == 0.0 {
            return Err(AppError::new(
                "AI_RETRIEVAL_FAILED",
                "Query embedding norm is zero",
            ));
        }
        let scores = (0..self.len())
            .map(|i| (i, similarity::cosine(query, self.row(i), qnorm, self.norms[i])));
        Ok(similarity::top_k(scores, k))
    }
}
