use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;
use wikirag_core::domain::DocumentChunk;
use wikirag_core::error::AppError;

use super::{IndexManifest, VectorIndex, FORMAT_VERSION};
use crate::corpus::CorpusSource;
use crate::embeddings::{EmbedTask, Embedder};

/// Persisted index under one directory:
/// `index_manifest.json`, `index_chunks.json`, `index_vectors.bin` (LE f32, row-major).
#[derive(Debug, Clone)]
pub struct IndexStore {
    root: PathBuf,
}

fn same_model(a: &str, b: &str) -> bool {
    a.trim_start_matches("models/") == b.trim_start_matches("models/")
}

fn encode_vectors(vectors: &[f32]) -> Vec<u8> {
    vectors.iter().flat_map(|x| x.to_le_bytes()).collect()
}

fn decode_vectors(bytes: &[u8]) -> Option<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return None;
    }
    Some(
        bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect(),
    )
}

impl IndexStore {
    pub fn open(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        self.root.as_path()
    }

    fn manifest_path(&self) -> PathBuf {
        self.root.join("index_manifest.json")
    }

    fn chunks_path(&self) -> PathBuf {
        self.root.join("index_chunks.json")
    }

    fn vectors_path(&self) -> PathBuf {
        self.root.join("index_vectors.bin")
    }

    pub fn exists(&self) -> bool {
        self.manifest_path().is_file()
    }

    fn ensure_dirs(&self) -> Result<(), AppError> {
        fs::create_dir_all(&self.root).map_err(|e| {
            AppError::new("AI_INDEX_BUILD_FAILED", "Failed to create index directory")
                .with_details(format!("path={}; err={}", self.root.display(), e))
        })
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<(), AppError> {
        let tmp = path.with_extension("tmp");
        fs::write(&tmp, bytes).map_err(|e| {
            AppError::new("AI_INDEX_BUILD_FAILED", "Failed to write index file")
                .with_details(format!("path={}; err={}", tmp.display(), e))
        })?;
        fs::rename(&tmp, path).map_err(|e| {
            AppError::new("AI_INDEX_BUILD_FAILED", "Failed to finalize index file write")
                .with_details(format!("tmp={}; dest={}; err={}", tmp.display(), path.display(), e))
        })
    }

    fn read(&self, path: &Path) -> Result<Vec<u8>, AppError> {
        fs::read(path).map_err(|e| {
            AppError::new("AI_INDEX_LOAD_FAILED", "Failed to read index file")
                .with_details(format!("path={}; err={}", path.display(), e))
        })
    }

    /// `None` until a build has completed.
    pub fn manifest(&self) -> Result<Option<IndexManifest>, AppError> {
        if !self.exists() {
            return Ok(None);
        }
        let path = self.manifest_path();
        let bytes = self.read(&path)?;
        serde_json::from_slice(&bytes).map(Some).map_err(|e| {
            AppError::new("AI_INDEX_LOAD_FAILED", "Failed to decode index manifest")
                .with_details(format!("path={}; err={}", path.display(), e))
        })
    }

    /// Load a persisted index. Never calls an embedder.
    pub fn load(&self, embed_model: &str) -> Result<VectorIndex, AppError> {
        let manifest = self.manifest()?.ok_or_else(|| {
            AppError::new("AI_INDEX_LOAD_FAILED", "No index has been built")
                .with_details(format!("path={}", self.root.display()))
        })?;
        if manifest.format_version != FORMAT_VERSION {
            return Err(AppError::new("AI_INDEX_LOAD_FAILED", "Unsupported index format version")
                .with_details(format!(
                    "found={}; supported={}",
                    manifest.format_version, FORMAT_VERSION
                )));
        }
        if !same_model(&manifest.embed_model, embed_model) {
            return Err(AppError::new(
                "AI_INDEX_MODEL_MISMATCH",
                "Index was built with a different embedding model; delete it to rebuild",
            )
            .with_details(format!(
                "index_model={}; configured_model={}; path={}",
                manifest.embed_model,
                embed_model,
                self.root.display()
            )));
        }

        let raw = self.read(&self.vectors_path())?;
        let digest = hex::encode(Sha256::digest(&raw));
        if digest != manifest.vectors_sha256 {
            return Err(AppError::new("AI_INDEX_CORRUPT", "Index vectors checksum mismatch")
                .with_details(format!("expected={}; got={}", manifest.vectors_sha256, digest)));
        }
        let vectors = decode_vectors(&raw).ok_or_else(|| {
            AppError::new("AI_INDEX_CORRUPT", "Index vectors file is truncated")
                .with_details(format!("bytes={}", raw.len()))
        })?;

        let chunks_path = self.chunks_path();
        let chunks: Vec<DocumentChunk> = serde_json::from_slice(&self.read(&chunks_path)?)
            .map_err(|e| {
                AppError::new("AI_INDEX_CORRUPT", "Failed to decode index chunks")
                    .with_details(format!("path={}; err={}", chunks_path.display(), e))
            })?;

        let index = VectorIndex::from_parts(manifest, chunks, vectors)?;
        tracing::info!(
            chunks = index.len(),
            model = index.embed_model(),
            path = %self.root.display(),
            "index loaded"
        );
        Ok(index)
    }

    /// Embed the whole corpus and persist it. All-or-nothing: the manifest is
    /// written only after every chunk has been embedded and stored.
    pub fn build(
        &self,
        corpus: &dyn CorpusSource,
        embedder: &dyn Embedder,
        embed_model: &str,
    ) -> Result<VectorIndex, AppError> {
        self.ensure_dirs()?;
        let chunks = corpus.load()?;
        if chunks.is_empty() {
            tracing::warn!(corpus = %corpus.label(), "corpus is empty; building an empty index");
        }

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embedded = embedder.embed_batch(embed_model, EmbedTask::Document, &texts)?;
        if embedded.len() != chunks.len() {
            return Err(AppError::new(
                "AI_INDEX_BUILD_FAILED",
                "Embedder returned a different number of vectors than chunks",
            )
            .with_details(format!("chunks={}; vectors={}", chunks.len(), embedded.len())));
        }

        let dims = embedded.first().map(Vec::len).unwrap_or(0);
        let mut vectors = Vec::with_capacity(dims * embedded.len());
        for (chunk, v) in chunks.iter().zip(embedded) {
            if v.len() != dims || dims == 0 {
                return Err(AppError::new(
                    "AI_INDEX_BUILD_FAILED",
                    "Embedding dimension mismatch across chunks",
                )
                .with_details(format!(
                    "expected={}; got={}; chunk_id={}",
                    dims,
                    v.len(),
                    chunk.id
                )));
            }
            vectors.extend(v);
        }

        let vector_bytes = encode_vectors(&vectors);
        let chunks_json = serde_json::to_vec(&chunks).map_err(|e| {
            AppError::new("AI_INDEX_BUILD_FAILED", "Failed to encode index chunks")
                .with_details(e.to_string())
        })?;
        let built_at = OffsetDateTime::now_utc().format(&Rfc3339).map_err(|e| {
            AppError::new("AI_INDEX_BUILD_FAILED", "Failed to format build time")
                .with_details(e.to_string())
        })?;
        let manifest = IndexManifest {
            format_version: FORMAT_VERSION,
            embed_model: embed_model.to_string(),
            dims: dims as u32,
            chunk_count: chunks.len() as u32,
            corpus: corpus.label(),
            vectors_sha256: hex::encode(Sha256::digest(&vector_bytes)),
            built_at,
        };
        let manifest_json = serde_json::to_vec_pretty(&manifest).map_err(|e| {
            AppError::new("AI_INDEX_BUILD_FAILED", "Failed to encode index manifest")
                .with_details(e.to_string())
        })?;

        self.write_atomic(&self.vectors_path(), &vector_bytes)?;
        self.write_atomic(&self.chunks_path(), &chunks_json)?;
        self.write_atomic(&self.manifest_path(), &manifest_json)?;

        tracing::info!(chunks = chunks.len(), dims, path = %self.root.display(), "index built");
        VectorIndex::from_parts(manifest, chunks, vectors)
    }

    /// Load the persisted index if one exists, otherwise build it once.
    pub fn build_or_load(
        &self,
        corpus: &dyn CorpusSource,
        embedder: &dyn Embedder,
        embed_model: &str,
    ) -> Result<VectorIndex, AppError> {
        if self.exists() {
            return self.load(embed_model);
        }
        tracing::info!(
            path = %self.root.display(),
            "building index (first run); embedding the full corpus, this takes a while"
        );
        self.build(corpus, embedder, embed_model)
    }
}
