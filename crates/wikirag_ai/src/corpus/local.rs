use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use wikirag_core::domain::DocumentChunk;
use wikirag_core::error::AppError;

use super::{chunk_from_record, CorpusSource};

/// A local export of the corpus: JSON Lines (`.jsonl`) or CSV with
/// `id` and `context` columns.
#[derive(Debug, Clone)]
pub struct LocalCorpusFile {
    path: PathBuf,
}

impl LocalCorpusFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn is_csv(&self) -> bool {
        self.path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("csv"))
    }
}

fn load_failed(path: &Path, message: &str, err: impl std::fmt::Display) -> AppError {
    AppError::new("CORPUS_LOAD_FAILED", message)
        .with_details(format!("path={}; err={}", path.display(), err))
}

fn parse_jsonl(path: &Path, raw: &str) -> Result<Vec<DocumentChunk>, AppError> {
    let mut out = Vec::new();
    for (lineno, line) in raw.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: Value = serde_json::from_str(line).map_err(|e| {
            load_failed(
                path,
                "Invalid JSON line in corpus",
                format!("line {}: {e}", lineno + 1),
            )
        })?;
        if let Some(chunk) = chunk_from_record(&record, || format!("line-{}", lineno + 1)) {
            out.push(chunk);
        }
    }
    Ok(out)
}

fn parse_csv(path: &Path, raw: &str) -> Result<Vec<DocumentChunk>, AppError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(raw.as_bytes());
    let headers = rdr
        .headers()
        .map_err(|e| load_failed(path, "Failed to read corpus CSV headers", e))?
        .clone();
    let col = |name: &str| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(name));
    let context_col = col("context").ok_or_else(|| {
        AppError::new("CORPUS_LOAD_FAILED", "Corpus CSV has no `context` column")
            .with_details(format!("path={}", path.display()))
    })?;
    let id_col = col("id");

    let mut out = Vec::new();
    for (i, rec) in rdr.records().enumerate() {
        let rec = rec.map_err(|e| load_failed(path, "Failed to read corpus CSV row", e))?;
        let mut record = serde_json::Map::new();
        if let Some(text) = rec.get(context_col) {
            record.insert("context".to_string(), Value::String(text.to_string()));
        }
        if let Some(id) = id_col.and_then(|c| rec.get(c)) {
            record.insert("id".to_string(), Value::String(id.to_string()));
        }
        if let Some(chunk) = chunk_from_record(&Value::Object(record), || format!("row-{i}")) {
            out.push(chunk);
        }
    }
    Ok(out)
}

impl CorpusSource for LocalCorpusFile {
    fn label(&self) -> String {
        format!("file:{}", self.path.display())
    }

    fn load(&self) -> Result<Vec<DocumentChunk>, AppError> {
        let raw = fs::read_to_string(&self.path)
            .map_err(|e| load_failed(&self.path, "Failed to read corpus file", e))?;
        let chunks = if self.is_csv() {
            parse_csv(&self.path, &raw)?
        } else {
            parse_jsonl(&self.path, &raw)?
        };
        tracing::info!(path = %self.path.display(), chunks = chunks.len(), "local corpus loaded");
        Ok(chunks)
    }
}
