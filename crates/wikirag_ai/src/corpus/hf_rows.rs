use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use wikirag_core::domain::DocumentChunk;
use wikirag_core::error::AppError;

use super::{chunk_from_record, CorpusSource};
use crate::retry::RetryPolicy;

const ROWS_ENDPOINT: &str = "https://datasets-server.huggingface.co/rows";
const PAGE_SIZE: usize = 100;

/// The `train` split of a Hugging Face dataset, read through the public
/// datasets-server rows API.
#[derive(Debug, Clone)]
pub struct HfDatasetSource {
    dataset: String,
    split: String,
    token: Option<String>,
    retry: RetryPolicy,
}

impl HfDatasetSource {
    pub fn new(dataset: &str) -> Self {
        Self {
            dataset: dataset.to_string(),
            split: "train".to_string(),
            token: None,
            retry: RetryPolicy::fail_fast(),
        }
    }

    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    fn fetch_page(&self, offset: usize) -> Result<RowsPage, AppError> {
        self.retry.run("datasets-server rows", || {
            let mut req = ureq::get(ROWS_ENDPOINT)
                .timeout(Duration::from_secs(60))
                .query("dataset", &self.dataset)
                .query("config", "default")
                .query("split", &self.split)
                .query("offset", &offset.to_string())
                .query("length", &PAGE_SIZE.to_string());
            if let Some(token) = &self.token {
                req = req.set("Authorization", &format!("Bearer {token}"));
            }
            match req.call() {
                Ok(r) => r.into_json::<RowsPage>().map_err(|e| {
                    AppError::new("CORPUS_LOAD_FAILED", "Failed to decode dataset rows")
                        .with_details(format!("offset={offset}; err={e}"))
                }),
                Err(ureq::Error::Status(status, _)) => Err(AppError::new(
                    "CORPUS_LOAD_FAILED",
                    "Dataset server rejected the rows request",
                )
                .with_details(format!("dataset={}; offset={offset}; status={status}", self.dataset))
                .with_retryable(status == 429 || status >= 500)),
                Err(e) => Err(AppError::new("CORPUS_LOAD_FAILED", "Failed to reach dataset server")
                    .with_details(e.to_string())
                    .with_retryable(true)),
            }
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RowEntry {
    row_idx: u64,
    row: Value,
    #[serde(default)]
    truncated_cells: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RowsPage {
    #[serde(default)]
    rows: Vec<RowEntry>,
    num_rows_total: usize,
}

fn page_chunks(page: &RowsPage) -> Vec<DocumentChunk> {
    page.rows
        .iter()
        .filter_map(|r| {
            if r.truncated_cells.iter().any(|c| c == "context") {
                tracing::warn!(row_idx = r.row_idx, "dataset server truncated row context");
            }
            chunk_from_record(&r.row, || format!("row-{}", r.row_idx))
        })
        .collect()
}

/// Page through the split until `num_rows_total` rows are read or a page
/// comes back empty.
fn collect_rows(
    mut fetch: impl FnMut(usize) -> Result<RowsPage, AppError>,
) -> Result<Vec<DocumentChunk>, AppError> {
    let mut out = Vec::new();
    let mut offset = 0usize;
    loop {
        let page = fetch(offset)?;
        out.extend(page_chunks(&page));
        offset += page.rows.len();
        if page.rows.is_empty() || offset >= page.num_rows_total {
            return Ok(out);
        }
        if offset % (PAGE_SIZE * 20) == 0 {
            tracing::info!(offset, total = page.num_rows_total, "loading dataset rows");
        }
    }
}

impl CorpusSource for HfDatasetSource {
    fn label(&self) -> String {
        format!("hf:{}/{}", self.dataset, self.split)
    }

    fn load(&self) -> Result<Vec<DocumentChunk>, AppError> {
        let out = collect_rows(|offset| self.fetch_page(offset))?;
        tracing::info!(dataset = %self.dataset, chunks = out.len(), "dataset loaded");
        Ok(out)
    }
}
