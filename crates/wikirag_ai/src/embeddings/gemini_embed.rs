use serde::{Deserialize, Serialize};
use wikirag_core::error::AppError;

use super::{EmbedTask, Embedder};
use crate::gemini::GeminiClient;

/// Upper bound on requests per `batchEmbedContents` call.
pub const MAX_BATCH: usize = 100;
const MAX_INPUT_CHARS: usize = 8_000;

#[derive(Debug, Clone)]
pub struct GeminiEmbedder {
    client: GeminiClient,
}

impl GeminiEmbedder {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }
}

#[derive(Debug, Clone, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Clone, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedContentRequest<'a> {
    model: &'a str,
    content: Content<'a>,
    task_type: &'static str,
}

#[derive(Debug, Clone, Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedContentRequest<'a>>,
}

#[derive(Debug, Clone, Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Debug, Clone, Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Debug, Clone, Deserialize)]
struct BatchEmbedResponse {
    #[serde(default)]
    embeddings: Vec<ContentEmbedding>,
}

fn task_type(task: EmbedTask) -> &'static str {
    match task {
        EmbedTask::Document => "RETRIEVAL_DOCUMENT",
        EmbedTask::Query => "RETRIEVAL_QUERY",
    }
}

/// `embedding-001` and `models/embedding-001` name the same model.
fn qualified(model: &str) -> String {
    if model.starts_with("models/") {
        model.to_string()
    } else {
        format!("models/{model}")
    }
}

fn bounded(input: &str) -> &str {
    match input.char_indices().nth(MAX_INPUT_CHARS) {
        Some((idx, _)) => {
            tracing::warn!(
                chars = input.chars().count(),
                limit = MAX_INPUT_CHARS,
                head = %input.chars().take(40).collect::<String>(),
                "embedding input truncated"
            );
            &input[..idx]
        }
        None => input,
    }
}

fn empty_embedding() -> AppError {
    AppError::new("AI_EMBEDDINGS_FAILED", "Embeddings response was empty")
}

/// One vector per request, none of them empty.
fn batch_vectors(requested: usize, resp: BatchEmbedResponse) -> Result<Vec<Vec<f32>>, AppError> {
    if resp.embeddings.len() != requested {
        return Err(AppError::new("AI_EMBEDDINGS_FAILED", "Batch embeddings count mismatch")
            .with_details(format!("requested={requested}; returned={}", resp.embeddings.len())));
    }
    resp.embeddings
        .into_iter()
        .map(|e| {
            if e.values.is_empty() {
                Err(empty_embedding())
            } else {
                Ok(e.values)
            }
        })
        .collect()
}

fn request<'a>(model: &'a str, task: EmbedTask, input: &'a str) -> EmbedContentRequest<'a> {
    EmbedContentRequest {
        model,
        content: Content {
            parts: vec![Part {
                text: bounded(input),
            }],
        },
        task_type: task_type(task),
    }
}

impl Embedder for GeminiEmbedder {
    fn embed(&self, model: &str, task: EmbedTask, input: &str) -> Result<Vec<f32>, AppError> {
        let model = qualified(model);
        let resp: EmbedContentResponse = self.client.post_json(
            &format!("{model}:embedContent"),
            &request(&model, task, input),
            "AI_EMBEDDINGS_FAILED",
        )?;
        if resp.embedding.values.is_empty() {
            return Err(empty_embedding());
        }
        Ok(resp.embedding.values)
    }

    fn embed_batch(
        &self,
        model: &str,
        task: EmbedTask,
        inputs: &[&str],
    ) -> Result<Vec<Vec<f32>>, AppError> {
        let model = qualified(model);
        let mut out = Vec::with_capacity(inputs.len());
        for batch in inputs.chunks(MAX_BATCH) {
            let body = BatchEmbedRequest {
                requests: batch.iter().map(|t| request(&model, task, t)).collect(),
            };
            let resp: BatchEmbedResponse = self.client.post_json(
                &format!("{model}:batchEmbedContents"),
                &body,
                "AI_EMBEDDINGS_FAILED",
            )?;
            out.extend(batch_vectors(batch.len(), resp)?);
            tracing::debug!(done = out.len(), total = inputs.len(), "embedded batch");
        }
        Ok(out)
    }
}
