use wikirag_core::config::Settings;
use wikirag_core::domain::AnswerResult;
use wikirag_core::error::AppError;
use wikirag_core::memory::ConversationMemory;

use crate::corpus::{CorpusSource, HfDatasetSource, LocalCorpusFile};
use crate::embeddings::gemini_embed::GeminiEmbedder;
use crate::gemini::GeminiClient;
use crate::index::{IndexStore, VectorIndex};
use crate::llm::gemini_llm::GeminiLlm;
use crate::models::{resolve_chat_model, ModelSelector};
use crate::pipeline::AnswerPipeline;
use crate::prompts::PromptBuilder;
use crate::retrieve::Retriever;
use crate::retry::RetryPolicy;
use crate::rewrite::LlmCondenser;
use std::time::Duration;

/// Long-lived collaborators for one process run, wired from `Settings`.
/// Pipelines borrow from it.
pub struct RagSession {
    settings: Settings,
    llm: GeminiLlm,
    embedder: GeminiEmbedder,
    index: VectorIndex,
    chat_model: String,
}

impl RagSession {
    /// Resolve the chat model, then build or load the index.
    pub fn from_settings(settings: Settings) -> Result<Self, AppError> {
        let retry = RetryPolicy::new(settings.max_attempts, Duration::from_millis(500));
        let client = GeminiClient::new(&settings.api_base, &settings.api_key)?.with_retry(retry);

        let chat_model = resolve_chat_model(
            settings.chat_model_override.as_deref(),
            &ModelSelector::new(&client),
        )?;
        tracing::info!(model = %chat_model, "chat model selected");

        let embedder = GeminiEmbedder::new(client.clone());
        let corpus: Box<dyn CorpusSource> = match &settings.corpus_path {
            Some(path) => Box::new(LocalCorpusFile::new(path.clone())),
            None => Box::new(
                HfDatasetSource::new(&settings.dataset)
                    .with_token(settings.hf_token.clone())
                    .with_retry(retry),
            ),
        };
        let index = IndexStore::open(settings.index_dir.clone()).build_or_load(
            corpus.as_ref(),
            &embedder,
            &settings.embed_model,
        )?;

        Ok(Self {
            llm: GeminiLlm::new(client).with_system_as_human(true),
            embedder,
            index,
            chat_model,
            settings,
        })
    }

    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn pipeline(&self) -> AnswerPipeline<'_> {
        let prompts = PromptBuilder::new(self.settings.language);
        let mut pipeline = AnswerPipeline::new(
            Retriever::new(&self.index, &self.embedder),
            &self.llm,
            &self.chat_model,
        )
        .with_prompts(prompts)
        .with_memory(ConversationMemory::with_limit(self.settings.history_limit));
        if self.settings.rewrite_queries {
            pipeline = pipeline.with_rewriter(Box::new(LlmCondenser::new(
                &self.llm,
                &self.chat_model,
                prompts,
            )));
        }
        pipeline
    }

    /// Answer one question on a fresh pipeline, with no prior history.
    pub fn answer_once(&self, question: &str) -> Result<AnswerResult, AppError> {
        self.pipeline().answer(question)
    }
}
