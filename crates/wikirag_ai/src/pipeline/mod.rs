use wikirag_core::domain::{AnswerResult, ConversationTurn};
use wikirag_core::error::AppError;
use wikirag_core::memory::ConversationMemory;

use crate::llm::{ChatRequest, Llm};
use crate::prompts::PromptBuilder;
use crate::retrieve::Retriever;
use crate::rewrite::{QueryRewriter, Verbatim};

/// The single coordination point between retrieval, prompting, the chat
/// model and conversation memory. One instance per session.
pub struct AnswerPipeline<'a> {
    retriever: Retriever<'a>,
    llm: &'a dyn Llm,
    chat_model: String,
    prompts: PromptBuilder,
    rewriter: Box<dyn QueryRewriter + 'a>,
    memory: ConversationMemory,
}

impl<'a> AnswerPipeline<'a> {
    pub fn new(retriever: Retriever<'a>, llm: &'a dyn Llm, chat_model: &str) -> Self {
        Self {
            retriever,
            llm,
            chat_model: chat_model.to_string(),
            prompts: PromptBuilder::default(),
            rewriter: Box::new(Verbatim),
            memory: ConversationMemory::new(),
        }
    }

    pub fn with_prompts(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn with_rewriter(mut self, rewriter: Box<dyn QueryRewriter + 'a>) -> Self {
        self.rewriter = rewriter;
        self
    }

    pub fn with_memory(mut self, memory: ConversationMemory) -> Self {
        self.memory = memory;
        self
    }

    pub fn chat_model(&self) -> &str {
        &self.chat_model
    }

    pub fn history(&self) -> &[ConversationTurn] {
        self.memory.history()
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    /// Answer one question. Any collaborator failure aborts the turn and
    /// leaves memory untouched.
    pub fn answer(&mut self, question: &str) -> Result<AnswerResult, AppError> {
        let question = question.trim();
        let history = self.memory.history();

        let query = self.rewriter.rewrite(history, question)?;
        let chunks = self.retriever.retrieve(&query)?;
        let prompt = self.prompts.render(&chunks, question);

        let answer = self.llm.generate(
            &self.chat_model,
            &ChatRequest {
                system: &prompt.system,
                human: &prompt.human,
                history,
            },
        )?;

        self.memory.append(ConversationTurn {
            question: question.to_string(),
            answer: answer.clone(),
        });
        tracing::debug!(
            turns = self.memory.total_turns(),
            sources = chunks.len(),
            "answered question"
        );

        Ok(AnswerResult {
            answer,
            source_chunks: chunks,
        })
    }
}
