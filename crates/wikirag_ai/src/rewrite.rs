use wikirag_core::domain::ConversationTurn;
use wikirag_core::error::AppError;

use crate::llm::{ChatRequest, Llm};
use crate::prompts::PromptBuilder;

/// Produces the text used as the retrieval key for a turn.
pub trait QueryRewriter {
    fn rewrite(&self, history: &[ConversationTurn], question: &str) -> Result<String, AppError>;
}

impl<T: QueryRewriter + ?Sized> QueryRewriter for &T {
    fn rewrite(&self, history: &[ConversationTurn], question: &str) -> Result<String, AppError> {
        (**self).rewrite(history, question)
    }
}

/// Retrieval keyed by the raw current question.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verbatim;

impl QueryRewriter for Verbatim {
    fn rewrite(&self, _history: &[ConversationTurn], question: &str) -> Result<String, AppError> {
        Ok(question.to_string())
    }
}

/// Asks the chat model to fold the conversation into a standalone question.
pub struct LlmCondenser<'a> {
    llm: &'a dyn Llm,
    model: String,
    prompts: PromptBuilder,
}

impl<'a> LlmCondenser<'a> {
    pub fn new(llm: &'a dyn Llm, model: &str, prompts: PromptBuilder) -> Self {
        Self {
            llm,
            model: model.to_string(),
            prompts,
        }
    }
}

fn transcript(history: &[ConversationTurn]) -> String {
    history
        .iter()
        .map(|t| format!("Human: {}\nAssistant: {}", t.question, t.answer))
        .collect::<Vec<_>>()
        .join("\n")
}

impl QueryRewriter for LlmCondenser<'_> {
    fn rewrite(&self, history: &[ConversationTurn], question: &str) -> Result<String, AppError> {
        if history.is_empty() {
            return Ok(question.to_string());
        }
        let prompt = self.prompts.condense_prompt(&transcript(history), question);
        let standalone = self.llm.generate(
            &self.model,
            &ChatRequest {
                system: "",
                human: &prompt,
                history: &[],
            },
        )?;
        let standalone = standalone.trim();
        tracing::debug!(question, standalone, "condensed follow-up question");
        Ok(if standalone.is_empty() {
            question.to_string()
        } else {
            standalone.to_string()
        })
    }
}
