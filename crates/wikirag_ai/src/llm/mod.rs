use wikirag_core::domain::ConversationTurn;
use wikirag_core::error::AppError;

/// One chat call: system instructions, the rendered human turn, and the
/// prior turns the model should condition on.
#[derive(Debug, Clone, Copy)]
pub struct ChatRequest<'a> {
    pub system: &'a str,
    pub human: &'a str,
    pub history: &'a [ConversationTurn],
}

pub trait Llm {
    fn generate(&self, model: &str, req: &ChatRequest<'_>) -> Result<String, AppError>;
}

pub mod gemini_llm;
