use serde::{Deserialize, Serialize};

/// Number of passages retrieved per question.
pub const TOP_K: usize = 5;

/// One retrievable unit of corpus text. `id` is carried as metadata only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentChunk {
    pub id: String,
    pub text: String,
}

impl DocumentChunk {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationTurn {
    pub question: String,
    pub answer: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub answer: String,
    pub source_chunks: Vec<DocumentChunk>,
}

/// Language of the prompt contract (instructions, greeting set, unknown token).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum PromptLanguage {
    #[default]
    English,
    Turkish,
}

impl PromptLanguage {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "en" | "english" => Some(Self::English),
            "tr" | "turkish" | "türkçe" => Some(Self::Turkish),
            _ => None,
        }
    }
}
