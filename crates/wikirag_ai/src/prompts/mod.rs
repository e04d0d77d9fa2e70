use wikirag_core::domain::{DocumentChunk, PromptLanguage};

mod templates;

/// Rendered chat input: system rules plus the human turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: String,
    pub human: String,
}

/// Stateless renderer of the fixed two-part prompt.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PromptBuilder {
    language: PromptLanguage,
}

impl PromptBuilder {
    pub fn new(language: PromptLanguage) -> Self {
        Self { language }
    }

    pub fn language(&self) -> PromptLanguage {
        self.language
    }

    pub fn system_prompt(&self) -> &'static str {
        match self.language {
            PromptLanguage::English => templates::SYSTEM_EN.trim(),
            PromptLanguage::Turkish => templates::SYSTEM_TR.trim(),
        }
    }

    /// Bare greetings the model is told to answer without context.
    pub fn greetings(&self) -> &'static [&'static str] {
        match self.language {
            PromptLanguage::English => &templates::GREETINGS_EN,
            PromptLanguage::Turkish => &templates::GREETINGS_TR,
        }
    }

    /// Exact answer the model must give when the context lacks the answer.
    pub fn unknown_answer(&self) -> &'static str {
        match self.language {
            PromptLanguage::English => templates::UNKNOWN_EN,
            PromptLanguage::Turkish => templates::UNKNOWN_TR,
        }
    }

    pub fn help_offer(&self) -> &'static str {
        match self.language {
            PromptLanguage::English => templates::HELP_OFFER_EN,
            PromptLanguage::Turkish => templates::HELP_OFFER_TR,
        }
    }

    pub fn render(&self, context: &[DocumentChunk], question: &str) -> RenderedPrompt {
        let joined = context
            .iter()
            .map(|c| c.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let human = match self.language {
            PromptLanguage::English => templates::human_en(&joined, question),
            PromptLanguage::Turkish => templates::human_tr(&joined, question),
        };
        RenderedPrompt {
            system: self.system_prompt().to_string(),
            human,
        }
    }

    /// Instruction asking the model to rewrite a follow-up as a standalone question.
    pub fn condense_prompt(&self, history: &str, question: &str) -> String {
        templates::condense(history, question)
    }
}
