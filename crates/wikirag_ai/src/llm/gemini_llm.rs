use serde::{Deserialize, Serialize};
use wikirag_core::error::AppError;

use super::{ChatRequest, Llm};
use crate::gemini::GeminiClient;

#[derive(Debug, Clone)]
pub struct GeminiLlm {
    client: GeminiClient,
    temperature: f32,
    convert_system_to_human: bool,
}

impl GeminiLlm {
    pub fn new(client: GeminiClient) -> Self {
        Self {
            client,
            temperature: 0.0,
            convert_system_to_human: false,
        }
    }

    /// Fold the system block into the final user message for models that
    /// reject `systemInstruction`.
    pub fn with_system_as_human(mut self, enabled: bool) -> Self {
        self.convert_system_to_human = enabled;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none", default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

fn message(role: &str, text: &str) -> Content {
    Content {
        role: Some(role.to_string()),
        parts: vec![Part {
            text: text.to_string(),
        }],
    }
}

fn build_request(
    req: &ChatRequest<'_>,
    temperature: f32,
    system_as_human: bool,
) -> GenerateRequest {
    let mut contents = Vec::with_capacity(req.history.len() * 2 + 1);
    for turn in req.history {
        contents.push(message("user", &turn.question));
        contents.push(message("model", &turn.answer));
    }

    let system = req.system.trim();
    let system_instruction = if system.is_empty() || system_as_human {
        None
    } else {
        Some(Content {
            role: None,
            parts: vec![Part {
                text: system.to_string(),
            }],
        })
    };
    let human = if system_as_human && !system.is_empty() {
        format!("{system}\n\n{}", req.human)
    } else {
        req.human.to_string()
    };
    contents.push(message("user", &human));

    GenerateRequest {
        system_instruction,
        contents,
        generation_config: GenerationConfig { temperature },
    }
}

fn response_text(resp: GenerateResponse) -> Result<String, AppError> {
    let text = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
        .unwrap_or_default();
    let text = text.trim();
    if text.is_empty() {
        return Err(AppError::new("AI_CHAT_FAILED", "Chat response was empty"));
    }
    Ok(text.to_string())
}

impl Llm for GeminiLlm {
    fn generate(&self, model: &str, req: &ChatRequest<'_>) -> Result<String, AppError> {
        let model = model.trim_start_matches("models/");
        let body = build_request(req, self.temperature, self.convert_system_to_human);
        let resp: GenerateResponse = self.client.post_json(
            &format!("models/{model}:generateContent"),
            &body,
            "AI_CHAT_FAILED",
        )?;
        response_text(resp)
    }
}
