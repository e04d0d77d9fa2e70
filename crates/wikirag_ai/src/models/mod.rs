use serde::Deserialize;
use wikirag_core::error::AppError;

use crate::gemini::GeminiClient;

/// Fast/cheap first, larger models later.
pub const PREFERRED_MODELS: [&str; 4] = [
    "gemini-1.5-flash-latest",
    "gemini-1.5-pro-latest",
    "gemini-1.0-pro",
    "gemini-pro",
];

const DISALLOWED_SUBSTRINGS: [&str; 3] = ["vision", "translate", "deprecated"];
const GENERATE_CONTENT: &str = "generateContent";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    /// Bare id, without the `models/` prefix.
    pub name: String,
    pub supported_generation_methods: Vec<String>,
}

impl ModelInfo {
    pub fn new(name: &str, methods: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            supported_generation_methods: methods.iter().map(|m| m.to_string()).collect(),
        }
    }
}

pub trait ModelCatalog {
    fn list_models(&self) -> Result<Vec<ModelInfo>, AppError>;
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireModel {
    name: String,
    #[serde(default)]
    supported_generation_methods: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ModelsPage {
    #[serde(default)]
    models: Vec<WireModel>,
    #[serde(default)]
    next_page_token: Option<String>,
}

impl From<WireModel> for ModelInfo {
    fn from(m: WireModel) -> Self {
        Self {
            name: m.name.trim_start_matches("models/").to_string(),
            supported_generation_methods: m.supported_generation_methods,
        }
    }
}

/// Follow `nextPageToken` until the listing ends; an empty token ends it too.
fn collect_models(
    mut fetch: impl FnMut(Option<&str>) -> Result<ModelsPage, AppError>,
) -> Result<Vec<ModelInfo>, AppError> {
    let mut out = Vec::new();
    let mut token: Option<String> = None;
    loop {
        let page = fetch(token.as_deref())?;
        out.extend(page.models.into_iter().map(ModelInfo::from));
        match page.next_page_token.filter(|t| !t.is_empty()) {
            Some(t) => token = Some(t),
            None => return Ok(out),
        }
    }
}

impl ModelCatalog for GeminiClient {
    fn list_models(&self) -> Result<Vec<ModelInfo>, AppError> {
        collect_models(|token| {
            let mut query = vec![("pageSize", "1000")];
            if let Some(t) = token {
                query.push(("pageToken", t));
            }
            self.get_json("models", &query, "AI_MODELS_LIST_FAILED")
        })
    }
}

/// Chat-capable, text-only models in listing order.
pub fn allowed_models(models: &[ModelInfo]) -> Vec<String> {
    models
        .iter()
        .filter(|m| m.supported_generation_methods.iter().any(|g| g == GENERATE_CONTENT))
        .filter(|m| {
            let lower = m.name.to_lowercase();
            !DISALLOWED_SUBSTRINGS.iter().any(|bad| lower.contains(bad))
        })
        .map(|m| m.name.clone())
        .collect()
}

pub struct ModelSelector<'a> {
    catalog: &'a dyn ModelCatalog,
    preferences: Vec<String>,
}

impl<'a> ModelSelector<'a> {
    pub fn new(catalog: &'a dyn ModelCatalog) -> Self {
        Self::with_preferences(catalog, &PREFERRED_MODELS)
    }

    pub fn with_preferences(catalog: &'a dyn ModelCatalog, preferences: &[&str]) -> Self {
        Self {
            catalog,
            preferences: preferences.iter().map(|p| p.to_string()).collect(),
        }
    }

    /// First preferred model that is available; otherwise the
    /// lexicographically smallest allowed id.
    pub fn choose_model(&self) -> Result<String, AppError> {
        let allowed = allowed_models(&self.catalog.list_models()?);
        if let Some(p) = self.preferences.iter().find(|p| allowed.contains(p)) {
            return Ok(p.clone());
        }
        allowed.into_iter().min().ok_or_else(|| {
            AppError::new("AI_NO_USABLE_MODEL", "No chat-capable model is available")
        })
    }
}

/// An explicit override wins without contacting the catalog.
pub fn resolve_chat_model(
    override_name: Option<&str>,
    selector: &ModelSelector<'_>,
) -> Result<String, AppError> {
    match override_name.map(str::trim).filter(|s| !s.is_empty()) {
        Some(name) => Ok(name.trim_start_matches("models/").to_string()),
        None => selector.choose_model(),
    }
}
