use std::path::PathBuf;

use crate::domain::PromptLanguage;
use crate::error::AppError;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_EMBED_MODEL: &str = "models/embedding-001";
pub const DEFAULT_DATASET: &str = "Metin/WikiRAG-TR";
pub const DEFAULT_INDEX_DIR: &str = "wiki_index";
pub const DEFAULT_HISTORY_LIMIT: usize = 32;

/// Process configuration. Loaded once at startup, read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_key: String,
    pub api_base: String,
    pub chat_model_override: Option<String>,
    pub embed_model: String,
    pub index_dir: PathBuf,
    pub dataset: String,
    pub corpus_path: Option<PathBuf>,
    pub hf_token: Option<String>,
    pub language: PromptLanguage,
    /// `None` = unbounded.
    pub history_limit: Option<usize>,
    pub max_attempts: u32,
    pub rewrite_queries: bool,
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = get("GOOGLE_API_KEY").ok_or_else(|| {
            AppError::new(
                "CONFIG_MISSING_API_KEY",
                "Set the GOOGLE_API_KEY environment variable",
            )
        })?;

        let language = match get("WIKIRAG_PROMPT_LANG") {
            None => PromptLanguage::default(),
            Some(raw) => PromptLanguage::parse(&raw).ok_or_else(|| {
                AppError::new("CONFIG_INVALID", "Unsupported prompt language")
                    .with_details(format!("WIKIRAG_PROMPT_LANG={raw}; expected en|tr"))
            })?,
        };

        let history_limit = match get("WIKIRAG_HISTORY_LIMIT") {
            None => Some(DEFAULT_HISTORY_LIMIT),
            Some(raw) => {
                let n = parse_number::<usize>("WIKIRAG_HISTORY_LIMIT", &raw)?;
                (n > 0).then_some(n)
            }
        };

        let max_attempts = match get("WIKIRAG_MAX_ATTEMPTS") {
            None => 1,
            Some(raw) => {
                let n = parse_number::<u32>("WIKIRAG_MAX_ATTEMPTS", &raw)?;
                if n == 0 {
                    return Err(AppError::new("CONFIG_INVALID", "Max attempts must be at least 1")
                        .with_details("WIKIRAG_MAX_ATTEMPTS=0"));
                }
                n
            }
        };

        let rewrite_queries = match get("WIKIRAG_REWRITE_QUERIES") {
            None => false,
            Some(raw) => parse_flag("WIKIRAG_REWRITE_QUERIES", &raw)?,
        };

        Ok(Self {
            api_key,
            api_base: get("GOOGLE_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            chat_model_override: get("GOOGLE_LLM"),
            embed_model: get("WIKIRAG_EMBED_MODEL")
                .unwrap_or_else(|| DEFAULT_EMBED_MODEL.to_string()),
            index_dir: get("WIKIRAG_INDEX_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_INDEX_DIR)),
            dataset: get("WIKIRAG_DATASET").unwrap_or_else(|| DEFAULT_DATASET.to_string()),
            corpus_path: get("WIKIRAG_CORPUS_PATH").map(PathBuf::from),
            hf_token: get("HF_TOKEN"),
            language,
            history_limit,
            max_attempts,
            rewrite_queries,
        })
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, AppError> {
    raw.parse::<T>().map_err(|_| {
        AppError::new("CONFIG_INVALID", "Expected a non-negative integer")
            .with_details(format!("{key}={raw}"))
    })
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, AppError> {
    match raw.to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(AppError::new("CONFIG_INVALID", "Expected a boolean flag")
            .with_details(format!("{key}={raw}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn missing_api_key_is_a_configuration_error() {
        let err = Settings::from_lookup(lookup(&[])).expect_err("should fail");
        assert_eq!(err.code, "CONFIG_MISSING_API_KEY");

        let err = Settings::from_lookup(lookup(&[("GOOGLE_API_KEY", "   ")])).expect_err("blank");
        assert_eq!(err.code, "CONFIG_MISSING_API_KEY");
    }

    #[test]
    fn defaults_apply_when_only_the_key_is_set() {
        let s = Settings::from_lookup(lookup(&[("GOOGLE_API_KEY", "k")])).expect("settings");
        assert_eq!(s.api_key, "k");
        assert_eq!(s.chat_model_override, None);
        assert_eq!(s.embed_model, DEFAULT_EMBED_MODEL);
        assert_eq!(s.index_dir, PathBuf::from(DEFAULT_INDEX_DIR));
        assert_eq!(s.dataset, DEFAULT_DATASET);
        assert_eq!(s.language, PromptLanguage::English);
        assert_eq!(s.history_limit, Some(DEFAULT_HISTORY_LIMIT));
        assert_eq!(s.max_attempts, 1);
        assert!(!s.rewrite_queries);
    }

    #[test]
    fn overrides_are_parsed() {
        let s = Settings::from_lookup(lookup(&[
            ("GOOGLE_API_KEY", "k"),
            ("GOOGLE_LLM", "gemini-pro"),
            ("WIKIRAG_PROMPT_LANG", "tr"),
            ("WIKIRAG_HISTORY_LIMIT", "0"),
            ("WIKIRAG_MAX_ATTEMPTS", "3"),
            ("WIKIRAG_REWRITE_QUERIES", "yes"),
        ]))
        .expect("settings");
        assert_eq!(s.chat_model_override.as_deref(), Some("gemini-pro"));
        assert_eq!(s.language, PromptLanguage::Turkish);
        assert_eq!(s.history_limit, None);
        assert_eq!(s.max_attempts, 3);
        assert!(s.rewrite_queries);
    }

    #[test]
    fn rejects_malformed_values() {
        for (key, value) in [
            ("WIKIRAG_PROMPT_LANG", "fr"),
            ("WIKIRAG_HISTORY_LIMIT", "-1"),
            ("WIKIRAG_MAX_ATTEMPTS", "0"),
            ("WIKIRAG_REWRITE_QUERIES", "maybe"),
        ] {
            let err = Settings::from_lookup(lookup(&[("GOOGLE_API_KEY", "k"), (key, value)]))
                .expect_err(key);
            assert_eq!(err.code, "CONFIG_INVALID", "{key}");
        }
    }
}
