use std::fmt;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use wikirag_core::error::AppError;

use crate::retry::RetryPolicy;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);
const MAX_ERROR_BODY: usize = 600;

/// Blocking client for the Gemini REST API.
#[derive(Clone)]
pub struct GeminiClient {
    base_url: String,
    api_key: String,
    agent: ureq::Agent,
    retry: RetryPolicy,
}

impl fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("retry", &self.retry)
            .finish()
    }
}

impl GeminiClient {
    /// Create a client. The base URL must be https, or plain http on
    /// `127.0.0.1` for local stand-ins.
    pub fn new(base_url: &str, api_key: &str) -> Result<Self, AppError> {
        let base_url = validate_base_url(base_url)?;
        if api_key.trim().is_empty() {
            return Err(AppError::new(
                "CONFIG_MISSING_API_KEY",
                "Gemini API key must not be empty",
            ));
        }
        Ok(Self {
            base_url,
            api_key: api_key.trim().to_string(),
            agent: ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build(),
            retry: RetryPolicy::fail_fast(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        code: &str,
    ) -> Result<T, AppError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        self.retry.run(path, || {
            let mut req = self.agent.get(&url).set("x-goog-api-key", &self.api_key);
            for (k, v) in query {
                req = req.query(k, v);
            }
            decode_response(req.call(), code)
        })
    }

    pub(crate) fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
        code: &str,
    ) -> Result<T, AppError> {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let payload = serde_json::to_value(body).map_err(|e| {
            AppError::new(code, "Failed to encode request").with_details(e.to_string())
        })?;
        self.retry.run(path, || {
            let resp = self
                .agent
                .post(&url)
                .set("x-goog-api-key", &self.api_key)
                .send_json(payload.clone());
            decode_response(resp, code)
        })
    }
}

fn decode_response<T: DeserializeOwned>(
    resp: Result<ureq::Response, ureq::Error>,
    code: &str,
) -> Result<T, AppError> {
    match resp {
        Ok(r) => r.into_json::<T>().map_err(|e| {
            AppError::new(code, "Failed to decode response").with_details(e.to_string())
        }),
        Err(ureq::Error::Status(status, r)) => {
            let body = r.into_string().unwrap_or_default();
            let body: String = body.chars().take(MAX_ERROR_BODY).collect();
            Err(AppError::new(code, "Request rejected by the API")
                .with_details(format!("status={status}; body={body}"))
                .with_retryable(status == 429 || status >= 500))
        }
        Err(e) => Err(AppError::new(code, "Failed to reach the API")
            .with_details(e.to_string())
            .with_retryable(true)),
    }
}

fn validate_base_url(raw: &str) -> Result<String, AppError> {
    let base_url = raw.trim().trim_end_matches('/').to_string();
    let invalid = || {
        AppError::new(
            "AI_REMOTE_URL_INVALID",
            "API base URL must be https (or http on 127.0.0.1)",
        )
        .with_details(format!("base_url={base_url}"))
    };

    if let Some(rest) = base_url.strip_prefix("https://") {
        let authority = rest.split('/').next().unwrap_or_default();
        if authority.is_empty()
            || authority.contains('@')
            || authority.chars().any(char::is_whitespace)
        {
            return Err(invalid());
        }
        return Ok(base_url);
    }

    if let Some(rest) = base_url.strip_prefix("http://") {
        let authority = rest.split('/').next().unwrap_or_default();
        let ok = match authority.strip_prefix("127.0.0.1") {
            Some("") => true,
            Some(port) => port
                .strip_prefix(':')
                .and_then(|p| p.parse::<u16>().ok())
                .is_some_and(|p| p != 0),
            None => false,
        };
        if ok {
            return Ok(base_url);
        }
    }

    Err(invalid())
}
