pub mod chat;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),
    #[error("Invalid API key format: {0}")]
    InvalidApiKey(String),
    #[error("Completion response is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

impl LlmConfig {
    pub fn new(api_url: impl Into<String>, api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.into(),
        }
    }
}
