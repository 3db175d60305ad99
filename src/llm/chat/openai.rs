use async_trait::async_trait;
use log::{ debug, info, warn };
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION } };
use serde::{ Deserialize, Serialize };

use super::{ CompletionClient, CompletionResponse };
use crate::llm::{ LlmConfig, LlmError };
use crate::models::chat::Turn;

/// Client for any endpoint speaking the OpenAI chat completions shape:
/// the API itself or a relay that forwards to it.
pub struct OpenAIChatClient {
    http: HttpClient,
    model: String,
    url: String,
}

#[derive(Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: &'a [Turn],
}

// Every level is optional: a reply missing any of them is a soft failure,
// not a decode error.
#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Option<Vec<OpenAIChoice>>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: Option<OpenAIMessage>,
}

#[derive(Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

impl OpenAIResponse {
    fn into_content(self) -> Option<String> {
        self.choices?
            .into_iter()
            .next()?
            .message?
            .content
            .filter(|c| !c.is_empty())
    }
}

impl OpenAIChatClient {
    pub fn new(
        api_key: Option<String>,
        model: String,
        url: String,
    ) -> Result<Self, LlmError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(key) = api_key {
            let mut value = HeaderValue::from_str(&format!("Bearer {}", key))
                .map_err(|e| LlmError::InvalidApiKey(e.to_string()))?;
            value.set_sensitive(true);
            headers.insert(AUTHORIZATION, value);
        }

        let http = HttpClient::builder().default_headers(headers).build()?;

        Ok(Self { http, model, url })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        if config.api_key.is_none() {
            info!("No credential configured for {}; requests are sent without Authorization", config.api_url);
        }
        Self::new(config.api_key.clone(), config.model.clone(), config.api_url.clone())
    }
}

#[async_trait]
impl CompletionClient for OpenAIChatClient {
    async fn complete(&self, messages: &[Turn]) -> Result<CompletionResponse, LlmError> {
        let req = OpenAIChatRequest {
            model: &self.model,
            messages,
        };
        debug!("POST {} with {} message(s)", self.url, messages.len());

        // The status is not checked: error bodies without `choices` become
        // soft failures just like any other malformed reply.
        let resp = self.http.post(&self.url).json(&req).send().await?;
        let status = resp.status();
        if !status.is_success() {
            warn!("Completion endpoint {} answered {}", self.url, status);
        }
        let body = resp.text().await?;
        let parsed: OpenAIResponse = serde_json::from_str(&body)?;
        let content = parsed.into_content();
        if content.is_none() {
            warn!("Completion reply from {} had no message content", self.url);
        }

        Ok(CompletionResponse { content })
    }

    fn get_model(&self) -> String {
        self.model.clone()
    }

    fn get_url(&self) -> String {
        self.url.clone()
    }
}
