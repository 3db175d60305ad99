pub mod openai;

use async_trait::async_trait;
use std::sync::Arc;
use super::{ LlmConfig, LlmError };
use self::openai::OpenAIChatClient;
use crate::models::chat::Turn;

/// Outcome of a completion round trip that reached the endpoint and
/// returned JSON. `content` is `None` when the reply lacks a non-empty
/// `choices[0].message.content`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResponse {
    pub content: Option<String>,
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, messages: &[Turn]) -> Result<CompletionResponse, LlmError>;

    fn get_model(&self) -> String;
    fn get_url(&self) -> String;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn CompletionClient>, LlmError> {
    let client = OpenAIChatClient::from_config(config)?;
    Ok(Arc::new(client))
}
