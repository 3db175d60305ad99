use log::{ error, info, warn };
use serde::Serialize;
use std::sync::Arc;
use crate::config::prompt::PromptConfig;
use crate::llm::chat::CompletionClient;
use crate::models::chat::{ Conversation, Turn };
use crate::models::product::Product;

/// What the routine output area shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "text", rename_all = "snake_case")]
pub enum RoutineOutput {
    Idle,
    Generating(String),
    Ready(String),
    Failed(String),
}

impl RoutineOutput {
    pub fn text(&self) -> &str {
        match self {
            RoutineOutput::Idle => "",
            RoutineOutput::Generating(t) | RoutineOutput::Ready(t) | RoutineOutput::Failed(t) => t.as_str(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Routine {
    pub output: RoutineOutput,
    /// The conversation built for this request, with the assistant turn
    /// appended on success. `None` when the request never left the process.
    pub conversation: Option<Conversation>,
}

#[derive(Clone)]
pub struct RoutineGenerator {
    client: Arc<dyn CompletionClient>,
    prompts: Arc<PromptConfig>,
}

impl RoutineGenerator {
    pub fn new(client: Arc<dyn CompletionClient>, prompts: Arc<PromptConfig>) -> Self {
        Self { client, prompts }
    }

    pub fn generating(&self) -> RoutineOutput {
        RoutineOutput::Generating(self.prompts.generating_message.clone())
    }

    pub fn build_conversation(&self, selection: &[Product]) -> Conversation {
        let product_list = selection
            .iter()
            .map(|p| format!("- {} ({})", p.name, p.brand))
            .collect::<Vec<_>>()
            .join("\n");

        let mut conversation = Conversation::new();
        conversation.push(Turn::system(self.prompts.routine_system_prompt.clone()));
        conversation.push(Turn::user(self.prompts.routine_request(&product_list)));
        conversation
    }

    pub async fn generate(&self, selection: &[Product]) -> Routine {
        if selection.is_empty() {
            return Routine {
                output: RoutineOutput::Failed(self.prompts.empty_selection_message.clone()),
                conversation: None,
            };
        }

        let mut conversation = self.build_conversation(selection);
        info!(
            "Requesting routine for {} product(s) via {}",
            selection.len(),
            self.client.get_url()
        );

        let output = match self.client.complete(conversation.turns()).await {
            Ok(resp) => match resp.content {
                Some(text) => {
                    conversation.push(Turn::assistant(text.clone()));
                    RoutineOutput::Ready(text)
                }
                None => {
                    warn!("Relay reply carried no routine text");
                    RoutineOutput::Failed(self.prompts.failure_message.clone())
                }
            },
            Err(e) => {
                error!("Routine request failed: {}", e);
                RoutineOutput::Failed(self.prompts.error_message(&e))
            }
        };

        Routine { output, conversation: Some(conversation) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::chat::testing::{ RecordingClient, Scripted };
    use crate::models::chat::Role;

    fn selection() -> Vec<Product> {
        serde_json::from_value(serde_json::json!([
            { "id": 1, "name": "Hydrating Cleanser", "brand": "CeraVe" },
            { "id": 2, "name": "Revitalift Serum", "brand": "L'Oréal Paris" }
        ])).unwrap()
    }

    fn generator(client: Arc<RecordingClient>) -> RoutineGenerator {
        RoutineGenerator::new(client, Arc::new(PromptConfig::default()))
    }

    #[tokio::test]
    async fn empty_selection_makes_no_call() {
        let client = RecordingClient::new(Scripted::Reply("unused"));
        let routine = generator(client.clone()).generate(&[]).await;

        assert_eq!(routine.output.text(), "Please select at least one product.");
        assert!(routine.conversation.is_none());
        assert_eq!(client.call_count().await, 0);
    }

    #[tokio::test]
    async fn sends_fresh_two_turn_conversation() {
        let client = RecordingClient::new(Scripted::Reply("1. Cleanse\n2. Apply serum"));
        let routine = generator(client.clone()).generate(&selection()).await;

        assert_eq!(routine.output, RoutineOutput::Ready("1. Cleanse\n2. Apply serum".into()));
        let calls = client.calls.lock().await;
        assert_eq!(calls.len(), 1);
        let sent = &calls[0];
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].role, Role::System);
        assert_eq!(sent[0].content, "You are a helpful skincare and beauty routine assistant.");
        assert_eq!(sent[1].role, Role::User);
        assert!(sent[1].content.contains("- Hydrating Cleanser (CeraVe)\n- Revitalift Serum (L'Oréal Paris)"));

        let conversation = routine.conversation.unwrap();
        assert_eq!(conversation.len(), 3);
        assert_eq!(conversation.turns()[2], Turn::assistant("1. Cleanse\n2. Apply serum"));
    }

    #[tokio::test]
    async fn malformed_reply_shows_generic_message() {
        let client = RecordingClient::new(Scripted::Malformed);
        let routine = generator(client).generate(&selection()).await;
        assert_eq!(routine.output, RoutineOutput::Failed("Sorry, something went wrong. Please try again.".into()));
        assert_eq!(routine.conversation.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn transport_error_is_prefixed() {
        let client = RecordingClient::new(Scripted::Fail);
        let routine = generator(client).generate(&selection()).await;
        assert!(routine.output.text().starts_with("Error: "));
    }
}
