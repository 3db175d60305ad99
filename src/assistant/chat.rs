use log::{ debug, error, warn };
use std::sync::Arc;
use crate::config::prompt::PromptConfig;
use crate::llm::chat::CompletionClient;
use crate::models::chat::{ Conversation, TranscriptLine, Turn };

/// Case-insensitive substring allow-list.
#[derive(Debug, Clone)]
pub struct TopicGate {
    topics: Vec<String>,
}

impl TopicGate {
    pub fn new<S: AsRef<str>>(topics: &[S]) -> Self {
        Self {
            topics: topics.iter().map(|t| t.as_ref().to_lowercase()).collect(),
        }
    }

    pub fn allows(&self, input: &str) -> bool {
        let lowered = input.to_lowercase();
        self.topics.iter().any(|topic| lowered.contains(topic.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    /// Blank input; nothing happens.
    Ignored,
    /// Blocked by the gate. The message is shown but not recorded.
    Refused(String),
    /// The user turn was recorded. Render the transcript, then the
    /// placeholder, then call `dispatch`.
    Accepted {
        transcript: Vec<TranscriptLine>,
        placeholder: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Replied(Vec<TranscriptLine>),
    /// Shown in place of the placeholder; the conversation is unchanged.
    Failed(String),
}

/// One chat session. The conversation lives only as long as this value.
pub struct ChatAssistant {
    client: Arc<dyn CompletionClient>,
    prompts: Arc<PromptConfig>,
    gate: TopicGate,
    conversation: Conversation,
}

impl ChatAssistant {
    pub fn new(client: Arc<dyn CompletionClient>, prompts: Arc<PromptConfig>) -> Self {
        let gate = TopicGate::new(prompts.allowed_topics.as_slice());
        Self {
            client,
            prompts,
            gate,
            conversation: Conversation::new(),
        }
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    pub fn transcript(&self) -> Vec<TranscriptLine> {
        self.conversation.turns().iter().map(TranscriptLine::from).collect()
    }

    pub fn submit(&mut self, input: &str) -> Submission {
        let input = input.trim();
        if input.is_empty() {
            return Submission::Ignored;
        }
        if !self.gate.allows(input) {
            debug!("Chat input refused by topic gate");
            return Submission::Refused(self.prompts.refusal_message.clone());
        }

        self.conversation.push(Turn::user(input));
        Submission::Accepted {
            transcript: self.transcript(),
            placeholder: self.prompts.thinking_message.clone(),
        }
    }

    pub async fn dispatch(&mut self) -> Resolution {
        debug!(
            "Sending {} turn(s) to {} ({})",
            self.conversation.len(),
            self.client.get_url(),
            self.client.get_model()
        );
        match self.client.complete(self.conversation.turns()).await {
            Ok(resp) => match resp.content {
                Some(text) => {
                    self.conversation.push(Turn::assistant(text));
                    Resolution::Replied(self.transcript())
                }
                None => {
                    warn!("Chat completion reply had no content");
                    Resolution::Failed(self.prompts.failure_message.clone())
                }
            },
            Err(e) => {
                error!("Chat completion failed: {}", e);
                Resolution::Failed(self.prompts.error_message(&e))
            }
        }
    }
}
