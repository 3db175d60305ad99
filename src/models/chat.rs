use serde::{ Serialize, Deserialize };

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// Ordered role-tagged turns, serialized as a bare array for the
/// completion API's `messages` field.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Conversation {
    pub turns: Vec<Turn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TranscriptClass {
    #[serde(rename = "chat-user")]
    User,
    #[serde(rename = "chat-assistant")]
    Assistant,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptLine {
    pub class: TranscriptClass,
    pub content: String,
}

impl From<&Turn> for TranscriptLine {
    fn from(turn: &Turn) -> Self {
        let class = match turn.role {
            Role::User => TranscriptClass::User,
            _ => TranscriptClass::Assistant,
        };
        Self { class, content: turn.content.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conversation_serializes_as_message_array() {
        let mut conversation = Conversation::new();
        conversation.push(Turn::system("persona"));
        conversation.push(Turn::user("hi"));
        let json = serde_json::to_value(&conversation).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                { "role": "system", "content": "persona" },
                { "role": "user", "content": "hi" }
            ])
        );
    }
}
