use serde::{ Serialize, Deserialize };
use crate::models::chat::TranscriptLine;

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "chat")] Chat {
        content: String,
    },
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Full re-render of the chat transcript.
    #[serde(rename = "transcript")] Transcript {
        lines: Vec<TranscriptLine>,
        timestamp: i64,
    },
    /// Transient placeholder shown while a completion is in flight.
    #[serde(rename = "thinking")] Thinking {
        content: String,
    },
    /// A one-off assistant line outside the conversation (refusals, failures).
    #[serde(rename = "notice")] Notice {
        content: String,
    },
    #[serde(rename = "error")] Error {
        message: String,
    },
}
