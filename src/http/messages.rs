use serde::{Deserialize, Serialize};

use crate::stt::TranscriptResult;

/// Messages sent by the client over the WebSocket
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    AudioChunk(AudioChunkMessage),
    Finalize,
    Ping,
}

/// A single compressed audio fragment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioChunkMessage {
    pub chunk_number: i64,
    #[serde(default)]
    pub audio_data: String, // Base64-encoded (optionally as a data URL)
}

/// Messages sent to the client over the WebSocket
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Connection {
        status: String,
        #[serde(rename = "sessionId")]
        session_id: String,
    },
    TranscriptionResult(TranscriptResult),
    Error {
        message: String,
    },
    Pong,
}

impl ServerMessage {
    pub fn connected(session_id: &str) -> Self {
        ServerMessage::Connection {
            status: "connected".to_string(),
            session_id: session_id.to_string(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error {
            message: message.into(),
        }
    }
}
