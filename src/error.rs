//! Recoverable error types for transcription sessions
//!
//! None of these ever tear a session down: decode and transcription failures
//! are reported to the client as `error` envelopes and the session keeps going.

use thiserror::Error;

/// A malformed inbound audio fragment
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Malformed message: {0}")]
    MalformedEnvelope(String),

    #[error("Invalid chunk number {0}: must be non-negative")]
    NegativeSequence(i64),

    #[error("Chunk {0} has no audio data")]
    EmptyPayload(u64),

    #[error("Chunk {sequence} audio data is not valid base64: {message}")]
    InvalidBase64 { sequence: u64, message: String },
}

/// A failed call to the speech-to-text backend
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TranscriptionError {
    #[error("Transcription request timed out")]
    Timeout,

    #[error("Transcription service rate limit exceeded")]
    RateLimited,

    #[error("Transcription service returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("Transcription request failed: {0}")]
    Transport(String),

    #[error("Malformed transcription response: {0}")]
    MalformedResponse(String),

    #[error("Transcription task aborted: {0}")]
    Aborted(String),
}

impl From<reqwest::Error> for TranscriptionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TranscriptionError::Timeout
        } else if err.is_decode() {
            TranscriptionError::MalformedResponse(err.to_string())
        } else if let Some(status) = err.status() {
            TranscriptionError::Status {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            TranscriptionError::Transport(err.to_string())
        }
    }
}

/// Errors returned by [`SessionHandle`](crate::session::SessionHandle) operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session {0} is closed")]
    Closed(String),

    #[error("Invalid session transition from {from} on {event}")]
    InvalidTransition { from: String, event: String },
}
