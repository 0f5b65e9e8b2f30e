use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::SessionState;

/// Statistics about a transcription session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionStats {
    pub session_id: String,

    /// Current lifecycle state
    pub state: SessionState,

    /// When the connection was opened
    pub started_at: DateTime<Utc>,

    /// Total duration in seconds
    pub duration_secs: f64,

    /// Audio fragments accepted into the buffer
    pub fragments_received: usize,

    /// Payload bytes accepted into the buffer
    pub bytes_received: usize,

    /// Arrival time of the most recent accepted fragment
    pub last_fragment_at: Option<DateTime<Utc>>,

    /// Batches handed to the speech-to-text backend (final one included)
    pub batches_dispatched: usize,

    /// Batches that failed; their audio is not retried
    pub batches_failed: usize,

    /// Transcripts delivered to the client
    pub results_emitted: usize,

    /// Inbound fragments rejected as malformed
    pub decode_errors: usize,
}

impl SessionStats {
    pub fn new(session_id: String) -> Self {
        Self {
            session_id,
            state: SessionState::Open,
            started_at: Utc::now(),
            duration_secs: 0.0,
            fragments_received: 0,
            bytes_received: 0,
            last_fragment_at: None,
            batches_dispatched: 0,
            batches_failed: 0,
            results_emitted: 0,
            decode_errors: 0,
        }
    }

    /// Copy with `duration_secs` brought up to date
    pub fn snapshot(&self) -> Self {
        let duration = Utc::now().signed_duration_since(self.started_at);
        Self {
            duration_secs: duration.num_milliseconds() as f64 / 1000.0,
            ..self.clone()
        }
    }
}
