use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::Config;

/// Configuration for a transcription session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Debounce delay: fragments arriving within this window share one batch
    /// Default: 2 seconds
    pub batch_delay: Duration,

    /// Language hint passed to the speech-to-text backend
    pub language: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            batch_delay: Duration::from_secs(2),
            language: "en".to_string(),
        }
    }
}

impl From<&Config> for SessionConfig {
    fn from(cfg: &Config) -> Self {
        Self {
            batch_delay: Duration::from_millis(cfg.session.batch_delay_ms),
            language: cfg.transcription.language.clone(),
        }
    }
}
