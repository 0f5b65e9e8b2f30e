use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub transcription: TranscriptionConfig,
    pub session: SessionSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionConfig {
    /// OpenAI-compatible `/audio/transcriptions` URL
    pub endpoint: String,
    pub model: String,
    /// Language hint sent with every request (ISO-639-1)
    pub language: String,
    #[serde(default)]
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// File name and MIME type the audio blob is uploaded as
    pub file_name: String,
    pub mime_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SessionSettings {
    /// Debounce delay between the first fragment and its batch dispatch
    pub batch_delay_ms: u64,
}

impl Config {
    /// Load from a config file (optional) layered under `LOQA_*` environment
    /// variables, falling back to built-in defaults
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .set_default("service.name", "loqa-stream")?
            .set_default("service.http.bind", "0.0.0.0")?
            .set_default("service.http.port", 3030)?
            .set_default(
                "transcription.endpoint",
                "https://api.openai.com/v1/audio/transcriptions",
            )?
            .set_default("transcription.model", "whisper-1")?
            .set_default("transcription.language", "en")?
            .set_default("transcription.timeout_secs", 30)?
            .set_default("transcription.file_name", "audio.webm")?
            .set_default("transcription.mime_type", "audio/webm")?
            .set_default("session.batch_delay_ms", 2000)?
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("LOQA").separator("__"))
            .build()
            .with_context(|| format!("Failed to load config from {}", path))?;

        Ok(settings.try_deserialize()?)
    }
}
