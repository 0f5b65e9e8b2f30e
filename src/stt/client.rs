use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use super::messages::SttResponse;
use crate::config::TranscriptionConfig;
use crate::error::TranscriptionError;

/// External speech-to-text capability
///
/// Takes one opaque audio blob plus a language hint and returns the full text
/// with optional time-aligned segments.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        language: &str,
    ) -> std::result::Result<SttResponse, TranscriptionError>;
}

/// Client for OpenAI-compatible `/audio/transcriptions` endpoints
pub struct HttpSpeechToText {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    file_name: String,
    mime_type: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl HttpSpeechToText {
    pub fn new(config: &TranscriptionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        info!(
            "Speech-to-text backend: {} (model={}, timeout={}s)",
            config.endpoint, config.model, config.timeout_secs
        );

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
            file_name: config.file_name.clone(),
            mime_type: config.mime_type.clone(),
        })
    }

    async fn error_from_response(response: reqwest::Response) -> TranscriptionError {
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return TranscriptionError::RateLimited;
        }

        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
            Ok(parsed) => parsed.error.message,
            Err(_) if body.is_empty() => status
                .canonical_reason()
                .unwrap_or("unknown error")
                .to_string(),
            Err(_) => body,
        };

        TranscriptionError::Status {
            status: status.as_u16(),
            message,
        }
    }
}

#[async_trait]
impl SpeechToText for HttpSpeechToText {
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        language: &str,
    ) -> std::result::Result<SttResponse, TranscriptionError> {
        let audio_len = audio.len();

        let part = reqwest::multipart::Part::bytes(audio)
            .file_name(self.file_name.clone())
            .mime_str(&self.mime_type)
            .map_err(|e| TranscriptionError::Transport(e.to_string()))?;

        let form = reqwest::multipart::Form::new()
            .text("model", self.model.clone())
            .text("language", language.to_string())
            .text("response_format", "verbose_json")
            .part("file", part);

        let mut request = self.client.post(&self.endpoint).multipart(form);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        debug!("Sending {} bytes to {}", audio_len, self.endpoint);

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let body = response.text().await?;
        serde_json::from_str::<SttResponse>(&body)
            .map_err(|e| TranscriptionError::MalformedResponse(e.to_string()))
    }
}
