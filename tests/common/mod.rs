// Shared fixtures for session and connection tests
#![allow(dead_code)]

use async_trait::async_trait;
use loqa_stream::http::messages::ServerMessage;
use loqa_stream::{
    AudioFragment, SessionConfig, SpeechToText, SttResponse, TranscriptResult, TranscriptionError,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tokio::sync::mpsc;

/// Fake backend that echoes the batch audio back as the transcript text
///
/// Tracks every call, how many ran concurrently, and can be told to fail
/// specific calls (0-indexed).
pub struct ScriptedBackend {
    latency: Duration,
    fail_calls: HashSet<usize>,
    calls: Mutex<Vec<(Vec<u8>, String)>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
    completed: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::with_latency(Duration::from_millis(0))
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            fail_calls: HashSet::new(),
            calls: Mutex::new(Vec::new()),
            active: AtomicUsize::new(0),
            max_active: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        }
    }

    pub fn failing_on(mut self, call_index: usize) -> Self {
        self.fail_calls.insert(call_index);
        self
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn call_audio(&self, index: usize) -> Vec<u8> {
        self.calls.lock().unwrap()[index].0.clone()
    }

    pub fn call_language(&self, index: usize) -> String {
        self.calls.lock().unwrap()[index].1.clone()
    }

    pub fn max_concurrent(&self) -> usize {
        self.max_active.load(Ordering::SeqCst)
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechToText for ScriptedBackend {
    async fn transcribe(
        &self,
        audio: Vec<u8>,
        language: &str,
    ) -> Result<SttResponse, TranscriptionError> {
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((audio.clone(), language.to_string()));
            calls.len() - 1
        };

        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_active.fetch_max(now_active, Ordering::SeqCst);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        self.active.fetch_sub(1, Ordering::SeqCst);
        self.completed.fetch_add(1, Ordering::SeqCst);

        if self.fail_calls.contains(&index) {
            return Err(TranscriptionError::Status {
                status: 503,
                message: "backend unavailable".to_string(),
            });
        }

        Ok(SttResponse {
            text: String::from_utf8_lossy(&audio).to_string(),
            ..Default::default()
        })
    }
}

pub fn fragment(sequence: u64, payload: &str) -> AudioFragment {
    AudioFragment::new(sequence, payload.as_bytes().to_vec())
}

pub fn session_config() -> SessionConfig {
    SessionConfig {
        batch_delay: Duration::from_secs(2),
        language: "en".to_string(),
    }
}

/// Wait for the next outbound message (paused-clock friendly)
pub async fn next_message(rx: &mut mpsc::UnboundedReceiver<ServerMessage>) -> ServerMessage {
    tokio::time::timeout(Duration::from_secs(60), rx.recv())
        .await
        .expect("timed out waiting for outbound message")
        .expect("outbound channel closed")
}

pub async fn next_result(rx: &mut mpsc::UnboundedReceiver<ServerMessage>) -> TranscriptResult {
    match next_message(rx).await {
        ServerMessage::TranscriptionResult(result) => result,
        other => panic!("expected transcription_result, got {:?}", other),
    }
}

pub async fn next_error(rx: &mut mpsc::UnboundedReceiver<ServerMessage>) -> String {
    match next_message(rx).await {
        ServerMessage::Error { message } => message,
        other => panic!("expected error, got {:?}", other),
    }
}

/// Everything currently queued, without waiting
pub fn drain(rx: &mut mpsc::UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
    let mut messages = Vec::new();
    while let Ok(message) = rx.try_recv() {
        messages.push(message);
    }
    messages
}
