use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::messages::ClientMessage;
use super::state::AppState;
use crate::audio::fragment;
use crate::error::DecodeError;
use crate::session::{
    ResultEmitter, SessionConfig, SessionHandle, SessionStats, TranscriptionSession,
};
use crate::stt::SpeechToText;

/// Transport-facing side of one transcription session
///
/// Translates connection events (open, message, close, error) into session
/// operations. Nothing raised by decoding or transcription escapes it: every
/// failure becomes an `error` message to the client.
pub struct ConnectionHandler {
    session: SessionHandle,
    emitter: ResultEmitter,
    task: JoinHandle<SessionStats>,
}

impl ConnectionHandler {
    /// Start a session for a freshly opened connection and acknowledge it
    pub fn open(
        config: SessionConfig,
        backend: Arc<dyn SpeechToText>,
        emitter: ResultEmitter,
    ) -> Self {
        let session_id = format!("session-{}", uuid::Uuid::new_v4());
        let (session, task) =
            TranscriptionSession::spawn(session_id.clone(), config, backend, emitter.clone());

        emitter.emit_connected(&session_id);

        Self {
            session,
            emitter,
            task,
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn session_id(&self) -> &str {
        self.session.id()
    }

    /// Dispatch one inbound text message by its `type`
    pub fn on_message(&self, text: &str) {
        let message = match serde_json::from_str::<ClientMessage>(text) {
            Ok(message) => message,
            Err(e) => {
                warn!("[{}] Invalid message: {}", self.session_id(), e);
                self.emitter
                    .emit_error(DecodeError::MalformedEnvelope(e.to_string()).to_string());
                return;
            }
        };

        match message {
            ClientMessage::AudioChunk(chunk) => match fragment::decode(&chunk) {
                Ok(fragment) => {
                    if let Err(e) = self.session.push_fragment(fragment) {
                        self.emitter.emit_error(e.to_string());
                    }
                }
                Err(e) => {
                    warn!("[{}] {}", self.session_id(), e);
                    self.session.record_decode_error();
                    self.emitter.emit_error(e.to_string());
                }
            },
            ClientMessage::Finalize => match self.session.request_finalize() {
                // Queued in order; only the wait for the backend runs off the reader
                Ok(done) => {
                    let session_id = self.session_id().to_string();
                    tokio::spawn(async move {
                        if done.await.is_err() {
                            debug!("[{}] Finalize did not complete", session_id);
                        }
                    });
                }
                Err(e) => self.emitter.emit_error(e.to_string()),
            },
            ClientMessage::Ping => self.emitter.emit_pong(),
        }
    }

    pub fn on_binary(&self) {
        self.emitter
            .emit_error("Binary frames are not supported; send JSON text messages");
    }

    /// Transport closed: release the session and wait for it to wind down
    pub async fn on_close(self) -> Option<SessionStats> {
        self.session.close();
        match self.task.await {
            Ok(stats) => Some(stats),
            Err(e) => {
                error!("[{}] Session task panicked: {}", self.session.id(), e);
                None
            }
        }
    }

    pub async fn on_error(self, err: impl std::fmt::Display) -> Option<SessionStats> {
        warn!("[{}] Connection error: {}", self.session_id(), err);
        self.on_close().await
    }
}

/// Serve one upgraded WebSocket until the client goes away
pub async fn serve_socket(socket: WebSocket, state: AppState) {
    let (emitter, mut outbound) = ResultEmitter::channel();
    let connection = ConnectionHandler::open(
        state.session_config.clone(),
        Arc::clone(&state.backend),
        emitter,
    );
    let session_id = connection.session_id().to_string();

    info!("WebSocket connected: {}", session_id);
    state.register(connection.session().clone()).await;

    let (mut ws_tx, mut ws_rx) = socket.split();

    let writer_id = session_id.clone();
    let writer = tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            let text = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(e) => {
                    error!("[{}] Failed to serialize message: {}", writer_id, e);
                    continue;
                }
            };
            if ws_tx.send(Message::Text(text)).await.is_err() {
                debug!("[{}] Socket closed, writer stopping", writer_id);
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    let mut transport_error = None;
    while let Some(frame) = ws_rx.next().await {
        match frame {
            Ok(Message::Text(text)) => connection.on_message(&text),
            Ok(Message::Binary(_)) => connection.on_binary(),
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                transport_error = Some(e);
                break;
            }
        }
    }

    state.unregister(&session_id).await;
    let stats = match transport_error {
        Some(e) => connection.on_error(e).await,
        None => connection.on_close().await,
    };

    // Session task is gone, so its emitter is dropped and the writer drains out
    if let Err(e) = writer.await {
        error!("[{}] Writer task panicked: {}", session_id, e);
    }

    if let Some(stats) = stats {
        info!(
            "WebSocket disconnected: {} ({:.1}s, {} fragments, {} results)",
            session_id, stats.duration_secs, stats.fragments_received, stats.results_emitted
        );
    }
}
