use tokio::sync::mpsc;
use tracing::debug;

use crate::http::messages::ServerMessage;
use crate::stt::TranscriptResult;

/// Writes outbound messages onto a connection
///
/// Cloneable; every clone feeds the same connection writer. Sends after the
/// connection has gone away are dropped silently.
#[derive(Debug, Clone)]
pub struct ResultEmitter {
    tx: mpsc::UnboundedSender<ServerMessage>,
}

impl ResultEmitter {
    pub fn new(tx: mpsc::UnboundedSender<ServerMessage>) -> Self {
        Self { tx }
    }

    /// Create an emitter together with the receiving end the connection
    /// writer drains
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ServerMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }

    pub fn emit(&self, message: ServerMessage) {
        if self.tx.send(message).is_err() {
            debug!("Connection closed, dropping outbound message");
        }
    }

    pub fn emit_result(&self, result: TranscriptResult) {
        self.emit(ServerMessage::TranscriptionResult(result));
    }

    pub fn emit_error(&self, message: impl Into<String>) {
        self.emit(ServerMessage::error(message));
    }

    pub fn emit_pong(&self) {
        self.emit(ServerMessage::Pong);
    }

    pub fn emit_connected(&self, session_id: &str) {
        self.emit(ServerMessage::connected(session_id));
    }
}
