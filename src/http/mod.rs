//! HTTP + WebSocket API
//!
//! This module serves live transcription sessions and read-only status:
//! - GET /ws/transcribe - WebSocket, one transcription session per connection
//! - GET /sessions - List active sessions
//! - GET /sessions/:id/status - Query one session
//! - GET /health - Health check

mod connection;
mod handlers;
pub mod messages;
mod routes;
mod state;

pub use connection::ConnectionHandler;
pub use messages::{AudioChunkMessage, ClientMessage, ServerMessage};
pub use routes::create_router;
pub use state::AppState;
