//! Transcription session management
//!
//! This module provides the `TranscriptionSession` actor that manages:
//! - Buffering of incoming audio fragments (pending + cumulative)
//! - Debounced batch dispatch to the speech-to-text backend
//! - The session state machine (open, batching, finalizing, closed)
//! - Delivery of incremental and final transcripts to the client

mod config;
mod emitter;
mod scheduler;
mod session;
mod state;
mod stats;

pub use config::SessionConfig;
pub use emitter::ResultEmitter;
pub use scheduler::BatchScheduler;
pub use session::{SessionHandle, TranscriptionSession};
pub use state::{SessionState, StateEvent};
pub use stats::SessionStats;
