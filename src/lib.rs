pub mod audio;
pub mod config;
pub mod error;
pub mod http;
pub mod session;
pub mod stt;

pub use audio::{AudioFragment, SessionBuffer};
pub use config::Config;
pub use error::{DecodeError, SessionError, TranscriptionError};
pub use http::{create_router, AppState, ClientMessage, ConnectionHandler, ServerMessage};
pub use session::{
    BatchScheduler, ResultEmitter, SessionConfig, SessionHandle, SessionState, SessionStats,
    TranscriptionSession,
};
pub use stt::{
    BatchJob, BatchTrigger, HttpSpeechToText, SpeechToText, SttResponse, TranscriptResult,
    TranscriptSegment, TranscriptionInvoker,
};
