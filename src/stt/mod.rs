//! Speech-to-text backend access
//!
//! - `client` - the [`SpeechToText`] seam and its HTTP implementation
//! - `invoker` - batch packaging and result mapping
//! - `messages` - backend response and transcript types

pub mod client;
pub mod invoker;
pub mod messages;

pub use client::{HttpSpeechToText, SpeechToText};
pub use invoker::{BatchJob, BatchTrigger, TranscriptionInvoker};
pub use messages::{SttResponse, SttSegment, TranscriptResult, TranscriptSegment};
