use base64::Engine;
use chrono::{DateTime, Utc};

use crate::error::DecodeError;
use crate::http::messages::AudioChunkMessage;

/// One unit of compressed audio received from the client
///
/// The payload is opaque: it is never decoded as audio, only concatenated
/// with its neighbours and handed to the speech-to-text backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFragment {
    sequence_number: u64,
    payload: Vec<u8>,
    received_at: DateTime<Utc>,
}

impl AudioFragment {
    pub fn new(sequence_number: u64, payload: Vec<u8>) -> Self {
        Self {
            sequence_number,
            payload,
            received_at: Utc::now(),
        }
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }
}

/// Decode an inbound `audio_chunk` envelope into an [`AudioFragment`]
///
/// Accepts plain standard-alphabet base64 as well as browser data URLs
/// (`data:audio/webm;base64,...`).
pub fn decode(message: &AudioChunkMessage) -> Result<AudioFragment, DecodeError> {
    if message.chunk_number < 0 {
        return Err(DecodeError::NegativeSequence(message.chunk_number));
    }
    let sequence = message.chunk_number as u64;

    let encoded = strip_data_url(message.audio_data.trim());
    if encoded.is_empty() {
        return Err(DecodeError::EmptyPayload(sequence));
    }

    let payload = base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| DecodeError::InvalidBase64 {
            sequence,
            message: e.to_string(),
        })?;

    if payload.is_empty() {
        return Err(DecodeError::EmptyPayload(sequence));
    }

    Ok(AudioFragment::new(sequence, payload))
}

fn strip_data_url(encoded: &str) -> &str {
    if encoded.starts_with("data:") {
        match encoded.find(";base64,") {
            Some(idx) => &encoded[idx + ";base64,".len()..],
            None => encoded,
        }
    } else {
        encoded
    }
}
