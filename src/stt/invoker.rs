use std::sync::Arc;
use tracing::{info, warn};

use super::client::SpeechToText;
use super::messages::TranscriptResult;
use crate::audio::AudioFragment;
use crate::error::TranscriptionError;

/// What caused a batch to be dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchTrigger {
    Timer,
    Finalize,
}

/// A contiguous, ordered set of fragments submitted together
#[derive(Debug, Clone)]
pub struct BatchJob {
    fragments: Vec<AudioFragment>,
    trigger: BatchTrigger,
}

impl BatchJob {
    /// Non-final batch over the fragments drained from the pending buffer
    pub fn timer(fragments: Vec<AudioFragment>) -> Self {
        Self {
            fragments,
            trigger: BatchTrigger::Timer,
        }
    }

    /// Final batch over the whole cumulative buffer
    pub fn finalize(fragments: Vec<AudioFragment>) -> Self {
        Self {
            fragments,
            trigger: BatchTrigger::Finalize,
        }
    }

    pub fn fragments(&self) -> &[AudioFragment] {
        &self.fragments
    }

    pub fn trigger(&self) -> BatchTrigger {
        self.trigger
    }

    pub fn is_final(&self) -> bool {
        self.trigger == BatchTrigger::Finalize
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Payloads concatenated in sequence-number order
    ///
    /// The sort is stable, so fragments sharing a sequence number keep their
    /// arrival order.
    pub fn audio_blob(&self) -> Vec<u8> {
        let mut ordered: Vec<&AudioFragment> = self.fragments.iter().collect();
        ordered.sort_by_key(|f| f.sequence_number());

        let total = ordered.iter().map(|f| f.len()).sum();
        let mut blob = Vec::with_capacity(total);
        for fragment in ordered {
            blob.extend_from_slice(fragment.payload());
        }
        blob
    }
}

/// Drives the speech-to-text backend for one batch at a time
#[derive(Clone)]
pub struct TranscriptionInvoker {
    backend: Arc<dyn SpeechToText>,
    language: String,
}

impl TranscriptionInvoker {
    pub fn new(backend: Arc<dyn SpeechToText>, language: impl Into<String>) -> Self {
        Self {
            backend,
            language: language.into(),
        }
    }

    /// Transcribe one batch
    ///
    /// Returns `Ok(None)` when the backend recognized nothing, or without any
    /// request when the batch is empty. Otherwise exactly one backend request
    /// is made; failures are not retried.
    pub async fn invoke(
        &self,
        job: &BatchJob,
    ) -> Result<Option<TranscriptResult>, TranscriptionError> {
        if job.is_empty() {
            warn!("Skipping empty batch (final={})", job.is_final());
            return Ok(None);
        }

        let audio = job.audio_blob();
        info!(
            "Transcribing batch: {} fragments, {} bytes (final={})",
            job.fragments().len(),
            audio.len(),
            job.is_final()
        );

        match self.backend.transcribe(audio, &self.language).await {
            Ok(response) => Ok(response.into_result(job.is_final())),
            Err(e) => {
                warn!("Transcription failed: {}", e);
                Err(e)
            }
        }
    }
}
