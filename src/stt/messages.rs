use serde::{Deserialize, Serialize};

/// Transcript produced for one batch, as delivered to the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptResult {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segments: Option<Vec<TranscriptSegment>>,
    pub is_final: bool,
    /// Advisory only (0.0 to 1.0)
    pub confidence: f32,
}

/// A time-aligned piece of a transcript, in seconds relative to the batch audio
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Response body of an OpenAI-compatible transcription endpoint
///
/// Works for both `json` (text only) and `verbose_json` response formats.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SttResponse {
    pub text: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub segments: Option<Vec<SttSegment>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SttSegment {
    pub start: f64,
    pub end: f64,
    pub text: String,
    #[serde(default)]
    pub avg_logprob: Option<f64>,
}

impl SttResponse {
    /// Mean per-segment probability derived from `avg_logprob`, or 1.0 when
    /// the backend does not report it
    pub fn confidence(&self) -> f32 {
        let probs: Vec<f64> = self
            .segments
            .iter()
            .flatten()
            .filter_map(|s| s.avg_logprob)
            .map(f64::exp)
            .collect();

        if probs.is_empty() {
            return 1.0;
        }

        let mean = probs.iter().sum::<f64>() / probs.len() as f64;
        mean.clamp(0.0, 1.0) as f32
    }

    /// Convert into a client-facing result, or `None` if nothing was recognized
    pub fn into_result(self, is_final: bool) -> Option<TranscriptResult> {
        let text = self.text.trim();
        if text.is_empty() {
            return None;
        }

        let confidence = self.confidence();
        let segments = self.segments.map(|segments| {
            segments
                .into_iter()
                .map(|s| TranscriptSegment {
                    start: s.start,
                    end: s.end,
                    text: s.text.trim().to_string(),
                })
                .collect()
        });

        Some(TranscriptResult {
            text: text.to_string(),
            segments,
            is_final,
            confidence,
        })
    }
}
