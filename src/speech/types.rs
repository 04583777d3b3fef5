//! Shared types for both speech transports.

use serde::{Deserialize, Serialize};

/// One transcript segment, whether produced by the batch or the streaming
/// transport. `is_final` distinguishes a settled utterance from an interim
/// hypothesis that may still change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    pub confidence: f32,
    pub is_final: bool,
    pub duration_ms: u64,
}

/// An event surfaced by a live stream, richer than a plain transcript
/// because AMD and barge-in logic both need to react to speech timing,
/// not just to finished text.
#[derive(Debug, Clone)]
pub enum StreamEvent {
    SpeechStart,
    /// Speech ended after being continuously detected for `duration_ms`.
    SpeechEnd { duration_ms: u64 },
    Transcript(Transcript),
    Error(String),
}
