//! A single objection/rebuttal entry as loaded from a theme's library.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectionEntry {
    pub id: String,
    /// Example phrasings of the objection, used as scoring anchors.
    pub trigger_phrases: Vec<String>,
    /// Path to the audio file played as the rebuttal.
    pub rebuttal_audio: String,
    /// Step id to route to if this objection recurs past the retry limit.
    pub escalation_step: Option<String>,
}
