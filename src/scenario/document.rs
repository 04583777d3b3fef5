//! Scenario document data model (spec §3, §4.6): a directed graph of steps,
//! each playing one audio source, then routing on the caller's response.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::nlu::intent::IntentDefinition;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AudioSource {
    File { path: String },
    Tts { text: String, voice: Option<String> },
}

/// A side effect fired when a step is reached, dispatched through the
/// `ActionExecutor` seam rather than executed inline (spec §6).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Transfer { extension: String, context: String },
    Webhook { url: String, payload: serde_json::Value },
    SendEmail { template: String },
    UpdateCrm { fields: HashMap<String, String> },
    Hangup,
}

/// One node in the scenario graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioStep {
    pub id: String,
    pub audio: AudioSource,
    /// Caller-response intents routable from this step, in priority order.
    #[serde(default)]
    pub intents: Vec<IntentDefinition>,
    /// Map of intent name -> next step id.
    #[serde(default)]
    pub routing: HashMap<String, String>,
    /// Step reached when no intent matches and the step has no inline
    /// objection handling, or when the objection retry budget is spent.
    pub fallback_step: Option<String>,
    /// Step reached if the caller stays silent past `waiting_silence_threshold_ms`.
    pub silence_step: Option<String>,
    /// Points added to the qualification score when this step is reached.
    #[serde(default)]
    pub qualification_points: f64,
    /// Side effects fired on entering this step.
    #[serde(default)]
    pub actions: Vec<Action>,
    /// Steps with no outgoing routing are call-ending terminals.
    #[serde(default)]
    pub terminal: bool,
    /// How long Waiting holds this step open for a reply before routing
    /// on silence (spec §4.6.4).
    #[serde(default = "default_step_timeout_ms")]
    pub timeout_ms: u64,
    /// Whether Playing opens a streaming ASR session and listens for
    /// barge-in while this step's prompt plays (spec §4.6.3).
    #[serde(default)]
    pub barge_in_enabled: bool,
    /// Objection-rebuttal turns allowed on this step before escalating.
    /// 0 means the objection loop never runs here — objections route via
    /// this step's own `routing["objection"]` entry instead (spec §9).
    #[serde(default)]
    pub max_autonomous_turns: u32,
}

fn default_step_timeout_ms() -> u64 {
    10_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualificationConfig {
    pub threshold: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioDocument {
    pub entry_step: String,
    pub theme: String,
    pub qualification: QualificationConfig,
    pub steps: HashMap<String, ScenarioStep>,
    /// Scenario-wide routing fallback by intent name, consulted after a
    /// step has no entry for the intent and no `"*"` wildcard (spec
    /// §4.5's 4-tier chain). `"unknown"` is the catch-all entry.
    #[serde(default)]
    pub fallbacks: HashMap<String, String>,
}

impl ScenarioDocument {
    pub fn step(&self, id: &str) -> Option<&ScenarioStep> {
        self.steps.get(id)
    }
}
