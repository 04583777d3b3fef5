//! Per-call state (spec §3): the data every phase handler reads and
//! mutates as a call progresses from origination through to a final
//! status.

use serde::{Deserialize, Serialize};

use crate::scenario::QualificationTracker;

/// Where a call currently sits in the three-phase loop (spec §4.6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Amd,
    Playing,
    Waiting,
    Processing,
    Terminating,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Amd => "amd",
            Phase::Playing => "playing",
            Phase::Waiting => "waiting",
            Phase::Processing => "processing",
            Phase::Terminating => "terminating",
        }
    }
}

/// The outcome recorded against a call once it ends. Expected call
/// outcomes live here, not in `VoicebotError` (spec §7).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinalStatus {
    Qualified,
    NotQualified,
    Busy,
    NoAnswer,
    Failed,
}

impl FinalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FinalStatus::Qualified => "qualified",
            FinalStatus::NotQualified => "not_qualified",
            FinalStatus::Busy => "busy",
            FinalStatus::NoAnswer => "no_answer",
            FinalStatus::Failed => "failed",
        }
    }

    /// Whether the contact should be retried later (spec §4.6.6 /
    /// campaign retry policy).
    pub fn is_retryable(&self) -> bool {
        matches!(self, FinalStatus::Busy | FinalStatus::NoAnswer)
    }
}

/// Live state for one call, owned by its controller task.
#[derive(Debug, Clone)]
pub struct CallSession {
    pub call_id: String,
    pub campaign_id: String,
    pub contact_id: i64,
    pub phone_number: String,
    pub caller_id: String,
    pub theme: String,
    pub phase: Phase,
    pub current_step: String,
    pub objection_retries_on_step: u32,
    pub autonomous_turns_used: u32,
    pub qualification: QualificationTracker,
    /// Set when Processing decides to play a rebuttal instead of the
    /// current step's own prompt; Playing consumes and clears it.
    pub pending_audio_override: Option<String>,
    /// Set right before the controller issues a Kill for a bot-decided
    /// final status (spec §4.6.6). A hangup event that arrives with this
    /// still `false` is caller-initiated and its status comes from the
    /// hangup-cause table instead.
    pub robot_initiated_hangup: bool,
    /// Consecutive Waiting phases that came back silent. Two in a row
    /// forces termination regardless of whatever Processing would
    /// otherwise have routed to (spec §4.6.5, testable property #4).
    pub consecutive_silences: u32,
}

impl CallSession {
    pub fn new(
        call_id: String,
        campaign_id: String,
        contact_id: i64,
        phone_number: String,
        caller_id: String,
        theme: String,
        entry_step: String,
    ) -> Self {
        Self {
            call_id,
            campaign_id,
            contact_id,
            phone_number,
            caller_id,
            theme,
            phase: Phase::Amd,
            current_step: entry_step,
            objection_retries_on_step: 0,
            autonomous_turns_used: 0,
            qualification: QualificationTracker::new(),
            pending_audio_override: None,
            robot_initiated_hangup: false,
            consecutive_silences: 0,
        }
    }
}
