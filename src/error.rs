//! Crate-wide error type.
//!
//! Errors are grouped the way spec §7 groups them: transient transport
//! issues that are recovered locally, fatal per-call conditions that end
//! the call with `Failed`, recoverable degradations that downgrade a call
//! but let it continue, and configuration/scenario errors that are only
//! ever raised at load time. Expected call outcomes (busy, no-answer,
//! hangup, machine) are never represented here — they are `FinalStatus`
//! values, not errors.

use thiserror::Error;

/// Result type alias used throughout the crate.
pub type Result<T> = std::result::Result<T, VoicebotError>;

/// Crate-wide error type for the voice-bot orchestrator.
#[derive(Error, Debug, Clone)]
pub enum VoicebotError {
    /// The softswitch rejected an API command or its reply could not be parsed.
    #[error("softswitch command failed: {reason}")]
    SoftswitchCommand { reason: String },

    /// Both event and API connections to the softswitch are down and the
    /// reconnect budget has been exhausted.
    #[error("softswitch disconnected: {reason}")]
    SoftswitchDisconnected { reason: String },

    /// `Originate` failed before a channel was ever created.
    #[error("originate failed: {reason}")]
    OriginateFailed { reason: String },

    /// The speech gateway (batch or streaming) failed in a way the call
    /// cannot recover from by falling back to the other transport.
    #[error("speech gateway error: {reason}")]
    SpeechGateway { reason: String },

    /// Scenario routed to a step id that does not exist in the loaded
    /// document. This is a scenario-authoring bug, not a runtime condition
    /// — spec §4.6.7 says to abort the call loudly.
    #[error("scenario routing to undefined step: {step_id}")]
    UndefinedStep { step_id: String },

    /// Scenario document failed load-time validation.
    #[error("invalid scenario: {reason}")]
    InvalidScenario { reason: String },

    /// Configuration file failed validation.
    #[error("invalid configuration: {field} - {reason}")]
    InvalidConfiguration { field: String, reason: String },

    /// Persistence operation failed.
    #[error("persistence error: {reason}")]
    Persistence { reason: String },

    /// A call's task panicked; caught by the controller's supervisor.
    #[error("call task panicked: {reason}")]
    CallPanicked { reason: String },

    /// Catch-all for conditions that do not fit the categories above.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl VoicebotError {
    pub fn softswitch_command(reason: impl Into<String>) -> Self {
        Self::SoftswitchCommand { reason: reason.into() }
    }

    pub fn speech_gateway(reason: impl Into<String>) -> Self {
        Self::SpeechGateway { reason: reason.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal { message: message.into() }
    }

    /// Whether retrying the same operation locally is worth attempting.
    ///
    /// Mirrors spec §7's "transient transport" vs. "fatal per-call" split:
    /// transport and gateway hiccups are recoverable, scenario/config bugs
    /// are not.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            VoicebotError::SoftswitchCommand { .. } | VoicebotError::SpeechGateway { .. }
        )
    }

    /// Category label used in structured logs and metrics counters.
    pub fn category(&self) -> &'static str {
        match self {
            VoicebotError::SoftswitchCommand { .. }
            | VoicebotError::SoftswitchDisconnected { .. }
            | VoicebotError::OriginateFailed { .. } => "softswitch",
            VoicebotError::SpeechGateway { .. } => "speech",
            VoicebotError::UndefinedStep { .. } | VoicebotError::InvalidScenario { .. } => {
                "scenario"
            }
            VoicebotError::InvalidConfiguration { .. } => "configuration",
            VoicebotError::Persistence { .. } => "persistence",
            VoicebotError::CallPanicked { .. } | VoicebotError::Internal { .. } => "system",
        }
    }
}

impl From<sqlx::Error> for VoicebotError {
    fn from(e: sqlx::Error) -> Self {
        VoicebotError::Persistence { reason: e.to_string() }
    }
}
