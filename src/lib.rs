//! Outbound voice-bot call orchestrator.
//!
//! Drives an outbound calling campaign end to end: originates calls over
//! a softswitch's Event Socket-style control channel, classifies
//! answering machines, plays a scenario-driven script with barge-in and
//! objection handling, and records outcomes through a persistence port.

pub mod actions;
pub mod call;
pub mod campaign;
pub mod config;
pub mod error;
pub mod nlu;
pub mod objection;
pub mod persistence;
pub mod scenario;
pub mod softswitch;
pub mod speech;

pub mod prelude {
    pub use crate::call::{CallDeps, CallSession, FinalStatus, Phase};
    pub use crate::campaign::CampaignRunner;
    pub use crate::config::VoicebotConfig;
    pub use crate::error::{Result, VoicebotError};
    pub use crate::scenario::ScenarioDocument;
}
