//! Campaign execution: legal-hours gating, concurrency-capped dispatch,
//! and retry scheduling (spec §4.5).

pub mod legal_hours;
pub mod retry;
pub mod runner;

pub use runner::CampaignRunner;
