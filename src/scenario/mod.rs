//! Scenario documents: the step graph a call walks through, its loading
//! and validation, intent-based routing, and qualification scoring
//! (spec §4.6).

pub mod document;
pub mod load;
pub mod qualification;
pub mod routing;

pub use document::{Action, AudioSource, ScenarioDocument, ScenarioStep};
pub use qualification::QualificationTracker;
pub use routing::{is_implicit_terminal, route, RouteOutcome};
