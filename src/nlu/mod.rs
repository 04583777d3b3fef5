//! Natural-language understanding: text normalization, answering-machine
//! detection, and intent matching for scenario routing.

pub mod amd;
pub mod intent;
pub mod normalize;

pub use amd::{classify, AmdKeywords, AmdVerdict};
pub use intent::{match_intent, IntentDefinition};
pub use normalize::normalize;
