//! Objection handling: themed rebuttal libraries and hybrid scoring
//! against a caller's spoken objection (spec §4.6.5).

pub mod entry;
pub mod library;
pub mod matcher;

pub use entry::ObjectionEntry;
pub use library::ObjectionLibrary;
pub use matcher::best_match;
