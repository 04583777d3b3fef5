//! The per-call state machine: session state, phase handlers, and the
//! controller that drives them (spec §3, §4.6).

pub mod controller;
pub mod phases;
pub mod session;

pub use controller::run as run_call;
pub use phases::CallDeps;
pub use session::{CallSession, FinalStatus, Phase};
