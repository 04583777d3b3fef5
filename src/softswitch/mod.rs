//! Softswitch integration: wire codec, command builders, typed events, and
//! the reconnecting client that ties them together (spec §4.1).

pub mod client;
pub mod commands;
pub mod connection;
pub mod events;
pub mod protocol;

pub use client::{fakes, SoftswitchApi, SoftswitchClient};
pub use commands::Command;
pub use events::SoftswitchEvent;
