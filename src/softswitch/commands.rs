//! Typed builders for the command vocabulary in spec §6.
//!
//! Each builder renders the exact wire form of the corresponding `uuid_*`
//! (or `Originate`) command. Keeping construction typed means call sites
//! never hand-format a channel id into a string by hand.

use std::collections::HashMap;

/// A command ready to be sent over the API connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command(pub String);

impl Command {
    pub fn originate(destination: &str, caller_id: &str, application_vars: &HashMap<String, String>) -> Self {
        let vars = application_vars
            .iter()
            .map(|(k, v)| format!("{k}='{v}'"))
            .collect::<Vec<_>>()
            .join(",");
        Command(format!(
            "api originate {{origination_caller_id_number={caller_id},{vars}}}{destination}"
        ))
    }

    pub fn record_start(call_id: &str, path: &str, limit_secs: Option<u32>) -> Self {
        match limit_secs {
            Some(limit) => Command(format!("api uuid_record {call_id} start {path} {limit}")),
            None => Command(format!("api uuid_record {call_id} start {path}")),
        }
    }

    pub fn record_stop(call_id: &str, path: &str) -> Self {
        Command(format!("api uuid_record {call_id} stop {path}"))
    }

    pub fn play(call_id: &str, audio_path: &str) -> Self {
        Command(format!("api uuid_broadcast {call_id} {audio_path} aleg"))
    }

    pub fn break_playback(call_id: &str) -> Self {
        Command(format!("api uuid_break {call_id}"))
    }

    pub fn set_var(call_id: &str, key: &str, value: &str) -> Self {
        Command(format!("api uuid_setvar {call_id} {key} {value}"))
    }

    pub fn transfer(call_id: &str, extension: &str, context: &str) -> Self {
        Command(format!("api uuid_transfer {call_id} {extension} XML {context}"))
    }

    pub fn audio_stream_start(call_id: &str, ws_url: &str, mix: &str, rate: u32) -> Self {
        Command(format!("api uuid_audio_stream {call_id} start {ws_url} {mix} {rate}"))
    }

    pub fn kill(call_id: &str) -> Self {
        Command(format!("api uuid_kill {call_id}"))
    }
}
