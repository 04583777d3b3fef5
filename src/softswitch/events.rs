//! Typed asynchronous events consumed from the softswitch's event connection.
//!
//! Parsing tolerates header ordering variance (spec §4.1); frames whose
//! `Event-Name` is not recognised are dropped rather than surfaced as an
//! error — the spec says unknown event types are ignored, not fatal.

use crate::softswitch::protocol::Frame;

/// Hangup cause header value, used to disambiguate caller- from
/// bot-initiated hangups per spec §4.6.6.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HangupCause {
    NormalClearing,
    OriginatorCancel,
    RecvBye,
    UserBusy,
    NoAnswer,
    NoUserResponse,
    Other(String),
}

impl HangupCause {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "NORMAL_CLEARING" => Self::NormalClearing,
            "ORIGINATOR_CANCEL" => Self::OriginatorCancel,
            "recv_bye" => Self::RecvBye,
            "USER_BUSY" => Self::UserBusy,
            "NO_ANSWER" => Self::NoAnswer,
            "NO_USER_RESPONSE" => Self::NoUserResponse,
            other => Self::Other(other.to_string()),
        }
    }
}

/// A single asynchronous event on a channel.
#[derive(Debug, Clone)]
pub enum SoftswitchEvent {
    ChannelCreate { call_id: String },
    ChannelAnswer { call_id: String },
    PlaybackStart { call_id: String },
    PlaybackStop { call_id: String },
    RecordStart { call_id: String, path: String },
    RecordStop { call_id: String, path: String },
    /// Softswitch-native speech detection, used only when the on-softswitch
    /// ASR module deployment variant is selected (spec §9 open question).
    SpeechDetected { call_id: String, text: String },
    ChannelHangup { call_id: String, cause: HangupCause },
    ChannelHangupComplete { call_id: String, cause: HangupCause },
    ChannelDestroy { call_id: String },
    /// Synthesized locally when the client reconnects and tears down all
    /// sessions that were open on the old connection (spec §4.1).
    ProviderDisconnected { call_id: String },
}

impl SoftswitchEvent {
    pub fn call_id(&self) -> &str {
        match self {
            SoftswitchEvent::ChannelCreate { call_id }
            | SoftswitchEvent::ChannelAnswer { call_id }
            | SoftswitchEvent::PlaybackStart { call_id }
            | SoftswitchEvent::PlaybackStop { call_id }
            | SoftswitchEvent::RecordStart { call_id, .. }
            | SoftswitchEvent::RecordStop { call_id, .. }
            | SoftswitchEvent::SpeechDetected { call_id, .. }
            | SoftswitchEvent::ChannelHangup { call_id, .. }
            | SoftswitchEvent::ChannelHangupComplete { call_id, .. }
            | SoftswitchEvent::ChannelDestroy { call_id }
            | SoftswitchEvent::ProviderDisconnected { call_id } => call_id,
        }
    }

    /// Parse a frame from the event connection into a typed event.
    ///
    /// Returns `None` for event types this client does not act on; this is
    /// the "unknown event types are ignored" behaviour from spec §4.1.
    pub fn from_frame(frame: &Frame) -> Option<Self> {
        let name = frame.header("Event-Name")?;
        let call_id = frame.header("Unique-ID").unwrap_or_default().to_string();
        match name {
            "CHANNEL_CREATE" => Some(Self::ChannelCreate { call_id }),
            "CHANNEL_ANSWER" => Some(Self::ChannelAnswer { call_id }),
            "CHANNEL_DESTROY" => Some(Self::ChannelDestroy { call_id }),
            "PLAYBACK_START" => Some(Self::PlaybackStart { call_id }),
            "PLAYBACK_STOP" => Some(Self::PlaybackStop { call_id }),
            "RECORD_START" => Some(Self::RecordStart {
                call_id,
                path: frame.header("Record-File-Path").unwrap_or_default().to_string(),
            }),
            "RECORD_STOP" => Some(Self::RecordStop {
                call_id,
                path: frame.header("Record-File-Path").unwrap_or_default().to_string(),
            }),
            "DETECTED_SPEECH" => Some(Self::SpeechDetected {
                call_id,
                text: frame.body.clone().unwrap_or_default(),
            }),
            "CHANNEL_HANGUP" => Some(Self::ChannelHangup {
                call_id,
                cause: HangupCause::parse(frame.header("Hangup-Cause").unwrap_or_default()),
            }),
            "CHANNEL_HANGUP_COMPLETE" => Some(Self::ChannelHangupComplete {
                call_id,
                cause: HangupCause::parse(frame.header("Hangup-Cause").unwrap_or_default()),
            }),
            _ => None,
        }
    }
}
