//! Playing phase (spec §4.6.2): play the current step's prompt while
//! watching for barge-in. Speech detected after `barge_in_grace_ms` (to
//! ignore line echo right as playback starts) and sustained past
//! `barge_in_threshold_ms` breaks the prompt early and hands control to
//! Processing with whatever the caller said so far.

use std::time::Duration;

use tokio::sync::broadcast;
use tracing::info;

use crate::call::phases::CallDeps;
use crate::call::session::CallSession;
use crate::error::{Result, VoicebotError};
use crate::scenario::AudioSource;
use crate::softswitch::{Command, SoftswitchEvent};
use crate::speech::StreamEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayingOutcome {
    /// Prompt played to completion with no barge-in.
    Completed,
    /// Caller spoke over the prompt; it was cut short.
    BargedIn { partial_transcript: Option<String> },
}

pub async fn run(
    session: &CallSession,
    deps: &CallDeps,
    audio_path: &str,
    barge_in_enabled: bool,
    mut switch_events: broadcast::Receiver<SoftswitchEvent>,
) -> Result<PlayingOutcome> {
    let play_cmd = Command::play(&session.call_id, audio_path);
    deps.softswitch.exec_api(&play_cmd).await?;

    if !barge_in_enabled {
        loop {
            match switch_events.recv().await {
                Ok(SoftswitchEvent::PlaybackStop { call_id }) if call_id == session.call_id => {
                    return Ok(PlayingOutcome::Completed);
                }
                Ok(SoftswitchEvent::ProviderDisconnected { call_id }) if call_id == session.call_id => {
                    return Err(VoicebotError::SoftswitchDisconnected {
                        reason: "disconnected while playing".into(),
                    });
                }
                Ok(_) => continue,
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(VoicebotError::SoftswitchDisconnected { reason: "event bus closed".into() });
                }
            }
        }
    }

    let mut stream = deps.streaming.open_stream().await?;
    let grace = Duration::from_millis(deps.speech_config.barge_in_grace_ms);
    let threshold = Duration::from_millis(deps.speech_config.barge_in_threshold_ms);
    let started_at = tokio::time::Instant::now();

    loop {
        tokio::select! {
            // Checked first: a playback-stop or disconnect is authoritative
            // over a speech event that happens to land in the same tick.
            biased;
            event = switch_events.recv() => {
                match event {
                    Ok(SoftswitchEvent::PlaybackStop { call_id }) if call_id == session.call_id => {
                        return Ok(PlayingOutcome::Completed);
                    }
                    Ok(SoftswitchEvent::ProviderDisconnected { call_id }) if call_id == session.call_id => {
                        return Err(VoicebotError::SoftswitchDisconnected {
                            reason: "disconnected while playing".into(),
                        });
                    }
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(VoicebotError::SoftswitchDisconnected { reason: "event bus closed".into() });
                    }
                }
            }
            stream_event = stream.next_event() => {
                match stream_event {
                    Some(StreamEvent::SpeechEnd { duration_ms }) => {
                        let past_grace = started_at.elapsed() >= grace;
                        if past_grace && duration_ms as u128 >= threshold.as_millis() {
                            info!(call_id = %session.call_id, "barge-in detected, breaking playback");
                            let break_cmd = Command::break_playback(&session.call_id);
                            deps.softswitch.exec_api(&break_cmd).await?;
                            tokio::time::sleep(Duration::from_millis(deps.speech_config.barge_in_smooth_delay_ms)).await;
                            return Ok(PlayingOutcome::BargedIn { partial_transcript: None });
                        }
                    }
                    Some(StreamEvent::Transcript(transcript)) if transcript.is_final => {
                        return Ok(PlayingOutcome::BargedIn { partial_transcript: Some(transcript.text) });
                    }
                    Some(StreamEvent::Error(reason)) => return Err(VoicebotError::speech_gateway(reason)),
                    Some(_) => continue,
                    None => return Err(VoicebotError::speech_gateway("speech stream closed during playback")),
                }
            }
        }
    }
}
