//! Waiting phase (spec §4.6.4): record the caller's reply and poll the
//! recording file's own growth for a stall, rather than watching
//! streaming ASR speech events — file-growth stall is the trigger this
//! phase uses, so it works the same whether or not the step has barge-in
//! enabled and needs no live ASR session of its own. A response shorter
//! than `min_speech_ms` is treated as silence; nothing recorded at all
//! before the step's own timeout elapses is reported as silence too, so
//! the scenario's `silence_step` fires.

use std::time::Duration;

use crate::call::phases::CallDeps;
use crate::call::session::CallSession;
use crate::error::{Result, VoicebotError};
use crate::softswitch::Command;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitingOutcome {
    Captured { transcript: String },
    Silence,
}

pub async fn run(session: &mut CallSession, deps: &CallDeps) -> Result<WaitingOutcome> {
    let step = deps
        .scenario
        .step(&session.current_step)
        .ok_or_else(|| VoicebotError::UndefinedStep { step_id: session.current_step.clone() })?;

    let path = format!("{}/{}-{}-waiting.wav", deps.general.recordings_dir, session.call_id, step.id);
    let start_cmd = Command::record_start(&session.call_id, &path, None);
    deps.softswitch.exec_api(&start_cmd).await?;

    let silence_threshold = Duration::from_millis(deps.speech_config.waiting_silence_threshold_ms);
    let step_timeout = Duration::from_millis(step.timeout_ms);
    let deadline = tokio::time::Instant::now() + step_timeout;

    let mut last_len: u64 = 0;
    let mut last_growth_at = tokio::time::Instant::now();
    let mut growth_seen = false;

    loop {
        if tokio::time::Instant::now() >= deadline {
            break;
        }
        tokio::time::sleep(POLL_INTERVAL).await;
        let len = tokio::fs::metadata(&path).await.map(|m| m.len()).unwrap_or(0);
        if len > last_len {
            last_len = len;
            last_growth_at = tokio::time::Instant::now();
            growth_seen = true;
        } else if growth_seen && last_growth_at.elapsed() >= silence_threshold {
            break;
        }
    }

    let stop_cmd = Command::record_stop(&session.call_id, &path);
    deps.softswitch.exec_api(&stop_cmd).await?;

    if !growth_seen {
        session.consecutive_silences += 1;
        return Ok(WaitingOutcome::Silence);
    }

    let transcript = deps.batch.transcribe_file(&path).await?;
    let min_speech = Duration::from_millis(deps.speech_config.min_speech_ms);
    if Duration::from_millis(transcript.duration_ms) < min_speech || transcript.text.trim().is_empty() {
        session.consecutive_silences += 1;
        return Ok(WaitingOutcome::Silence);
    }

    session.consecutive_silences = 0;
    Ok(WaitingOutcome::Captured { transcript: transcript.text })
}
