//! AMD phase (spec §4.6.1, §4.6.2): classify the first utterance on an
//! answered channel as human or machine before any scenario audio plays.
//!
//! Pipeline: wait out RTP priming, record the caller's leg for a fixed
//! window, batch-transcribe it, classify. An empty transcript is treated
//! as silence straight from the transcriber's own contract (spec §4.2:
//! "TranscribeFile returning empty text is a successful result meaning
//! silence detected") rather than a separate raw-PCM volume probe —
//! audio DSP is explicitly delegated away from this crate.

use std::time::Duration;

use tracing::{debug, info};

use crate::call::phases::CallDeps;
use crate::call::session::CallSession;
use crate::error::Result;
use crate::nlu::amd::{classify, AmdVerdict};
use crate::softswitch::Command;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmdOutcome {
    Human,
    Machine,
    /// No speech at all in the classification window.
    Silence,
}

pub async fn run(session: &CallSession, deps: &CallDeps) -> Result<AmdOutcome> {
    tokio::time::sleep(Duration::from_millis(deps.general.rtp_priming_ms)).await;

    let path = format!("{}/{}-amd.wav", deps.general.recordings_dir, session.call_id);
    let window_secs = ((deps.speech_config.amd_window_ms + 999) / 1000) as u32;
    let start_cmd = Command::record_start(&session.call_id, &path, Some(window_secs));
    deps.softswitch.exec_api(&start_cmd).await?;

    tokio::time::sleep(Duration::from_millis(deps.speech_config.amd_window_ms)).await;

    let stop_cmd = Command::record_stop(&session.call_id, &path);
    deps.softswitch.exec_api(&stop_cmd).await?;

    let transcript = deps.batch.transcribe_file(&path).await?;
    if transcript.text.trim().is_empty() {
        info!(call_id = %session.call_id, "amd window produced no speech, treating as silence");
        return Ok(AmdOutcome::Silence);
    }

    let (verdict, confidence) = classify(&transcript.text, &deps.amd_keywords);
    debug!(call_id = %session.call_id, ?verdict, confidence, "amd classification");
    match verdict {
        AmdVerdict::Machine => Ok(AmdOutcome::Machine),
        AmdVerdict::Human | AmdVerdict::Uncertain => Ok(AmdOutcome::Human),
    }
}
