//! The call controller: owns one call's lifetime from AMD through to a
//! final status, driving the phase loop from spec §4.6 as nested
//! `select!`s rather than mutual recursion. Spawned once per call by the
//! campaign runner and supervised via its `JoinHandle` so a panic inside
//! becomes a `FinalStatus::Failed` instead of taking the runner down.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::call::phases::{amd, playing, processing, terminating, waiting, CallDeps};
use crate::call::session::{CallSession, FinalStatus, Phase};
use crate::error::{Result, VoicebotError};
use crate::scenario::{is_implicit_terminal, AudioSource};
use crate::softswitch::events::HangupCause;
use crate::softswitch::SoftswitchEvent;

/// Resolve an audio source to a file path playable over the softswitch.
/// Only `File` sources are implemented; TTS synthesis is a named
/// collaborator the spec keeps external to this crate.
fn audio_path(audio: &AudioSource) -> Result<String> {
    match audio {
        AudioSource::File { path } => Ok(path.clone()),
        AudioSource::Tts { .. } => {
            Err(VoicebotError::internal("tts synthesis is not implemented in this crate"))
        }
    }
}

/// Wait for a hangup-shaped event scoped to one call: caller hangup,
/// hangup complete, or a synthetic provider disconnect.
async fn await_hangup(mut events: broadcast::Receiver<SoftswitchEvent>, call_id: String) -> HangupCause {
    loop {
        match events.recv().await {
            Ok(SoftswitchEvent::ChannelHangupComplete { call_id: id, cause }) if id == call_id => return cause,
            Ok(SoftswitchEvent::ProviderDisconnected { call_id: id }) if id == call_id => {
                return HangupCause::Other("provider_disconnected".into())
            }
            Ok(_) => continue,
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => {
                return HangupCause::Other("event_bus_closed".into())
            }
        }
    }
}

/// Cause -> status table for a hangup observed with `robot_initiated_hangup`
/// still false, i.e. one the controller didn't itself decide (spec
/// §4.6.6). Anything not explicitly named is a failure, not a polite
/// caller goodbye.
fn hangup_final_status(cause: &HangupCause) -> FinalStatus {
    match cause {
        HangupCause::NormalClearing | HangupCause::OriginatorCancel | HangupCause::RecvBye => {
            FinalStatus::NotQualified
        }
        HangupCause::UserBusy => FinalStatus::Busy,
        HangupCause::NoAnswer | HangupCause::NoUserResponse => FinalStatus::NoAnswer,
        HangupCause::Other(_) => FinalStatus::Failed,
    }
}

/// Mark the call as ending on the controller's own decision, not a caller
/// hangup, before the status is handed back to be finalized with a Kill.
fn conclude(session: &mut CallSession, status: FinalStatus) -> FinalStatus {
    session.robot_initiated_hangup = true;
    status
}

/// Drive one call through the full phase loop until it reaches a final
/// status. Returns the status without hanging up — the caller runs
/// the Terminating phase so actions and persistence are centralized in
/// one place regardless of which path got here.
pub async fn run(
    session: &mut CallSession,
    deps: &CallDeps,
    max_call_duration: Duration,
    cancel: CancellationToken,
) -> Result<FinalStatus> {
    let deadline = tokio::time::Instant::now() + max_call_duration;

    loop {
        if cancel.is_cancelled() {
            return Ok(conclude(session, FinalStatus::Failed));
        }
        if tokio::time::Instant::now() >= deadline {
            warn!(call_id = %session.call_id, "max call duration exceeded");
            return Ok(conclude(session, FinalStatus::Failed));
        }

        let hangup_watch = await_hangup(deps.softswitch.subscribe(), session.call_id.clone());

        match session.phase {
            Phase::Amd => {
                deps.persistence.update_call_phase(&session.call_id, Phase::Amd.as_str()).await?;
                let outcome = tokio::select! {
                    outcome = amd::run(session, deps) => outcome?,
                    cause = hangup_watch => return Ok(hangup_final_status(&cause)),
                };
                match outcome {
                    amd::AmdOutcome::Machine | amd::AmdOutcome::Silence => {
                        return Ok(conclude(session, FinalStatus::NoAnswer));
                    }
                    amd::AmdOutcome::Human => session.phase = Phase::Playing,
                }
            }
            Phase::Playing => {
                deps.persistence.update_call_phase(&session.call_id, Phase::Playing.as_str()).await?;
                let is_rebuttal = session.pending_audio_override.is_some();
                let current_step = deps
                    .scenario
                    .step(&session.current_step)
                    .ok_or_else(|| VoicebotError::UndefinedStep { step_id: session.current_step.clone() })?;
                let path = if let Some(override_path) = session.pending_audio_override.take() {
                    override_path
                } else {
                    audio_path(&current_step.audio)?
                };
                let is_terminal = !is_rebuttal
                    && (current_step.terminal || is_implicit_terminal(&current_step.id));
                let barge_in_enabled = current_step.barge_in_enabled;

                let outcome = tokio::select! {
                    outcome = playing::run(session, deps, &path, barge_in_enabled, deps.softswitch.subscribe()) => outcome?,
                    cause = hangup_watch => return Ok(hangup_final_status(&cause)),
                };

                if is_terminal {
                    if let playing::PlayingOutcome::Completed = outcome {
                        deps.persistence.update_call_phase(&session.call_id, Phase::Terminating.as_str()).await?;
                        let status =
                            if session.qualification.is_qualified(&deps.scenario) {
                                FinalStatus::Qualified
                            } else {
                                FinalStatus::NotQualified
                            };
                        return Ok(conclude(session, status));
                    }
                }

                match outcome {
                    playing::PlayingOutcome::Completed => session.phase = Phase::Waiting,
                    playing::PlayingOutcome::BargedIn { partial_transcript: Some(text) } => {
                        let result = process_reply(session, deps, Some(&text))?;
                        if let Some(status) = apply_processing_outcome(session, result) {
                            return Ok(conclude(session, status));
                        }
                    }
                    playing::PlayingOutcome::BargedIn { partial_transcript: None } => {
                        session.phase = Phase::Waiting;
                    }
                }
            }
            Phase::Waiting => {
                deps.persistence.update_call_phase(&session.call_id, Phase::Waiting.as_str()).await?;
                let outcome = tokio::select! {
                    outcome = waiting::run(session, deps) => outcome?,
                    cause = hangup_watch => return Ok(hangup_final_status(&cause)),
                };
                let transcript = match outcome {
                    waiting::WaitingOutcome::Captured { transcript } => Some(transcript),
                    waiting::WaitingOutcome::Silence => None,
                };
                let result = process_reply(session, deps, transcript.as_deref())?;
                if let Some(status) = apply_processing_outcome(session, result) {
                    return Ok(conclude(session, status));
                }
            }
            Phase::Processing => {
                // Reached only if a future phase defers processing without
                // a transcript in hand; current phases resolve inline above.
                let result = process_reply(session, deps, None)?;
                if let Some(status) = apply_processing_outcome(session, result) {
                    return Ok(conclude(session, status));
                }
            }
            Phase::Terminating => unreachable!("terminating is a return, not a looped phase"),
        }
    }
}

fn process_reply(
    session: &mut CallSession,
    deps: &CallDeps,
    transcript: Option<&str>,
) -> Result<processing::ProcessingOutcome> {
    processing::run(session, deps, transcript)
}

/// Apply the controller's decision for what Processing decided, advancing
/// `session` in place. A rebuttal re-enters Playing on the same step; a
/// route moves to a new step and always re-enters Playing, which is
/// where the terminal check above catches a terminal destination. Returns
/// `Some` only when Processing itself decided the call is over.
fn apply_processing_outcome(
    session: &mut CallSession,
    outcome: processing::ProcessingOutcome,
) -> Option<FinalStatus> {
    match outcome {
        processing::ProcessingOutcome::Route { next_step } => {
            info!(call_id = %session.call_id, from = %session.current_step, to = %next_step, "routing");
            session.current_step = next_step;
            session.phase = Phase::Playing;
            None
        }
        processing::ProcessingOutcome::Rebuttal { audio_path } => {
            session.pending_audio_override = Some(audio_path);
            session.phase = Phase::Playing;
            None
        }
        processing::ProcessingOutcome::ForcedNoAnswer => Some(FinalStatus::NoAnswer),
    }
}
