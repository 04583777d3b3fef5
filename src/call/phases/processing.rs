//! Processing phase (spec §4.6.5): decide what the caller's reply means.
//! Intent is classified first; the objection matcher is only consulted
//! when that classification comes back `objection`, so an affirmative
//! reply that happens to share a word or two with a rebuttal trigger
//! phrase is never mistaken for an objection. Two consecutive silent
//! Waiting phases force termination regardless of whatever intent or
//! routing would otherwise have decided (spec §8 testable property #4).

use tracing::info;

use crate::call::phases::CallDeps;
use crate::call::session::CallSession;
use crate::error::{Result, VoicebotError};
use crate::nlu::intent::match_intent;
use crate::objection::best_match;
use crate::scenario::{route, RouteOutcome};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessingOutcome {
    /// Advance to a new step; caller's session.current_step should be updated.
    Route { next_step: String },
    /// Replay a rebuttal, then return to Waiting on the same step.
    Rebuttal { audio_path: String },
    /// Two consecutive silences with no scenario-level silence fallback
    /// configured; the call ends now.
    ForcedNoAnswer,
}

pub fn run(session: &mut CallSession, deps: &CallDeps, transcript: Option<&str>) -> Result<ProcessingOutcome> {
    let step = deps
        .scenario
        .step(&session.current_step)
        .ok_or_else(|| VoicebotError::UndefinedStep { step_id: session.current_step.clone() })?;

    if session.consecutive_silences >= 2 {
        session.consecutive_silences = 0;
        if let Some(next_step) = deps.scenario.fallbacks.get("silence") {
            session.qualification.record_step(&deps.scenario, next_step);
            return Ok(ProcessingOutcome::Route { next_step: next_step.clone() });
        }
        return Ok(ProcessingOutcome::ForcedNoAnswer);
    }

    let intent = transcript.and_then(|text| match_intent(text, &step.intents));

    if intent.as_deref() == Some("objection") && step.max_autonomous_turns > 0 {
        let text = transcript.unwrap_or_default();
        let entries = deps.objection_library.theme(&session.theme)?;
        if let Some((entry, score)) = best_match(text, &entries) {
            if session.objection_retries_on_step < step.max_autonomous_turns {
                info!(call_id = %session.call_id, objection = %entry.id, score, "objection matched");
                session.objection_retries_on_step += 1;
                return Ok(ProcessingOutcome::Rebuttal { audio_path: entry.rebuttal_audio.clone() });
            }
            let next_step = entry
                .escalation_step
                .clone()
                .or_else(|| step.routing.get("objection").cloned())
                .or_else(|| step.fallback_step.clone())
                .unwrap_or_else(|| deps.scenario.entry_step.clone());
            session.objection_retries_on_step = 0;
            session.qualification.record_step(&deps.scenario, &next_step);
            return Ok(ProcessingOutcome::Route { next_step });
        }
    }

    session.objection_retries_on_step = 0;
    session.autonomous_turns_used += 1;

    let outcome = route(&deps.scenario, step, transcript);
    let next_step = match outcome {
        RouteOutcome::Matched { next_step, .. } => next_step,
        RouteOutcome::Fallback { next_step } => next_step,
        RouteOutcome::Silence { next_step } => next_step,
    };
    session.qualification.record_step(&deps.scenario, &next_step);

    Ok(ProcessingOutcome::Route { next_step })
}
