//! Routing a caller's response to the next scenario step (spec §4.5): a
//! 4-tier fallback chain — the step's own intent mapping, then its `"*"`
//! wildcard entry, then the scenario-wide fallback for that intent, then
//! the scenario-wide `"unknown"` fallback — so a call can never dead-end
//! mid-graph. Legacy step ids (`bye`, `bye_failed`, any `bye_`-prefixed
//! id) are implicitly terminal even without `terminal: true` set.

use crate::nlu::intent::match_intent;
use crate::scenario::document::{ScenarioDocument, ScenarioStep};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteOutcome {
    /// An intent matched a step or scenario mapping; route to its target.
    Matched { intent: String, next_step: String },
    /// Nothing matched anywhere in the chain; routed via the last-resort
    /// fallback.
    Fallback { next_step: String },
    /// Caller said nothing within the silence threshold.
    Silence { next_step: String },
}

/// Whether `step_id` counts as a terminal step even if its own
/// `terminal` flag is unset — a scenario-authoring convention carried
/// over from legacy scripts rather than a new field every such step has
/// to set explicitly.
pub fn is_implicit_terminal(step_id: &str) -> bool {
    step_id == "bye" || step_id == "bye_failed" || step_id.starts_with("bye_")
}

pub fn route(document: &ScenarioDocument, step: &ScenarioStep, transcript: Option<&str>) -> RouteOutcome {
    let Some(transcript) = transcript else {
        let next = step.silence_step.clone().unwrap_or_else(|| document.entry_step.clone());
        return RouteOutcome::Silence { next_step: next };
    };

    let intent = match_intent(transcript, &step.intents);

    if let Some(intent) = &intent {
        if let Some(next_step) = step.routing.get(intent) {
            return RouteOutcome::Matched { intent: intent.clone(), next_step: next_step.clone() };
        }
    }
    if let Some(next_step) = step.routing.get("*") {
        let intent = intent.clone().unwrap_or_else(|| "unknown".to_string());
        return RouteOutcome::Matched { intent, next_step: next_step.clone() };
    }

    let fallback_key = intent.as_deref().unwrap_or("unknown");
    if let Some(next_step) = document.fallbacks.get(fallback_key) {
        return RouteOutcome::Fallback { next_step: next_step.clone() };
    }
    if let Some(next_step) = document.fallbacks.get("unknown") {
        return RouteOutcome::Fallback { next_step: next_step.clone() };
    }

    let next = step.fallback_step.clone().unwrap_or_else(|| document.entry_step.clone());
    RouteOutcome::Fallback { next_step: next }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlu::intent::IntentDefinition;
    use crate::scenario::document::{AudioSource, QualificationConfig};
    use std::collections::HashMap;

    fn build() -> (ScenarioDocument, ScenarioStep) {
        let step = ScenarioStep {
            id: "ask".into(),
            audio: AudioSource::Tts { text: "interested?".into(), voice: None },
            intents: vec![IntentDefinition { name: "affirm".into(), phrases: vec!["yes".into()] }],
            routing: HashMap::from([("affirm".to_string(), "qualify".to_string())]),
            fallback_step: Some("clarify".into()),
            silence_step: Some("reprompt".into()),
            qualification_points: 0.0,
            actions: vec![],
            terminal: false,
            timeout_ms: 10_000,
            barge_in_enabled: false,
            max_autonomous_turns: 0,
        };
        let document = ScenarioDocument {
            entry_step: "ask".into(),
            theme: "default".into(),
            qualification: QualificationConfig { threshold: 60.0 },
            steps: HashMap::from([("ask".to_string(), step.clone())]),
            fallbacks: HashMap::new(),
        };
        (document, step)
    }

    #[test]
    fn matched_intent_routes_to_its_target() {
        let (document, step) = build();
        assert_eq!(
            route(&document, &step, Some("yes definitely")),
            RouteOutcome::Matched { intent: "affirm".into(), next_step: "qualify".into() }
        );
    }

    #[test]
    fn unmatched_response_routes_to_fallback() {
        let (document, step) = build();
        assert_eq!(route(&document, &step, Some("what?")), RouteOutcome::Fallback { next_step: "clarify".into() });
    }

    #[test]
    fn no_response_routes_to_silence_step() {
        let (document, step) = build();
        assert_eq!(route(&document, &step, None), RouteOutcome::Silence { next_step: "reprompt".into() });
    }

    #[test]
    fn scenario_fallback_wins_over_step_fallback_when_intent_is_known() {
        let (mut document, mut step) = build();
        step.routing.clear();
        document.fallbacks.insert("affirm".into(), "qualify_fast".into());
        assert_eq!(route(&document, &step, Some("yes definitely")), RouteOutcome::Fallback { next_step: "qualify_fast".into() });
    }

    #[test]
    fn unknown_scenario_fallback_catches_an_unmapped_intent() {
        let (mut document, step) = build();
        document.fallbacks.insert("unknown".into(), "operator".into());
        let step = ScenarioStep { fallback_step: None, ..step };
        assert_eq!(route(&document, &step, Some("what?")), RouteOutcome::Fallback { next_step: "operator".into() });
    }

    #[test]
    fn bye_prefixed_step_ids_are_implicitly_terminal() {
        assert!(is_implicit_terminal("bye"));
        assert!(is_implicit_terminal("bye_failed"));
        assert!(is_implicit_terminal("bye_no_answer"));
        assert!(!is_implicit_terminal("goodbye"));
    }
}
