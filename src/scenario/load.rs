//! Scenario document loading and structural validation.
//!
//! Validation catches authoring mistakes before a call ever reaches them:
//! routing to a step that doesn't exist, audio files that aren't on disk,
//! and graphs where some step can never reach a terminal (the call would
//! loop forever). These are load-time `InvalidScenario` errors, never
//! runtime conditions (spec §4.6.7).

use std::collections::{HashSet, VecDeque};
use std::path::Path;

use crate::error::{Result, VoicebotError};
use crate::scenario::document::{AudioSource, ScenarioDocument};
use crate::scenario::routing::is_implicit_terminal;

pub fn load(path: &str, audio_root: &Path) -> Result<ScenarioDocument> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| VoicebotError::InvalidScenario { reason: format!("cannot read {path}: {e}") })?;
    let document: ScenarioDocument = serde_json::from_str(&text)
        .map_err(|e| VoicebotError::InvalidScenario { reason: format!("malformed json: {e}") })?;
    validate(&document, audio_root)?;
    Ok(document)
}

pub fn validate(document: &ScenarioDocument, audio_root: &Path) -> Result<()> {
    if !document.steps.contains_key(&document.entry_step) {
        return Err(VoicebotError::InvalidScenario {
            reason: format!("entry_step '{}' is not a defined step", document.entry_step),
        });
    }

    for step in document.steps.values() {
        for target in referenced_steps(step) {
            if !document.steps.contains_key(target) {
                return Err(VoicebotError::InvalidScenario {
                    reason: format!("step '{}' routes to undefined step '{target}'", step.id),
                });
            }
        }
        if let AudioSource::File { path } = &step.audio {
            let full = audio_root.join(path);
            if !full.exists() {
                return Err(VoicebotError::InvalidScenario {
                    reason: format!("step '{}' references missing audio file {}", step.id, full.display()),
                });
            }
        }
    }

    for target in document.fallbacks.values() {
        if !document.steps.contains_key(target) {
            return Err(VoicebotError::InvalidScenario {
                reason: format!("scenario fallback routes to undefined step '{target}'"),
            });
        }
    }

    let can_reach_terminal = reachable_to_terminal(document);
    for step in document.steps.values() {
        if !is_terminal(step) && !can_reach_terminal.contains(&step.id) {
            return Err(VoicebotError::InvalidScenario {
                reason: format!("step '{}' can never reach a terminal step", step.id),
            });
        }
    }

    Ok(())
}

fn is_terminal(step: &crate::scenario::document::ScenarioStep) -> bool {
    step.terminal || is_implicit_terminal(&step.id)
}

fn referenced_steps(step: &crate::scenario::document::ScenarioStep) -> Vec<&String> {
    let mut targets: Vec<&String> = step.routing.values().collect();
    targets.extend(step.fallback_step.iter());
    targets.extend(step.silence_step.iter());
    targets
}

/// Steps from which a terminal step is reachable, found by BFS over the
/// reversed edge set starting from every terminal step.
fn reachable_to_terminal(document: &ScenarioDocument) -> HashSet<String> {
    let mut reverse_edges: std::collections::HashMap<&str, Vec<&str>> = std::collections::HashMap::new();
    for step in document.steps.values() {
        for target in referenced_steps(step) {
            reverse_edges.entry(target.as_str()).or_default().push(&step.id);
        }
    }

    let mut visited: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<&str> = VecDeque::new();
    for step in document.steps.values() {
        if is_terminal(step) {
            visited.insert(step.id.clone());
            queue.push_back(&step.id);
        }
    }
    while let Some(id) = queue.pop_front() {
        if let Some(preds) = reverse_edges.get(id) {
            for pred in preds {
                if visited.insert((*pred).to_string()) {
                    queue.push_back(pred);
                }
            }
        }
    }
    visited
}
