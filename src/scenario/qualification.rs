//! Qualification scoring: steps accumulate points as the call progresses,
//! and the final score against the scenario's threshold decides whether
//! the contact is reported qualified (spec §4.6.5, §8).

use crate::scenario::document::ScenarioDocument;

#[derive(Debug, Clone, Default)]
pub struct QualificationTracker {
    score: f64,
}

impl QualificationTracker {
    pub fn new() -> Self {
        Self { score: 0.0 }
    }

    pub fn record_step(&mut self, document: &ScenarioDocument, step_id: &str) {
        if let Some(step) = document.step(step_id) {
            self.score += step.qualification_points;
        }
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn is_qualified(&self, document: &ScenarioDocument) -> bool {
        self.score >= document.qualification.threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::document::{AudioSource, QualificationConfig, ScenarioStep};
    use std::collections::HashMap;

    fn doc_with_points(points: &[(&str, f64)], threshold: f64) -> ScenarioDocument {
        let steps = points
            .iter()
            .map(|(id, pts)| {
                (
                    id.to_string(),
                    ScenarioStep {
                        id: id.to_string(),
                        audio: AudioSource::Tts { text: String::new(), voice: None },
                        intents: vec![],
                        routing: HashMap::new(),
                        fallback_step: None,
                        silence_step: None,
                        qualification_points: *pts,
                        actions: vec![],
                        terminal: false,
                        timeout_ms: 10_000,
                        barge_in_enabled: false,
                        max_autonomous_turns: 0,
                    },
                )
            })
            .collect();
        ScenarioDocument {
            entry_step: points[0].0.into(),
            theme: "default".into(),
            qualification: QualificationConfig { threshold },
            steps,
            fallbacks: HashMap::new(),
        }
    }

    #[test]
    fn accumulates_points_across_visited_steps() {
        let document = doc_with_points(&[("a", 20.0), ("b", 50.0)], 60.0);
        let mut tracker = QualificationTracker::new();
        tracker.record_step(&document, "a");
        tracker.record_step(&document, "b");
        assert_eq!(tracker.score(), 70.0);
        assert!(tracker.is_qualified(&document));
    }

    #[test]
    fn below_threshold_is_not_qualified() {
        let document = doc_with_points(&[("a", 10.0)], 60.0);
        let mut tracker = QualificationTracker::new();
        tracker.record_step(&document, "a");
        assert!(!tracker.is_qualified(&document));
    }
}
