//! Intent matching for scenario routing (spec §4.6.4): given a caller's
//! transcribed response and the current step's ordered list of intents,
//! pick the first intent whose trigger phrases match, falling back to a
//! step-declared default when nothing matches.

use strsim::jaro_winkler;

use crate::nlu::normalize::normalize;

const FUZZY_THRESHOLD: f64 = 0.85;

/// One routable intent: a name the scenario step's routing table keys on,
/// plus the phrases that trigger it. Declared in priority order by the
/// scenario author; the first match wins.
#[derive(Debug, Clone)]
pub struct IntentDefinition {
    pub name: String,
    pub phrases: Vec<String>,
}

/// Scan `transcript` against `intents` in order, returning the first
/// match. A trigger phrase matches if it's a normalized substring of the
/// transcript, or any transcript word is a close fuzzy match to any word
/// in the phrase.
pub fn match_intent(transcript: &str, intents: &[IntentDefinition]) -> Option<String> {
    let normalized = normalize(transcript);
    let words: Vec<&str> = normalized.split_whitespace().collect();

    for intent in intents {
        for phrase in &intent.phrases {
            let phrase_norm = normalize(phrase);
            if normalized.contains(&phrase_norm) {
                return Some(intent.name.clone());
            }
            if phrase_norm.split_whitespace().count() == 1
                && words.iter().any(|w| jaro_winkler(w, &phrase_norm) >= FUZZY_THRESHOLD)
            {
                return Some(intent.name.clone());
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn intents() -> Vec<IntentDefinition> {
        vec![
            IntentDefinition { name: "affirm".into(), phrases: vec!["yes".into(), "sure".into(), "go ahead".into()] },
            IntentDefinition { name: "deny".into(), phrases: vec!["no".into(), "not interested".into()] },
        ]
    }

    #[test]
    fn first_matching_intent_wins_in_priority_order() {
        assert_eq!(match_intent("yes sure go ahead", &intents()), Some("affirm".into()));
    }

    #[test]
    fn substring_phrase_match() {
        assert_eq!(match_intent("no thanks, not interested", &intents()), Some("deny".into()));
    }

    #[test]
    fn no_match_returns_none() {
        assert_eq!(match_intent("what time is it", &intents()), None);
    }

    #[test]
    fn fuzzy_single_word_typo_matches() {
        assert_eq!(match_intent("yess", &intents()), Some("affirm".into()));
    }
}
