//! Answering-machine detection (spec §4.3): classify the first utterance
//! on an answered channel as a human greeting or a machine/voicemail
//! greeting from keyword evidence alone.
//!
//! Two tiers: an exact substring match after normalization counts first;
//! only when *neither* class has any exact hit at all do we fall back to
//! fuzzy (Jaro-Winkler) matching of single-word keywords against the
//! transcript's own words, so an ASR mishearing ("voicemail" heard as
//! "voicemale") still counts. Confidence is the matched fraction of the
//! class's keyword list, boosted once two or more keywords land — a
//! single weak hit is deliberately not enough to decide the call either
//! way; `classify` is allowed to come back `Uncertain`, and the AMD phase
//! treats that the same as `Human` (never hang up on uncertainty).

use std::collections::HashMap;

use strsim::jaro_winkler;

use crate::nlu::normalize::normalize;

const FUZZY_THRESHOLD: f64 = 0.85;
const DECISION_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmdVerdict {
    Human,
    Machine,
    Uncertain,
}

#[derive(Debug, Clone)]
pub struct AmdKeywords {
    pub machine: Vec<String>,
    pub human: Vec<String>,
}

impl Default for AmdKeywords {
    fn default() -> Self {
        Self {
            machine: ["leave a message", "after the tone", "voicemail"].into_iter().map(normalize).collect(),
            human: ["hello", "yes", "speaking"].into_iter().map(normalize).collect(),
        }
    }
}

fn exact_match_count(transcript: &str, keywords: &[String]) -> usize {
    keywords.iter().filter(|keyword| transcript.contains(keyword.as_str())).count()
}

/// Fuzzy matching only applies to single-word keywords — a multi-word
/// phrase has no single transcript token to compare against, same
/// convention as `nlu::intent::match_intent`.
fn fuzzy_match_count(words: &[&str], keywords: &[String]) -> usize {
    keywords
        .iter()
        .filter(|keyword| {
            keyword.split_whitespace().count() == 1
                && words.iter().any(|word| jaro_winkler(word, keyword) >= FUZZY_THRESHOLD)
        })
        .count()
}

fn class_confidence(matches: usize, total_keywords: usize) -> f64 {
    if matches == 0 || total_keywords == 0 {
        return 0.0;
    }
    let base = matches as f64 / total_keywords as f64;
    let boosted = if matches >= 2 { base + 0.2 } else { base };
    boosted.min(1.0)
}

/// Classify one utterance against a keyword set (spec §4.3's exact
/// formula). Decision order: confident machine, else confident human,
/// else uncertain.
pub fn classify(transcript: &str, keywords: &AmdKeywords) -> (AmdVerdict, f64) {
    let normalized = normalize(transcript);

    let mut machine_matches = exact_match_count(&normalized, &keywords.machine);
    let mut human_matches = exact_match_count(&normalized, &keywords.human);

    if machine_matches == 0 && human_matches == 0 {
        let words: Vec<&str> = normalized.split_whitespace().collect();
        machine_matches = fuzzy_match_count(&words, &keywords.machine);
        human_matches = fuzzy_match_count(&words, &keywords.human);
    }

    let machine_conf = class_confidence(machine_matches, keywords.machine.len());
    let human_conf = class_confidence(human_matches, keywords.human.len());

    if machine_conf >= DECISION_THRESHOLD && machine_conf > human_conf {
        (AmdVerdict::Machine, machine_conf)
    } else if human_conf >= DECISION_THRESHOLD {
        (AmdVerdict::Human, human_conf)
    } else {
        (AmdVerdict::Uncertain, machine_conf.max(human_conf))
    }
}

#[derive(Debug, Default)]
pub struct AmdThemeKeywords(HashMap<String, AmdKeywords>);

impl AmdThemeKeywords {
    pub fn get(&self, theme: &str) -> AmdKeywords {
        self.0.get(theme).cloned().unwrap_or_default()
    }

    pub fn insert(&mut self, theme: impl Into<String>, keywords: AmdKeywords) {
        self.0.insert(theme.into(), keywords);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_machine_keyword_wins() {
        let (verdict, confidence) = classify("please leave a message after the tone", &AmdKeywords::default());
        assert_eq!(verdict, AmdVerdict::Machine);
        // 2 of 3 machine keywords match exactly: 2/3 + 0.2 boost.
        assert!(confidence >= 0.8);
    }

    #[test]
    fn multi_keyword_greeting_is_confidently_human() {
        let (verdict, confidence) = classify("hello, yes, speaking", &AmdKeywords::default());
        assert_eq!(verdict, AmdVerdict::Human);
        assert!(confidence >= 0.9);
    }

    #[test]
    fn ambiguous_short_silence_is_uncertain() {
        let (verdict, _) = classify("mmh", &AmdKeywords::default());
        assert_eq!(verdict, AmdVerdict::Uncertain);
    }

    #[test]
    fn single_weak_keyword_hit_stays_uncertain() {
        // One matched keyword out of three isn't enough evidence either
        // way; §4.3 treats this as Uncertain, not a confident verdict.
        let (verdict, confidence) = classify("hello there", &AmdKeywords::default());
        assert_eq!(verdict, AmdVerdict::Uncertain);
        assert!(confidence < 0.6);
    }

    #[test]
    fn fuzzy_match_detects_a_misheard_single_word_keyword() {
        let (verdict, confidence) = classify("sounds like a voicemale to me", &AmdKeywords::default());
        // Single fuzzy hit out of three keywords isn't enough to confirm
        // Machine on its own, but it's no longer flat zero confidence.
        assert_eq!(verdict, AmdVerdict::Uncertain);
        assert!(confidence > 0.0);
    }
}
