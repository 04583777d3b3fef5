//! Objection scoring: match a caller's response against a theme's
//! objection entries using a hybrid score that blends whole-phrase
//! similarity with raw keyword overlap, so both near-verbatim repeats and
//! loosely-worded objections are caught.

use std::collections::HashSet;

use strsim::jaro_winkler;

use crate::nlu::normalize::normalize;
use crate::objection::entry::ObjectionEntry;

const SIMILARITY_WEIGHT: f64 = 0.7;
const OVERLAP_WEIGHT: f64 = 0.3;
const MATCH_THRESHOLD: f64 = 0.55;

fn keyword_overlap(a: &str, b: &str) -> f64 {
    let a_words: HashSet<&str> = a.split_whitespace().collect();
    let b_words: HashSet<&str> = b.split_whitespace().collect();
    if a_words.is_empty() || b_words.is_empty() {
        return 0.0;
    }
    let intersection = a_words.intersection(&b_words).count() as f64;
    let denom = a_words.len().max(b_words.len()) as f64;
    intersection / denom
}

fn score_against_phrase(transcript: &str, phrase: &str) -> f64 {
    let similarity = jaro_winkler(transcript, phrase);
    let overlap = keyword_overlap(transcript, phrase);
    SIMILARITY_WEIGHT * similarity + OVERLAP_WEIGHT * overlap
}

/// Best-matching entry for `transcript`, if any entry's best trigger
/// phrase clears `MATCH_THRESHOLD`.
pub fn best_match<'a>(transcript: &str, entries: &'a [ObjectionEntry]) -> Option<(&'a ObjectionEntry, f64)> {
    let normalized = normalize(transcript);
    let mut best: Option<(&ObjectionEntry, f64)> = None;

    for entry in entries {
        for phrase in &entry.trigger_phrases {
            let score = score_against_phrase(&normalized, &normalize(phrase));
            if score >= MATCH_THRESHOLD && best.as_ref().map(|(_, s)| score > *s).unwrap_or(true) {
                best = Some((entry, score));
            }
        }
    }
    best
}
