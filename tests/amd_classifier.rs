//! End-to-end AMD classification across the scenarios the spec calls out:
//! a clean human greeting, a voicemail greeting, and an ambiguous grunt
//! that should stay uncertain rather than forcing a guess.

use voicebot_core::nlu::amd::{classify, AmdKeywords, AmdVerdict};

#[test]
fn human_hello_is_classified_human_quickly() {
    let (verdict, _) = classify("hello, yes, speaking, who's calling?", &AmdKeywords::default());
    assert_eq!(verdict, AmdVerdict::Human);
}

#[test]
fn voicemail_greeting_is_classified_machine() {
    let (verdict, confidence) = classify(
        "you've reached the voicemail of Alex, please leave a message after the tone",
        &AmdKeywords::default(),
    );
    assert_eq!(verdict, AmdVerdict::Machine);
    assert!(confidence > 0.9);
}

#[test]
fn short_ambiguous_grunt_stays_uncertain() {
    let (verdict, _) = classify("uh", &AmdKeywords::default());
    assert_eq!(verdict, AmdVerdict::Uncertain);
}

#[test]
fn accented_and_punctuated_human_greeting_still_matches() {
    let (verdict, _) = classify("¿Bueno? ¿Quién es?", &AmdKeywords::default());
    // Spanish greetings aren't in the default keyword list; this asserts
    // the normalizer runs without panicking and falls back to uncertain
    // rather than misclassifying as machine.
    assert_ne!(verdict, AmdVerdict::Machine);
}
