//! End-to-end coverage of the call state machine: drives `call::controller::run`
//! and individual phase functions with fakes standing in for the softswitch,
//! speech gateway, persistence, and action dispatch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use voicebot_core::actions::fakes::RecordingActionExecutor;
use voicebot_core::actions::ActionExecutor;
use voicebot_core::call::phases::{playing, processing, CallDeps};
use voicebot_core::call::session::{CallSession, FinalStatus};
use voicebot_core::config::{GeneralConfig, SpeechConfig};
use voicebot_core::nlu::amd::AmdKeywords;
use voicebot_core::nlu::intent::IntentDefinition;
use voicebot_core::objection::{ObjectionEntry, ObjectionLibrary};
use voicebot_core::persistence::fakes::InMemoryPersistence;
use voicebot_core::persistence::PersistencePort;
use voicebot_core::scenario::document::{AudioSource, QualificationConfig, ScenarioDocument, ScenarioStep};
use voicebot_core::softswitch::client::fakes::FakeSoftswitch;
use voicebot_core::softswitch::SoftswitchApi;
use voicebot_core::speech::batch::fakes::FakeBatchTranscriber;
use voicebot_core::speech::stream::fakes::FakeStreamingTranscriber;
use voicebot_core::speech::types::Transcript;
use voicebot_core::speech::StreamEvent;

fn scratch_dir(label: &str) -> std::path::PathBuf {
    use std::sync::atomic::{AtomicUsize, Ordering};
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let unique = COUNTER.fetch_add(1, Ordering::SeqCst);
    let dir = std::env::temp_dir().join(format!("call-controller-phases-{label}-{}-{unique}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn write_default_theme(dir: &std::path::Path, entries: &[ObjectionEntry]) {
    let path = dir.join("default.json");
    std::fs::write(path, serde_json::to_string(entries).unwrap()).unwrap();
}

fn transcript(text: &str) -> Transcript {
    Transcript { text: text.to_string(), confidence: 0.9, is_final: true, duration_ms: 500 }
}

/// Short windows so tests that drive the real AMD/Waiting timers don't
/// actually wait out production-sized silences.
fn fast_speech_config() -> SpeechConfig {
    SpeechConfig { amd_window_ms: 20, waiting_silence_threshold_ms: 50, min_speech_ms: 10, ..SpeechConfig::default() }
}

fn fast_general_config(recordings_dir: &std::path::Path) -> GeneralConfig {
    GeneralConfig {
        rtp_priming_ms: 5,
        recordings_dir: recordings_dir.to_string_lossy().into_owned(),
        ..GeneralConfig::default()
    }
}

/// Two-step scenario: the entry step routes an "affirm" reply straight to a
/// terminal step worth enough points to clear the default threshold.
fn qualified_flow_scenario() -> ScenarioDocument {
    let intro = ScenarioStep {
        id: "intro".into(),
        audio: AudioSource::File { path: "intro.wav".into() },
        intents: vec![IntentDefinition { name: "affirm".into(), phrases: vec!["yes".into()] }],
        routing: HashMap::from([("affirm".to_string(), "goodbye".to_string())]),
        fallback_step: Some("intro".into()),
        silence_step: Some("intro".into()),
        qualification_points: 0.0,
        actions: vec![],
        terminal: false,
        timeout_ms: 5_000,
        barge_in_enabled: false,
        max_autonomous_turns: 0,
    };
    let goodbye = ScenarioStep {
        id: "goodbye".into(),
        audio: AudioSource::File { path: "goodbye.wav".into() },
        intents: vec![],
        routing: HashMap::new(),
        fallback_step: None,
        silence_step: None,
        qualification_points: 100.0,
        actions: vec![],
        terminal: true,
        timeout_ms: 5_000,
        barge_in_enabled: false,
        max_autonomous_turns: 0,
    };
    ScenarioDocument {
        entry_step: "intro".into(),
        theme: "default".into(),
        qualification: QualificationConfig { threshold: 50.0 },
        steps: HashMap::from([("intro".to_string(), intro), ("goodbye".to_string(), goodbye)]),
        fallbacks: HashMap::new(),
    }
}

/// Single-step scenario used for exercising Processing directly: an
/// objection escalates after two rebuttals, silence reprompts rather than
/// dead-ending at the fallback step.
fn pitch_scenario() -> ScenarioDocument {
    let pitch = ScenarioStep {
        id: "pitch".into(),
        audio: AudioSource::File { path: "pitch.wav".into() },
        intents: vec![
            IntentDefinition { name: "affirm".into(), phrases: vec!["yes".into()] },
            IntentDefinition { name: "objection".into(), phrases: vec!["too expensive".into(), "cannot afford it".into()] },
        ],
        routing: HashMap::from([("affirm".to_string(), "qualify".to_string())]),
        fallback_step: Some("clarify".into()),
        silence_step: Some("reprompt".into()),
        qualification_points: 0.0,
        actions: vec![],
        terminal: false,
        timeout_ms: 5_000,
        barge_in_enabled: false,
        max_autonomous_turns: 2,
    };
    ScenarioDocument {
        entry_step: "pitch".into(),
        theme: "default".into(),
        qualification: QualificationConfig { threshold: 60.0 },
        steps: HashMap::from([("pitch".to_string(), pitch)]),
        fallbacks: HashMap::new(),
    }
}

struct Fixture {
    deps: CallDeps,
    softswitch: Arc<FakeSoftswitch>,
    persistence: Arc<InMemoryPersistence>,
}

fn build_fixture(
    scenario: ScenarioDocument,
    streaming_scripts: Vec<Vec<StreamEvent>>,
    objection_entries: &[ObjectionEntry],
    recordings_dir: &std::path::Path,
    batch: FakeBatchTranscriber,
) -> Fixture {
    let dir = scratch_dir(&format!("{}-theme", scenario.theme));
    write_default_theme(&dir, objection_entries);

    let softswitch = Arc::new(FakeSoftswitch::new());
    let softswitch_api: Arc<dyn SoftswitchApi> = softswitch.clone();
    let persistence = Arc::new(InMemoryPersistence::new());
    let persistence_api: Arc<dyn PersistencePort> = persistence.clone();

    // FakeStreamingTranscriber pops scripts from the back; reverse so the
    // first `open_stream` call gets the first script in call order.
    let mut ordered = streaming_scripts;
    ordered.reverse();

    let deps = CallDeps {
        softswitch: softswitch_api,
        streaming: Arc::new(FakeStreamingTranscriber::new(ordered)),
        batch: Arc::new(batch),
        persistence: persistence_api,
        objection_library: Arc::new(ObjectionLibrary::load(&dir, "default").unwrap()),
        actions: Arc::new(RecordingActionExecutor::new()) as Arc<dyn ActionExecutor>,
        scenario: Arc::new(scenario),
        speech_config: fast_speech_config(),
        amd_keywords: AmdKeywords::default(),
        general: fast_general_config(recordings_dir),
    };

    Fixture { deps, softswitch, persistence }
}

#[tokio::test]
async fn machine_greeting_ends_the_call_without_playing_anything() {
    let recordings = scratch_dir("recordings-machine");
    let amd_path = recordings.join("call-1-amd.wav");
    std::fs::write(&amd_path, b"greeting audio").unwrap();
    let batch = FakeBatchTranscriber::new()
        .with_fixture(amd_path.to_str().unwrap(), transcript("please leave a message after the tone"));

    let fixture = build_fixture(qualified_flow_scenario(), vec![], &[], &recordings, batch);

    let mut session = CallSession::new(
        "call-1".into(),
        "camp-1".into(),
        1,
        "+15551234567".into(),
        "+15557654321".into(),
        "default".into(),
        "intro".into(),
    );

    let status = voicebot_core::call::run_call(&mut session, &fixture.deps, Duration::from_secs(5), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(status, FinalStatus::NoAnswer);
    let sent = fixture.softswitch.sent_commands.lock();
    assert!(!sent.iter().any(|c| c.0.contains("uuid_broadcast")));
}

#[tokio::test]
async fn human_greeting_reaches_a_qualified_terminal_step() {
    let recordings = scratch_dir("recordings-human");
    let amd_path = recordings.join("call-2-amd.wav");
    std::fs::write(&amd_path, b"greeting audio").unwrap();
    let waiting_path = recordings.join("call-2-intro-waiting.wav");
    std::fs::write(&waiting_path, b"reply audio").unwrap();

    let batch = FakeBatchTranscriber::new()
        .with_fixture(amd_path.to_str().unwrap(), transcript("hello, yes, speaking"))
        .with_fixture(waiting_path.to_str().unwrap(), transcript("yes"));

    let fixture = build_fixture(
        qualified_flow_scenario(),
        vec![],
        &[ObjectionEntry {
            id: "price".into(),
            trigger_phrases: vec!["too expensive".into()],
            rebuttal_audio: "price.wav".into(),
            escalation_step: None,
        }],
        &recordings,
        batch,
    );

    let mut session = CallSession::new(
        "call-2".into(),
        "camp-1".into(),
        2,
        "+15551234567".into(),
        "+15557654321".into(),
        "default".into(),
        "intro".into(),
    );

    let status = voicebot_core::call::run_call(&mut session, &fixture.deps, Duration::from_secs(5), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(status, FinalStatus::Qualified);
    assert_eq!(session.current_step, "goodbye");
    assert!(session.qualification.is_qualified(&fixture.deps.scenario));

    let sent = fixture.softswitch.sent_commands.lock();
    assert!(sent.iter().any(|c| c.0.contains("uuid_broadcast") && c.0.contains("intro.wav")));
    assert!(sent.iter().any(|c| c.0.contains("uuid_broadcast") && c.0.contains("goodbye.wav")));
}

#[tokio::test]
async fn barge_in_mid_prompt_hands_a_partial_transcript_to_processing() {
    let recordings = scratch_dir("recordings-bargein");
    let fixture = build_fixture(
        qualified_flow_scenario(),
        vec![vec![StreamEvent::Transcript(transcript("wait, hold on"))]],
        &[],
        &recordings,
        FakeBatchTranscriber::new(),
    );
    fixture.softswitch.set_auto_complete_playback(false);

    let session = CallSession::new(
        "call-3".into(),
        "camp-1".into(),
        3,
        "+15551234567".into(),
        "+15557654321".into(),
        "default".into(),
        "intro".into(),
    );

    let outcome = playing::run(&session, &fixture.deps, "intro.wav", true, fixture.softswitch.subscribe())
        .await
        .unwrap();

    assert_eq!(outcome, playing::PlayingOutcome::BargedIn { partial_transcript: Some("wait, hold on".into()) });

    let sent = fixture.softswitch.sent_commands.lock();
    assert!(sent.iter().any(|c| c.0.contains("uuid_broadcast")));
    assert!(!sent.iter().any(|c| c.0.contains("uuid_break")));
}

#[tokio::test]
async fn repeated_objection_escalates_once_the_retry_budget_is_spent() {
    let recordings = scratch_dir("recordings-objection");
    let fixture = build_fixture(
        pitch_scenario(),
        vec![],
        &[ObjectionEntry {
            id: "price".into(),
            trigger_phrases: vec!["too expensive".into(), "cannot afford it".into()],
            rebuttal_audio: "price_rebuttal.wav".into(),
            escalation_step: Some("transfer_to_agent".into()),
        }],
        &recordings,
        FakeBatchTranscriber::new(),
    );

    let mut session = CallSession::new(
        "call-4".into(),
        "camp-1".into(),
        4,
        "+15551234567".into(),
        "+15557654321".into(),
        "default".into(),
        "pitch".into(),
    );

    let first = processing::run(&mut session, &fixture.deps, Some("it's too expensive for me")).unwrap();
    assert_eq!(first, processing::ProcessingOutcome::Rebuttal { audio_path: "price_rebuttal.wav".into() });
    assert_eq!(session.objection_retries_on_step, 1);

    let second = processing::run(&mut session, &fixture.deps, Some("it's too expensive for me")).unwrap();
    assert_eq!(second, processing::ProcessingOutcome::Rebuttal { audio_path: "price_rebuttal.wav".into() });
    assert_eq!(session.objection_retries_on_step, 2);

    let third = processing::run(&mut session, &fixture.deps, Some("it's too expensive for me")).unwrap();
    assert_eq!(third, processing::ProcessingOutcome::Route { next_step: "transfer_to_agent".into() });
    assert_eq!(session.objection_retries_on_step, 0);
}

#[tokio::test]
async fn silence_routes_to_the_reprompt_step_not_the_fallback() {
    let recordings = scratch_dir("recordings-silence");
    let fixture = build_fixture(pitch_scenario(), vec![], &[], &recordings, FakeBatchTranscriber::new());

    let mut session = CallSession::new(
        "call-5".into(),
        "camp-1".into(),
        5,
        "+15551234567".into(),
        "+15557654321".into(),
        "default".into(),
        "pitch".into(),
    );

    let outcome = processing::run(&mut session, &fixture.deps, None).unwrap();
    assert_eq!(outcome, processing::ProcessingOutcome::Route { next_step: "reprompt".into() });
}

#[tokio::test]
async fn persistence_phase_updates_are_recorded_as_the_call_progresses() {
    let recordings = scratch_dir("recordings-persistence");
    let amd_path = recordings.join("call-6-amd.wav");
    std::fs::write(&amd_path, b"greeting audio").unwrap();
    let waiting_path = recordings.join("call-6-intro-waiting.wav");
    std::fs::write(&waiting_path, b"reply audio").unwrap();

    let batch = FakeBatchTranscriber::new()
        .with_fixture(amd_path.to_str().unwrap(), transcript("hello, yes, speaking"))
        .with_fixture(waiting_path.to_str().unwrap(), transcript("yes"));

    let fixture = build_fixture(qualified_flow_scenario(), vec![], &[], &recordings, batch);

    let mut session = CallSession::new(
        "call-6".into(),
        "camp-1".into(),
        6,
        "+15551234567".into(),
        "+15557654321".into(),
        "default".into(),
        "intro".into(),
    );

    voicebot_core::call::run_call(&mut session, &fixture.deps, Duration::from_secs(5), CancellationToken::new())
        .await
        .unwrap();

    let phases: Vec<&str> = fixture.persistence.phases.lock().iter().map(|(_, phase)| phase.as_str()).collect();
    assert_eq!(phases, vec!["amd", "playing", "waiting", "playing", "terminating"]);
    assert!(fixture.persistence.phases.lock().iter().all(|(call_id, _)| call_id == "call-6"));
}
