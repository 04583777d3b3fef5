//! One function per phase of the call loop (spec §4.6). Each phase owns a
//! narrow slice of the state machine and returns an outcome the
//! controller uses to decide the next phase; none of them recurse into
//! each other directly.

pub mod amd;
pub mod playing;
pub mod processing;
pub mod terminating;
pub mod waiting;

use std::sync::Arc;

use crate::actions::ActionExecutor;
use crate::config::{GeneralConfig, SpeechConfig};
use crate::nlu::amd::AmdKeywords;
use crate::objection::ObjectionLibrary;
use crate::persistence::PersistencePort;
use crate::scenario::ScenarioDocument;
use crate::softswitch::SoftswitchApi;
use crate::speech::{BatchTranscriber, StreamingTranscriber};

/// Shared, cloneable dependencies every phase needs. Bundled so phase
/// function signatures don't grow a parameter every time a new
/// collaborator is added.
#[derive(Clone)]
pub struct CallDeps {
    pub softswitch: Arc<dyn SoftswitchApi>,
    pub streaming: Arc<dyn StreamingTranscriber>,
    pub batch: Arc<dyn BatchTranscriber>,
    pub persistence: Arc<dyn PersistencePort>,
    pub objection_library: Arc<ObjectionLibrary>,
    pub actions: Arc<dyn ActionExecutor>,
    pub scenario: Arc<ScenarioDocument>,
    pub speech_config: SpeechConfig,
    pub amd_keywords: AmdKeywords,
    pub general: GeneralConfig,
}
