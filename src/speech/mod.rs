//! Speech gateway: batch transcription for AMD/scoring, streaming
//! transcription for live AMD and barge-in detection (spec §4.3).

pub mod batch;
pub mod stream;
pub mod types;

pub use batch::BatchTranscriber;
pub use stream::{StreamHandle, StreamingTranscriber};
pub use types::{StreamEvent, Transcript};
