//! Batch transcription: send a complete recording, get one transcript back.
//! Used for AMD classification and for scoring a caller's recorded answer
//! in the Waiting phase once silence has settled (spec §4.3, §4.4).

use async_trait::async_trait;

use crate::error::{Result, VoicebotError};
use crate::speech::types::Transcript;

/// A transport that can transcribe a whole audio file in one request.
#[async_trait]
pub trait BatchTranscriber: Send + Sync {
    async fn transcribe_file(&self, path: &str) -> Result<Transcript>;
    async fn is_available(&self) -> bool;
}

/// HTTP-backed implementation; the concrete wire format is an
/// implementation detail of whichever ASR vendor is configured.
pub struct HttpBatchTranscriber {
    endpoint: String,
    client: reqwest::Client,
}

impl HttpBatchTranscriber {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into(), client: reqwest::Client::new() }
    }
}

#[async_trait]
impl BatchTranscriber for HttpBatchTranscriber {
    async fn transcribe_file(&self, path: &str) -> Result<Transcript> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| VoicebotError::speech_gateway(format!("read {path}: {e}")))?;
        let resp = self
            .client
            .post(&self.endpoint)
            .body(bytes)
            .send()
            .await
            .map_err(|e| VoicebotError::speech_gateway(format!("request: {e}")))?;
        if !resp.status().is_success() {
            return Err(VoicebotError::speech_gateway(format!("status {}", resp.status())));
        }
        resp.json::<Transcript>()
            .await
            .map_err(|e| VoicebotError::speech_gateway(format!("decode: {e}")))
    }

    async fn is_available(&self) -> bool {
        self.client.head(&self.endpoint).send().await.is_ok()
    }
}

pub mod fakes {
    use super::*;
    use std::sync::Mutex;

    /// Deterministic transcriber for tests: returns a fixed transcript for
    /// a given path, or an error if the path is not registered.
    pub struct FakeBatchTranscriber {
        fixtures: Mutex<std::collections::HashMap<String, Transcript>>,
    }

    impl FakeBatchTranscriber {
        pub fn new() -> Self {
            Self { fixtures: Mutex::new(std::collections::HashMap::new()) }
        }

        pub fn with_fixture(self, path: &str, transcript: Transcript) -> Self {
            self.fixtures.lock().unwrap().insert(path.to_string(), transcript);
            self
        }
    }

    #[async_trait]
    impl BatchTranscriber for FakeBatchTranscriber {
        async fn transcribe_file(&self, path: &str) -> Result<Transcript> {
            self.fixtures
                .lock()
                .unwrap()
                .get(path)
                .cloned()
                .ok_or_else(|| VoicebotError::speech_gateway(format!("no fixture for {path}")))
        }

        async fn is_available(&self) -> bool {
            true
        }
    }
}
