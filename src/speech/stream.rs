//! Streaming transcription: a live duplex session fed audio frames and
//! producing `StreamEvent`s as speech starts, ends, and is transcribed.
//! Used for AMD live classification and in-call barge-in detection
//! (spec §4.3, §4.5). Split into a feed side and an event side the same
//! way a media-forwarding worker splits ingestion from ASR, connected by
//! an internal channel rather than sharing a mutable buffer.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

use crate::error::{Result, VoicebotError};
use crate::speech::types::{StreamEvent, Transcript};

/// A live session: push audio in, get typed events out.
pub struct StreamHandle {
    audio_tx: mpsc::Sender<Bytes>,
    events_rx: mpsc::Receiver<StreamEvent>,
}

impl StreamHandle {
    pub async fn push_audio(&self, frame: Bytes) -> Result<()> {
        self.audio_tx
            .send(frame)
            .await
            .map_err(|_| VoicebotError::speech_gateway("stream closed"))
    }

    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        self.events_rx.recv().await
    }
}

/// A transport that can open a live transcription stream.
#[async_trait]
pub trait StreamingTranscriber: Send + Sync {
    async fn open_stream(&self) -> Result<StreamHandle>;
    async fn is_available(&self) -> bool;
}

/// Websocket-backed implementation. Each call gets its own socket; the
/// provider's wire framing (JSON event frames interleaved with binary
/// audio frames) is opaque to callers of `StreamHandle`.
pub struct WsStreamingTranscriber {
    endpoint: String,
}

impl WsStreamingTranscriber {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self { endpoint: endpoint.into() }
    }
}

#[async_trait]
impl StreamingTranscriber for WsStreamingTranscriber {
    async fn open_stream(&self) -> Result<StreamHandle> {
        let (ws, _) = tokio_tungstenite::connect_async(&self.endpoint)
            .await
            .map_err(|e| VoicebotError::speech_gateway(format!("connect: {e}")))?;
        let (mut sink, mut source) = ws.split();

        let (audio_tx, mut audio_rx) = mpsc::channel::<Bytes>(64);
        let (events_tx, events_rx) = mpsc::channel::<StreamEvent>(64);

        // Ingestion side: forward audio frames to the socket.
        tokio::spawn(async move {
            while let Some(frame) = audio_rx.recv().await {
                if sink.send(Message::Binary(frame.to_vec())).await.is_err() {
                    break;
                }
            }
        });

        // Event side: parse provider frames into StreamEvent.
        let events_tx2 = events_tx.clone();
        tokio::spawn(async move {
            while let Some(msg) = source.next().await {
                let event = match msg {
                    Ok(Message::Text(text)) => parse_provider_event(&text),
                    Ok(Message::Close(_)) => break,
                    Err(e) => StreamEvent::Error(e.to_string()),
                    _ => continue,
                };
                if events_tx2.send(event).await.is_err() {
                    break;
                }
            }
        });

        Ok(StreamHandle { audio_tx, events_rx })
    }

    async fn is_available(&self) -> bool {
        tokio_tungstenite::connect_async(&self.endpoint).await.is_ok()
    }
}

fn parse_provider_event(text: &str) -> StreamEvent {
    #[derive(serde::Deserialize)]
    #[serde(tag = "type", rename_all = "snake_case")]
    enum Wire {
        SpeechStart,
        SpeechEnd { duration_ms: u64 },
        Transcript { text: String, confidence: f32, is_final: bool, duration_ms: u64 },
    }
    match serde_json::from_str::<Wire>(text) {
        Ok(Wire::SpeechStart) => StreamEvent::SpeechStart,
        Ok(Wire::SpeechEnd { duration_ms }) => StreamEvent::SpeechEnd { duration_ms },
        Ok(Wire::Transcript { text, confidence, is_final, duration_ms }) => {
            StreamEvent::Transcript(Transcript { text, confidence, is_final, duration_ms })
        }
        Err(e) => StreamEvent::Error(format!("malformed provider frame: {e}")),
    }
}

pub mod fakes {
    use super::*;
    use std::sync::Mutex;

    /// A stream whose events are pre-scripted, for deterministic tests of
    /// AMD and barge-in logic without a real websocket.
    pub struct FakeStreamingTranscriber {
        scripts: Mutex<Vec<Vec<StreamEvent>>>,
    }

    impl FakeStreamingTranscriber {
        pub fn new(scripts: Vec<Vec<StreamEvent>>) -> Self {
            Self { scripts: Mutex::new(scripts) }
        }
    }

    #[async_trait]
    impl StreamingTranscriber for FakeStreamingTranscriber {
        async fn open_stream(&self) -> Result<StreamHandle> {
            let script = self
                .scripts
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| VoicebotError::speech_gateway("no scripted stream left"))?;
            let (audio_tx, _audio_rx) = mpsc::channel(1);
            let (events_tx, events_rx) = mpsc::channel(script.len().max(1));
            for event in script {
                let _ = events_tx.try_send(event);
            }
            Ok(StreamHandle { audio_tx, events_rx })
        }

        async fn is_available(&self) -> bool {
            true
        }
    }
}
