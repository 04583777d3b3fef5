//! Public softswitch client contract (spec §4.1): `Originate`, `ExecApi`,
//! `Subscribe`, `Close`. Owns the reconnect loop for both connections and
//! fans out a synthetic `ProviderDisconnected` event per tracked call when
//! the event connection drops, so the call controller can decide how to
//! fail calls that were in flight rather than hang forever.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashSet;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::SoftswitchConfig;
use crate::error::{Result, VoicebotError};
use crate::softswitch::commands::Command;
use crate::softswitch::connection::{Backoff, Connection};
use crate::softswitch::events::SoftswitchEvent;
use crate::softswitch::protocol::Frame;

/// The seam call phases and the campaign runner depend on, so tests can
/// substitute a fake transport instead of a live softswitch connection.
#[async_trait]
pub trait SoftswitchApi: Send + Sync {
    fn subscribe(&self) -> broadcast::Receiver<SoftswitchEvent>;
    fn track_call(&self, call_id: &str);
    fn untrack_call(&self, call_id: &str);
    async fn originate(
        &self,
        destination: &str,
        caller_id: &str,
        application_vars: &HashMap<String, String>,
    ) -> Result<String>;
    async fn exec_api(&self, command: &Command) -> Result<Frame>;
    fn close(&self);
}

const SUBSCRIBED_EVENTS: &[&str] = &[
    "CHANNEL_CREATE",
    "CHANNEL_ANSWER",
    "CHANNEL_HANGUP",
    "CHANNEL_HANGUP_COMPLETE",
    "CHANNEL_DESTROY",
    "PLAYBACK_START",
    "PLAYBACK_STOP",
    "RECORD_START",
    "RECORD_STOP",
    "DETECTED_SPEECH",
];

/// Handle to the softswitch. Cheap to clone; the reconnect loop and API
/// connection live behind `Arc`s.
#[derive(Clone)]
pub struct SoftswitchClient {
    inner: Arc<Inner>,
}

struct Inner {
    config: SoftswitchConfig,
    api: tokio::sync::RwLock<Option<Arc<Connection>>>,
    events: broadcast::Sender<SoftswitchEvent>,
    tracked_calls: DashSet<String>,
    shutdown: CancellationToken,
}

impl SoftswitchClient {
    /// Connect both sockets and spawn the event pump. Returns once the
    /// first connection attempt succeeds; subsequent drops are handled by
    /// the background reconnect loop.
    pub async fn connect(config: SoftswitchConfig) -> Result<Self> {
        let (events_tx, _) = broadcast::channel(1024);
        let inner = Arc::new(Inner {
            config: config.clone(),
            api: tokio::sync::RwLock::new(None),
            events: events_tx,
            tracked_calls: DashSet::new(),
            shutdown: CancellationToken::new(),
        });
        let client = Self { inner };
        client.reconnect_api().await?;
        client.spawn_event_loop();
        Ok(client)
    }

    async fn reconnect_api(&self) -> Result<()> {
        let conn =
            Connection::connect(&self.inner.config.api_host, self.inner.config.api_port, &self.inner.config.password)
                .await?;
        *self.inner.api.write().await = Some(Arc::new(conn));
        Ok(())
    }

    fn spawn_event_loop(&self) {
        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            let mut backoff = Backoff::new(
                inner.config.reconnect_initial_backoff_ms,
                inner.config.reconnect_max_backoff_ms,
            );
            loop {
                if inner.shutdown.is_cancelled() {
                    return;
                }
                let connected = Connection::connect(
                    &inner.config.event_host,
                    inner.config.event_port,
                    &inner.config.password,
                )
                .await;
                let conn = match connected {
                    Ok(conn) => conn,
                    Err(e) => {
                        warn!(error = %e, "event connection failed, backing off");
                        tokio::time::sleep(backoff.next()).await;
                        continue;
                    }
                };
                if let Err(e) = conn.subscribe_events(SUBSCRIBED_EVENTS).await {
                    warn!(error = %e, "event subscription failed, backing off");
                    tokio::time::sleep(backoff.next()).await;
                    continue;
                }
                backoff.reset(inner.config.reconnect_initial_backoff_ms);
                info!("softswitch event connection established");

                let (frame_tx, mut frame_rx) = mpsc::channel::<Frame>(256);
                let pump = tokio::spawn(async move { conn.pump_events(frame_tx).await });

                loop {
                    tokio::select! {
                        _ = inner.shutdown.cancelled() => return,
                        frame = frame_rx.recv() => {
                            match frame {
                                Some(frame) => {
                                    if let Some(event) = SoftswitchEvent::from_frame(&frame) {
                                        let _ = inner.events.send(event);
                                    }
                                }
                                None => break,
                            }
                        }
                    }
                }
                let _ = pump.await;

                error!("softswitch event connection lost, synthesizing disconnects");
                for call_id in inner.tracked_calls.iter() {
                    let _ = inner
                        .events
                        .send(SoftswitchEvent::ProviderDisconnected { call_id: call_id.clone() });
                }
                inner.tracked_calls.clear();
                tokio::time::sleep(backoff.next()).await;
            }
        });
    }

    /// Subscribe to the event broadcast. Each call controller holds its
    /// own receiver and filters by call id.
    pub fn subscribe(&self) -> broadcast::Receiver<SoftswitchEvent> {
        self.inner.events.subscribe()
    }

    /// Register a call id so it receives a synthetic `ProviderDisconnected`
    /// event if the event connection drops while it is active.
    pub fn track_call(&self, call_id: &str) {
        self.inner.tracked_calls.insert(call_id.to_string());
    }

    pub fn untrack_call(&self, call_id: &str) {
        self.inner.tracked_calls.remove(call_id);
    }

    /// Originate an outbound channel. Returns the provider-assigned call id
    /// parsed from the reply body on success.
    pub async fn originate(
        &self,
        destination: &str,
        caller_id: &str,
        application_vars: &HashMap<String, String>,
    ) -> Result<String> {
        let cmd = Command::originate(destination, caller_id, application_vars);
        let reply = self.exec_api(&cmd).await?;
        if reply.is_error() {
            return Err(VoicebotError::OriginateFailed { reason: reply.reply_text() });
        }
        let call_id = reply.reply_text().trim().to_string();
        if call_id.is_empty() {
            return Err(VoicebotError::OriginateFailed { reason: "empty reply to originate".into() });
        }
        self.track_call(&call_id);
        Ok(call_id)
    }

    /// Send a pre-built command on the API connection and return its reply.
    pub async fn exec_api(&self, command: &Command) -> Result<Frame> {
        let conn = {
            let guard = self.inner.api.read().await;
            guard.clone()
        };
        let conn = conn.ok_or_else(|| VoicebotError::SoftswitchDisconnected {
            reason: "api connection not established".into(),
        })?;
        match conn.send_raw(&command.0).await {
            Ok(frame) => Ok(frame),
            Err(e) => {
                warn!(error = %e, "api command failed, reconnecting");
                self.reconnect_api().await?;
                let guard = self.inner.api.read().await;
                let conn = guard
                    .clone()
                    .ok_or_else(|| VoicebotError::SoftswitchDisconnected { reason: "reconnect failed".into() })?;
                conn.send_raw(&command.0).await
            }
        }
    }

    /// Tear down both connections and stop the reconnect loop.
    pub fn close(&self) {
        self.inner.shutdown.cancel();
    }
}

#[async_trait]
impl SoftswitchApi for SoftswitchClient {
    fn subscribe(&self) -> broadcast::Receiver<SoftswitchEvent> {
        SoftswitchClient::subscribe(self)
    }

    fn track_call(&self, call_id: &str) {
        SoftswitchClient::track_call(self, call_id)
    }

    fn untrack_call(&self, call_id: &str) {
        SoftswitchClient::untrack_call(self, call_id)
    }

    async fn originate(
        &self,
        destination: &str,
        caller_id: &str,
        application_vars: &HashMap<String, String>,
    ) -> Result<String> {
        SoftswitchClient::originate(self, destination, caller_id, application_vars).await
    }

    async fn exec_api(&self, command: &Command) -> Result<Frame> {
        SoftswitchClient::exec_api(self, command).await
    }

    fn close(&self) {
        SoftswitchClient::close(self)
    }
}

/// Deterministic fake for tests that exercise call phases and the
/// campaign runner without a live softswitch connection.
pub mod fakes {
    use super::*;
    use parking_lot::Mutex;

    pub struct FakeSoftswitch {
        events: broadcast::Sender<SoftswitchEvent>,
        pub sent_commands: Mutex<Vec<Command>>,
        pub originate_result: Mutex<Option<Result<String>>>,
        auto_complete_playback: std::sync::atomic::AtomicBool,
    }

    impl FakeSoftswitch {
        pub fn new() -> Self {
            let (events, _) = broadcast::channel(256);
            Self {
                events,
                sent_commands: Mutex::new(Vec::new()),
                originate_result: Mutex::new(None),
                auto_complete_playback: std::sync::atomic::AtomicBool::new(true),
            }
        }

        pub fn emit(&self, event: SoftswitchEvent) {
            let _ = self.events.send(event);
        }

        /// Tests that want to drive barge-in need playback to stay open
        /// until they emit `PlaybackStop` themselves.
        pub fn set_auto_complete_playback(&self, enabled: bool) {
            self.auto_complete_playback.store(enabled, std::sync::atomic::Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl SoftswitchApi for FakeSoftswitch {
        fn subscribe(&self) -> broadcast::Receiver<SoftswitchEvent> {
            self.events.subscribe()
        }

        fn track_call(&self, _call_id: &str) {}
        fn untrack_call(&self, _call_id: &str) {}

        async fn originate(
            &self,
            _destination: &str,
            _caller_id: &str,
            _application_vars: &HashMap<String, String>,
        ) -> Result<String> {
            self.originate_result
                .lock()
                .take()
                .unwrap_or_else(|| Ok(uuid::Uuid::new_v4().to_string()))
        }

        async fn exec_api(&self, command: &Command) -> Result<Frame> {
            self.sent_commands.lock().push(command.clone());
            // A real channel finishes playback on its own; mirror that here so
            // phase tests don't need to synthesize playback completion by hand.
            if self.auto_complete_playback.load(std::sync::atomic::Ordering::SeqCst) {
                if let Some(call_id) = uuid_broadcast_call_id(&command.0) {
                    self.emit(SoftswitchEvent::PlaybackStop { call_id });
                }
            }
            Ok(Frame::default())
        }

        fn close(&self) {}
    }

    fn uuid_broadcast_call_id(raw: &str) -> Option<String> {
        let rest = raw.strip_prefix("api uuid_broadcast ")?;
        rest.split_whitespace().next().map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribed_events_cover_required_set() {
        for required in [
            "CHANNEL_CREATE",
            "CHANNEL_HANGUP_COMPLETE",
            "PLAYBACK_START",
            "DETECTED_SPEECH",
        ] {
            assert!(SUBSCRIBED_EVENTS.contains(&required));
        }
    }
}
