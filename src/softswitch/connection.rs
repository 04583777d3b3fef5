//! Dual-connection transport: one socket for the event stream, one for
//! API request/reply. Grounded in the teacher's builder-style connection
//! setup (`orchestrator/core.rs`), adapted from a single SIP stack to the
//! two-socket Event-Socket pattern spec §4.1 calls for.

use std::time::Duration;

use tokio::io::{AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, Mutex};

use crate::error::{Result, VoicebotError};
use crate::softswitch::protocol::{encode_command, read_frame, Frame};

/// One authenticated connection to the softswitch, either role.
pub struct Connection {
    reader: Mutex<BufReader<tokio::net::tcp::OwnedReadHalf>>,
    writer: Mutex<tokio::net::tcp::OwnedWriteHalf>,
}

impl Connection {
    /// Connect and perform the `auth`/`Content-Type: auth/request` handshake.
    pub async fn connect(host: &str, port: u16, password: &str) -> Result<Self> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|e| VoicebotError::softswitch_command(format!("connect {host}:{port}: {e}")))?;
        let (read_half, write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        // Provider greets with an auth/request frame before we send anything.
        let greeting = read_frame(&mut reader)
            .await?
            .ok_or_else(|| VoicebotError::softswitch_command("connection closed during handshake"))?;
        if greeting.header("Content-Type") != Some("auth/request") {
            return Err(VoicebotError::softswitch_command("unexpected handshake greeting"));
        }

        let mut writer = write_half;
        writer
            .write_all(encode_command(&format!("auth {password}")).as_slice())
            .await
            .map_err(|e| VoicebotError::softswitch_command(format!("auth write: {e}")))?;
        let reply = read_frame(&mut reader)
            .await?
            .ok_or_else(|| VoicebotError::softswitch_command("connection closed after auth"))?;
        if reply.is_error() {
            return Err(VoicebotError::softswitch_command(format!(
                "auth rejected: {}",
                reply.reply_text()
            )));
        }

        Ok(Self { reader: Mutex::new(reader), writer: Mutex::new(writer) })
    }

    /// Subscribe to the event classes this client acts on.
    pub async fn subscribe_events(&self, events: &[&str]) -> Result<()> {
        self.send_raw(&format!("event plain {}", events.join(" "))).await?;
        Ok(())
    }

    /// Send a raw command line and wait for its reply frame.
    pub async fn send_raw(&self, command: &str) -> Result<Frame> {
        {
            let mut writer = self.writer.lock().await;
            writer
                .write_all(encode_command(command).as_slice())
                .await
                .map_err(|e| VoicebotError::softswitch_command(format!("write: {e}")))?;
        }
        let mut reader = self.reader.lock().await;
        read_frame(&mut reader)
            .await?
            .ok_or_else(|| VoicebotError::softswitch_command("connection closed awaiting reply"))
    }

    /// Drain frames from the event connection into `tx` until the socket
    /// closes or errors. Runs as its own task; the caller decides whether
    /// that means reconnect or shutdown.
    pub async fn pump_events(&self, tx: mpsc::Sender<Frame>) -> Result<()> {
        loop {
            let frame = {
                let mut reader = self.reader.lock().await;
                read_frame(&mut reader).await?
            };
            match frame {
                Some(frame) => {
                    if tx.send(frame).await.is_err() {
                        return Ok(());
                    }
                }
                None => return Err(VoicebotError::softswitch_command("event connection closed")),
            }
        }
    }
}

/// Exponential backoff with a cap, used when re-establishing either
/// connection after a drop (spec §4.1).
pub struct Backoff {
    current_ms: u64,
    max_ms: u64,
}

impl Backoff {
    pub fn new(initial_ms: u64, max_ms: u64) -> Self {
        Self { current_ms: initial_ms, max_ms }
    }

    pub fn next(&mut self) -> Duration {
        let wait = self.current_ms;
        self.current_ms = (self.current_ms * 2).min(self.max_ms);
        Duration::from_millis(wait)
    }

    pub fn reset(&mut self, initial_ms: u64) {
        self.current_ms = initial_ms;
    }
}
