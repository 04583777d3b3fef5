//! Wire codec for the softswitch's Event Socket-style protocol.
//!
//! Frames are a block of `Header: value` lines terminated by a blank line,
//! with an optional body whose length is given by a `Content-Length`
//! header. Header ordering is not significant and unknown headers are
//! preserved verbatim so callers can read whatever they need.

use std::collections::HashMap;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};

use crate::error::{Result, VoicebotError};

/// One parsed frame: headers plus an optional raw body.
#[derive(Debug, Clone, Default)]
pub struct Frame {
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
}

impl Frame {
    pub fn header(&self, key: &str) -> Option<&str> {
        self.headers.get(key).map(|s| s.as_str())
    }

    /// Unescaped the provider's failure sentinel: a reply whose first body
    /// line (or, if no body, whose `Reply-Text` header) begins with `-ERR`.
    pub fn is_error(&self) -> bool {
        if let Some(body) = &self.body {
            if body.starts_with("-ERR") {
                return true;
            }
        }
        self.header("Reply-Text").map(|t| t.starts_with("-ERR")).unwrap_or(false)
    }

    pub fn reply_text(&self) -> String {
        self.body.clone().unwrap_or_else(|| {
            self.header("Reply-Text").map(str::to_string).unwrap_or_default()
        })
    }
}

/// Read one frame from a buffered async reader.
///
/// Tolerates header-ordering variance and ignores headers it does not
/// recognise (the caller decides what matters). Returns `Ok(None)` on a
/// clean EOF between frames.
pub async fn read_frame<R>(reader: &mut BufReader<R>) -> Result<Option<Frame>>
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut headers = HashMap::new();
    let mut line = String::new();
    let mut saw_any_header = false;

    loop {
        line.clear();
        let n = reader
            .read_line(&mut line)
            .await
            .map_err(|e| VoicebotError::softswitch_command(format!("read error: {e}")))?;
        if n == 0 {
            return if saw_any_header {
                Err(VoicebotError::softswitch_command("connection closed mid-frame"))
            } else {
                Ok(None)
            };
        }
        let trimmed = line.trim_end_matches(['\r', '\n']);
        if trimmed.is_empty() {
            break;
        }
        saw_any_header = true;
        if let Some((key, value)) = trimmed.split_once(':') {
            headers.insert(key.trim().to_string(), value.trim().to_string());
        }
    }

    let body = if let Some(len) = headers.get("Content-Length").and_then(|v| v.parse::<usize>().ok())
    {
        let mut buf = vec![0u8; len];
        reader
            .read_exact(&mut buf)
            .await
            .map_err(|e| VoicebotError::softswitch_command(format!("short body: {e}")))?;
        Some(String::from_utf8_lossy(&buf).into_owned())
    } else {
        None
    };

    Ok(Some(Frame { headers, body }))
}

/// Serialize a single-line command as the protocol expects: command text
/// followed by a blank line.
pub fn encode_command(command: &str) -> Vec<u8> {
    format!("{command}\n\n").into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::BufReader;

    #[tokio::test]
    async fn parses_headers_only_frame() {
        let raw = b"Event-Name: CHANNEL_ANSWER\r\nUnique-ID: abc-123\r\n\r\n".to_vec();
        let mut reader = BufReader::new(&raw[..]);
        let frame = read_frame(&mut reader).await.unwrap().unwrap();
        assert_eq!(frame.header("Event-Name"), Some("CHANNEL_ANSWER"));
        assert_eq!(frame.header("Unique-ID"), Some("abc-123"));
        assert!(frame.body.is_none());
    }

    #[tokio::test]
    async fn parses_frame_with_body() {
        let body = "-ERR NO_ANSWER\n";
        let raw = format!("Content-Length: {}\n\n{}", body.len(), body).into_bytes();
        let mut reader = BufReader::new(&raw[..]);
        let frame = read_frame(&mut reader).await.unwrap().unwrap();
        assert!(frame.is_error());
    }

    #[tokio::test]
    async fn clean_eof_between_frames_is_none() {
        let raw: Vec<u8> = Vec::new();
        let mut reader = BufReader::new(&raw[..]);
        assert!(read_frame(&mut reader).await.unwrap().is_none());
    }
}
