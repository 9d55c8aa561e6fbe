//! Server-Sent Events adapter for the push channel
//!
//! `SseDecoder` turns raw body chunks into complete `data:` payloads and is
//! transport-free. `SseNotificationChannel` opens the stream with reqwest and
//! feeds it through the decoder.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use reqwest::Client;
use url::Url;

use crate::ports::outbound::{ChannelError, FrameStream, NotificationChannelPort};

const STREAM_PATH: &str = "/sse/stream";
const HEARTBEAT_EVENT: &str = "ping";
/// Heartbeats are passed on in envelope form so the subscriber sees liveness.
const HEARTBEAT_FRAME: &str = r#"{"type":"ping","payload":{}}"#;
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Bound on waiting for the response headers once connected
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(30);

/// Incremental decoder for the `text/event-stream` format.
///
/// Events are separated by a blank line. Multiple `data:` lines are joined
/// with `\n`. Comment lines yield nothing; a heartbeat event yields a `ping`
/// envelope whatever its data.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk, returning every data payload it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buffer.extend(chunk.iter().copied().filter(|b| *b != b'\r'));

        let mut frames = Vec::new();
        while let Some(end) = find_boundary(&self.buffer) {
            let block: Vec<u8> = self.buffer.drain(..end + 2).collect();
            if let Some(data) = decode_event(&String::from_utf8_lossy(&block[..end])) {
                frames.push(data);
            }
        }
        frames
    }

    /// Bytes held back waiting for the end of an event.
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

fn find_boundary(buffer: &[u8]) -> Option<usize> {
    buffer.windows(2).position(|w| w == b"\n\n")
}

fn decode_event(block: &str) -> Option<String> {
    let mut event: Option<&str> = None;
    let mut data: Vec<&str> = Vec::new();

    for line in block.lines() {
        if line.starts_with(':') {
            continue;
        }
        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match field {
            "event" => event = Some(value),
            "data" => data.push(value),
            _ => {}
        }
    }

    if event == Some(HEARTBEAT_EVENT) {
        return Some(HEARTBEAT_FRAME.to_string());
    }
    let data = data.join("\n");
    if data.trim().is_empty() {
        None
    } else {
        Some(data)
    }
}

pub struct SseNotificationChannel {
    client: Client,
    base_url: String,
    credential: Option<String>,
}

impl SseNotificationChannel {
    pub fn new(base_url: &str, credential: Option<String>) -> Self {
        Self {
            client: Client::builder()
                .connect_timeout(CONNECT_TIMEOUT)
                .build()
                .unwrap_or_else(|_| Client::new()),
            base_url: base_url.trim_end_matches('/').to_string(),
            credential: credential.filter(|c| !c.trim().is_empty()),
        }
    }

    pub fn stream_url(&self) -> Result<Url, ChannelError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, STREAM_PATH))
            .map_err(|e| ChannelError::Connect(e.to_string()))?;
        if let Some(credential) = &self.credential {
            url.query_pairs_mut().append_pair("initData", credential);
        }
        Ok(url)
    }
}

#[async_trait]
impl NotificationChannelPort for SseNotificationChannel {
    async fn subscribe(&self) -> Result<FrameStream, ChannelError> {
        let url = self.stream_url()?;
        let request = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send();
        let response = tokio::time::timeout(HANDSHAKE_TIMEOUT, request)
            .await
            .map_err(|_| ChannelError::Connect("no stream headers before timeout".to_string()))?
            .map_err(|e| ChannelError::Connect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ChannelError::Status(status.as_u16()));
        }
        tracing::info!("Push channel subscribed");

        let state = (
            response.bytes_stream().boxed(),
            SseDecoder::new(),
            VecDeque::<String>::new(),
        );
        let frames = stream::unfold(state, |(mut body, mut decoder, mut ready)| async move {
            loop {
                if let Some(frame) = ready.pop_front() {
                    return Some((Ok(frame), (body, decoder, ready)));
                }
                match body.next().await {
                    Some(Ok(chunk)) => ready.extend(decoder.push(&chunk)),
                    Some(Err(e)) => {
                        return Some((
                            Err(ChannelError::Transport(e.to_string())),
                            (body, decoder, ready),
                        ))
                    }
                    None => return None,
                }
            }
        });
        Ok(Box::pin(frames))
    }
}
