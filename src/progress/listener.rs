//! Server push channel — SSE subscription for progress events.
//!
//! Connects to `GET /events` (`text/event-stream`) and forwards every
//! `processing_progress` frame as a [`ProgressEvent`] over an mpsc channel to
//! the UI. The stream is read chunk-by-chunk; chunk boundaries do not align
//! with frame boundaries, so [`SseParser`] accumulates bytes until a blank
//! line completes a frame.
//!
//! The listener reconnects with a fixed delay after any stream loss. Losing
//! the push channel only costs live progress display; request/response flows
//! are unaffected.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::mpsc;

use crate::progress::ProgressEvent;

/// Event name the server uses for progress frames.
const PROGRESS_EVENT: &str = "processing_progress";

/// Delay between reconnect attempts after the stream drops.
const RECONNECT_DELAY: Duration = Duration::from_secs(3);

// ---------------------------------------------------------------------------
// SSE frame parser
// ---------------------------------------------------------------------------

/// One parsed server-sent event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    /// Value of the `event:` field; empty when the frame carried none.
    pub event: String,
    /// Concatenated `data:` lines, joined with `\n`.
    pub data: String,
}

/// Incremental parser for an SSE byte stream.
///
/// Feed raw chunks with [`SseParser::push`]; completed frames come back in
/// arrival order. Comment lines (leading `:`) and fields other than `event:`
/// and `data:` are skipped per the SSE grammar.
#[derive(Debug, Default)]
pub struct SseParser {
    buf: String,
    event: String,
    data: Vec<String>,
}

impl SseParser {
    /// Consume a chunk of bytes, returning any frames it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.buf.push_str(&String::from_utf8_lossy(chunk));

        let mut frames = Vec::new();
        while let Some(nl) = self.buf.find('\n') {
            let line: String = self.buf.drain(..=nl).collect();
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if let Some(frame) = self.take_frame() {
                    frames.push(frame);
                }
            } else {
                self.field(line);
            }
        }
        frames
    }

    fn field(&mut self, line: &str) {
        if line.starts_with(':') {
            return; // comment / keep-alive
        }
        let (name, value) = match line.split_once(':') {
            Some((name, value)) => (name, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };
        match name {
            "event" => self.event = value.to_owned(),
            "data" => self.data.push(value.to_owned()),
            _ => {} // id, retry — not used by this client
        }
    }

    fn take_frame(&mut self) -> Option<SseFrame> {
        if self.data.is_empty() && self.event.is_empty() {
            return None; // blank separator without content
        }
        let frame = SseFrame {
            event: std::mem::take(&mut self.event),
            data: self.data.join("\n"),
        };
        self.data.clear();
        Some(frame)
    }
}

// ---------------------------------------------------------------------------
// Listener task
// ---------------------------------------------------------------------------

/// Run the progress listener until the UI side of `tx` is dropped.
///
/// Spawned once on the tokio runtime at startup. Never returns an error:
/// connection failures are logged and retried after [`RECONNECT_DELAY`].
pub async fn run_progress_listener(
    client: reqwest::Client,
    base_url: String,
    tx: mpsc::Sender<ProgressEvent>,
) {
    let url = format!("{base_url}/events");
    loop {
        match subscribe(&client, &url, &tx).await {
            Ok(ChannelClosed::UiGone) => {
                log::debug!("progress listener stopping: UI channel closed");
                return;
            }
            Ok(ChannelClosed::StreamEnded) => {
                log::info!("progress stream ended; reconnecting");
            }
            Err(e) => {
                log::warn!("progress stream error: {e}; reconnecting");
            }
        }
        tokio::time::sleep(RECONNECT_DELAY).await;
    }
}

enum ChannelClosed {
    /// The server closed the stream; reconnect.
    StreamEnded,
    /// The UI dropped its receiver; shut down.
    UiGone,
}

async fn subscribe(
    client: &reqwest::Client,
    url: &str,
    tx: &mpsc::Sender<ProgressEvent>,
) -> Result<ChannelClosed, reqwest::Error> {
    let response = client.get(url).send().await?.error_for_status()?;
    log::debug!("progress stream connected: {url}");

    let mut stream = response.bytes_stream();
    let mut parser = SseParser::default();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        for frame in parser.push(&chunk) {
            if frame.event != PROGRESS_EVENT {
                continue;
            }
            match serde_json::from_str::<ProgressEvent>(&frame.data) {
                Ok(event) => {
                    if tx.send(event).await.is_err() {
                        return Ok(ChannelClosed::UiGone);
                    }
                }
                Err(e) => log::warn!("malformed progress payload ({e}): {}", frame.data),
            }
        }
    }
    Ok(ChannelClosed::StreamEnded)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
