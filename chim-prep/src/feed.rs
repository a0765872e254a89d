//! Push progress feed
//!
//! Reads the importer's Server-Sent-Events stream and republishes every
//! `progress` frame on the [`EventBus`]. Connection changes are published
//! as `FeedStatus` events. When the stream ends or fails the feed waits the
//! reconnect delay and connects again, until its token is cancelled.

use crate::backend::http::{api_url, auth_headers, USER_AGENT};
use crate::backend::BackendError;
use chim_common::config::ClientConfig;
use chim_common::events::{EventBus, ImporterEvent, ProgressEvent};
use futures::StreamExt;
use reqwest::header::ACCEPT;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Endpoint name under `/api/v1`
pub const PROGRESS_STREAM: &str = "importers.progress/stream";

/// SSE event name carrying a progress payload
pub const PROGRESS_EVENT: &str = "progress";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// One dispatched SSE message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseFrame {
    pub event: Option<String>,
    pub data: String,
}

/// Incremental `text/event-stream` parser
///
/// Chunks may split lines (and UTF-8 sequences) anywhere; incomplete input
/// is buffered until the next push.
#[derive(Debug, Default)]
pub struct SseParser {
    pending: Vec<u8>,
    event: Option<String>,
    data: Vec<String>,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed raw bytes, returning every frame completed by them
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseFrame> {
        self.pending.extend_from_slice(chunk);

        let mut frames = Vec::new();
        while let Some(end) = self.pending.iter().position(|&b| b == b'\n') {
            let raw: Vec<u8> = self.pending.drain(..=end).collect();
            let line = String::from_utf8_lossy(&raw[..end]);
            let line = line.strip_suffix('\r').unwrap_or(&line);

            if let Some(frame) = self.process_line(line) {
                frames.push(frame);
            }
        }
        frames
    }

    fn process_line(&mut self, line: &str) -> Option<SseFrame> {
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.event = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            // id / retry / unknown fields are not used
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseFrame> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseFrame { event, data })
    }
}

/// Decode a frame into a progress event; other frames yield `None`
pub fn decode_progress(frame: &SseFrame) -> Option<ProgressEvent> {
    if frame.event.as_deref() != Some(PROGRESS_EVENT) {
        return None;
    }
    match serde_json::from_str::<ProgressEvent>(&frame.data) {
        Ok(progress) => Some(progress),
        Err(e) => {
            warn!(error = %e, "Malformed progress frame");
            None
        }
    }
}

/// SSE client publishing onto an [`EventBus`]
pub struct ProgressFeed {
    http_client: reqwest::Client,
    url: String,
    bus: EventBus,
    reconnect_delay: Duration,
}

impl ProgressFeed {
    pub fn new(config: &ClientConfig, bus: EventBus) -> Result<Self, BackendError> {
        // No overall timeout: the stream is expected to stay open
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(auth_headers(config)?)
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Ok(Self {
            http_client,
            url: api_url(&config.server_url, PROGRESS_STREAM),
            bus,
            reconnect_delay: config.feed_reconnect_delay(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }

    /// Connect, stream, reconnect; returns once `cancel` fires
    pub async fn run(self, cancel: CancellationToken) {
        info!(url = %self.url, "Progress feed started");

        loop {
            if cancel.is_cancelled() {
                break;
            }

            match self.stream_once(&cancel).await {
                Ok(()) if cancel.is_cancelled() => break,
                Ok(()) => debug!(url = %self.url, "Progress stream ended"),
                Err(e) => warn!(url = %self.url, error = %e, "Progress stream failed"),
            }
            self.bus.emit_lossy(ImporterEvent::feed_status(false));

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }
            debug!(url = %self.url, "Reconnecting progress feed");
        }

        info!(url = %self.url, "Progress feed stopped");
    }

    async fn stream_once(&self, cancel: &CancellationToken) -> Result<(), BackendError> {
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            response = self.http_client.get(&self.url).header(ACCEPT, "text/event-stream").send() => {
                response.map_err(|e| BackendError::Network(e.to_string()))?
            }
        };

        if !response.status().is_success() {
            return Err(BackendError::Api {
                status: response.status().as_u16(),
                message: None,
            });
        }

        self.bus.emit_lossy(ImporterEvent::feed_status(true));

        let mut stream = response.bytes_stream();
        let mut parser = SseParser::new();
        loop {
            let chunk = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Ok(()),
                chunk = stream.next() => chunk,
            };

            let bytes = match chunk {
                Some(Ok(bytes)) => bytes,
                Some(Err(e)) => return Err(BackendError::Network(e.to_string())),
                None => return Ok(()),
            };

            for frame in parser.push(&bytes) {
                if let Some(progress) = decode_progress(&frame) {
                    debug!(rate = progress.rate, "Progress pushed");
                    self.bus.emit_lossy(ImporterEvent::progress(progress));
                }
            }
        }
    }
}
