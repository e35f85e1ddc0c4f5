use std::sync::{Arc, Mutex};

use futures_util::StreamExt;
use memchr::memchr;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::ConnectionStatus;
use crate::utils::url::{with_token_param, InvalidUrl};

#[derive(Debug, Clone, Default)]
pub struct EventStreamOptions {
    /// Append `access_token` to the URL as the `token` query parameter.
    pub with_credentials: bool,
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SseMessage {
    pub event: Option<String>,
    pub data: String,
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseEvent {
    Opened,
    Message(SseMessage),
    Error(String),
}

/// Incremental decoder for the `text/event-stream` line protocol.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
    data: Vec<String>,
    event: Option<String>,
    last_id: Option<String>,
}

impl SseDecoder {
    /// Feed raw bytes; returns every event completed by them.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseMessage> {
        self.buffer.extend_from_slice(chunk);
        let mut messages = Vec::new();

        while let Some(newline) = memchr(b'\n', &self.buffer) {
            let mut end = newline;
            if end > 0 && self.buffer[end - 1] == b'\r' {
                end -= 1;
            }
            let line = String::from_utf8_lossy(&self.buffer[..end]).into_owned();
            self.buffer.drain(..=newline);
            if let Some(message) = self.process_line(&line) {
                messages.push(message);
            }
        }

        messages
    }

    fn process_line(&mut self, line: &str) -> Option<SseMessage> {
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
            "data" => self.data.push(value.to_string()),
            "event" => self.event = Some(value.to_string()),
            "id" if !value.contains('\0') => self.last_id = Some(value.to_string()),
            _ => {}
        }
        None
    }

    fn dispatch(&mut self) -> Option<SseMessage> {
        let event = self.event.take();
        if self.data.is_empty() {
            return None;
        }
        let data = std::mem::take(&mut self.data).join("\n");
        Some(SseMessage {
            event,
            data,
            id: self.last_id.clone(),
        })
    }
}

pub fn is_event_stream_content_type(content_type: &str) -> bool {
    content_type
        .split(';')
        .next()
        .map(str::trim)
        .is_some_and(|value| value.eq_ignore_ascii_case("text/event-stream"))
}

struct Shared {
    status: watch::Sender<ConnectionStatus>,
    /// Held while publishing so a stream cannot be superseded mid-write.
    generation: Mutex<u64>,
    events: mpsc::UnboundedSender<SseEvent>,
}

impl Shared {
    /// Start a new generation, superseding every running stream.
    fn advance(&self, status: ConnectionStatus) -> u64 {
        let mut generation = self.generation.lock().unwrap();
        *generation += 1;
        self.status.send_replace(status);
        *generation
    }

    /// Status writes from a superseded stream are discarded.
    fn set_status(&self, generation: u64, status: ConnectionStatus) {
        let current = self.generation.lock().unwrap();
        if *current == generation {
            self.status.send_replace(status);
        }
    }

    /// Events from a superseded stream are discarded.
    fn emit(&self, generation: u64, event: SseEvent) {
        let current = self.generation.lock().unwrap();
        if *current == generation {
            let _ = self.events.send(event);
        }
    }
}

/// A server-sent event subscription. It does not retry on its own; call
/// [`EventStream::reconnect`] to open it again.
pub struct EventStream {
    client: reqwest::Client,
    url: String,
    shared: Arc<Shared>,
    cancel: Mutex<CancellationToken>,
}

impl EventStream {
    pub fn open(
        client: reqwest::Client,
        url: &str,
        options: EventStreamOptions,
    ) -> Result<(Self, mpsc::UnboundedReceiver<SseEvent>), InvalidUrl> {
        let url = match (options.with_credentials, options.access_token.as_deref()) {
            (true, Some(token)) => with_token_param(url, token)?,
            _ => url.to_string(),
        };
        let (status, _) = watch::channel(ConnectionStatus::Connecting);
        let (events, rx) = mpsc::unbounded_channel();

        let stream = Self {
            client,
            url,
            shared: Arc::new(Shared {
                status,
                generation: Mutex::new(0),
                events,
            }),
            cancel: Mutex::new(CancellationToken::new()),
        };
        stream.spawn();
        Ok((stream, rx))
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.shared.status.borrow()
    }

    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.shared.status.subscribe()
    }

    /// Tear down the current stream and open a new one immediately.
    pub fn reconnect(&self) {
        self.spawn();
    }

    pub fn disconnect(&self) {
        self.cancel.lock().unwrap().cancel();
        self.shared.advance(ConnectionStatus::Disconnected);
    }

    fn spawn(&self) {
        let cancel = CancellationToken::new();
        let previous = std::mem::replace(&mut *self.cancel.lock().unwrap(), cancel.clone());
        previous.cancel();

        let generation = self.shared.advance(ConnectionStatus::Connecting);

        tokio::spawn(run_stream(
            self.client.clone(),
            self.url.clone(),
            Arc::clone(&self.shared),
            generation,
            cancel,
        ));
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.cancel.lock().unwrap().cancel();
    }
}

async fn run_stream(
    client: reqwest::Client,
    url: String,
    shared: Arc<Shared>,
    generation: u64,
    cancel: CancellationToken,
) {
    let fail = |message: String| {
        warn!(error = %message, "event stream failed");
        shared.set_status(generation, ConnectionStatus::Error);
        shared.emit(generation, SseEvent::Error(message));
    };

    let request = client.get(&url).header(ACCEPT, "text/event-stream").send();
    let response = tokio::select! {
        biased;
        _ = cancel.cancelled() => return,
        response = request => response,
    };
    let response = match response {
        Ok(response) => response,
        Err(err) => return fail(err.to_string()),
    };
    if !response.status().is_success() {
        return fail(format!("event stream rejected with HTTP {}", response.status()));
    }
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if !is_event_stream_content_type(content_type) {
        return fail(format!("unexpected content type {content_type:?}"));
    }

    info!(generation, "event stream opened");
    shared.set_status(generation, ConnectionStatus::Connected);
    shared.emit(generation, SseEvent::Opened);

    let mut decoder = SseDecoder::default();
    let mut body = response.bytes_stream();
    loop {
        let chunk = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!(generation, "event stream cancelled");
                return;
            }
            chunk = body.next() => chunk,
        };
        match chunk {
            Some(Ok(bytes)) => {
                for message in decoder.push(&bytes) {
                    shared.emit(generation, SseEvent::Message(message));
                }
            }
            Some(Err(err)) => return fail(err.to_string()),
            None => return fail("event stream closed by server".to_string()),
        }
    }
}
