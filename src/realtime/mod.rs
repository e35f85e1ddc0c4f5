//! Server push: a reconnecting WebSocket channel and a one-shot SSE stream.
//!
//! Both run on a spawned task and report through an unbounded event
//! receiver, in the order the transport delivered them.

pub mod reconnect;
pub mod sse;
pub mod websocket;

use std::fmt;

pub use reconnect::{PushChannelOptions, ReconnectState};
pub use sse::{EventStream, EventStreamOptions, SseDecoder, SseEvent, SseMessage};
pub use websocket::{ChannelEvent, PushChannel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    Connecting,
    Connected,
    #[default]
    Disconnected,
    Error,
}

impl ConnectionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionStatus::Connecting => "connecting",
            ConnectionStatus::Connected => "connected",
            ConnectionStatus::Disconnected => "disconnected",
            ConnectionStatus::Error => "error",
        }
    }
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A frame received over the push channel.
#[derive(Debug, Clone, PartialEq)]
pub enum InboundPayload {
    Json(serde_json::Value),
    /// Text that is not valid JSON.
    Raw(String),
    Binary(Vec<u8>),
}

impl InboundPayload {
    pub fn from_text(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(value) => InboundPayload::Json(value),
            Err(_) => InboundPayload::Raw(text),
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            InboundPayload::Json(value) => Some(value),
            _ => None,
        }
    }
}
