//! Kindred is a terminal-first client for a character-based AI chat service.
//!
//! The crate is organized around a small set of collaborating layers:
//! - [`api`] is the typed REST client, including bearer credentials and the
//!   one-shot token refresh.
//! - [`core`] owns client state (session, active chat, voice call), the
//!   optimistic chat flow, configuration and credential storage.
//! - [`realtime`] provides the reconnecting WebSocket push channel and the
//!   server-sent event stream.
//! - [`audio`] buffers microphone capture into a single clip.
//! - [`cli`] parses arguments and drives the other layers from the terminal.
//!
//! The binary (`src/main.rs`) routes straight into [`crate::cli::main`].

pub mod api;
pub mod audio;
pub mod cli;
pub mod core;
pub mod logging;
pub mod realtime;
pub mod utils;
