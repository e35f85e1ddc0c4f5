use std::time::Duration;

use crate::audio::DEFAULT_MIME_TYPE;
use crate::core::config::data::{Config, FontSize, Theme};
use crate::realtime::PushChannelOptions;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000/api";
pub const DEFAULT_WS_URL: &str = "ws://localhost:8000/ws";
pub const DEFAULT_EVENTS_URL: &str = "http://localhost:8000/api/events";

pub const API_URL_ENV: &str = "KINDRED_API_URL";
pub const WS_URL_ENV: &str = "KINDRED_WS_URL";
pub const EVENTS_URL_ENV: &str = "KINDRED_EVENTS_URL";

/// Captures the default PulseAudio source as Opus in WebM on stdout.
pub const DEFAULT_RECORDER_COMMAND: &[&str] = &[
    "ffmpeg", "-loglevel", "error", "-f", "pulse", "-i", "default", "-c:a", "libopus", "-f",
    "webm", "-",
];

/// ffmpeg finalizes its output when it reads `q` on stdin.
pub const DEFAULT_RECORDER_STOP_INPUT: &str = "q";

/// Server locations after applying environment overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub api_base_url: String,
    pub ws_url: String,
    pub events_url: String,
}

impl Config {
    pub fn endpoints(&self) -> Endpoints {
        self.endpoints_with(|key| std::env::var(key).ok())
    }

    /// Resolution order: environment, then file, then built-in default.
    pub fn endpoints_with(&self, env: impl Fn(&str) -> Option<String>) -> Endpoints {
        let pick = |key: &str, configured: &Option<String>, default: &str| {
            env(key)
                .filter(|value| !value.trim().is_empty())
                .or_else(|| configured.clone())
                .unwrap_or_else(|| default.to_string())
        };
        Endpoints {
            api_base_url: pick(API_URL_ENV, &self.api_base_url, DEFAULT_API_BASE_URL),
            ws_url: pick(WS_URL_ENV, &self.ws_url, DEFAULT_WS_URL),
            events_url: pick(EVENTS_URL_ENV, &self.events_url, DEFAULT_EVENTS_URL),
        }
    }

    pub fn theme_or_default(&self) -> Theme {
        self.theme.unwrap_or(Theme::System)
    }

    pub fn font_size_or_default(&self) -> FontSize {
        self.font_size.unwrap_or(FontSize::Medium)
    }

    pub fn push_channel_options(&self) -> PushChannelOptions {
        let defaults = PushChannelOptions::default();
        PushChannelOptions {
            reconnect: self.realtime.reconnect.unwrap_or(defaults.reconnect),
            reconnect_interval: self
                .realtime
                .reconnect_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.reconnect_interval),
            max_reconnect_attempts: self
                .realtime
                .max_reconnect_attempts
                .unwrap_or(defaults.max_reconnect_attempts),
        }
    }

    pub fn recorder_command(&self) -> Vec<String> {
        self.recorder
            .command
            .clone()
            .filter(|argv| !argv.is_empty())
            .unwrap_or_else(|| {
                DEFAULT_RECORDER_COMMAND
                    .iter()
                    .map(|arg| arg.to_string())
                    .collect()
            })
    }

    pub fn recorder_stop_input(&self) -> String {
        self.recorder
            .stop_input
            .clone()
            .unwrap_or_else(|| DEFAULT_RECORDER_STOP_INPUT.to_string())
    }

    pub fn recorder_mime_type(&self) -> String {
        self.recorder
            .mime_type
            .clone()
            .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string())
    }
}
