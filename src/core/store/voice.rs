use std::fmt;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceCallStatus {
    #[default]
    Idle,
    Connecting,
    Active,
    Reconnecting,
    Ended,
    Error,
}

impl VoiceCallStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            VoiceCallStatus::Idle => "idle",
            VoiceCallStatus::Connecting => "connecting",
            VoiceCallStatus::Active => "active",
            VoiceCallStatus::Reconnecting => "reconnecting",
            VoiceCallStatus::Ended => "ended",
            VoiceCallStatus::Error => "error",
        }
    }
}

impl fmt::Display for VoiceCallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VoiceState {
    pub is_call_active: bool,
    pub status: VoiceCallStatus,
    pub session_id: Option<String>,
    pub is_muted: bool,
    pub is_speaker_on: bool,
    pub duration: u64,
    pub error_message: Option<String>,
}

impl Default for VoiceState {
    fn default() -> Self {
        Self {
            is_call_active: false,
            status: VoiceCallStatus::Idle,
            session_id: None,
            is_muted: false,
            is_speaker_on: true,
            duration: 0,
            error_message: None,
        }
    }
}

#[derive(Clone, Default)]
pub struct VoiceStore {
    state: Arc<Mutex<VoiceState>>,
}

impl VoiceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> VoiceState {
        self.state.lock().unwrap().clone()
    }

    pub fn session_id(&self) -> Option<String> {
        self.state.lock().unwrap().session_id.clone()
    }

    pub fn start_call(&self, session_id: impl Into<String>) {
        let mut state = self.state.lock().unwrap();
        state.is_call_active = true;
        state.status = VoiceCallStatus::Connecting;
        state.session_id = Some(session_id.into());
        state.duration = 0;
        state.error_message = None;
    }

    pub fn end_call(&self) {
        let mut state = self.state.lock().unwrap();
        state.is_call_active = false;
        state.status = VoiceCallStatus::Ended;
        state.session_id = None;
        state.is_muted = false;
        state.duration = 0;
    }

    pub fn set_status(&self, status: VoiceCallStatus) {
        self.state.lock().unwrap().status = status;
    }

    pub fn toggle_mute(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        state.is_muted = !state.is_muted;
        state.is_muted
    }

    pub fn toggle_speaker(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        state.is_speaker_on = !state.is_speaker_on;
        state.is_speaker_on
    }

    pub fn set_duration(&self, duration: u64) {
        self.state.lock().unwrap().duration = duration;
    }

    /// `Some` moves the call into the error state; `None` clears it back to idle.
    pub fn set_error(&self, message: Option<String>) {
        let mut state = self.state.lock().unwrap();
        state.status = if message.is_some() {
            VoiceCallStatus::Error
        } else {
            VoiceCallStatus::Idle
        };
        state.error_message = message;
    }

    pub(crate) fn reset(&self) {
        *self.state.lock().unwrap() = VoiceState::default();
    }
}
