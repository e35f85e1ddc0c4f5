//! Client state: the session, the active chat, and the voice call.
//!
//! One [`ClientState`] is built per front end and handed to whatever needs
//! it. Each store is a cheap clonable handle; setters are short, synchronous
//! critical sections, so a reader never observes a half-applied update.

pub mod chat;
pub mod session;
pub mod voice;

use std::sync::Arc;

use tracing::debug;

use crate::core::credentials::CredentialStore;

pub use chat::{ChatState, ChatStore};
pub use session::{Session, SessionStore};
pub use voice::{VoiceCallStatus, VoiceState, VoiceStore};

#[derive(Clone)]
pub struct ClientState {
    pub session: SessionStore,
    pub chat: ChatStore,
    pub voice: VoiceStore,
}

impl ClientState {
    /// Build the stores and restore any persisted session.
    pub fn init(credentials: Arc<dyn CredentialStore>) -> Self {
        let state = Self {
            session: SessionStore::new(credentials),
            chat: ChatStore::new(),
            voice: VoiceStore::new(),
        };
        state.session.restore();
        state
    }

    /// Drop all in-memory state. Persisted credentials are left alone; use
    /// [`SessionStore::clear`] to sign out.
    pub fn dispose(&self) {
        self.chat.clear_chat();
        self.voice.reset();
        self.session.forget();
        debug!("client state disposed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::credentials::MemoryCredentialStore;
    use crate::core::store::voice::VoiceCallStatus;

    #[test]
    fn init_restores_and_dispose_forgets_without_touching_storage() {
        let credentials = Arc::new(MemoryCredentialStore::with_tokens("a1", "r1"));
        let state = ClientState::init(credentials.clone());
        assert!(state.session.is_authenticated());

        state.chat.set_draft("hello");
        state.voice.start_call("s1");
        state.dispose();

        assert!(!state.session.is_authenticated());
        assert!(state.chat.draft().is_empty());
        assert_eq!(state.voice.snapshot().status, VoiceCallStatus::Idle);
        assert_eq!(credentials.snapshot().access_token.as_deref(), Some("a1"));
    }
}
