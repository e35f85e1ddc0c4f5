use std::sync::{Arc, Mutex};

use crate::api::models::Conversation;
use crate::core::message::ChatEntry;
use crate::core::timeline::{reduce, TimelineEvent};

#[derive(Debug, Clone, Default)]
pub struct ChatState {
    pub active_conversation: Option<Conversation>,
    pub entries: Vec<ChatEntry>,
    pub is_streaming: bool,
    pub streaming_content: String,
    /// Text typed but not yet sent.
    pub draft: String,
}

/// Shared handle to the active conversation and its timeline.
#[derive(Clone, Default)]
pub struct ChatStore {
    state: Arc<Mutex<ChatState>>,
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ChatState {
        self.state.lock().unwrap().clone()
    }

    pub fn entries(&self) -> Vec<ChatEntry> {
        self.state.lock().unwrap().entries.clone()
    }

    pub fn active_conversation(&self) -> Option<Conversation> {
        self.state.lock().unwrap().active_conversation.clone()
    }

    pub fn set_active_conversation(&self, conversation: Option<Conversation>) {
        self.state.lock().unwrap().active_conversation = conversation;
    }

    pub fn apply(&self, event: TimelineEvent) {
        let mut state = self.state.lock().unwrap();
        let entries = std::mem::take(&mut state.entries);
        state.entries = reduce(entries, event);
    }

    pub fn set_messages(&self, entries: Vec<ChatEntry>) {
        self.apply(TimelineEvent::Loaded(entries));
    }

    pub fn add_message(&self, entry: ChatEntry) {
        self.apply(TimelineEvent::Appended(entry));
    }

    pub fn set_streaming(&self, is_streaming: bool) {
        self.state.lock().unwrap().is_streaming = is_streaming;
    }

    pub fn set_streaming_content(&self, content: impl Into<String>) {
        self.state.lock().unwrap().streaming_content = content.into();
    }

    pub fn append_streaming_content(&self, chunk: &str) {
        self.state.lock().unwrap().streaming_content.push_str(chunk);
    }

    /// Ends a streamed reply and returns what was accumulated.
    pub fn finish_streaming(&self) -> String {
        let mut state = self.state.lock().unwrap();
        state.is_streaming = false;
        std::mem::take(&mut state.streaming_content)
    }

    pub fn set_draft(&self, draft: impl Into<String>) {
        self.state.lock().unwrap().draft = draft.into();
    }

    pub fn draft(&self) -> String {
        self.state.lock().unwrap().draft.clone()
    }

    pub fn clear_draft(&self) {
        self.state.lock().unwrap().draft.clear();
    }

    pub fn clear_chat(&self) {
        *self.state.lock().unwrap() = ChatState::default();
    }
}
