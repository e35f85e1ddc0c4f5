//! Applies frames pushed by the server to the chat store.
//!
//! Frames are JSON objects tagged by `type`:
//! - `message`: a complete message under `message`, appended to the timeline;
//! - `token`: a partial assistant reply under `content`;
//! - `done`: the partial reply is complete and becomes a timeline entry.

use serde::Deserialize;
use tracing::debug;

use crate::api::models::Message;
use crate::core::message::{ChatEntry, EntryKey, Role};
use crate::core::store::ChatStore;
use crate::core::timeline::TimelineEvent;
use crate::realtime::InboundPayload;
use crate::utils::ids::durable_local_id;

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum PushFrame {
    Message { message: Message },
    Token { content: String },
    Done,
}

/// Returns `true` when the payload changed the store.
pub fn apply_push(store: &ChatStore, payload: &InboundPayload) -> bool {
    let Some(value) = payload.as_json() else {
        return false;
    };
    let frame = match PushFrame::deserialize(value) {
        Ok(frame) => frame,
        Err(err) => {
            debug!(error = %err, "ignoring unrecognised push frame");
            return false;
        }
    };

    match frame {
        PushFrame::Message { message } => {
            if !is_for_active(store, &message.conversation_id) {
                return false;
            }
            store.apply(TimelineEvent::Appended(ChatEntry::from(message)));
        }
        PushFrame::Token { content } => {
            store.set_streaming(true);
            store.append_streaming_content(&content);
        }
        PushFrame::Done => {
            let content = store.finish_streaming();
            if content.is_empty() {
                return false;
            }
            store.apply(TimelineEvent::Appended(ChatEntry::new(
                EntryKey::Durable(durable_local_id()),
                Role::Assistant,
                content,
            )));
        }
    }
    true
}

fn is_for_active(store: &ChatStore, conversation_id: &str) -> bool {
    store
        .active_conversation()
        .map_or(true, |active| active.id == conversation_id)
}
