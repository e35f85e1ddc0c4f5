//! Pure state transitions for the chat timeline.
//!
//! Every change the chat view makes to its message list goes through
//! [`reduce`], so optimistic inserts, confirmations and rollbacks can be
//! checked without a network or a store.

use crate::core::message::{ChatEntry, EntryKey};

#[derive(Debug, Clone)]
pub enum TimelineEvent {
    /// Optimistic insert of a user entry that has not been sent yet.
    Provisional(ChatEntry),
    /// The server accepted the message; `user` takes the provisional slot and
    /// `reply` follows it.
    Confirmed {
        provisional: EntryKey,
        user: ChatEntry,
        reply: ChatEntry,
    },
    /// The send failed; the provisional entry disappears.
    RolledBack { provisional: EntryKey },
    /// Replace the whole list, e.g. after fetching history.
    Loaded(Vec<ChatEntry>),
    /// A message that arrived from elsewhere (push channel, greeting).
    Appended(ChatEntry),
    Removed { key: EntryKey },
    Cleared,
}

pub fn reduce(mut entries: Vec<ChatEntry>, event: TimelineEvent) -> Vec<ChatEntry> {
    match event {
        TimelineEvent::Provisional(entry) | TimelineEvent::Appended(entry) => {
            entries.push(entry);
            entries
        }
        TimelineEvent::Confirmed {
            provisional,
            user,
            reply,
        } => {
            match position_of(&entries, &provisional) {
                Some(index) => {
                    entries[index] = user;
                    entries.insert(index + 1, reply);
                }
                None => {
                    // The provisional slot was cleared while the call was in
                    // flight; keep the confirmed pair in order at the end.
                    entries.push(user);
                    entries.push(reply);
                }
            }
            entries
        }
        TimelineEvent::RolledBack { provisional } => {
            entries.retain(|entry| entry.key != provisional);
            entries
        }
        TimelineEvent::Loaded(loaded) => loaded,
        TimelineEvent::Removed { key } => {
            entries.retain(|entry| entry.key != key);
            entries
        }
        TimelineEvent::Cleared => Vec::new(),
    }
}

fn position_of(entries: &[ChatEntry], key: &EntryKey) -> Option<usize> {
    entries.iter().position(|entry| &entry.key == key)
}
