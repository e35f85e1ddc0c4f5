//! Optimistic message submission.
//!
//! The user's text shows up in the timeline before the server has seen it.
//! When the server answers, the provisional entry is swapped for a durable one
//! and the assistant reply lands right after it; when it fails the provisional
//! entry is removed again.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::api::models::Message;
use crate::api::ApiError;
use crate::core::message::ChatEntry;
use crate::core::notice::NoticeSender;
use crate::core::store::ChatStore;
use crate::core::timeline::TimelineEvent;

pub const MAX_MESSAGE_CHARS: usize = 5000;

/// Anything that can deliver a user message and return the reply.
#[async_trait]
pub trait MessageSender: Send + Sync {
    async fn send_message(&self, conversation_id: &str, content: &str) -> Result<Message, ApiError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    TooLong { length: usize, max: usize },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::TooLong { length, max } => {
                write!(f, "message is {length} characters; the limit is {max}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug)]
pub enum SendOutcome {
    /// Blank input, or another send is still in flight.
    Ignored,
    Invalid(ValidationError),
    Sent { reply: ChatEntry },
    Failed(ApiError),
}

impl SendOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, SendOutcome::Sent { .. })
    }
}

pub struct ChatSubmission {
    sender: Arc<dyn MessageSender>,
    store: ChatStore,
    notices: NoticeSender,
    in_flight: AtomicBool,
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ChatSubmission {
    pub fn new(sender: Arc<dyn MessageSender>, store: ChatStore, notices: NoticeSender) -> Self {
        Self {
            sender,
            store,
            notices,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_sending(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn send(&self, conversation_id: &str, text: &str) -> SendOutcome {
        let content = text.trim();
        if content.is_empty() {
            return SendOutcome::Ignored;
        }

        let Some(_guard) = self.acquire() else {
            debug!(conversation_id, "send ignored, previous send still in flight");
            return SendOutcome::Ignored;
        };

        let length = content.chars().count();
        if length > MAX_MESSAGE_CHARS {
            return SendOutcome::Invalid(ValidationError::TooLong {
                length,
                max: MAX_MESSAGE_CHARS,
            });
        }

        let provisional = ChatEntry::provisional_user(content);
        let provisional_key = provisional.key.clone();
        let created_at = provisional.created_at;
        self.store.apply(TimelineEvent::Provisional(provisional));
        self.store.clear_draft();

        match self.sender.send_message(conversation_id, content).await {
            Ok(reply) => {
                let mut user = ChatEntry::acknowledged_user(content);
                user.created_at = created_at;
                let reply = ChatEntry::from(reply);
                self.store.apply(TimelineEvent::Confirmed {
                    provisional: provisional_key,
                    user,
                    reply: reply.clone(),
                });
                SendOutcome::Sent { reply }
            }
            Err(err) => {
                warn!(conversation_id, error = %err, "message send failed");
                self.store.apply(TimelineEvent::RolledBack {
                    provisional: provisional_key,
                });
                self.notices.error(err.user_message());
                SendOutcome::Failed(err)
            }
        }
    }

    fn acquire(&self) -> Option<InFlightGuard<'_>> {
        self.in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard(&self.in_flight))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;
    use reqwest::StatusCode;
    use tokio::sync::Notify;

    use super::*;
    use crate::api::ApiClient;
    use crate::core::message::{EntryKey, Role};
    use crate::core::notice::{self, Notice};
    use crate::utils::test_utils::memory_session;

    /// Records calls and what the timeline looked like when each call began.
    struct FakeSender {
        store: ChatStore,
        reply: Option<&'static str>,
        entered: Arc<Notify>,
        release: Option<Arc<Notify>>,
        calls: Mutex<Vec<(String, String, Vec<ChatEntry>, String)>>,
    }

    impl FakeSender {
        fn new(store: &ChatStore, reply: Option<&'static str>) -> Self {
            Self {
                store: store.clone(),
                reply,
                entered: Arc::new(Notify::new()),
                release: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl MessageSender for FakeSender {
        async fn send_message(
            &self,
            conversation_id: &str,
            content: &str,
        ) -> Result<Message, ApiError> {
            self.calls.lock().unwrap().push((
                conversation_id.to_string(),
                content.to_string(),
                self.store.entries(),
                self.store.draft(),
            ));
            self.entered.notify_one();
            if let Some(release) = &self.release {
                release.notified().await;
            }
            match self.reply {
                Some(reply) => Ok(Message {
                    id: "m-reply".to_string(),
                    conversation_id: conversation_id.to_string(),
                    role: Role::Assistant,
                    content: reply.to_string(),
                    audio_url: None,
                    token_count: None,
                    created_at: Utc::now(),
                }),
                None => Err(ApiError::Status {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    detail: Some("model unavailable".to_string()),
                    body: String::new(),
                }),
            }
        }
    }

    fn submission(
        sender: Arc<FakeSender>,
        store: &ChatStore,
    ) -> (ChatSubmission, tokio::sync::mpsc::UnboundedReceiver<Notice>) {
        let (notices, rx) = notice::channel();
        (ChatSubmission::new(sender, store.clone(), notices), rx)
    }

    #[tokio::test]
    async fn provisional_entry_is_visible_before_the_network_call() {
        let store = ChatStore::new();
        store.set_draft("hello");
        let sender = Arc::new(FakeSender::new(&store, Some("hi!")));
        let (flow, _rx) = submission(Arc::clone(&sender), &store);

        flow.send("c1", "  hello  ").await;

        let calls = sender.calls.lock().unwrap();
        let (conversation, content, seen, draft) = &calls[0];
        assert_eq!(conversation, "c1");
        assert_eq!(content, "hello");
        assert_eq!(seen.len(), 1);
        assert!(seen[0].is_provisional());
        assert_eq!(seen[0].role, Role::User);
        assert_eq!(seen[0].content, "hello");
        assert!(draft.is_empty());
    }

    #[tokio::test]
    async fn success_replaces_provisional_and_appends_reply() {
        let store = ChatStore::new();
        store.apply(TimelineEvent::Appended(ChatEntry::new(
            EntryKey::Durable("m0".to_string()),
            Role::Assistant,
            "welcome",
        )));
        let sender = Arc::new(FakeSender::new(&store, Some("hi there")));
        let (flow, _rx) = submission(sender, &store);

        let outcome = flow.send("c1", "hello").await;
        assert!(outcome.is_sent());

        let entries = store.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[1].role, Role::User);
        assert_eq!(entries[1].content, "hello");
        assert!(entries[1].key.as_str().starts_with("local-"));
        assert_eq!(entries[2].role, Role::Assistant);
        assert_eq!(entries[2].key, EntryKey::Durable("m-reply".to_string()));
        assert!(entries.iter().all(|entry| !entry.is_provisional()));
        assert!(!flow.is_sending());
    }

    #[tokio::test]
    async fn failure_rolls_back_exactly_and_notifies_once() {
        let store = ChatStore::new();
        store.set_draft("hello");
        let sender = Arc::new(FakeSender::new(&store, None));
        let (flow, mut rx) = submission(sender, &store);

        let outcome = flow.send("c1", "hello").await;
        assert!(matches!(outcome, SendOutcome::Failed(_)));

        assert!(store.entries().is_empty());
        assert_eq!(store.draft(), "");
        assert_eq!(
            rx.try_recv().expect("one notice"),
            Notice::Error("model unavailable".to_string())
        );
        assert!(rx.try_recv().is_err());
        assert!(!flow.is_sending());
    }

    #[tokio::test]
    async fn network_failure_from_the_api_client_rolls_back() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let (session, _) = memory_session(Some(("a1", "r1")));
        let api = ApiClient::new(format!("http://{addr}/api"), session);
        let store = ChatStore::new();
        store.set_draft("hello");
        let (notices, mut rx) = notice::channel();
        let flow = ChatSubmission::new(Arc::new(api), store.clone(), notices);

        let outcome = flow.send("c1", "hello").await;
        let SendOutcome::Failed(err) = outcome else {
            panic!("a refused connection should fail the send");
        };
        assert!(matches!(err, ApiError::Transport(_)));

        assert!(store.entries().is_empty());
        assert_eq!(
            rx.try_recv().expect("one notice"),
            Notice::Error("Network error, please try again".to_string())
        );
        assert!(rx.try_recv().is_err());
        assert!(!flow.is_sending());
    }

    #[tokio::test]
    async fn blank_input_has_no_side_effects() {
        let store = ChatStore::new();
        store.set_draft("   ");
        let sender = Arc::new(FakeSender::new(&store, Some("unused")));
        let (flow, _rx) = submission(Arc::clone(&sender), &store);

        assert!(matches!(flow.send("c1", " \n\t").await, SendOutcome::Ignored));
        assert!(store.entries().is_empty());
        assert_eq!(store.draft(), "   ");
        assert_eq!(sender.call_count(), 0);
    }

    #[tokio::test]
    async fn overlong_input_is_rejected_before_sending() {
        let store = ChatStore::new();
        let sender = Arc::new(FakeSender::new(&store, Some("ok")));
        let (flow, _rx) = submission(Arc::clone(&sender), &store);

        let text = "x".repeat(MAX_MESSAGE_CHARS + 1);
        let outcome = flow.send("c1", &text).await;
        assert!(matches!(
            outcome,
            SendOutcome::Invalid(ValidationError::TooLong { length: 5001, max: 5000 })
        ));
        assert!(store.entries().is_empty());
        assert_eq!(sender.call_count(), 0);

        let exact = "y".repeat(MAX_MESSAGE_CHARS);
        assert!(flow.send("c1", &exact).await.is_sent());
    }

    #[tokio::test]
    async fn second_send_while_in_flight_is_ignored() {
        let store = ChatStore::new();
        let release = Arc::new(Notify::new());
        let mut fake = FakeSender::new(&store, Some("reply"));
        fake.release = Some(Arc::clone(&release));
        let entered = Arc::clone(&fake.entered);
        let sender = Arc::new(fake);
        let (flow, _rx) = submission(Arc::clone(&sender), &store);
        let flow = Arc::new(flow);

        let first = tokio::spawn({
            let flow = Arc::clone(&flow);
            async move { flow.send("c1", "first").await }
        });
        entered.notified().await;
        assert!(flow.is_sending());

        let second = flow.send("c1", "second").await;
        assert!(matches!(second, SendOutcome::Ignored));
        assert_eq!(store.entries().len(), 1);
        assert_eq!(sender.call_count(), 1);

        release.notify_one();
        assert!(first.await.expect("send task").is_sent());
        assert!(!flow.is_sending());
        assert_eq!(store.entries().len(), 2);
    }
}
