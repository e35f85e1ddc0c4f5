//! Transient user-facing notifications ("toasts").

use std::fmt;

use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Error(String),
    Info(String),
}

impl Notice {
    pub fn message(&self) -> &str {
        match self {
            Notice::Error(message) | Notice::Info(message) => message,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Notice::Error(_))
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Error(message) => write!(f, "❌ {message}"),
            Notice::Info(message) => write!(f, "{message}"),
        }
    }
}

/// Sending half handed to services. Notices sent after the receiver is gone
/// are dropped.
#[derive(Debug, Clone)]
pub struct NoticeSender {
    tx: mpsc::UnboundedSender<Notice>,
}

impl NoticeSender {
    pub fn error(&self, message: impl Into<String>) {
        self.emit(Notice::Error(message.into()));
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(Notice::Info(message.into()));
    }

    fn emit(&self, notice: Notice) {
        let _ = self.tx.send(notice);
    }
}

pub fn channel() -> (NoticeSender, mpsc::UnboundedReceiver<Notice>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (NoticeSender { tx }, rx)
}
