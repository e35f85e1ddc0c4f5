use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::ids::{durable_local_id, provisional_id};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }

    pub fn is_user(self) -> bool {
        self == Role::User
    }

    pub fn is_assistant(self) -> bool {
        self == Role::Assistant
    }
}

impl AsRef<str> for Role {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<&str> for Role {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl TryFrom<&str> for Role {
    type Error = String;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            "system" => Ok(Role::System),
            _ => Err(format!("invalid message role: {value}")),
        }
    }
}

impl TryFrom<String> for Role {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        value.as_str().to_string()
    }
}

/// Identity of a timeline entry.
///
/// Provisional keys exist only on the client between an optimistic insert and
/// the server's answer. Durable keys are either issued by the server or
/// assigned locally once the server has acknowledged the message.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryKey {
    Provisional(String),
    Durable(String),
}

impl EntryKey {
    pub fn as_str(&self) -> &str {
        match self {
            EntryKey::Provisional(id) | EntryKey::Durable(id) => id,
        }
    }

    pub fn is_provisional(&self) -> bool {
        matches!(self, EntryKey::Provisional(_))
    }
}

/// A message as shown in the chat timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatEntry {
    pub key: EntryKey,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl ChatEntry {
    pub fn new(key: EntryKey, role: Role, content: impl Into<String>) -> Self {
        Self {
            key,
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    /// A user entry inserted before the server has confirmed it.
    pub fn provisional_user(content: impl Into<String>) -> Self {
        Self::new(EntryKey::Provisional(provisional_id()), Role::User, content)
    }

    /// A user entry confirmed by the server but still carrying a client id,
    /// because the send endpoint only returns the assistant reply.
    pub fn acknowledged_user(content: impl Into<String>) -> Self {
        Self::new(EntryKey::Durable(durable_local_id()), Role::User, content)
    }

    pub fn is_provisional(&self) -> bool {
        self.key.is_provisional()
    }

    pub fn is_user(&self) -> bool {
        self.role.is_user()
    }

    pub fn is_assistant(&self) -> bool {
        self.role.is_assistant()
    }
}

impl From<crate::api::models::Message> for ChatEntry {
    fn from(message: crate::api::models::Message) -> Self {
        Self {
            key: EntryKey::Durable(message.id),
            role: message.role,
            content: message.content,
            created_at: message.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_role_strings_are_rejected() {
        assert!(Role::try_from("tool").is_err());
        assert_eq!(Role::try_from("system"), Ok(Role::System));
    }

    #[test]
    fn provisional_and_acknowledged_keys_differ() {
        let pending = ChatEntry::provisional_user("hi");
        let confirmed = ChatEntry::acknowledged_user("hi");
        assert!(pending.is_provisional());
        assert!(!confirmed.is_provisional());
        assert_ne!(pending.key.as_str(), confirmed.key.as_str());
    }

    #[test]
    fn role_serializes_as_api_string() {
        let json = serde_json::to_string(&Role::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
    }
}
