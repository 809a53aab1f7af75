//! Message and session domain types.
//!
//! These are the value objects that make up a session's conversation memory:
//! the user speaks (human), the agent answers (agent), and compaction writes
//! summaries (system).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifies one conversation of one user.
///
/// Owns exactly one conversation memory; two keys are the same session
/// only when both parts match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub user_id: String,
    pub session_id: String,
}

impl SessionKey {
    pub fn new(user_id: impl Into<String>, session_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: session_id.into(),
        }
    }

    /// The key under which the session's memory is persisted externally.
    ///
    /// `%` and `:` inside either part are percent-encoded, so distinct keys
    /// never share a storage key.
    pub fn storage_key(&self) -> String {
        format!(
            "chat_memory:{}:{}",
            escape_part(&self.user_id),
            escape_part(&self.session_id)
        )
    }
}

fn escape_part(part: &str) -> String {
    let mut out = String::with_capacity(part.len());
    for c in part.chars() {
        match c {
            '%' => out.push_str("%25"),
            ':' => out.push_str("%3A"),
            c => out.push(c),
        }
    }
    out
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.user_id, self.session_id)
    }
}

/// The author of a message in conversation memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    Human,
    /// The AI agent
    Agent,
    /// Runtime-authored content (conversation summaries)
    System,
}

/// A single message in a conversation. Immutable once appended to memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who authored this message
    pub role: Role,

    /// The text content
    pub content: String,

    /// When the message was created
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Create a new human message.
    pub fn human(content: impl Into<String>) -> Self {
        Self::new(Role::Human, content)
    }

    /// Create a new agent message.
    pub fn agent(content: impl Into<String>) -> Self {
        Self::new(Role::Agent, content)
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Rough token estimate (4 chars ≈ 1 token).
    pub fn estimated_tokens(&self) -> usize {
        self.content.len().div_ceil(4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_human_message() {
        let msg = Message::human("Hello, agent!");
        assert_eq!(msg.role, Role::Human);
        assert_eq!(msg.content, "Hello, agent!");
    }

    #[test]
    fn roles_serialize_lowercase() {
        let json = serde_json::to_string(&Message::agent("hi")).unwrap();
        assert!(json.contains(r#""role":"agent""#));
        let json = serde_json::to_string(&Role::Human).unwrap();
        assert_eq!(json, r#""human""#);
    }

    #[test]
    fn storage_key_includes_both_parts() {
        let key = SessionKey::new("alice", "s-1");
        assert_eq!(key.storage_key(), "chat_memory:alice:s-1");
        assert_eq!(key.to_string(), "alice/s-1");
    }

    #[test]
    fn storage_key_separates_colon_splits() {
        let a = SessionKey::new("a:b", "c");
        let b = SessionKey::new("a", "b:c");
        assert_ne!(a.storage_key(), b.storage_key());
        assert_eq!(a.storage_key(), "chat_memory:a%3Ab:c");
        assert_eq!(b.storage_key(), "chat_memory:a:b%3Ac");
    }

    #[test]
    fn storage_key_escapes_percent() {
        let literal = SessionKey::new("a%3Ab", "c");
        let colon = SessionKey::new("a:b", "c");
        assert_ne!(literal.storage_key(), colon.storage_key());
        assert_eq!(literal.storage_key(), "chat_memory:a%253Ab:c");
    }

    #[test]
    fn session_keys_differ_by_user() {
        assert_ne!(SessionKey::new("alice", "s"), SessionKey::new("bob", "s"));
    }

    #[test]
    fn token_estimate_rounds_up() {
        assert_eq!(Message::human("12345").estimated_tokens(), 2);
        assert_eq!(Message::human("").estimated_tokens(), 0);
    }
}
