//! The persisted memory record and its versioning.
//!
//! Current shape (version 1):
//!
//! ```json
//! {"version": 1, "summary": "...", "messages": [...], "timestamp": "..."}
//! ```
//!
//! Records written before versioning carry only `messages` and `timestamp`,
//! with the running summary stored as a leading system message. They are
//! migrated on read.

use chatclaw_core::error::MemoryError;
use chatclaw_core::message::{Message, Role};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The newest record version this build reads and writes.
pub const CURRENT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedMemory {
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub messages: Vec<Message>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Deserialize)]
struct LegacyRecord {
    messages: Vec<LegacyMessage>,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct LegacyMessage {
    role: Role,
    content: String,
    #[serde(default)]
    timestamp: Option<DateTime<Utc>>,
}

impl PersistedMemory {
    pub fn new(summary: Option<String>, messages: Vec<Message>) -> Self {
        Self {
            version: CURRENT_VERSION,
            summary,
            messages,
            timestamp: Utc::now(),
        }
    }

    pub fn encode(&self) -> Result<String, MemoryError> {
        serde_json::to_string(self).map_err(|e| MemoryError::Serialization(e.to_string()))
    }

    /// Decode any known record version, migrating older shapes.
    pub fn decode(raw: &str) -> Result<Self, MemoryError> {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| MemoryError::Serialization(format!("Invalid memory record: {e}")))?;

        match value.get("version").map(serde_json::Value::as_u64) {
            None => Self::from_legacy(value),
            Some(Some(v)) if v == u64::from(CURRENT_VERSION) => serde_json::from_value(value)
                .map_err(|e| MemoryError::Serialization(format!("Invalid memory record: {e}"))),
            Some(Some(v)) => Err(MemoryError::UnsupportedVersion {
                found: u32::try_from(v).unwrap_or(u32::MAX),
                latest: CURRENT_VERSION,
            }),
            Some(None) => Err(MemoryError::Serialization(
                "Invalid memory record: 'version' is not an unsigned integer".into(),
            )),
        }
    }

    fn from_legacy(value: serde_json::Value) -> Result<Self, MemoryError> {
        let legacy: LegacyRecord = serde_json::from_value(value)
            .map_err(|e| MemoryError::Serialization(format!("Invalid legacy memory record: {e}")))?;
        let timestamp = legacy.timestamp.unwrap_or_else(Utc::now);

        let mut messages = legacy.messages.into_iter().map(|m| Message {
            role: m.role,
            content: m.content,
            timestamp: m.timestamp.unwrap_or(timestamp),
        });

        let mut summary = None;
        let mut kept = Vec::new();
        if let Some(first) = messages.next() {
            if first.role == Role::System {
                summary = Some(first.content);
            } else {
                kept.push(first);
            }
        }
        kept.extend(messages);

        Ok(Self {
            version: CURRENT_VERSION,
            summary,
            messages: kept,
            timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn current_version_roundtrips() {
        let record = PersistedMemory::new(
            Some("user likes tea".into()),
            vec![Message::human("hi"), Message::agent("hello")],
        );
        let decoded = PersistedMemory::decode(&record.encode().unwrap()).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn legacy_record_is_migrated() {
        let raw = r#"{
            "messages": [
                {"role": "system", "content": "Earlier: user asked about refunds."},
                {"role": "human", "content": "and shipping?", "timestamp": "2024-01-01T00:00:00Z"},
                {"role": "agent", "content": "3 to 5 days."}
            ],
            "timestamp": "2024-01-01T00:00:05Z"
        }"#;
        let record = PersistedMemory::decode(raw).unwrap();
        assert_eq!(record.version, CURRENT_VERSION);
        assert_eq!(record.summary.as_deref(), Some("Earlier: user asked about refunds."));
        assert_eq!(record.messages.len(), 2);
        assert_eq!(record.messages[0].role, Role::Human);
        assert_eq!(record.messages[1].timestamp, record.timestamp);
    }

    #[test]
    fn legacy_record_without_summary_keeps_all_messages() {
        let raw = r#"{"messages": [{"role": "human", "content": "hi"}]}"#;
        let record = PersistedMemory::decode(raw).unwrap();
        assert!(record.summary.is_none());
        assert_eq!(record.messages.len(), 1);
    }

    #[test]
    fn future_version_is_rejected() {
        let raw = r#"{"version": 7, "messages": [], "timestamp": "2024-01-01T00:00:00Z"}"#;
        let err = PersistedMemory::decode(raw).unwrap_err();
        assert!(matches!(err, MemoryError::UnsupportedVersion { found: 7, latest: 1 }));
    }

    #[test]
    fn garbage_is_a_serialization_error() {
        assert!(matches!(
            PersistedMemory::decode("{not json"),
            Err(MemoryError::Serialization(_))
        ));
        assert!(matches!(
            PersistedMemory::decode(r#"{"version": "one"}"#),
            Err(MemoryError::Serialization(_))
        ));
    }
}
