//! Conversation memory and session stores for ChatClaw.

pub mod conversation;
pub mod file_backend;
pub mod in_memory;
pub mod noop;
pub mod persisted;
pub mod summarizer;

pub use conversation::{ConversationMemory, EMPTY_SUMMARY, MemoryConfig, MemorySnapshot};
pub use file_backend::FileStore;
pub use in_memory::InMemoryStore;
pub use noop::NoopStore;
pub use persisted::PersistedMemory;
pub use summarizer::{LlmSummarizer, Summarizer};

use std::sync::Arc;

use chatclaw_config::MemorySettings;
use chatclaw_core::error::MemoryError;
use chatclaw_core::store::SessionStore;

/// Build the session store selected by `settings.backend`.
pub fn build_store(settings: &MemorySettings) -> Result<Arc<dyn SessionStore>, MemoryError> {
    match settings.backend.as_str() {
        "memory" => Ok(Arc::new(InMemoryStore::new())),
        "file" => Ok(Arc::new(FileStore::new(settings.resolved_path()))),
        "none" => Ok(Arc::new(NoopStore)),
        other => Err(MemoryError::Storage(format!(
            "Unknown memory backend '{other}' (expected memory, file or none)"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_each_backend() {
        let dir = tempfile::tempdir().unwrap();
        for (backend, name) in [("memory", "memory"), ("file", "file"), ("none", "none")] {
            let settings = MemorySettings {
                backend: backend.into(),
                path: Some(dir.path().to_path_buf()),
                ..MemorySettings::default()
            };
            assert_eq!(build_store(&settings).unwrap().name(), name);
        }
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let settings = MemorySettings {
            backend: "redis".into(),
            ..MemorySettings::default()
        };
        assert!(build_store(&settings).is_err());
    }
}
