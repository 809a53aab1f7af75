//! No-op store: disables persistence entirely.

use async_trait::async_trait;
use chatclaw_core::error::MemoryError;
use chatclaw_core::store::SessionStore;
use std::time::Duration;

/// A store that keeps nothing. Conversation memory then lives only in-process.
pub struct NoopStore;

#[async_trait]
impl SessionStore for NoopStore {
    fn name(&self) -> &str {
        "none"
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, MemoryError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) -> Result<(), MemoryError> {
        Ok(())
    }

    async fn del(&self, _key: &str) -> Result<bool, MemoryError> {
        Ok(false)
    }
}
