//! In-memory store, useful for testing and single-process deployments.

use async_trait::async_trait;
use chatclaw_core::error::MemoryError;
use chatclaw_core::store::SessionStore;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Every this many writes, `set` also drops all expired entries.
const SWEEP_EVERY: u64 = 64;

/// A process-local TTL store. Expired values are dropped when read, and in
/// bulk every [`SWEEP_EVERY`] writes.
pub struct InMemoryStore {
    entries: Arc<RwLock<HashMap<String, (String, Instant)>>>,
    writes: AtomicU64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            writes: AtomicU64::new(0),
        }
    }

    /// Number of stored entries, expired or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for InMemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, MemoryError> {
        {
            let entries = self.entries.read().await;
            match entries.get(key) {
                None => return Ok(None),
                Some((value, expires_at)) if Instant::now() < *expires_at => {
                    return Ok(Some(value.clone()));
                }
                Some(_) => {}
            }
        }
        self.entries.write().await.remove(key);
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), MemoryError> {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        if (self.writes.fetch_add(1, Ordering::Relaxed) + 1) % SWEEP_EVERY == 0 {
            entries.retain(|_, (_, expires_at)| now < *expires_at);
        }
        entries.insert(key.to_string(), (value, now + ttl));
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<bool, MemoryError> {
        Ok(self.entries.write().await.remove(key).is_some())
    }
}
