//! Session store trait: the external key-value store behind conversation memory.
//!
//! The store is scratch storage: values expire after their TTL, writes are
//! best-effort, and callers never rely on it for strong consistency.

use async_trait::async_trait;
use std::time::Duration;
use crate::error::MemoryError;

/// A TTL-keyed string store.
///
/// Implementations: in-memory, file-backed, none (no-op).
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// The backend name (e.g., "memory", "file", "none").
    fn name(&self) -> &str;

    /// Fetch a live (non-expired) value.
    async fn get(&self, key: &str) -> std::result::Result<Option<String>, MemoryError>;

    /// Store a value that expires after `ttl`.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> std::result::Result<(), MemoryError>;

    /// Delete a value. Returns whether anything was removed.
    async fn del(&self, key: &str) -> std::result::Result<bool, MemoryError>;
}
