//! File-based store: one JSON file per key.
//!
//! Storage location: `~/.chatclaw/sessions/` by default. Each file holds the
//! value and its expiry, so sessions survive restarts until their TTL runs
//! out. Expired files are ignored on read and removed.

use async_trait::async_trait;
use chatclaw_core::error::MemoryError;
use chatclaw_core::store::SessionStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize)]
struct StoredValue {
    value: String,
    expires_at: DateTime<Utc>,
}

/// A directory of JSON files, one per key.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        debug!(dir = %dir.display(), "File session store ready");
        Self { dir }
    }

    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    /// Map a key to a file path. Characters outside `[A-Za-z0-9_-]` are
    /// percent-encoded so distinct keys never share a file.
    fn path_for(&self, key: &str) -> PathBuf {
        let mut name = String::with_capacity(key.len() + 5);
        for b in key.bytes() {
            if b.is_ascii_alphanumeric() || b == b'_' || b == b'-' {
                name.push(b as char);
            } else {
                name.push_str(&format!("%{b:02X}"));
            }
        }
        name.push_str(".json");
        self.dir.join(name)
    }

    async fn remove(&self, path: &PathBuf) -> Result<bool, MemoryError> {
        match tokio::fs::remove_file(path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(MemoryError::Storage(format!(
                "Failed to remove session file {}: {e}",
                path.display()
            ))),
        }
    }
}

#[async_trait]
impl SessionStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, MemoryError> {
        let path = self.path_for(key);
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(MemoryError::Storage(format!(
                    "Failed to read session file {}: {e}",
                    path.display()
                )));
            }
        };

        let stored: StoredValue = serde_json::from_str(&raw)
            .map_err(|e| MemoryError::Serialization(format!("Corrupted session file: {e}")))?;

        if stored.expires_at <= Utc::now() {
            debug!(key, "Session file expired");
            if let Err(e) = self.remove(&path).await {
                warn!(key, error = %e, "Failed to remove expired session file");
            }
            return Ok(None);
        }
        Ok(Some(stored.value))
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<(), MemoryError> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            MemoryError::Storage(format!("Failed to create session directory: {e}"))
        })?;

        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| MemoryError::Storage(format!("Invalid TTL: {e}")))?;
        let stored = StoredValue {
            value,
            expires_at: Utc::now() + ttl,
        };
        let json = serde_json::to_string(&stored)
            .map_err(|e| MemoryError::Serialization(e.to_string()))?;

        // Write-then-rename so readers never observe a partial file.
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, json)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to write session file: {e}")))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| MemoryError::Storage(format!("Failed to write session file: {e}")))?;
        Ok(())
    }

    async fn del(&self, key: &str) -> Result<bool, MemoryError> {
        self.remove(&self.path_for(key)).await
    }
}
