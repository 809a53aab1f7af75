//! Per-session conversation memory with compaction and persistence.
//!
//! Holds an optional running summary plus a window of recent messages.
//! When the window grows past the compaction threshold, everything except
//! the most recent `keep_recent` messages is folded into the summary.
//! Once a summary exists the window is held at `keep_recent`, so after more
//! than `compaction_threshold` messages the memory is always exactly one
//! summary plus `keep_recent` recent messages.
//!
//! Every mutation writes a [`PersistedMemory`] record to the session store.
//! Store failures are logged and swallowed; in-process state stays the
//! fallback.

use std::sync::Arc;
use std::time::Duration;

use chatclaw_config::MemorySettings;
use chatclaw_core::message::{Message, SessionKey};
use chatclaw_core::store::SessionStore;
use serde::Serialize;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};

use crate::persisted::PersistedMemory;
use crate::summarizer::Summarizer;

/// Returned by [`ConversationMemory::get_summary`] for an empty session.
pub const EMPTY_SUMMARY: &str = "No conversation history yet.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemoryConfig {
    /// Raw message count above which the first compaction runs.
    pub compaction_threshold: usize,
    /// Messages kept verbatim after compaction.
    pub keep_recent: usize,
    /// Lifetime of the persisted record.
    pub ttl: Duration,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            compaction_threshold: 20,
            keep_recent: 10,
            ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl From<&MemorySettings> for MemoryConfig {
    fn from(settings: &MemorySettings) -> Self {
        Self {
            compaction_threshold: settings.compaction_threshold,
            keep_recent: settings.keep_recent,
            ttl: settings.ttl(),
        }
    }
}

/// A point-in-time view of a session's memory.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemorySnapshot {
    pub summary: Option<String>,
    pub recent_messages: Vec<Message>,
}

impl MemorySnapshot {
    pub fn is_empty(&self) -> bool {
        self.summary.is_none() && self.recent_messages.is_empty()
    }

    /// Flatten into history order: the summary (as a system message) first.
    pub fn into_history(self) -> Vec<Message> {
        let mut history = Vec::with_capacity(self.recent_messages.len() + 1);
        if let Some(summary) = self.summary {
            history.push(Message::system(summary));
        }
        history.extend(self.recent_messages);
        history
    }
}

#[derive(Default)]
struct State {
    summary: Option<String>,
    messages: Vec<Message>,
    /// Whether the store has been consulted since construction or `clear`.
    hydrated: bool,
}

/// The memory of one session.
pub struct ConversationMemory {
    key: SessionKey,
    storage_key: String,
    config: MemoryConfig,
    store: Arc<dyn SessionStore>,
    summarizer: Arc<dyn Summarizer>,
    state: Mutex<State>,
}

impl ConversationMemory {
    pub fn new(
        key: SessionKey,
        config: MemoryConfig,
        store: Arc<dyn SessionStore>,
        summarizer: Arc<dyn Summarizer>,
    ) -> Self {
        Self {
            storage_key: key.storage_key(),
            key,
            config,
            store,
            summarizer,
            state: Mutex::new(State::default()),
        }
    }

    pub fn key(&self) -> &SessionKey {
        &self.key
    }

    pub fn config(&self) -> &MemoryConfig {
        &self.config
    }

    /// Append one message, compacting if needed.
    pub async fn add_message(&self, message: Message) {
        self.add_messages(vec![message]).await;
    }

    /// Append a batch atomically: no reader observes part of the batch, and
    /// compaction runs at most once, after the whole batch is in.
    pub async fn add_messages(&self, messages: Vec<Message>) {
        if messages.is_empty() {
            return;
        }
        let mut state = self.lock_hydrated().await;
        state.messages.extend(messages);
        self.compact(&mut state).await;
        self.persist(&state).await;
    }

    /// The full history: the summary (if any) as a system message, then the
    /// recent messages in insertion order.
    pub async fn get_history(&self) -> Vec<Message> {
        self.snapshot().await.into_history()
    }

    /// The summary and recent window, read through the store.
    pub async fn snapshot(&self) -> MemorySnapshot {
        let mut state = self.state.lock().await;
        self.refresh(&mut state).await;
        MemorySnapshot {
            summary: state.summary.clone(),
            recent_messages: state.messages.clone(),
        }
    }

    /// A fresh digest of the whole conversation. Read-only: the stored
    /// summary is not replaced.
    pub async fn get_summary(&self) -> String {
        let snapshot = self.snapshot().await;
        if snapshot.is_empty() {
            return EMPTY_SUMMARY.to_string();
        }

        match self
            .summarizer
            .summarize(snapshot.summary.as_deref(), &snapshot.recent_messages)
            .await
        {
            Ok(summary) => summary,
            Err(e) => {
                warn!(session = %self.key, error = %e, "Summary generation failed, using stored summary");
                let count = snapshot.recent_messages.len();
                match snapshot.summary {
                    Some(summary) => format!("{summary}\n({count} recent messages not yet summarized)"),
                    None => format!("{count} messages in this conversation; no summary available."),
                }
            }
        }
    }

    /// Forget everything, in-process and in the store.
    pub async fn clear(&self) {
        let mut state = self.state.lock().await;
        *state = State {
            hydrated: true,
            ..State::default()
        };
        match self.store.del(&self.storage_key).await {
            Ok(_) => debug!(session = %self.key, "Conversation memory cleared"),
            Err(e) => warn!(session = %self.key, error = %e, "Failed to delete persisted memory"),
        }
    }

    /// Lock the state, reading the store once if it has not been consulted yet.
    async fn lock_hydrated(&self) -> MutexGuard<'_, State> {
        let mut state = self.state.lock().await;
        if !state.hydrated {
            self.refresh(&mut state).await;
        }
        state
    }

    /// Replace in-process state with the stored record when one exists.
    async fn refresh(&self, state: &mut State) {
        state.hydrated = true;
        let raw = match self.store.get(&self.storage_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return,
            Err(e) => {
                warn!(session = %self.key, error = %e, "Failed to read persisted memory, using in-process copy");
                return;
            }
        };
        match PersistedMemory::decode(&raw) {
            Ok(record) => {
                state.summary = record.summary;
                state.messages = record.messages;
            }
            Err(e) => {
                warn!(session = %self.key, error = %e, "Ignoring unreadable persisted memory");
            }
        }
    }

    async fn compact(&self, state: &mut State) {
        let raw = state.messages.len();
        let over_threshold = raw > self.config.compaction_threshold;
        let over_window = state.summary.is_some() && raw > self.config.keep_recent;
        if !over_threshold && !over_window {
            return;
        }

        let split = raw.saturating_sub(self.config.keep_recent);
        if split == 0 {
            return;
        }
        match self
            .summarizer
            .summarize(state.summary.as_deref(), &state.messages[..split])
            .await
        {
            Ok(summary) => {
                state.summary = Some(summary);
                state.messages.drain(..split);
                debug!(session = %self.key, folded = split, "Compacted conversation memory");
            }
            Err(e) => {
                // Keep the raw window; the next append retries.
                warn!(session = %self.key, error = %e, "Compaction failed");
            }
        }
    }

    async fn persist(&self, state: &State) {
        let record = PersistedMemory::new(state.summary.clone(), state.messages.clone());
        let raw = match record.encode() {
            Ok(raw) => raw,
            Err(e) => {
                warn!(session = %self.key, error = %e, "Failed to encode memory record");
                return;
            }
        };
        if let Err(e) = self.store.set(&self.storage_key, raw, self.config.ttl).await {
            warn!(session = %self.key, error = %e, "Failed to persist memory");
        }
    }
}
