//! Session management: one executor and one memory per session key.
//!
//! Turns on the same key run one at a time, so each turn's prompt sees the
//! previous turn. Turns on different keys run concurrently.

use std::collections::HashMap;
use std::sync::Arc;

use chatclaw_config::AppConfig;
use chatclaw_core::error::Result;
use chatclaw_core::message::{Message, SessionKey};
use chatclaw_core::provider::LlmClient;
use chatclaw_core::store::SessionStore;
use chatclaw_memory::{ConversationMemory, LlmSummarizer, MemoryConfig, Summarizer};
use chatclaw_tools::ToolRegistry;
use tokio::sync::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info};

use crate::event::AgentEvent;
use crate::executor::{AgentExecutor, ChatResponse, ExecutorConfig};

struct Session {
    executor: AgentExecutor,
    turn: Mutex<()>,
}

pub struct SessionManager {
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    store: Arc<dyn SessionStore>,
    summarizer: Arc<dyn Summarizer>,
    memory_config: MemoryConfig,
    executor_config: ExecutorConfig,
    events: Option<UnboundedSender<AgentEvent>>,
    sessions: Mutex<HashMap<SessionKey, Arc<Session>>>,
}

impl SessionManager {
    /// Summaries are produced by `llm` unless replaced with
    /// [`with_summarizer`](Self::with_summarizer).
    pub fn new(
        llm: Arc<dyn LlmClient>,
        tools: Arc<ToolRegistry>,
        store: Arc<dyn SessionStore>,
        memory_config: MemoryConfig,
        executor_config: ExecutorConfig,
    ) -> Self {
        Self {
            summarizer: Arc::new(LlmSummarizer::new(llm.clone())),
            llm,
            tools,
            store,
            memory_config,
            executor_config,
            events: None,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Wire up the default tools and the configured store.
    pub fn from_config(config: &AppConfig, llm: Arc<dyn LlmClient>) -> Result<Self> {
        let tools = Arc::new(chatclaw_tools::default_registry(&config.tools));
        let store = chatclaw_memory::build_store(&config.memory)?;
        let summarizer =
            LlmSummarizer::new(llm.clone()).with_timeout(config.agent.llm_timeout());

        info!(
            provider = llm.name(),
            tools = tools.len(),
            store = store.name(),
            "Session manager ready"
        );

        Ok(Self::new(
            llm,
            tools,
            store,
            MemoryConfig::from(&config.memory),
            ExecutorConfig::from(&config.agent),
        )
        .with_summarizer(Arc::new(summarizer)))
    }

    pub fn with_summarizer(mut self, summarizer: Arc<dyn Summarizer>) -> Self {
        self.summarizer = summarizer;
        self
    }

    /// Every session's executor reports on `events`.
    pub fn with_events(mut self, events: UnboundedSender<AgentEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn tools(&self) -> &Arc<ToolRegistry> {
        &self.tools
    }

    /// Run one turn in the session named by `key`.
    pub async fn chat(&self, key: &SessionKey, input: &str) -> Result<ChatResponse> {
        let session = self.session(key).await;
        let _turn = session.turn.lock().await;
        session.executor.chat(input, None).await
    }

    /// Forget the session, in-process and in the store.
    pub async fn clear_memory(&self, key: &SessionKey) {
        let existing = self.sessions.lock().await.get(key).cloned();
        match existing {
            Some(session) => {
                {
                    let _turn = session.turn.lock().await;
                    session.executor.clear_memory().await;
                }
                self.sessions.lock().await.remove(key);
            }
            None => self.detached_memory(key).clear().await,
        }
        info!(session = %key, "Session cleared");
    }

    /// A digest of the session's conversation. Does not open the session.
    pub async fn memory_summary(&self, key: &SessionKey) -> String {
        self.memory_for(key).await.get_summary().await
    }

    /// The session's history. Does not open the session.
    pub async fn history(&self, key: &SessionKey) -> Vec<Message> {
        self.memory_for(key).await.get_history().await
    }

    /// Keys of the sessions held in this process.
    pub async fn active_sessions(&self) -> Vec<SessionKey> {
        let mut keys: Vec<SessionKey> = self.sessions.lock().await.keys().cloned().collect();
        keys.sort_by(|a, b| {
            (a.user_id.as_str(), a.session_id.as_str()).cmp(&(b.user_id.as_str(), b.session_id.as_str()))
        });
        keys
    }

    /// The open session's memory, or a throwaway view of the stored record.
    async fn memory_for(&self, key: &SessionKey) -> Arc<ConversationMemory> {
        match self.sessions.lock().await.get(key) {
            Some(session) => session.executor.memory().clone(),
            None => Arc::new(self.detached_memory(key)),
        }
    }

    fn detached_memory(&self, key: &SessionKey) -> ConversationMemory {
        ConversationMemory::new(
            key.clone(),
            self.memory_config,
            self.store.clone(),
            self.summarizer.clone(),
        )
    }

    async fn session(&self, key: &SessionKey) -> Arc<Session> {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get(key) {
            return session.clone();
        }

        debug!(session = %key, "Opening session");
        let memory = Arc::new(self.detached_memory(key));
        let mut executor = AgentExecutor::new(
            self.llm.clone(),
            self.tools.clone(),
            memory,
            self.executor_config.clone(),
        );
        if let Some(events) = &self.events {
            executor = executor.with_events(events.clone());
        }

        let session = Arc::new(Session {
            executor,
            turn: Mutex::new(()),
        });
        sessions.insert(key.clone(), session.clone());
        session
    }
}
