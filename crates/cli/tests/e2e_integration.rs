//! End-to-end integration tests for the ChatClaw agent runtime.
//!
//! These tests drive the full pipeline from user input to agent output
//! (prompt assembly, tool execution, memory, and persistence) with a
//! scripted model in place of a real provider.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chatclaw_agent::{AgentExecutor, ExecutorConfig, INCOMPLETE_RESPONSE, RetryPolicy, SessionManager};
use chatclaw_config::ToolSettings;
use chatclaw_core::error::{MemoryError, ProviderError, ToolError};
use chatclaw_core::provider::{LlmClient, LlmResponse, Prompt, PromptRole};
use chatclaw_core::{Message, SessionKey, SessionStore, ToolCall, ToolDescriptor, ToolErrorKind};
use chatclaw_memory::{ConversationMemory, FileStore, InMemoryStore, MemoryConfig, Summarizer};
use chatclaw_tools::{ToolRegistry, default_registry};
use serde_json::json;

// ── Scripted model ───────────────────────────────────────────────────────

/// A model that replays scripted responses and records every prompt.
struct ScriptedModel {
    responses: Mutex<VecDeque<LlmResponse>>,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedModel {
    fn new(responses: Vec<LlmResponse>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }

    fn last_prompt(&self) -> Prompt {
        self.prompts.lock().unwrap().last().cloned().unwrap()
    }
}

#[async_trait::async_trait]
impl LlmClient for ScriptedModel {
    fn name(&self) -> &str {
        "e2e_mock"
    }

    async fn complete(&self, prompt: &Prompt) -> Result<LlmResponse, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(response) => Ok(response),
            None => panic!("ScriptedModel exhausted after {} calls", self.prompts().len()),
        }
    }
}

/// Summaries that just list what they folded in.
struct ListingSummarizer;

#[async_trait::async_trait]
impl Summarizer for ListingSummarizer {
    async fn summarize(
        &self,
        previous: Option<&str>,
        messages: &[Message],
    ) -> Result<String, MemoryError> {
        let mut lines: Vec<String> = previous.map(String::from).into_iter().collect();
        lines.extend(messages.iter().map(|m| m.content.clone()));
        Ok(lines.join("\n"))
    }
}

fn answer(text: &str) -> LlmResponse {
    LlmResponse::text(text)
}

fn use_tool(name: &str, args: serde_json::Value) -> LlmResponse {
    LlmResponse::tool_call(ToolCall::new(format!("call_{name}"), name, args))
}

fn executor_config(max_iterations: u32) -> ExecutorConfig {
    ExecutorConfig {
        system_prompt: "You are a helpful assistant.".into(),
        max_iterations,
        retry: RetryPolicy {
            attempts: 2,
            base_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(2),
            timeout: Duration::from_secs(5),
        },
    }
}

fn agent_with(
    model: Arc<ScriptedModel>,
    tools: ToolRegistry,
    store: Arc<dyn SessionStore>,
    max_iterations: u32,
) -> AgentExecutor {
    let memory = Arc::new(ConversationMemory::new(
        SessionKey::new("e2e", "session"),
        MemoryConfig::default(),
        store,
        Arc::new(ListingSummarizer),
    ));
    AgentExecutor::new(model, Arc::new(tools), memory, executor_config(max_iterations))
}

fn agent(model: Arc<ScriptedModel>) -> AgentExecutor {
    agent_with(
        model,
        default_registry(&ToolSettings::default()),
        Arc::new(InMemoryStore::new()),
        10,
    )
}

// ── Tool use ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_calculation_uses_calculator() {
    let model = ScriptedModel::new(vec![
        use_tool("calculate", json!({"expression": "5+3*2"})),
        answer("5 + 3 * 2 = 11"),
    ]);
    let agent = agent(model.clone());

    let response = agent.chat("What is 5+3*2?", None).await.unwrap();

    assert_eq!(response.tools_used, vec!["calculate"]);
    assert!(response.response.contains("11"));
    assert!(!response.incomplete);

    // The calculator's output reached the model as an observation.
    let observation = model.last_prompt().messages.last().cloned().unwrap();
    assert_eq!(observation.role, PromptRole::Tool);
    assert_eq!(observation.tool_call_id.as_deref(), Some("call_calculate"));
    assert_eq!(observation.content, "11");
}

#[tokio::test]
async fn e2e_knowledge_base_lookup() {
    let model = ScriptedModel::new(vec![
        use_tool("search_knowledge_base", json!({"query": "how do I reset my password"})),
        answer("Use the 'Forgot password' link on the sign-in page."),
    ]);
    let agent = agent(model.clone());

    let response = agent.chat("I forgot my password", None).await.unwrap();
    assert_eq!(response.tools_used, vec!["search_knowledge_base"]);

    let observation = model.last_prompt().messages.last().cloned().unwrap();
    assert!(observation.content.to_lowercase().contains("password"));
}

#[tokio::test]
async fn e2e_tools_used_preserves_call_order() {
    let model = ScriptedModel::new(vec![
        use_tool("get_current_time", json!({})),
        use_tool("calculate", json!({"expression": "24*7"})),
        answer("There are 168 hours in a week."),
    ]);
    let response = agent(model).chat("Hours in a week?", None).await.unwrap();
    assert_eq!(response.tools_used, vec!["get_current_time", "calculate"]);
    assert_eq!(response.iterations, 3);
}

#[tokio::test]
async fn e2e_unknown_tool_yields_tool_not_found() {
    let model = ScriptedModel::new(vec![
        use_tool("launch_rocket", json!({"target": "moon"})),
        answer("I don't have a tool for that."),
    ]);
    let agent = agent(model.clone());

    let response = agent.chat("Launch a rocket", None).await.unwrap();
    assert_eq!(response.response, "I don't have a tool for that.");
    assert_eq!(response.tools_used, vec!["launch_rocket"]);
    assert!(model.last_prompt().contains("Error (tool_not_found)"));

    // The registry itself reports the kind directly.
    let registry = default_registry(&ToolSettings::default());
    let result = registry
        .invoke(&ToolCall::new("c1", "launch_rocket", json!({})))
        .await;
    assert_eq!(result.error, Some(ToolErrorKind::ToolNotFound));
}

#[tokio::test]
async fn e2e_timed_out_tool_is_acknowledged() {
    let mut tools = ToolRegistry::with_timeout(Duration::from_millis(30));
    tools
        .register(ToolDescriptor::new(
            "check_order_status",
            "Look up an order",
            json!({"type": "object", "properties": {"order_id": {"type": "string"}}, "required": ["order_id"]}),
            |_args: serde_json::Value| async {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok::<_, ToolError>("shipped".to_string())
            },
        ))
        .unwrap();

    let model = ScriptedModel::new(vec![
        use_tool("check_order_status", json!({"order_id": "A-17"})),
        answer("Sorry, the order service timed out. Please try again shortly."),
    ]);
    let agent = agent_with(model.clone(), tools, Arc::new(InMemoryStore::new()), 10);

    let response = agent.chat("Where is order A-17?", None).await.unwrap();
    assert!(!response.incomplete);
    assert!(response.response.contains("timed out"));
    assert!(model.last_prompt().contains("Error (tool_execution_error)"));
}

#[tokio::test]
async fn e2e_budget_exhaustion_marks_incomplete() {
    let model = ScriptedModel::new(vec![
        use_tool("get_current_time", json!({})),
        use_tool("get_current_time", json!({})),
    ]);
    let agent = agent_with(
        model,
        default_registry(&ToolSettings::default()),
        Arc::new(InMemoryStore::new()),
        2,
    );

    let response = agent.chat("Keep checking the time", None).await.unwrap();
    assert!(response.incomplete);
    assert_eq!(response.iterations, 2);
    assert_eq!(response.response, INCOMPLETE_RESPONSE);
    assert_eq!(response.tools_used.len(), 2);
}

// ── Memory ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_second_turn_prompt_contains_first_turn() {
    let model = ScriptedModel::new(vec![
        answer("Nice to meet you, Grace!"),
        answer("You told me your name is Grace."),
    ]);
    let agent = agent(model.clone());

    agent.chat("Hi, I'm Grace.", None).await.unwrap();
    agent.chat("What's my name?", None).await.unwrap();

    let second = &model.prompts()[1];
    let contents: Vec<&str> = second.messages.iter().map(|m| m.content.as_str()).collect();
    let human = contents.iter().position(|c| *c == "Hi, I'm Grace.").unwrap();
    let agent_reply = contents.iter().position(|c| *c == "Nice to meet you, Grace!").unwrap();
    let current = contents.iter().position(|c| *c == "What's my name?").unwrap();
    assert!(human < agent_reply && agent_reply < current);
}

#[tokio::test]
async fn e2e_long_conversation_keeps_summary_and_recent_window() {
    let turns = 15;
    let model = ScriptedModel::new((0..turns).map(|i| answer(&format!("reply {i}"))).collect());
    let agent = agent(model.clone());

    for i in 0..turns {
        agent.chat(&format!("message {i}"), None).await.unwrap();
    }

    let history = agent.memory().get_history().await;
    assert_eq!(history.len(), 11);
    assert_eq!(history[0].role, chatclaw_core::Role::System);
    assert!(history[0].content.contains("message 0"));
    assert_eq!(history.last().unwrap().content, format!("reply {}", turns - 1));
}

#[tokio::test]
async fn e2e_clear_memory_starts_fresh() {
    let model = ScriptedModel::new(vec![answer("Noted."), answer("I don't know yet.")]);
    let agent = agent(model.clone());

    agent.chat("My favourite colour is teal.", None).await.unwrap();
    agent.clear_memory().await;
    assert!(agent.memory().get_history().await.is_empty());
    assert_eq!(agent.get_memory_summary().await, chatclaw_memory::EMPTY_SUMMARY);

    agent.chat("What's my favourite colour?", None).await.unwrap();
    assert!(!model.last_prompt().contains("teal"));
}

#[tokio::test]
async fn e2e_file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let model = ScriptedModel::new(vec![answer("Got it, order A-17.")]);
    let first = agent_with(
        model,
        default_registry(&ToolSettings::default()),
        Arc::new(FileStore::new(dir.path())),
        10,
    );
    first.chat("My order is A-17.", None).await.unwrap();
    drop(first);

    let model = ScriptedModel::new(vec![answer("Your order is A-17.")]);
    let second = agent_with(
        model.clone(),
        default_registry(&ToolSettings::default()),
        Arc::new(FileStore::new(dir.path())),
        10,
    );
    second.chat("Which order was it?", None).await.unwrap();
    assert!(model.last_prompt().contains("My order is A-17."));
}

// ── Sessions ─────────────────────────────────────────────────────────────

#[tokio::test]
async fn e2e_session_manager_isolates_users() {
    let model = ScriptedModel::new(vec![answer("Hello Ann."), answer("Hello Ben."), answer("You are Ann.")]);
    let sessions = SessionManager::new(
        model.clone(),
        Arc::new(default_registry(&ToolSettings::default())),
        Arc::new(InMemoryStore::new()),
        MemoryConfig::default(),
        executor_config(10),
    )
    .with_summarizer(Arc::new(ListingSummarizer));

    let ann = SessionKey::new("ann", "web");
    let ben = SessionKey::new("ben", "web");
    sessions.chat(&ann, "I am Ann.").await.unwrap();
    sessions.chat(&ben, "I am Ben.").await.unwrap();
    sessions.chat(&ann, "Who am I?").await.unwrap();

    let last = model.last_prompt();
    assert!(last.contains("I am Ann."));
    assert!(!last.contains("I am Ben."));
}

#[tokio::test]
async fn e2e_outage_surfaces_service_unavailable() {
    struct DownModel;

    #[async_trait::async_trait]
    impl LlmClient for DownModel {
        fn name(&self) -> &str {
            "down"
        }
        async fn complete(&self, _prompt: &Prompt) -> Result<LlmResponse, ProviderError> {
            Err(ProviderError::Network("connection refused".into()))
        }
    }

    let memory = Arc::new(ConversationMemory::new(
        SessionKey::new("e2e", "down"),
        MemoryConfig::default(),
        Arc::new(InMemoryStore::new()),
        Arc::new(ListingSummarizer),
    ));
    let agent = AgentExecutor::new(
        Arc::new(DownModel),
        Arc::new(default_registry(&ToolSettings::default())),
        memory,
        executor_config(10),
    );

    let err = agent.chat("hello", None).await.unwrap_err();
    assert!(matches!(
        err,
        chatclaw_core::Error::ServiceUnavailable { attempts: 2, .. }
    ));
}
