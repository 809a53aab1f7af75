//! LLM client trait: the abstraction over language-model backends.
//!
//! The agent hands an [`LlmClient`] a fully rendered [`Prompt`] and gets back
//! either free text or one or more structured tool-call requests. Retry and
//! backoff policy belongs to the caller, not to the client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ProviderError;
use crate::tool::ToolCall;

/// The role of an entry in a rendered prompt.
///
/// This is the wire-level vocabulary of chat-completion APIs and differs
/// from the memory-level [`Role`](crate::message::Role).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    System,
    User,
    Assistant,
    Tool,
}

impl PromptRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::Tool => "tool",
        }
    }
}

/// A single entry in a rendered prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: PromptRole,

    pub content: String,

    /// The action an assistant entry took (scratchpad only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call: Option<ToolCall>,

    /// Which action a tool entry observes (scratchpad only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(PromptRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(PromptRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(PromptRole::Assistant, content)
    }

    /// An assistant entry recording a tool invocation.
    pub fn action(thought: impl Into<String>, call: ToolCall) -> Self {
        Self {
            role: PromptRole::Assistant,
            content: thought.into(),
            tool_call: Some(call),
            tool_call_id: None,
        }
    }

    /// A tool entry carrying the observation for `call_id`.
    pub fn observation(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: PromptRole::Tool,
            content: content.into(),
            tool_call: None,
            tool_call_id: Some(call_id.into()),
        }
    }

    fn plain(role: PromptRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_call: None,
            tool_call_id: None,
        }
    }
}

/// A tool definition sent to the LLM so it knows what tools it can call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// Description of what the tool does
    pub description: String,

    /// JSON Schema describing the tool's parameters
    pub parameters: serde_json::Value,
}

/// Everything the model sees for one completion call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Prompt {
    pub messages: Vec<PromptMessage>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

impl Prompt {
    /// A stable plain-text rendering, one line per entry.
    ///
    /// Used for logging, for the summarization prompt, and by tests that
    /// assert on prompt construction.
    pub fn transcript(&self) -> String {
        let mut out = String::new();
        for msg in &self.messages {
            match (&msg.tool_call, &msg.tool_call_id) {
                (Some(call), _) => {
                    out.push_str(&format!(
                        "[assistant] {} -> {}({})\n",
                        msg.content, call.name, call.arguments
                    ));
                }
                (None, Some(id)) => {
                    out.push_str(&format!("[tool:{id}] {}\n", msg.content));
                }
                (None, None) => {
                    out.push_str(&format!("[{}] {}\n", msg.role.as_str(), msg.content));
                }
            }
        }
        out
    }

    /// Whether any entry's content contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.messages.iter().any(|m| m.content.contains(needle))
    }
}

/// Token usage information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// A complete response from the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LlmResponse {
    /// Free-text content, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// Structured tool invocations requested via the function-call convention.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// Which model actually responded
    #[serde(default)]
    pub model: String,

    /// Token usage statistics
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl LlmResponse {
    /// A text-only response.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    /// A response requesting a single tool call.
    pub fn tool_call(call: ToolCall) -> Self {
        Self {
            tool_calls: vec![call],
            ..Self::default()
        }
    }
}

/// The core LLM client trait.
///
/// Every backend (OpenAI-compatible HTTP, local model, test fake) implements
/// this. The agent calls `complete()` without knowing which backend is used.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// A human-readable name for this client (e.g., "openrouter").
    fn name(&self) -> &str;

    /// Send a prompt and get a complete response.
    async fn complete(&self, prompt: &Prompt) -> std::result::Result<LlmResponse, ProviderError>;
}
