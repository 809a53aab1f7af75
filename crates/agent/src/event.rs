//! Agent-level progress events.
//!
//! An executor built with [`AgentExecutor::with_events`](crate::AgentExecutor::with_events)
//! reports each step of a turn on the channel, so a CLI or transport can show
//! tool activity while the turn runs.

use chatclaw_core::tool::ToolErrorKind;
use serde::{Deserialize, Serialize};

/// Events emitted while a turn executes.
///
/// - `turn_started` : a `chat()` call began
/// - `thought`      : model text that accompanied a tool call
/// - `tool_call`    : the agent is invoking a tool
/// - `tool_result`  : the invocation finished (successfully or not)
/// - `retry`        : an LLM call failed and will be retried
/// - `finished`     : the turn is complete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    TurnStarted {
        session: String,
        input: String,
    },

    Thought {
        iteration: u32,
        content: String,
    },

    ToolCall {
        iteration: u32,
        id: String,
        name: String,
        input: serde_json::Value,
    },

    ToolResult {
        iteration: u32,
        id: String,
        name: String,
        output: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<ToolErrorKind>,
    },

    Retry {
        attempt: u32,
        delay_ms: u64,
        error: String,
    },

    Finished {
        iterations: u32,
        tools_used: Vec<String>,
        incomplete: bool,
    },
}

impl AgentEvent {
    /// Wire name of this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::TurnStarted { .. } => "turn_started",
            Self::Thought { .. } => "thought",
            Self::ToolCall { .. } => "tool_call",
            Self::ToolResult { .. } => "tool_result",
            Self::Retry { .. } => "retry",
            Self::Finished { .. } => "finished",
        }
    }
}
