//! Turns a model response into the agent's next action.

use chatclaw_core::provider::LlmResponse;
use chatclaw_core::tool::ToolCall;
use tracing::debug;

/// What the model asked the agent to do.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentAction {
    /// Invoke a tool. `thought` is any text the model sent alongside.
    ToolCall { call: ToolCall, thought: String },
    /// Stop and answer.
    Finish { text: String },
}

pub struct OutputParser;

impl OutputParser {
    /// A structured tool call wins over text. Only the first call of a
    /// response is honoured; the model sees its observation and can issue
    /// the next one. Calls without an id get `call_{iteration}_{index}`.
    pub fn parse(response: &LlmResponse, iteration: u32) -> AgentAction {
        let text = response.text.clone().unwrap_or_default();

        let Some(first) = response.tool_calls.first() else {
            return AgentAction::Finish { text };
        };

        if response.tool_calls.len() > 1 {
            debug!(
                iteration,
                ignored = response.tool_calls.len() - 1,
                "Model requested several tool calls, dispatching the first"
            );
        }

        let mut call = first.clone();
        if call.id.trim().is_empty() {
            call.id = format!("call_{iteration}_0");
        }
        AgentAction::ToolCall {
            call,
            thought: text,
        }
    }
}
