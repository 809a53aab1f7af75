//! Prompt assembly.
//!
//! Renders the layered prompt for one LLM call, in this order:
//!
//! 1. System instructions
//! 2. The running conversation summary, if any, as a system entry
//! 3. Recent history (human → user, agent → assistant, system → system)
//! 4. The current user input
//! 5. The scratchpad: one assistant action and one tool observation per
//!    tool call made so far this turn
//!
//! The scratchpad comes after the user input, not before it: chat-completion
//! APIs require every tool message to follow the assistant message that
//! requested it, and the turn's tool steps all answer the current input.
//!
//! Assembly is pure: identical inputs always produce identical prompts.

use chatclaw_core::message::{Message, Role};
use chatclaw_core::provider::{Prompt, PromptMessage, ToolDefinition};
use chatclaw_core::tool::{ToolCall, ToolResult};

/// Header line of the summary entry.
pub const SUMMARY_HEADER: &str = "[Conversation summary]";

/// One completed tool step of the current turn.
#[derive(Debug, Clone, PartialEq)]
pub struct ScratchpadEntry {
    /// Text the model sent alongside the call.
    pub thought: String,
    pub call: ToolCall,
    pub result: ToolResult,
}

/// Everything that goes into one prompt.
pub struct PromptInput<'a> {
    pub summary: Option<&'a str>,
    pub history: &'a [Message],
    pub input: &'a str,
    pub scratchpad: &'a [ScratchpadEntry],
    /// Tool definitions, in registration order.
    pub tools: &'a [ToolDefinition],
}

#[derive(Debug, Clone)]
pub struct PromptAssembler {
    system_prompt: String,
}

impl PromptAssembler {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
        }
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn assemble(&self, input: &PromptInput<'_>) -> Prompt {
        let mut messages =
            Vec::with_capacity(input.history.len() + input.scratchpad.len() * 2 + 3);

        messages.push(PromptMessage::system(&self.system_prompt));

        if let Some(summary) = input.summary {
            messages.push(PromptMessage::system(format!("{SUMMARY_HEADER}\n{summary}")));
        }

        messages.extend(input.history.iter().map(|m| match m.role {
            Role::Human => PromptMessage::user(&m.content),
            Role::Agent => PromptMessage::assistant(&m.content),
            Role::System => PromptMessage::system(&m.content),
        }));

        messages.push(PromptMessage::user(input.input));

        for entry in input.scratchpad {
            messages.push(PromptMessage::action(&entry.thought, entry.call.clone()));
            messages.push(PromptMessage::observation(
                &entry.call.id,
                entry.result.observation(),
            ));
        }

        Prompt {
            messages,
            tools: input.tools.to_vec(),
        }
    }
}
