//! Shared test helpers for agent tests.

use async_trait::async_trait;
use chatclaw_core::error::ProviderError;
use chatclaw_core::provider::{LlmClient, LlmResponse, Prompt};
use chatclaw_core::tool::ToolCall;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// One scripted model reply.
#[derive(Debug, Clone)]
pub enum Step {
    Text(String),
    Call(ToolCall),
    Response(LlmResponse),
    Fail(ProviderError),
    /// Never answers (exercises timeouts).
    Hang,
}

/// A fake LLM that plays back a script and records every prompt it sees.
///
/// Panics if called more times than there are steps.
pub struct ScriptedLlm {
    steps: Mutex<VecDeque<Step>>,
    prompts: Mutex<Vec<Prompt>>,
}

impl ScriptedLlm {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<Prompt> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn last_prompt(&self) -> Prompt {
        self.prompts.lock().unwrap().last().cloned().expect("no prompts recorded")
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, prompt: &Prompt) -> Result<LlmResponse, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.clone());
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Text(text)) => Ok(LlmResponse::text(text)),
            Some(Step::Call(call)) => Ok(LlmResponse::tool_call(call)),
            Some(Step::Response(response)) => Ok(response),
            Some(Step::Fail(e)) => Err(e),
            Some(Step::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(ProviderError::Timeout("hung".into()))
            }
            None => panic!("ScriptedLlm: no more steps (call #{})", self.calls()),
        }
    }
}

/// Helper to create a tool call step.
pub fn call(name: &str, args: serde_json::Value) -> Step {
    Step::Call(ToolCall::new(format!("call_{name}"), name, args))
}

pub fn text(text: &str) -> Step {
    Step::Text(text.to_string())
}
