//! The agent executor: one reasoning/act loop per `chat()` call.
//!
//! Each iteration renders the prompt, calls the model (under timeout and
//! retry), and either dispatches one tool call or stops with the model's
//! answer. The turn is written to conversation memory once, after the loop.

use std::sync::Arc;

use chatclaw_config::AgentSettings;
use chatclaw_core::error::{Error, Result};
use chatclaw_core::message::Message;
use chatclaw_core::provider::LlmClient;
use chatclaw_memory::ConversationMemory;
use chatclaw_tools::ToolRegistry;
use serde::Serialize;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use crate::event::AgentEvent;
use crate::parser::{AgentAction, OutputParser};
use crate::prompt::{PromptAssembler, PromptInput, ScratchpadEntry};
use crate::retry::RetryPolicy;
use crate::state::{LoopEvent, LoopState};

/// Response used when the budget runs out before the model said anything.
pub const INCOMPLETE_RESPONSE: &str =
    "I was unable to complete this request within the allowed number of steps.";

#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub system_prompt: String,
    /// Maximum LLM round-trips per turn.
    pub max_iterations: u32,
    pub retry: RetryPolicy,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self::from(&AgentSettings::default())
    }
}

impl From<&AgentSettings> for ExecutorConfig {
    fn from(settings: &AgentSettings) -> Self {
        Self {
            system_prompt: settings.system_prompt.clone(),
            max_iterations: settings.max_iterations,
            retry: RetryPolicy::from(settings),
        }
    }
}

/// The outcome of one turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatResponse {
    pub response: String,
    /// Names of the tools dispatched this turn, in call order.
    pub tools_used: Vec<String>,
    /// The iteration budget ran out before the model finished.
    pub incomplete: bool,
    pub iterations: u32,
}

pub struct AgentExecutor {
    llm: Arc<dyn LlmClient>,
    tools: Arc<ToolRegistry>,
    memory: Arc<ConversationMemory>,
    assembler: PromptAssembler,
    config: ExecutorConfig,
    events: Option<UnboundedSender<AgentEvent>>,
}

impl AgentExecutor {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        tools: Arc<ToolRegistry>,
        memory: Arc<ConversationMemory>,
        config: ExecutorConfig,
    ) -> Self {
        Self {
            assembler: PromptAssembler::new(config.system_prompt.clone()),
            llm,
            tools,
            memory,
            config,
            events: None,
        }
    }

    /// Report turn progress on `events`.
    pub fn with_events(mut self, events: UnboundedSender<AgentEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn memory(&self) -> &Arc<ConversationMemory> {
        &self.memory
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run one turn.
    ///
    /// `history_override` replaces the stored history for this turn's prompts;
    /// the turn is still appended to memory. The only error returned is
    /// [`Error::ServiceUnavailable`]: tool failures become observations and an
    /// exhausted budget is reported through [`ChatResponse::incomplete`].
    ///
    /// Dropping the returned future cancels the turn; nothing is written to
    /// memory in that case.
    pub async fn chat(
        &self,
        input: &str,
        history_override: Option<Vec<Message>>,
    ) -> Result<ChatResponse> {
        let session = self.memory.key().clone();
        info!(%session, "Turn started");
        self.emit(AgentEvent::TurnStarted {
            session: session.to_string(),
            input: input.to_string(),
        });

        let (summary, history) = match history_override {
            Some(history) => (None, history),
            None => {
                let snapshot = self.memory.snapshot().await;
                (snapshot.summary, snapshot.recent_messages)
            }
        };
        let tool_definitions = self.tools.definitions();

        let mut state = LoopState::default();
        let mut scratchpad: Vec<ScratchpadEntry> = Vec::new();
        let mut tools_used: Vec<String> = Vec::new();
        let mut last_text: Option<String> = None;
        let mut answer: Option<String> = None;
        let mut iterations = 0;

        while iterations < self.config.max_iterations {
            iterations += 1;

            let prompt = self.assembler.assemble(&PromptInput {
                summary: summary.as_deref(),
                history: &history,
                input,
                scratchpad: &scratchpad,
                tools: &tool_definitions,
            });
            debug!(%session, iteration = iterations, entries = prompt.messages.len(), "Calling LLM");

            let response = self
                .config
                .retry
                .complete(self.llm.as_ref(), &prompt, |attempt, delay, error| {
                    self.emit(AgentEvent::Retry {
                        attempt,
                        delay_ms: delay.as_millis() as u64,
                        error: error.to_string(),
                    });
                })
                .await?;

            if let Some(text) = response.text.as_deref().filter(|t| !t.trim().is_empty()) {
                last_text = Some(text.to_string());
            }

            match OutputParser::parse(&response, iterations) {
                AgentAction::ToolCall { call, thought } => {
                    state = advance(state, LoopEvent::ToolCallParsed)?;
                    if !thought.trim().is_empty() {
                        self.emit(AgentEvent::Thought {
                            iteration: iterations,
                            content: thought.clone(),
                        });
                    }
                    self.emit(AgentEvent::ToolCall {
                        iteration: iterations,
                        id: call.id.clone(),
                        name: call.name.clone(),
                        input: call.arguments.clone(),
                    });
                    debug!(%session, iteration = iterations, tool = %call.name, "Dispatching tool");

                    tools_used.push(call.name.clone());
                    let result = self.tools.invoke(&call).await;

                    self.emit(AgentEvent::ToolResult {
                        iteration: iterations,
                        id: call.id.clone(),
                        name: call.name.clone(),
                        output: result.output.clone(),
                        error: result.error,
                    });
                    scratchpad.push(ScratchpadEntry {
                        thought,
                        call,
                        result,
                    });
                    state = advance(state, LoopEvent::ToolResultReady)?;
                }
                AgentAction::Finish { text } => {
                    state = advance(state, LoopEvent::FinishParsed)?;
                    answer = Some(text);
                    break;
                }
            }
        }

        let (response, incomplete) = match answer {
            Some(text) => (text, false),
            None => {
                state = advance(state, LoopEvent::BudgetExhausted)?;
                warn!(%session, iterations, "Iteration budget exhausted");
                (
                    last_text.unwrap_or_else(|| INCOMPLETE_RESPONSE.to_string()),
                    true,
                )
            }
        };
        debug_assert!(state.is_terminal());

        self.memory
            .add_messages(vec![Message::human(input), Message::agent(&response)])
            .await;

        self.emit(AgentEvent::Finished {
            iterations,
            tools_used: tools_used.clone(),
            incomplete,
        });
        info!(%session, iterations, tools = tools_used.len(), incomplete, "Turn finished");

        Ok(ChatResponse {
            response,
            tools_used,
            incomplete,
            iterations,
        })
    }

    /// Forget this session's conversation.
    pub async fn clear_memory(&self) {
        self.memory.clear().await;
    }

    /// A digest of this session's conversation.
    pub async fn get_memory_summary(&self) -> String {
        self.memory.get_summary().await
    }

    fn emit(&self, event: AgentEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver just means nobody is listening.
            let _ = tx.send(event);
        }
    }
}

fn advance(state: LoopState, event: LoopEvent) -> Result<LoopState> {
    state
        .next(event)
        .ok_or_else(|| Error::Internal(format!("invalid loop transition: {event:?} while {state}")))
}
