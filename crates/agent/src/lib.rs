//! The agent loop of ChatClaw.
//!
//! A turn follows a **Reason → Act → Observe** cycle:
//!
//! 1. **Assemble** the prompt (system prompt, conversation summary, recent
//!    history, user input, and this turn's tool steps)
//! 2. **Call the LLM** under a timeout, retrying transient failures
//! 3. **If it asks for a tool**: run it, record the observation, loop back to 2
//! 4. **If it answers**: store the exchange in memory and return it
//!
//! The loop stops at the first answer or when the iteration budget runs out.
//! [`SessionManager`] keeps one executor per session key.

pub mod event;
pub mod executor;
pub mod parser;
pub mod prompt;
pub mod retry;
pub mod session;
pub mod state;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use event::AgentEvent;
pub use executor::{AgentExecutor, ChatResponse, ExecutorConfig, INCOMPLETE_RESPONSE};
pub use parser::{AgentAction, OutputParser};
pub use prompt::{PromptAssembler, PromptInput, ScratchpadEntry};
pub use retry::RetryPolicy;
pub use session::SessionManager;
pub use state::{LoopEvent, LoopState};
