//! The tool registry and invoker.
//!
//! The agent loop uses the registry to:
//! 1. Get tool definitions to send to the LLM
//! 2. Validate and execute tool calls the LLM requests
//!
//! [`ToolRegistry::invoke`] never fails: unknown tools, invalid arguments,
//! handler errors, panics and timeouts all come back as a [`ToolResult`]
//! with its `error` set, so a faulty tool cannot take down a turn.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chatclaw_core::error::ToolError;
use chatclaw_core::provider::ToolDefinition;
use chatclaw_core::tool::{ToolCall, ToolDescriptor, ToolErrorKind, ToolResult};
use tracing::{debug, warn};

use crate::validation::validate_arguments;

/// Default per-invocation timeout.
pub const DEFAULT_TOOL_TIMEOUT: Duration = Duration::from_secs(30);

/// A registry of available tools, keyed by unique name.
///
/// Built once at startup and shared read-only (usually behind an `Arc`).
pub struct ToolRegistry {
    tools: HashMap<String, ToolDescriptor>,
    /// Registration order, so definitions render deterministically.
    order: Vec<String>,
    default_timeout: Duration,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TOOL_TIMEOUT)
    }

    /// Create an empty registry whose tools time out after `default_timeout`
    /// unless their descriptor says otherwise.
    pub fn with_timeout(default_timeout: Duration) -> Self {
        Self {
            tools: HashMap::new(),
            order: Vec::new(),
            default_timeout,
        }
    }

    /// Register a tool. Fails if the name is already taken.
    pub fn register(&mut self, descriptor: ToolDescriptor) -> Result<(), ToolError> {
        if self.tools.contains_key(&descriptor.name) {
            return Err(ToolError::DuplicateTool(descriptor.name));
        }
        self.order.push(descriptor.name.clone());
        self.tools.insert(descriptor.name.clone(), descriptor);
        Ok(())
    }

    /// Get a tool by name.
    pub fn get(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    /// Get all tool definitions (for sending to the LLM), in registration order.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.order
            .iter()
            .filter_map(|name| self.tools.get(name))
            .map(ToolDescriptor::to_definition)
            .collect()
    }

    /// List all registered tool names, in registration order.
    pub fn names(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate and execute a tool call.
    ///
    /// The handler runs on its own task under the tool's timeout. On timeout
    /// the task is aborted; a handler that never reaches an await point keeps
    /// running in the background and its result is discarded.
    pub async fn invoke(&self, call: &ToolCall) -> ToolResult {
        let Some(descriptor) = self.tools.get(&call.name) else {
            warn!(tool = %call.name, "Requested tool is not registered");
            return ToolResult::failure(
                &call.id,
                ToolErrorKind::ToolNotFound,
                format!(
                    "No tool named '{}'. Available tools: {}",
                    call.name,
                    self.names().join(", ")
                ),
            );
        };

        if let Err(violation) = validate_arguments(&call.arguments, &descriptor.parameter_schema) {
            debug!(tool = %call.name, %violation, "Tool arguments rejected");
            return ToolResult::failure(
                &call.id,
                ToolErrorKind::ValidationError,
                format!("Invalid arguments for '{}': {violation}", call.name),
            );
        }

        let timeout = descriptor.timeout.unwrap_or(self.default_timeout);
        let handler = descriptor.handler.clone();
        let arguments = call.arguments.clone();
        let start = Instant::now();

        let mut task = tokio::spawn(async move { handler.call(arguments).await });

        let outcome = match tokio::time::timeout(timeout, &mut task).await {
            Ok(Ok(Ok(output))) => Ok(output),
            Ok(Ok(Err(e))) => Err(e.to_string()),
            Ok(Err(join_err)) if join_err.is_panic() => {
                Err(format!("Tool '{}' panicked during execution", call.name))
            }
            Ok(Err(join_err)) => Err(format!("Tool '{}' was cancelled: {join_err}", call.name)),
            Err(_) => {
                task.abort();
                Err(ToolError::Timeout {
                    tool_name: call.name.clone(),
                    timeout_ms: timeout.as_millis() as u64,
                }
                .to_string())
            }
        };

        let duration_ms = start.elapsed().as_millis() as u64;
        match outcome {
            Ok(output) => {
                debug!(tool = %call.name, duration_ms, "Tool executed");
                ToolResult::success(&call.id, output)
            }
            Err(reason) => {
                warn!(tool = %call.name, duration_ms, error = %reason, "Tool execution failed");
                ToolResult::failure(&call.id, ToolErrorKind::ToolExecutionError, reason)
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
