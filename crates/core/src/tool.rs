//! Tool contract: the abstraction over agent capabilities.
//!
//! Tools are what give the agent the ability to act in the world: search a
//! knowledge base, compute, send, schedule. Each tool is described by a
//! [`ToolDescriptor`] (name, description, JSON Schema, handler) and every
//! invocation yields a [`ToolResult`], successful or not.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use crate::error::ToolError;
use crate::provider::ToolDefinition;

/// A request to execute a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique call ID (matches the LLM's tool_call.id when it supplies one)
    pub id: String,

    /// Name of the tool to execute
    pub name: String,

    /// Arguments as a JSON value
    pub arguments: serde_json::Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// Why a tool invocation did not succeed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    /// Arguments did not satisfy the tool's parameter schema.
    ValidationError,
    /// The handler failed, panicked, or timed out.
    ToolExecutionError,
    /// No tool is registered under the requested name.
    ToolNotFound,
}

impl ToolErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ValidationError => "validation_error",
            Self::ToolExecutionError => "tool_execution_error",
            Self::ToolNotFound => "tool_not_found",
        }
    }
}

/// The result of a tool invocation. Always produced, even on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    /// The call ID this result is for
    pub call_id: String,

    /// The output content, or a diagnostic when `error` is set
    pub output: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolErrorKind>,
}

impl ToolResult {
    pub fn success(call_id: impl Into<String>, output: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            output: output.into(),
            error: None,
        }
    }

    pub fn failure(call_id: impl Into<String>, kind: ToolErrorKind, output: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            output: output.into(),
            error: Some(kind),
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// The text fed back to the model as the observation for this call.
    pub fn observation(&self) -> String {
        match self.error {
            None => self.output.clone(),
            Some(kind) => format!("Error ({}): {}", kind.as_str(), self.output),
        }
    }
}

/// Executes a tool's business logic.
///
/// Closures of the shape `Fn(Value) -> impl Future<Output = Result<String, ToolError>>`
/// implement this trait, so ad-hoc tools need no dedicated type.
#[async_trait]
pub trait ToolHandler: Send + Sync {
    async fn call(&self, arguments: serde_json::Value) -> std::result::Result<String, ToolError>;
}

#[async_trait]
impl<F, Fut> ToolHandler for F
where
    F: Fn(serde_json::Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<String, ToolError>> + Send + 'static,
{
    async fn call(&self, arguments: serde_json::Value) -> std::result::Result<String, ToolError> {
        (self)(arguments).await
    }
}

/// A registered tool: its public description plus the handler behind it.
#[derive(Clone)]
pub struct ToolDescriptor {
    /// The unique name of this tool (e.g., "calculate").
    pub name: String,

    /// A description of what this tool does (sent to the LLM).
    pub description: String,

    /// JSON Schema describing this tool's parameters.
    pub parameter_schema: serde_json::Value,

    pub handler: Arc<dyn ToolHandler>,

    /// Overrides the registry's default timeout for this tool.
    pub timeout: Option<Duration>,
}

impl ToolDescriptor {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameter_schema: serde_json::Value,
        handler: impl ToolHandler + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameter_schema,
            handler: Arc::new(handler),
            timeout: None,
        }
    }

    /// Set a tool-specific timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Convert this tool into a ToolDefinition for sending to the LLM.
    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameter_schema.clone(),
        }
    }
}

impl std::fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("parameter_schema", &self.parameter_schema)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
