//! Tool registry and built-in tools for ChatClaw.
//!
//! The registry validates arguments against each tool's JSON Schema and runs
//! handlers in isolation under a timeout. Built-in tools: arithmetic, a
//! knowledge base search, and the current time.

pub mod calculator;
pub mod clock;
pub mod knowledge_base;
pub mod registry;
pub mod validation;

pub use registry::{DEFAULT_TOOL_TIMEOUT, ToolRegistry};

use chatclaw_config::ToolSettings;
use knowledge_base::KnowledgeBase;
use tracing::warn;

/// Create a registry with every built-in tool.
///
/// The knowledge base is read from `settings.knowledge_dir` when set; if that
/// directory cannot be read the built-in documents are used instead.
pub fn default_registry(settings: &ToolSettings) -> ToolRegistry {
    let kb = match &settings.knowledge_dir {
        Some(dir) => KnowledgeBase::from_dir(dir).unwrap_or_else(|e| {
            warn!(dir = %dir.display(), error = %e, "Failed to load knowledge base, using built-in documents");
            KnowledgeBase::builtin()
        }),
        None => KnowledgeBase::builtin(),
    };

    let mut registry = ToolRegistry::with_timeout(settings.timeout());
    for descriptor in [
        calculator::CalculatorTool::descriptor(),
        knowledge_base::KnowledgeBaseTool::descriptor(kb),
        clock::ClockTool::descriptor(),
    ] {
        // Built-in names are distinct.
        let _ = registry.register(descriptor);
    }
    registry
}
