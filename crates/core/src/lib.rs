//! # ChatClaw Core
//!
//! Domain types, traits, and error definitions for the ChatClaw agent runtime.
//! This crate has **zero framework dependencies**; it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator of the agent loop is defined as a trait here:
//! the language model ([`LlmClient`]), tool handlers ([`ToolHandler`]) and the
//! external session store ([`SessionStore`]). Implementations live in their
//! respective crates and are injected through constructors, which keeps
//! tests free to substitute fakes.

pub mod error;
pub mod message;
pub mod provider;
pub mod store;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, Result};
pub use message::{Message, Role, SessionKey};
pub use provider::{LlmClient, LlmResponse, Prompt, PromptMessage, PromptRole};
pub use store::SessionStore;
pub use tool::{ToolCall, ToolDescriptor, ToolErrorKind, ToolHandler, ToolResult};
