//! Configuration loading, validation, and management for ChatClaw.
//!
//! Loads configuration from `~/.chatclaw/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `~/.chatclaw/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key for the LLM provider
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// LLM provider configuration
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Agent loop configuration
    #[serde(default)]
    pub agent: AgentSettings,

    /// Tool registry configuration
    #[serde(default)]
    pub tools: ToolSettings,

    /// Conversation memory configuration
    #[serde(default)]
    pub memory: MemorySettings,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("provider", &self.provider)
            .field("agent", &self.agent)
            .field("tools", &self.tools)
            .field("memory", &self.memory)
            .field("logging", &self.logging)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_provider_name")]
    pub name: String,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_provider_name() -> String {
    "openrouter".into()
}
fn default_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_model() -> String {
    "openai/gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.0
}
fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            name: default_provider_name(),
            base_url: default_base_url(),
            model: default_model(),
            temperature: default_temperature(),
            max_tokens: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Bounds and retry policy of the reasoning/act loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Maximum LLM round-trips per turn
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    #[serde(default = "default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,

    /// Total attempts per LLM call, including the first
    #[serde(default = "default_llm_retry_attempts")]
    pub llm_retry_attempts: u32,

    #[serde(default = "default_llm_backoff_ms")]
    pub llm_backoff_ms: u64,

    #[serde(default = "default_llm_backoff_max_ms")]
    pub llm_backoff_max_ms: u64,
}

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant. \
Use the available tools whenever they help you answer accurately, \
and answer directly once you have what you need.";

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.into()
}
fn default_max_iterations() -> u32 {
    10
}
fn default_llm_timeout_secs() -> u64 {
    60
}
fn default_llm_retry_attempts() -> u32 {
    3
}
fn default_llm_backoff_ms() -> u64 {
    500
}
fn default_llm_backoff_max_ms() -> u64 {
    8_000
}

impl AgentSettings {
    pub fn llm_timeout(&self) -> Duration {
        Duration::from_secs(self.llm_timeout_secs)
    }

    pub fn llm_backoff(&self) -> Duration {
        Duration::from_millis(self.llm_backoff_ms)
    }

    pub fn llm_backoff_max(&self) -> Duration {
        Duration::from_millis(self.llm_backoff_max_ms)
    }
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            system_prompt: default_system_prompt(),
            max_iterations: default_max_iterations(),
            llm_timeout_secs: default_llm_timeout_secs(),
            llm_retry_attempts: default_llm_retry_attempts(),
            llm_backoff_ms: default_llm_backoff_ms(),
            llm_backoff_max_ms: default_llm_backoff_max_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    /// Default per-invocation timeout
    #[serde(default = "default_tool_timeout_secs")]
    pub timeout_secs: u64,

    /// Directory of `.md` / `.txt` documents served by `search_knowledge_base`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub knowledge_dir: Option<PathBuf>,
}

fn default_tool_timeout_secs() -> u64 {
    30
}

impl ToolSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_tool_timeout_secs(),
            knowledge_dir: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySettings {
    /// "memory", "file", or "none"
    #[serde(default = "default_memory_backend")]
    pub backend: String,

    /// Directory for the file backend (defaults to `~/.chatclaw/sessions`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// Raw message count that triggers the first compaction
    #[serde(default = "default_compaction_threshold")]
    pub compaction_threshold: usize,

    /// Messages kept verbatim after compaction
    #[serde(default = "default_keep_recent")]
    pub keep_recent: usize,

    /// Lifetime of a persisted session snapshot
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_memory_backend() -> String {
    "memory".into()
}
fn default_compaction_threshold() -> usize {
    20
}
fn default_keep_recent() -> usize {
    10
}
fn default_ttl_secs() -> u64 {
    24 * 60 * 60
}

impl MemorySettings {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// The file backend's directory, falling back to the default location.
    pub fn resolved_path(&self) -> PathBuf {
        self.path
            .clone()
            .unwrap_or_else(|| AppConfig::config_dir().join("sessions"))
    }
}

impl Default for MemorySettings {
    fn default() -> Self {
        Self {
            backend: default_memory_backend(),
            path: None,
            compaction_threshold: default_compaction_threshold(),
            keep_recent: default_keep_recent(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path with environment overrides.
    ///
    /// Priority: env vars > config file > defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        let mut config = Self::load_from(&config_path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides, reading variables through `lookup`.
    fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup("CHATCLAW_API_KEY")
            .or_else(|| lookup("OPENAI_API_KEY"))
            .or_else(|| lookup("OPENROUTER_API_KEY"))
        {
            self.api_key = Some(key);
        }

        if let Some(model) = lookup("CHATCLAW_MODEL") {
            self.provider.model = model;
        }

        if let Some(url) = lookup("CHATCLAW_BASE_URL") {
            self.provider.base_url = url;
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".chatclaw")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.provider.temperature) {
            return Err(ConfigError::ValidationError(
                "provider.temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.agent.max_iterations == 0 {
            return Err(ConfigError::ValidationError(
                "agent.max_iterations must be at least 1".into(),
            ));
        }

        if self.agent.llm_retry_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "agent.llm_retry_attempts must be at least 1".into(),
            ));
        }

        if self.memory.keep_recent == 0 || self.memory.keep_recent >= self.memory.compaction_threshold {
            return Err(ConfigError::ValidationError(
                "memory.keep_recent must be between 1 and compaction_threshold - 1".into(),
            ));
        }

        if !matches!(self.memory.backend.as_str(), "memory" | "file" | "none") {
            return Err(ConfigError::ValidationError(format!(
                "unknown memory.backend '{}' (expected memory, file, or none)",
                self.memory.backend
            )));
        }

        Ok(())
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    /// Generate a default config TOML string (for `config init`).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            provider: ProviderConfig::default(),
            agent: AgentSettings::default(),
            tools: ToolSettings::default(),
            memory: MemorySettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
