//! LLM client implementations for ChatClaw.
//!
//! All clients implement `chatclaw_core::LlmClient`. [`build_from_config`]
//! picks and configures the client named in the `[provider]` section.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatClient;

use std::sync::Arc;

use chatclaw_config::AppConfig;
use chatclaw_core::error::ProviderError;
use chatclaw_core::provider::LlmClient;

/// Providers that run locally and accept any API key.
const KEYLESS_PROVIDERS: &[&str] = &["ollama", "vllm", "local"];

/// Build the LLM client described by `config`.
///
/// Every supported provider speaks the OpenAI-compatible protocol; the
/// provider name only decides whether an API key is required.
pub fn build_from_config(config: &AppConfig) -> Result<Arc<dyn LlmClient>, ProviderError> {
    let provider = &config.provider;
    let api_key = match (&config.api_key, KEYLESS_PROVIDERS.contains(&provider.name.as_str())) {
        (Some(key), _) => key.clone(),
        (None, true) => String::new(),
        (None, false) => {
            return Err(ProviderError::NotConfigured(format!(
                "No API key for provider '{}'. Set CHATCLAW_API_KEY or api_key in config.toml",
                provider.name
            )));
        }
    };

    let client = OpenAiCompatClient::from_config(provider, api_key)?;
    tracing::info!(provider = %provider.name, model = %provider.model, "LLM client ready");
    Ok(Arc::new(client))
}
