//! Timeout and retry around LLM calls.

use std::time::Duration;

use chatclaw_config::AgentSettings;
use chatclaw_core::error::{Error, ProviderError};
use chatclaw_core::provider::{LlmClient, LlmResponse, Prompt};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Delay before the second attempt; doubles on each further attempt.
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Budget for a single attempt.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            timeout: Duration::from_secs(60),
        }
    }
}

impl From<&AgentSettings> for RetryPolicy {
    fn from(settings: &AgentSettings) -> Self {
        Self {
            attempts: settings.llm_retry_attempts.max(1),
            base_delay: settings.llm_backoff(),
            max_delay: settings.llm_backoff_max(),
            timeout: settings.llm_timeout(),
        }
    }
}

impl RetryPolicy {
    /// Delay after failed attempt number `attempt` (1-based).
    ///
    /// A rate-limit hint from the provider is honoured when longer than the
    /// computed backoff; the result never exceeds `max_delay`.
    pub fn delay_after(&self, attempt: u32, error: &ProviderError) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let backoff = self.base_delay.saturating_mul(1 << exp);
        let hinted = match error {
            ProviderError::RateLimited { retry_after_secs } => {
                backoff.max(Duration::from_secs(*retry_after_secs))
            }
            _ => backoff,
        };
        hinted.min(self.max_delay)
    }

    /// Call the model, retrying retryable failures with exponential backoff.
    ///
    /// `on_retry(attempt, delay, error)` runs before each backoff sleep.
    /// Exhausted or non-retryable failures come back as
    /// [`Error::ServiceUnavailable`].
    pub async fn complete(
        &self,
        llm: &dyn LlmClient,
        prompt: &Prompt,
        mut on_retry: impl FnMut(u32, Duration, &ProviderError),
    ) -> Result<LlmResponse, Error> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            let error = match tokio::time::timeout(self.timeout, llm.complete(prompt)).await {
                Ok(Ok(response)) => return Ok(response),
                Ok(Err(e)) => e,
                Err(_) => ProviderError::Timeout(format!(
                    "No response from '{}' within {}ms",
                    llm.name(),
                    self.timeout.as_millis()
                )),
            };

            if !error.is_retryable() || attempt >= self.attempts {
                warn!(provider = llm.name(), attempt, error = %error, "LLM call failed, giving up");
                return Err(Error::ServiceUnavailable {
                    attempts: attempt,
                    source: error,
                });
            }

            let delay = self.delay_after(attempt, &error);
            warn!(
                provider = llm.name(),
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "LLM call failed, retrying"
            );
            on_retry(attempt, delay, &error);
            tokio::time::sleep(delay).await;
        }
    }
}
