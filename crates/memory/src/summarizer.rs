//! Summarization used by memory compaction.
//!
//! Compaction is incremental: the summarizer receives the running summary
//! (if any) plus the messages being folded out of the recent window, and
//! returns the new running summary.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chatclaw_core::error::MemoryError;
use chatclaw_core::message::{Message, Role};
use chatclaw_core::provider::{LlmClient, Prompt, PromptMessage};
use tracing::debug;

#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Fold `messages` into `previous` and return the combined summary.
    async fn summarize(
        &self,
        previous: Option<&str>,
        messages: &[Message],
    ) -> Result<String, MemoryError>;
}

const SUMMARY_INSTRUCTIONS: &str = "You maintain the running summary of a conversation between a user and an AI assistant. \
Merge the previous summary (if any) with the new messages into one concise summary. \
Keep names, numbers, decisions, open questions and user preferences. \
Reply with the summary text only.";

/// Summarizes through a dedicated call to the language model.
pub struct LlmSummarizer {
    llm: Arc<dyn LlmClient>,
    timeout: Duration,
}

impl LlmSummarizer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            timeout: Duration::from_secs(60),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn prompt(previous: Option<&str>, messages: &[Message]) -> Prompt {
        let mut body = String::new();
        if let Some(prev) = previous {
            body.push_str("Previous summary:\n");
            body.push_str(prev);
            body.push_str("\n\n");
        }
        body.push_str("New messages:\n");
        body.push_str(&render_transcript(messages));

        Prompt {
            messages: vec![
                PromptMessage::system(SUMMARY_INSTRUCTIONS),
                PromptMessage::user(body),
            ],
            tools: Vec::new(),
        }
    }
}

/// Render messages as `Role: content` lines.
pub fn render_transcript(messages: &[Message]) -> String {
    let mut out = String::new();
    for msg in messages {
        let who = match msg.role {
            Role::Human => "User",
            Role::Agent => "Assistant",
            Role::System => "System",
        };
        out.push_str(who);
        out.push_str(": ");
        out.push_str(&msg.content);
        out.push('\n');
    }
    out
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(
        &self,
        previous: Option<&str>,
        messages: &[Message],
    ) -> Result<String, MemoryError> {
        let prompt = Self::prompt(previous, messages);
        debug!(messages = messages.len(), "Requesting conversation summary");

        let response = tokio::time::timeout(self.timeout, self.llm.complete(&prompt))
            .await
            .map_err(|_| MemoryError::Summarization("summary request timed out".into()))?
            .map_err(|e| MemoryError::Summarization(e.to_string()))?;

        match response.text.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Ok(text.to_string()),
            _ => Err(MemoryError::Summarization(
                "model returned an empty summary".into(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatclaw_core::error::ProviderError;
    use chatclaw_core::provider::LlmResponse;
    use std::sync::Mutex;

    struct FixedLlm {
        reply: Result<LlmResponse, ProviderError>,
        seen: Mutex<Vec<Prompt>>,
    }

    #[async_trait]
    impl LlmClient for FixedLlm {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn complete(&self, prompt: &Prompt) -> Result<LlmResponse, ProviderError> {
            self.seen.lock().unwrap().push(prompt.clone());
            self.reply.clone()
        }
    }

    fn llm(reply: Result<LlmResponse, ProviderError>) -> Arc<FixedLlm> {
        Arc::new(FixedLlm {
            reply,
            seen: Mutex::new(Vec::new()),
        })
    }

    #[tokio::test]
    async fn includes_previous_summary_and_messages() {
        let fake = llm(Ok(LlmResponse::text("  merged summary \n")));
        let summarizer = LlmSummarizer::new(fake.clone());
        let out = summarizer
            .summarize(Some("older facts"), &[Message::human("my name is Ada")])
            .await
            .unwrap();
        assert_eq!(out, "merged summary");

        let prompt = &fake.seen.lock().unwrap()[0];
        assert!(prompt.contains("older facts"));
        assert!(prompt.contains("User: my name is Ada"));
        assert!(prompt.tools.is_empty());
    }

    #[tokio::test]
    async fn provider_failure_is_a_summarization_error() {
        let summarizer = LlmSummarizer::new(llm(Err(ProviderError::Timeout("30s".into()))));
        let err = summarizer.summarize(None, &[Message::human("hi")]).await.unwrap_err();
        assert!(matches!(err, MemoryError::Summarization(_)));
    }

    #[tokio::test]
    async fn empty_reply_is_rejected() {
        let summarizer = LlmSummarizer::new(llm(Ok(LlmResponse::text("   "))));
        assert!(summarizer.summarize(None, &[Message::human("hi")]).await.is_err());
    }

    #[test]
    fn transcript_labels_roles() {
        let text = render_transcript(&[Message::human("q"), Message::agent("a")]);
        assert_eq!(text, "User: q\nAssistant: a\n");
    }
}
