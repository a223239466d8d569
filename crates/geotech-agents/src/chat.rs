//! Expert chat.

use crate::prompts::PromptBuilder;
use crate::structured::call_model;
use geotech_core::{CompletionProvider, CompletionRequest, Error, Result};
use geotech_telemetry::Metrics;
use std::sync::Arc;
use tracing::instrument;

const OPERATION: &str = "chat";

/// Answers free-form geotechnical questions.
#[derive(Clone)]
pub struct ChatAgent {
    provider: Arc<dyn CompletionProvider>,
    prompts: PromptBuilder,
    metrics: Option<Metrics>,
}

impl std::fmt::Debug for ChatAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatAgent")
            .field("provider", &self.provider.id())
            .field("region", &self.prompts.region())
            .finish()
    }
}

impl ChatAgent {
    /// Create a chat agent.
    pub fn new(provider: Arc<dyn CompletionProvider>, prompts: PromptBuilder) -> Self {
        Self {
            provider,
            prompts,
            metrics: None,
        }
    }

    /// Record model latency into `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Answer `query` given the rendered chat history. The reply is returned
    /// as the model wrote it.
    #[instrument(skip_all, fields(query_chars = query.len(), history_chars = chat_history.len()))]
    pub async fn respond(&self, query: &str, chat_history: &str) -> Result<String> {
        if query.trim().is_empty() {
            return Err(Error::input("query must not be empty"));
        }

        let request = CompletionRequest::text(self.prompts.chat_prompt(query, chat_history));
        let reply = call_model(
            self.provider.as_ref(),
            self.metrics.as_ref(),
            OPERATION,
            &request,
        )
        .await?;
        Ok(reply)
    }
}
