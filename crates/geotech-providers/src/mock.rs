//! Scripted provider for tests and offline demos.

use async_trait::async_trait;
use geotech_core::{CompletionProvider, CompletionRequest, GatewayError};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

type Responder = dyn Fn(&CompletionRequest) -> Result<String, GatewayError> + Send + Sync;

/// A provider that replays scripted replies and records every request.
///
/// Scripted replies are consumed in order. Once they run out the responder
/// (if any) answers; otherwise the call fails with an empty-response error.
pub struct MockProvider {
    model: String,
    script: Mutex<VecDeque<Result<String, GatewayError>>>,
    responder: Option<Box<Responder>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl std::fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockProvider")
            .field("model", &self.model)
            .field("remaining", &lock(&self.script).len())
            .finish_non_exhaustive()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    /// Empty script, no responder.
    #[must_use]
    pub fn new() -> Self {
        Self {
            model: "mock-model".to_string(),
            script: Mutex::new(VecDeque::new()),
            responder: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every request with the same text.
    #[must_use]
    pub fn always(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new().with_responder(move |_| Ok(text.clone()))
    }

    /// Queue a text reply.
    #[must_use]
    pub fn with_reply(self, text: impl Into<String>) -> Self {
        lock(&self.script).push_back(Ok(text.into()));
        self
    }

    /// Queue a failure.
    #[must_use]
    pub fn with_error(self, error: GatewayError) -> Self {
        lock(&self.script).push_back(Err(error));
        self
    }

    /// Answer requests the script does not cover.
    #[must_use]
    pub fn with_responder<F>(mut self, responder: F) -> Self
    where
        F: Fn(&CompletionRequest) -> Result<String, GatewayError> + Send + Sync + 'static,
    {
        self.responder = Some(Box::new(responder));
        self
    }

    /// Report a different model name.
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Every request received so far, oldest first.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        lock(&self.requests).clone()
    }

    /// Prompt of the most recent request.
    pub fn last_prompt(&self) -> Option<String> {
        lock(&self.requests).last().map(|r| r.prompt.clone())
    }

    /// Number of requests received.
    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }
}

#[async_trait]
impl CompletionProvider for MockProvider {
    fn id(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
        lock(&self.requests).push(request.clone());

        let scripted = lock(&self.script).pop_front();
        match scripted {
            Some(reply) => reply,
            None => match &self.responder {
                Some(responder) => responder(request),
                None => Err(GatewayError::empty("mock script exhausted")),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_script_then_exhausted() {
        let provider = MockProvider::new()
            .with_reply("first")
            .with_error(GatewayError::network("down"));

        assert_eq!(
            provider.complete(&CompletionRequest::text("a")).await.unwrap(),
            "first"
        );
        assert!(matches!(
            provider.complete(&CompletionRequest::text("b")).await,
            Err(GatewayError::Network { .. })
        ));
        assert!(matches!(
            provider.complete(&CompletionRequest::text("c")).await,
            Err(GatewayError::EmptyResponse { .. })
        ));
        assert_eq!(provider.call_count(), 3);
        assert_eq!(provider.last_prompt().as_deref(), Some("c"));
    }

    #[tokio::test]
    async fn test_responder_sees_prompt() {
        let provider = MockProvider::new()
            .with_responder(|req| Ok(format!("echo: {}", req.prompt.len())));
        let out = provider
            .complete(&CompletionRequest::json("12345"))
            .await
            .unwrap();
        assert_eq!(out, "echo: 5");
        assert_eq!(provider.requests()[0].response_format, geotech_core::ResponseFormat::Json);
    }

    #[tokio::test]
    async fn test_always() {
        let provider = MockProvider::always("same");
        for _ in 0..3 {
            assert_eq!(
                provider.complete(&CompletionRequest::text("x")).await.unwrap(),
                "same"
            );
        }
    }
}
