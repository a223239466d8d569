//! The completion provider seam.

use crate::error::GatewayError;
use crate::request::CompletionRequest;
use async_trait::async_trait;

/// A text-completion backend: prompt in, text out.
///
/// Implementations must be cheap to share behind an `Arc` and must not retry
/// on their own; every failure is returned to the caller as a [`GatewayError`].
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Stable provider identifier (`google`, `mock`, ...).
    fn id(&self) -> &str;

    /// Model the provider sends requests to.
    fn model(&self) -> &str;

    /// Send one prompt and return the model's raw text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct Echo;

    #[async_trait]
    impl CompletionProvider for Echo {
        fn id(&self) -> &str {
            "echo"
        }

        fn model(&self) -> &str {
            "echo-1"
        }

        async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
            Ok(request.prompt.clone())
        }
    }

    #[tokio::test]
    async fn test_provider_is_object_safe() {
        let provider: Arc<dyn CompletionProvider> = Arc::new(Echo);
        let out = provider
            .complete(&CompletionRequest::text("ping"))
            .await
            .unwrap();
        assert_eq!(out, "ping");
        assert_eq!(provider.id(), "echo");
        assert_eq!(provider.model(), "echo-1");
    }
}
