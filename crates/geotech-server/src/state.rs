//! Shared application state.

use geotech_agents::{
    Agents, JsonFileTranscriptStore, MemoryTranscriptStore, PromptBuilder, TranscriptError,
    TranscriptStore,
};
use geotech_config::{AppConfig, GoogleApi, LlmSettings, TranscriptBackend};
use geotech_core::{CompletionProvider, GatewayError};
use geotech_providers::{GoogleConfig, GoogleProvider};
use geotech_telemetry::Metrics;
use secrecy::ExposeSecret;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use crate::upload::UploadDir;

/// Errors building the state from configuration.
#[derive(Debug, Error)]
pub enum StateError {
    /// The model provider could not be created.
    #[error("Provider setup failed: {0}")]
    Provider(#[from] GatewayError),

    /// The transcript store could not be opened.
    #[error("Transcript setup failed: {0}")]
    Transcript(#[from] TranscriptError),

    /// Metric registration failed.
    #[error("Metrics setup failed: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// Chat, extraction and report agents
    pub agents: Agents,
    /// Chat transcript
    pub transcript: Arc<dyn TranscriptStore>,
    /// Prometheus metrics
    pub metrics: Metrics,
    /// Upload location
    pub uploads: UploadDir,
    /// Model name reported by `/health`
    pub model: String,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("agents", &self.agents)
            .field("uploads", &self.uploads)
            .field("model", &self.model)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Start building state around `provider`.
    pub fn builder(provider: Arc<dyn CompletionProvider>) -> AppStateBuilder {
        AppStateBuilder {
            provider,
            prompts: PromptBuilder::default(),
            transcript: None,
            metrics: None,
            uploads: UploadDir::default(),
        }
    }

    /// Build the state a server process runs with: Gemini provider,
    /// configured transcript backend and upload directory.
    pub async fn from_config(config: &AppConfig) -> Result<Self, StateError> {
        let provider = build_provider(&config.llm)?;

        let transcript: Arc<dyn TranscriptStore> = match config.transcript.backend {
            TranscriptBackend::File => {
                Arc::new(JsonFileTranscriptStore::open(&config.transcript.path).await?)
            }
            TranscriptBackend::Memory => Arc::new(MemoryTranscriptStore::new()),
        };

        info!(
            model = %config.llm.model,
            region = %config.prompts.region,
            transcript = ?config.transcript.backend,
            "Application state initialized"
        );

        Ok(Self::builder(Arc::new(provider))
            .prompts(PromptBuilder::new(config.prompts.region.clone()))
            .transcript(transcript)
            .metrics(Metrics::new()?)
            .uploads(UploadDir::new(config.server.upload_dir.clone()))
            .build()?)
    }
}

/// Builder for [`AppState`].
pub struct AppStateBuilder {
    provider: Arc<dyn CompletionProvider>,
    prompts: PromptBuilder,
    transcript: Option<Arc<dyn TranscriptStore>>,
    metrics: Option<Metrics>,
    uploads: UploadDir,
}

impl AppStateBuilder {
    /// Prompt builder (region).
    #[must_use]
    pub fn prompts(mut self, prompts: PromptBuilder) -> Self {
        self.prompts = prompts;
        self
    }

    /// Transcript store; in-memory when unset.
    #[must_use]
    pub fn transcript(mut self, transcript: Arc<dyn TranscriptStore>) -> Self {
        self.transcript = Some(transcript);
        self
    }

    /// Metrics registry; a fresh one when unset.
    #[must_use]
    pub fn metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Upload location.
    #[must_use]
    pub fn uploads(mut self, uploads: UploadDir) -> Self {
        self.uploads = uploads;
        self
    }

    /// Assemble the state.
    pub fn build(self) -> Result<AppState, prometheus::Error> {
        let metrics = match self.metrics {
            Some(metrics) => metrics,
            None => Metrics::new()?,
        };
        let model = self.provider.model().to_string();

        Ok(AppState {
            agents: Agents::new(self.provider, self.prompts).with_metrics(metrics.clone()),
            transcript: self
                .transcript
                .unwrap_or_else(|| Arc::new(MemoryTranscriptStore::new())),
            metrics,
            uploads: self.uploads,
            model,
        })
    }
}

/// Create the Gemini provider described by `settings`.
///
/// Fails with a configuration error when the credential for the selected
/// endpoint family is missing.
pub fn build_provider(settings: &LlmSettings) -> Result<GoogleProvider, GatewayError> {
    let mut config = match settings.api {
        GoogleApi::AiStudio => {
            let key = settings.api_key.as_ref().ok_or_else(|| {
                GatewayError::configuration(format!(
                    "{} is not set",
                    geotech_config::API_KEY_ENV
                ))
            })?;
            GoogleConfig::google_ai("google", key.expose_secret().clone())
        }
        GoogleApi::VertexAi => {
            let token = settings.access_token.as_ref().ok_or_else(|| {
                GatewayError::configuration(format!(
                    "{} is not set",
                    geotech_config::ACCESS_TOKEN_ENV
                ))
            })?;
            let project = settings.project_id.clone().ok_or_else(|| {
                GatewayError::configuration("llm.project_id is required for Vertex AI")
            })?;
            GoogleConfig::vertex_ai(
                "vertex",
                project,
                settings.location.clone(),
                token.expose_secret().clone(),
            )
        }
    }
    .with_model(settings.model.clone())
    .with_timeout(settings.timeout);

    if let Some(base_url) = &settings.base_url {
        config = config.with_base_url(base_url.clone());
    }
    if let Some(temperature) = settings.temperature {
        config = config.with_temperature(temperature);
    }
    if let Some(max_output_tokens) = settings.max_output_tokens {
        config = config.with_max_output_tokens(max_output_tokens);
    }

    GoogleProvider::new(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    #[test]
    fn test_build_provider_requires_key() {
        let err = build_provider(&LlmSettings::default()).unwrap_err();
        assert!(matches!(err, GatewayError::Configuration { .. }));
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }

    #[test]
    fn test_build_provider_with_key() {
        let settings = LlmSettings {
            api_key: Some(SecretString::new("k".to_string())),
            model: "gemini-1.5-pro".to_string(),
            ..LlmSettings::default()
        };
        let provider = build_provider(&settings).unwrap();
        assert_eq!(provider.model(), "gemini-1.5-pro");
    }

    #[test]
    fn test_vertex_requires_project() {
        let settings = LlmSettings {
            api: GoogleApi::VertexAi,
            access_token: Some(SecretString::new("t".to_string())),
            ..LlmSettings::default()
        };
        let err = build_provider(&settings).unwrap_err();
        assert!(err.to_string().contains("project_id"));
    }

    #[tokio::test]
    async fn test_from_config_memory_transcript() {
        let mut config = AppConfig::default();
        config.llm.api_key = Some(SecretString::new("k".to_string()));
        config.transcript.backend = TranscriptBackend::Memory;

        let state = AppState::from_config(&config).await.unwrap();
        assert_eq!(state.model, "gemini-1.5-flash");
        assert!(state.transcript.load().await.unwrap().is_empty());
    }
}
