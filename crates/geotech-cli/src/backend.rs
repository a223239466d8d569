//! Where CLI requests are answered: in-process agents or a remote server.

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use geotech_agents::{
    render_history, scan_parameters, validate_parameters, Agents, JsonFileTranscriptStore,
    MemoryTranscriptStore, PromptBuilder, ReportInput, TranscriptEntry, TranscriptStore,
};
use geotech_config::{load_config, AppConfig, TranscriptBackend};
use geotech_core::{DocumentSummary, GatewayError, Report};
use geotech_sdk::{ChatRequest, Client, ParameterSet};
use geotech_server::build_provider;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// A generated report and its advisory parameter check.
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    /// The report.
    pub report: Report,
    /// Parameter check message, when one was produced.
    pub parameter_check: Option<String>,
}

/// Operations the CLI commands need.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Answer a question, using the stored transcript as history.
    async fn chat(&self, query: &str) -> Result<String>;

    /// Analyze a local document.
    async fn analyze(&self, path: &Path) -> Result<DocumentSummary>;

    /// Generate a report.
    async fn report(&self, input: &ReportInput) -> Result<ReportOutcome>;

    /// Check parameters in the given order.
    async fn validate(&self, params: &[(String, f64)]) -> Result<String>;

    /// The stored transcript.
    async fn history(&self) -> Result<Vec<TranscriptEntry>>;

    /// Clear the stored transcript.
    async fn clear_history(&self) -> Result<()>;
}

/// Runs the agents in this process.
pub struct LocalBackend {
    agents: std::result::Result<Agents, GatewayError>,
    transcript: Arc<dyn TranscriptStore>,
}

impl LocalBackend {
    /// Load configuration and open the configured transcript.
    ///
    /// Missing model credentials only fail the commands that call the model.
    pub async fn from_config_file(path: Option<&Path>) -> Result<Self> {
        let config = load_config(path).context("Failed to load configuration")?;
        Self::from_config(&config).await
    }

    /// Build from loaded configuration.
    pub async fn from_config(config: &AppConfig) -> Result<Self> {
        let prompts = PromptBuilder::new(config.prompts.region.clone());
        let agents = build_provider(&config.llm)
            .map(|provider| Agents::new(Arc::new(provider), prompts));

        let transcript: Arc<dyn TranscriptStore> = match config.transcript.backend {
            TranscriptBackend::File => Arc::new(
                JsonFileTranscriptStore::open(&config.transcript.path)
                    .await
                    .context("Failed to open chat transcript")?,
            ),
            TranscriptBackend::Memory => Arc::new(MemoryTranscriptStore::new()),
        };

        Ok(Self { agents, transcript })
    }

    /// Use explicit agents and transcript.
    pub fn new(agents: Agents, transcript: Arc<dyn TranscriptStore>) -> Self {
        Self {
            agents: Ok(agents),
            transcript,
        }
    }

    fn agents(&self) -> Result<&Agents> {
        self.agents
            .as_ref()
            .map_err(|e| anyhow!("{e}. Set it in the environment or a .env file, or use --remote"))
    }
}

#[async_trait]
impl Backend for LocalBackend {
    async fn chat(&self, query: &str) -> Result<String> {
        let agents = self.agents()?;
        let history = render_history(&self.transcript.load().await?);
        let response = agents.chat.respond(query, &history).await?;

        let turn = [
            TranscriptEntry::user(query),
            TranscriptEntry::assistant(response.clone()),
        ];
        if let Err(e) = self.transcript.append(&turn).await {
            warn!(error = %e, "Failed to record chat turn");
        }
        Ok(response)
    }

    async fn analyze(&self, path: &Path) -> Result<DocumentSummary> {
        Ok(self.agents()?.extraction.analyze_file(path).await?)
    }

    async fn report(&self, input: &ReportInput) -> Result<ReportOutcome> {
        let agents = self.agents()?;
        let check = validate_parameters(scan_parameters(&input.parameters));
        debug!(check = %check, "Parameter check");
        let report = agents.report.generate(input).await?;
        Ok(ReportOutcome {
            report,
            parameter_check: Some(check.to_string()),
        })
    }

    async fn validate(&self, params: &[(String, f64)]) -> Result<String> {
        let pairs = params.iter().map(|(name, value)| (name.as_str(), *value));
        Ok(validate_parameters(pairs).to_string())
    }

    async fn history(&self) -> Result<Vec<TranscriptEntry>> {
        Ok(self.transcript.load().await?)
    }

    async fn clear_history(&self) -> Result<()> {
        Ok(self.transcript.clear().await?)
    }
}

/// Talks to a running server through the SDK.
pub struct RemoteBackend {
    client: Client,
}

impl RemoteBackend {
    /// Build a client for `url`.
    pub fn connect(url: &str) -> Result<Self> {
        let client = Client::builder()
            .base_url(url)
            .build()
            .context("Failed to create API client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Backend for RemoteBackend {
    async fn chat(&self, query: &str) -> Result<String> {
        Ok(self.client.chat(&ChatRequest::new(query)).await?.response)
    }

    async fn analyze(&self, path: &Path) -> Result<DocumentSummary> {
        Ok(self.client.analyze_document(path).await?)
    }

    async fn report(&self, input: &ReportInput) -> Result<ReportOutcome> {
        let response = self.client.generate_report(input).await?;
        Ok(ReportOutcome {
            report: response.report,
            parameter_check: response.parameter_check,
        })
    }

    async fn validate(&self, params: &[(String, f64)]) -> Result<String> {
        let set: ParameterSet = params.iter().map(|(k, v)| (k.clone(), *v)).collect();
        Ok(self.client.validate_parameters(&set).await?.message)
    }

    async fn history(&self) -> Result<Vec<TranscriptEntry>> {
        Ok(self.client.history().await?)
    }

    async fn clear_history(&self) -> Result<()> {
        Ok(self.client.clear_history().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geotech_agents::Role;
    use geotech_providers::MockProvider;

    fn backend(provider: MockProvider) -> (LocalBackend, Arc<MockProvider>) {
        let provider = Arc::new(provider);
        let agents = Agents::new(provider.clone(), PromptBuilder::default());
        let backend = LocalBackend::new(agents, Arc::new(MemoryTranscriptStore::new()));
        (backend, provider)
    }

    #[tokio::test]
    async fn test_local_chat_records_turns_and_reuses_history() {
        let (backend, provider) = backend(MockProvider::always("Dense glacial till."));

        backend.chat("What is under the site?").await.unwrap();
        backend.chat("How deep?").await.unwrap();

        let history = backend.history().await.unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].role, Role::User);
        assert!(provider
            .last_prompt()
            .unwrap()
            .contains("User: What is under the site?"));

        backend.clear_history().await.unwrap();
        assert!(backend.history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_model_commands_only() {
        let mut config = AppConfig::default();
        config.llm.api_key = None;
        config.transcript.backend = TranscriptBackend::Memory;
        let backend = LocalBackend::from_config(&config).await.unwrap();

        let err = backend.chat("hello").await.unwrap_err();
        assert!(err.to_string().contains("GOOGLE_API_KEY"));

        let message = backend
            .validate(&[("cohesion".to_string(), 60.0)])
            .await
            .unwrap();
        assert_eq!(
            message,
            "Warning: cohesion (60 kPa) outside typical range (0, 50)."
        );
        assert!(backend.history().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_local_report_includes_parameter_check() {
        let reply = r#"{"report_type":"Site Investigation","executive_summary":"s","site_description":"d","methodology":"m","findings":"f","recommendations":"r"}"#;
        let (backend, _) = backend(MockProvider::always(reply));

        let input = ReportInput::new("Site Investigation", "Lakeside lot", "bearing_capacity: 80");
        let outcome = backend.report(&input).await.unwrap();
        assert_eq!(outcome.report.findings, "f");
        assert!(outcome
            .parameter_check
            .unwrap()
            .starts_with("Warning: bearing_capacity"));
    }
}
