//! Configuration structures.

use secrecy::SecretString;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use validator::{Validate, ValidationError};

/// Complete application configuration.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct AppConfig {
    /// HTTP server settings
    #[serde(default)]
    #[validate(nested)]
    pub server: ServerSettings,

    /// Language model settings
    #[serde(default)]
    #[validate(nested)]
    pub llm: LlmSettings,

    /// Prompt settings
    #[serde(default)]
    #[validate(nested)]
    pub prompts: PromptSettings,

    /// Chat transcript settings
    #[serde(default)]
    pub transcript: TranscriptSettings,

    /// Logging, tracing and metrics settings
    #[serde(default)]
    #[validate(nested)]
    pub telemetry: TelemetrySettings,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ServerSettings {
    /// Bind address
    #[serde(default = "default_host")]
    #[validate(length(min = 1))]
    pub host: String,

    /// Bind port
    #[serde(default = "default_port")]
    #[validate(range(min = 1))]
    pub port: u16,

    /// Largest accepted request body, uploads included
    #[serde(default = "default_max_body_bytes")]
    #[validate(range(min = 1024))]
    pub max_body_bytes: usize,

    /// Directory for temporary uploads; the system temp dir when unset
    #[serde(default)]
    pub upload_dir: Option<PathBuf>,

    /// Enable permissive CORS for the dashboard
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// How long in-flight requests get to finish on shutdown
    #[serde(default = "default_shutdown_timeout", with = "humantime_serde")]
    pub shutdown_timeout: Duration,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_body_bytes: default_max_body_bytes(),
            upload_dir: None,
            cors_enabled: true,
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

impl ServerSettings {
    /// `host:port` string for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Which Google endpoint family to call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoogleApi {
    /// Google AI Studio, authenticated with an API key
    #[default]
    AiStudio,
    /// Vertex AI, authenticated with a bearer token
    VertexAi,
}

/// Language model configuration
#[derive(Debug, Clone, Deserialize, Validate)]
#[validate(schema(function = "validate_llm_settings"))]
pub struct LlmSettings {
    /// Endpoint family
    #[serde(default)]
    pub api: GoogleApi,

    /// Model identifier
    #[serde(default = "default_model")]
    #[validate(length(min = 1))]
    pub model: String,

    /// Base URL override (tests, proxies)
    #[serde(default)]
    #[validate(url)]
    pub base_url: Option<String>,

    /// HTTP timeout for one completion call
    #[serde(default = "default_llm_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Sampling temperature
    #[serde(default)]
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: Option<f32>,

    /// Output token limit
    #[serde(default)]
    #[validate(range(min = 1))]
    pub max_output_tokens: Option<u32>,

    /// Google AI Studio API key. Normally supplied through `GOOGLE_API_KEY`.
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Vertex AI access token. Normally supplied through `GOOGLE_ACCESS_TOKEN`.
    #[serde(default)]
    pub access_token: Option<SecretString>,

    /// Vertex AI project
    #[serde(default)]
    pub project_id: Option<String>,

    /// Vertex AI location
    #[serde(default = "default_location")]
    pub location: String,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api: GoogleApi::default(),
            model: default_model(),
            base_url: None,
            timeout: default_llm_timeout(),
            temperature: None,
            max_output_tokens: None,
            api_key: None,
            access_token: None,
            project_id: None,
            location: default_location(),
        }
    }
}

impl LlmSettings {
    /// Whether the credential for the selected endpoint family is present.
    pub fn has_credentials(&self) -> bool {
        match self.api {
            GoogleApi::AiStudio => self.api_key.is_some(),
            GoogleApi::VertexAi => self.access_token.is_some() && self.project_id.is_some(),
        }
    }
}

fn validate_llm_settings(settings: &LlmSettings) -> Result<(), ValidationError> {
    if settings.timeout.is_zero() {
        return Err(ValidationError::new("zero_timeout")
            .with_message("llm.timeout must be greater than zero".into()));
    }
    if settings.api == GoogleApi::VertexAi && settings.location.trim().is_empty() {
        return Err(ValidationError::new("missing_location")
            .with_message("llm.location is required for Vertex AI".into()));
    }
    Ok(())
}

/// Prompt configuration
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PromptSettings {
    /// Locale the prompts frame the engineer in
    #[serde(default = "default_region")]
    #[validate(length(min = 1))]
    pub region: String,
}

impl Default for PromptSettings {
    fn default() -> Self {
        Self {
            region: default_region(),
        }
    }
}

/// Where chat transcripts live.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptBackend {
    /// JSON file on disk
    #[default]
    File,
    /// Process memory only
    Memory,
}

/// Chat transcript configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptSettings {
    /// Storage backend
    #[serde(default)]
    pub backend: TranscriptBackend,

    /// File path for the `file` backend
    #[serde(default = "default_transcript_path")]
    pub path: PathBuf,
}

impl Default for TranscriptSettings {
    fn default() -> Self {
        Self {
            backend: TranscriptBackend::default(),
            path: default_transcript_path(),
        }
    }
}

/// Telemetry configuration
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TelemetrySettings {
    /// Log level (`RUST_LOG` takes precedence)
    #[serde(default = "default_log_level")]
    #[validate(length(min = 1))]
    pub log_level: String,

    /// Emit JSON log lines
    #[serde(default)]
    pub json_logs: bool,

    /// Install the OpenTelemetry layer
    #[serde(default)]
    pub tracing_enabled: bool,

    /// Trace sampling ratio
    #[serde(default = "default_sampling_ratio")]
    #[validate(range(min = 0.0, max = 1.0))]
    pub sampling_ratio: f64,

    /// Service name reported in traces
    #[serde(default = "default_service_name")]
    pub service_name: String,

    /// Expose `/metrics`
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            tracing_enabled: false,
            sampling_ratio: default_sampling_ratio(),
            service_name: default_service_name(),
            metrics_enabled: true,
        }
    }
}

// Default value functions

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

fn default_max_body_bytes() -> usize {
    25 * 1024 * 1024
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_llm_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_location() -> String {
    "us-central1".to_string()
}

fn default_region() -> String {
    "Mercer Island, WA".to_string()
}

fn default_transcript_path() -> PathBuf {
    PathBuf::from("chat_history.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_sampling_ratio() -> f64 {
    1.0
}

fn default_service_name() -> String {
    "geotech-assistant".to_string()
}

fn default_true() -> bool {
    true
}
