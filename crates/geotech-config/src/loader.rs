//! Configuration loading: file, then environment, then validation.

use crate::error::ConfigError;
use crate::settings::{AppConfig, GoogleApi, TranscriptBackend};
use secrecy::SecretString;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;
use validator::Validate;

/// Environment variable naming the config file.
pub const CONFIG_PATH_ENV: &str = "GEOTECH_CONFIG";

/// Environment variable holding the Google AI Studio API key.
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Environment variable holding the Vertex AI access token.
pub const ACCESS_TOKEN_ENV: &str = "GOOGLE_ACCESS_TOKEN";

/// Builder for loading [`AppConfig`].
#[derive(Debug, Default)]
pub struct ConfigLoader {
    file: Option<PathBuf>,
    env: Option<HashMap<String, String>>,
}

impl ConfigLoader {
    /// Create a loader reading the process environment.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read this file instead of the one named by `GEOTECH_CONFIG`.
    #[must_use]
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Use these variables instead of the process environment.
    #[must_use]
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    /// Load, apply overrides and validate.
    pub fn load(self) -> Result<AppConfig, ConfigError> {
        let env = self.env.unwrap_or_else(|| std::env::vars().collect());

        let path = self
            .file
            .or_else(|| env.get(CONFIG_PATH_ENV).map(PathBuf::from));

        let mut config = match path {
            Some(path) => {
                debug!(path = %path.display(), "Loading configuration file");
                parse_file(&path)?
            }
            None => AppConfig::default(),
        };

        apply_env(&mut config, &env)?;
        config.validate()?;
        Ok(config)
    }
}

/// Load configuration from an optional file plus the process environment.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let loader = ConfigLoader::new();
    match path {
        Some(path) => loader.with_file(path).load(),
        None => loader.load(),
    }
}

fn parse_file(path: &Path) -> Result<AppConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let parse_err = |message: String| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    };

    match path.extension().and_then(|e| e.to_str()) {
        Some("yaml" | "yml") => serde_yaml::from_str(&content).map_err(|e| parse_err(e.to_string())),
        Some("toml") => toml::from_str(&content).map_err(|e| parse_err(e.to_string())),
        _ => Err(ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
        }),
    }
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Env {
        key: key.to_string(),
        message: e.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::Env {
            key: key.to_string(),
            message: format!("expected a boolean, got {other:?}"),
        }),
    }
}

#[allow(clippy::too_many_lines)]
fn apply_env(config: &mut AppConfig, env: &HashMap<String, String>) -> Result<(), ConfigError> {
    let get = |key: &str| env.get(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get("GEOTECH_HOST") {
        config.server.host = v.trim().to_string();
    }
    if let Some(v) = get("GEOTECH_PORT") {
        config.server.port = parse_value("GEOTECH_PORT", v)?;
    }
    if let Some(v) = get("GEOTECH_MAX_BODY_BYTES") {
        config.server.max_body_bytes = parse_value("GEOTECH_MAX_BODY_BYTES", v)?;
    }
    if let Some(v) = get("GEOTECH_UPLOAD_DIR") {
        config.server.upload_dir = Some(PathBuf::from(v.trim()));
    }

    if let Some(v) = get("GEOTECH_LLM_API") {
        config.llm.api = match v.trim() {
            "ai_studio" => GoogleApi::AiStudio,
            "vertex_ai" => GoogleApi::VertexAi,
            other => {
                return Err(ConfigError::Env {
                    key: "GEOTECH_LLM_API".to_string(),
                    message: format!("expected ai_studio or vertex_ai, got {other:?}"),
                })
            }
        };
    }
    if let Some(v) = get("GEOTECH_MODEL") {
        config.llm.model = v.trim().to_string();
    }
    if let Some(v) = get("GEOTECH_LLM_BASE_URL") {
        config.llm.base_url = Some(v.trim().to_string());
    }
    if let Some(v) = get("GEOTECH_LLM_TIMEOUT") {
        config.llm.timeout = humantime_serde::re::humantime::parse_duration(v.trim()).map_err(
            |e| ConfigError::Env {
                key: "GEOTECH_LLM_TIMEOUT".to_string(),
                message: e.to_string(),
            },
        )?;
    }
    if let Some(v) = get("GEOTECH_TEMPERATURE") {
        config.llm.temperature = Some(parse_value("GEOTECH_TEMPERATURE", v)?);
    }
    if let Some(v) = get("GEOTECH_MAX_OUTPUT_TOKENS") {
        config.llm.max_output_tokens = Some(parse_value("GEOTECH_MAX_OUTPUT_TOKENS", v)?);
    }
    if let Some(v) = get(API_KEY_ENV) {
        config.llm.api_key = Some(SecretString::new(v.trim().to_string()));
    }
    if let Some(v) = get(ACCESS_TOKEN_ENV) {
        config.llm.access_token = Some(SecretString::new(v.trim().to_string()));
    }
    if let Some(v) = get("GOOGLE_CLOUD_PROJECT") {
        config.llm.project_id = Some(v.trim().to_string());
    }
    if let Some(v) = get("GOOGLE_CLOUD_LOCATION") {
        config.llm.location = v.trim().to_string();
    }

    if let Some(v) = get("GEOTECH_REGION") {
        config.prompts.region = v.trim().to_string();
    }

    if let Some(v) = get("GEOTECH_TRANSCRIPT_BACKEND") {
        config.transcript.backend = match v.trim() {
            "file" => TranscriptBackend::File,
            "memory" => TranscriptBackend::Memory,
            other => {
                return Err(ConfigError::Env {
                    key: "GEOTECH_TRANSCRIPT_BACKEND".to_string(),
                    message: format!("expected file or memory, got {other:?}"),
                })
            }
        };
    }
    if let Some(v) = get("GEOTECH_TRANSCRIPT_PATH") {
        config.transcript.path = PathBuf::from(v.trim());
    }

    if let Some(v) = get("GEOTECH_LOG_LEVEL") {
        config.telemetry.log_level = v.trim().to_string();
    }
    if let Some(v) = get("GEOTECH_LOG_JSON") {
        config.telemetry.json_logs = parse_bool("GEOTECH_LOG_JSON", v)?;
    }
    if let Some(v) = get("GEOTECH_TRACING") {
        config.telemetry.tracing_enabled = parse_bool("GEOTECH_TRACING", v)?;
    }
    if let Some(v) = get("GEOTECH_METRICS") {
        config.telemetry.metrics_enabled = parse_bool("GEOTECH_METRICS", v)?;
    }

    Ok(())
}
