//! # Geotech Config
//!
//! Typed configuration for the geotechnical assistant.
//!
//! Configuration is assembled in three steps:
//! 1. an optional YAML or TOML file (format chosen by extension),
//! 2. `GEOTECH_*` environment overrides plus the Google credentials
//!    (`GOOGLE_API_KEY`, `GOOGLE_ACCESS_TOKEN`),
//! 3. validation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod settings;

pub use error::ConfigError;
pub use loader::{load_config, ConfigLoader, ACCESS_TOKEN_ENV, API_KEY_ENV, CONFIG_PATH_ENV};
pub use settings::{
    AppConfig, GoogleApi, LlmSettings, PromptSettings, ServerSettings, TelemetrySettings,
    TranscriptBackend, TranscriptSettings,
};
