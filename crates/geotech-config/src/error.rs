//! Configuration errors.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Config file path.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file extension is neither YAML nor TOML.
    #[error("Unsupported config format for {path}: expected .yaml, .yml or .toml")]
    UnsupportedFormat {
        /// Config file path.
        path: PathBuf,
    },

    /// The file could not be parsed.
    #[error("Failed to parse {path}: {message}")]
    Parse {
        /// Config file path.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// An environment override had an unusable value.
    #[error("Invalid value for {key}: {message}")]
    Env {
        /// Environment variable name.
        key: String,
        /// What was wrong.
        message: String,
    },

    /// The merged configuration failed validation.
    #[error("Invalid configuration: {0}")]
    Validation(String),
}

impl From<validator::ValidationErrors> for ConfigError {
    fn from(errors: validator::ValidationErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}
