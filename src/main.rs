//! # Geotech Assistant
//!
//! HTTP API for geotechnical chat, document analysis and report generation.
//!
//! ## Usage
//!
//! ```bash
//! # Start with defaults (GOOGLE_API_KEY must be set, a .env file works too)
//! geotech-assistant
//!
//! # Start with a configuration file
//! geotech-assistant --config /path/to/config.yaml
//!
//! # Start with environment overrides
//! GEOTECH_PORT=9000 GEOTECH_MODEL=gemini-1.5-pro geotech-assistant
//! ```

use anyhow::{bail, Context, Result};
use clap::Parser;
use geotech_config::load_config;
use geotech_server::{tracing_config, AppState, Server, ServerConfig};
use geotech_telemetry::{init_tracing, shutdown_tracing};
use std::path::PathBuf;
use tracing::{error, info};

/// Application entry point
#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!(error = %e, "Application failed");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

/// Geotechnical assistant HTTP server
#[derive(Parser, Debug)]
#[command(name = "geotech-assistant", version, about)]
struct Args {
    /// Configuration file (YAML or TOML)
    #[arg(short, long, env = "GEOTECH_CONFIG")]
    config: Option<PathBuf>,
}

/// Main application logic
async fn run() -> Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let config = load_config(args.config.as_deref()).context("Failed to load configuration")?;

    let tracer = init_tracing(&tracing_config(&config)).context("Failed to initialize logging")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %config.server.host,
        port = config.server.port,
        model = %config.llm.model,
        "Starting geotechnical assistant"
    );

    if !config.llm.has_credentials() {
        bail!(
            "No model credentials configured: set {} (or the Vertex AI token and project)",
            geotech_config::API_KEY_ENV
        );
    }

    let state = AppState::from_config(&config)
        .await
        .context("Failed to initialize application state")?;

    let server = Server::new(ServerConfig::from(&config.server), state);
    let result = server.run().await.context("Server error");

    shutdown_tracing(tracer);
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_args_debug_assert() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_config_flag_forms() {
        let args = Args::try_parse_from(["geotech-assistant", "--config=site.yaml"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("site.yaml")));

        let args = Args::try_parse_from(["geotech-assistant", "-c", "site.toml"]).unwrap();
        assert_eq!(args.config, Some(PathBuf::from("site.toml")));

        let err = Args::try_parse_from(["geotech-assistant", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
