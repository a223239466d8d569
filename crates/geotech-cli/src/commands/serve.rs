//! Serve command - run the HTTP API server.

use anyhow::{bail, Context, Result};
use clap::Args;
use geotech_config::load_config;
use geotech_server::{tracing_config, AppState, Server, ServerConfig};
use geotech_telemetry::{init_tracing, shutdown_tracing};
use std::path::Path;
use tracing::info;

/// Arguments for the serve command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Host to bind to (overrides configuration)
    #[arg(long, env = "GEOTECH_HOST")]
    pub host: Option<String>,

    /// Port to bind to (overrides configuration)
    #[arg(short, long, env = "GEOTECH_PORT")]
    pub port: Option<u16>,

    /// Log level (overrides configuration)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Emit JSON logs
    #[arg(long)]
    pub json_logs: bool,
}

/// Execute the serve command.
pub async fn execute(args: ServeArgs, config_path: Option<&Path>) -> Result<()> {
    let mut config = load_config(config_path).context("Failed to load configuration")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(level) = args.log_level {
        config.telemetry.log_level = level;
    }
    if args.json_logs {
        config.telemetry.json_logs = true;
    }

    let tracer = init_tracing(&tracing_config(&config)).context("Failed to initialize logging")?;

    if !config.llm.has_credentials() {
        bail!(
            "No model credentials configured: set {} (or the Vertex AI token and project)",
            geotech_config::API_KEY_ENV
        );
    }

    let state = AppState::from_config(&config)
        .await
        .context("Failed to initialize application state")?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        address = %config.server.bind_address(),
        model = %config.llm.model,
        "Starting geotechnical assistant"
    );

    let server = Server::new(ServerConfig::from(&config.server), state);
    let result = server.run().await.context("Server error");

    shutdown_tracing(tracer);
    result
}
