//! Geotechnical assistant CLI
//!
//! Terminal dashboard for chat, document analysis, report generation and
//! parameter checks, either in-process or against a running server.

use anyhow::Result;
use clap::Parser;
use geotech_telemetry::{init_logging, LoggingConfig};

mod backend;
mod cli;
mod commands;
mod output;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // `serve` configures logging from the server configuration
    if !cli.is_serve() {
        init_logging(&logging_config(cli.verbose, cli.json))?;
    }

    cli.execute().await
}

/// Logging for interactive commands: quiet unless asked.
fn logging_config(verbose: u8, json: bool) -> LoggingConfig {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    LoggingConfig::new()
        .with_level(level)
        .with_json(json)
        .with_target(verbose > 1)
        .with_stderr(true)
}
