//! Health check command.

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use std::time::{Duration, Instant};

use crate::output::{self, CommandResult, OutputFormat};

/// Arguments for the health command.
#[derive(Args, Debug)]
pub struct HealthArgs {
    /// Timeout in seconds
    #[arg(short, long, default_value = "5")]
    pub timeout: u64,
}

/// Health check result for output.
#[derive(Debug, Serialize)]
pub struct HealthOutput {
    pub status: String,
    pub response_time_ms: u64,
    pub version: String,
    pub model: String,
}

/// Execute the health command against the server at `base_url`.
pub async fn execute(args: HealthArgs, base_url: &str, format: OutputFormat) -> Result<()> {
    let client = geotech_sdk::Client::builder()
        .base_url(base_url)
        .timeout(Duration::from_secs(args.timeout))
        .build()?;

    let start = Instant::now();
    let result =
        output::with_spinner(format, "Checking server health...", client.health()).await;
    let elapsed = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);

    match result {
        Ok(health) => {
            let healthy = health.is_healthy();
            match format {
                OutputFormat::Json => CommandResult::success(HealthOutput {
                    status: health.status,
                    response_time_ms: elapsed,
                    version: health.version,
                    model: health.model,
                })
                .print(format)?,
                OutputFormat::Text => {
                    if healthy {
                        output::success("Server is healthy");
                    } else {
                        output::warning(&format!("Server reports '{}'", health.status));
                    }
                    output::key_value("URL", base_url);
                    output::key_value("Version", &health.version);
                    output::key_value("Model", &health.model);
                    output::key_value("Response Time", &format!("{elapsed}ms"));
                }
            }
            if healthy {
                Ok(())
            } else {
                anyhow::bail!("server is not healthy")
            }
        }
        Err(e) => {
            CommandResult::<()>::failure(format!("Server at {base_url} is unreachable: {e}"))
                .print(format)?;
            Err(e.into())
        }
    }
}
