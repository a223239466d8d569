//! Validate command - check parameters against typical ranges.

use anyhow::{anyhow, Result};
use clap::Args;
use serde::Serialize;

use crate::backend::Backend;
use crate::output::{self, CommandResult, OutputFormat};

/// Arguments for the validate command.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Parameters as name=value, e.g. cohesion=60 bearing_capacity=180
    #[arg(required = true, value_parser = parse_parameter)]
    pub params: Vec<(String, f64)>,
}

/// Check result for output.
#[derive(Debug, Serialize)]
pub struct ValidationOutput {
    pub message: String,
    pub warning: bool,
}

/// Execute the validate command.
pub async fn execute(args: ValidateArgs, backend: &dyn Backend, format: OutputFormat) -> Result<()> {
    let message = backend.validate(&args.params).await?;
    let warning = message.starts_with("Warning:");

    match format {
        OutputFormat::Json => {
            CommandResult::success(ValidationOutput { message, warning }).print(format)
        }
        OutputFormat::Text => {
            output::parameter_check(&message);
            Ok(())
        }
    }
}

/// Parse `name=value` (or `name:value`).
fn parse_parameter(raw: &str) -> Result<(String, f64)> {
    let (name, value) = raw
        .split_once('=')
        .or_else(|| raw.split_once(':'))
        .ok_or_else(|| anyhow!("expected name=value, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("parameter name is empty in '{raw}'"));
    }
    let value = value
        .trim()
        .trim_end_matches("kPa")
        .trim()
        .parse::<f64>()
        .map_err(|_| anyhow!("'{}' is not a number", value.trim()))?;
    Ok((name.to_string(), value))
}
