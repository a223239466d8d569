//! CLI argument definitions using clap.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::backend::{self, Backend};
use crate::commands;
use crate::output::OutputFormat;

/// Geotechnical assistant - chat, document analysis and report generation
#[derive(Parser, Debug)]
#[command(name = "geotech")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Configuration file (YAML or TOML)
    #[arg(short, long, env = "GEOTECH_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub target: Target,

    #[command(subcommand)]
    pub command: Commands,
}

/// Where requests are answered.
#[derive(Args, Debug, Clone)]
pub struct Target {
    /// Send requests to a running server instead of calling the model directly
    #[arg(short, long, global = true)]
    pub remote: bool,

    /// Server URL used with --remote
    #[arg(
        short = 'u',
        long,
        env = "GEOTECH_URL",
        default_value = "http://localhost:8000",
        global = true
    )]
    pub url: String,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP API server
    #[command(visible_alias = "start")]
    Serve(commands::serve::ServeArgs),

    /// Ask geotechnical questions
    Chat(commands::chat::ChatArgs),

    /// Extract a structured summary from documents
    Analyze(commands::analyze::AnalyzeArgs),

    /// Generate a structured report
    Report(commands::report::ReportArgs),

    /// Check parameters against typical ranges
    Validate(commands::validate::ValidateArgs),

    /// Show or clear the chat transcript
    History(commands::history::HistoryArgs),

    /// Check server health
    Health(commands::health::HealthArgs),
}

impl Cli {
    /// Whether this invocation starts the server, which sets up its own logging.
    pub fn is_serve(&self) -> bool {
        matches!(self.command, Commands::Serve(_))
    }

    /// Execute the CLI command.
    pub async fn execute(self) -> Result<()> {
        let format = OutputFormat::from_json_flag(self.json);
        let config = self.config.as_deref();
        match self.command {
            Commands::Serve(args) => commands::serve::execute(args, config).await,
            Commands::Health(args) => commands::health::execute(args, &self.target.url, format).await,
            Commands::Chat(args) => {
                let backend = connect(&self.target, config).await?;
                commands::chat::execute(args, backend.as_ref(), format).await
            }
            Commands::Analyze(args) => {
                let backend = connect(&self.target, config).await?;
                commands::analyze::execute(args, backend.as_ref(), format).await
            }
            Commands::Report(args) => {
                let backend = connect(&self.target, config).await?;
                commands::report::execute(args, backend.as_ref(), format).await
            }
            Commands::Validate(args) => {
                let backend = connect(&self.target, config).await?;
                commands::validate::execute(args, backend.as_ref(), format).await
            }
            Commands::History(args) => {
                let backend = connect(&self.target, config).await?;
                commands::history::execute(args, backend.as_ref(), format).await
            }
        }
    }
}

async fn connect(target: &Target, config: Option<&std::path::Path>) -> Result<Box<dyn Backend>> {
    if target.remote {
        Ok(Box::new(backend::RemoteBackend::connect(&target.url)?))
    } else {
        Ok(Box::new(backend::LocalBackend::from_config_file(config).await?))
    }
}
