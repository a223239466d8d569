//! Report command - generate a structured report.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use geotech_agents::ReportInput;
use geotech_core::{DocumentSummary, Report};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::backend::Backend;
use crate::output::{self, CommandResult, OutputFormat};

/// Report kinds offered by the dashboard.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ReportKind {
    /// Site Investigation
    SiteInvestigation,
    /// Foundation Recommendation
    FoundationRecommendation,
}

impl ReportKind {
    fn label(self) -> &'static str {
        match self {
            Self::SiteInvestigation => "Site Investigation",
            Self::FoundationRecommendation => "Foundation Recommendation",
        }
    }
}

/// Arguments for the report command.
#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Report type
    #[arg(short = 't', long = "type", value_enum, default_value = "site-investigation")]
    pub kind: ReportKind,

    /// Project description (location, client, ...)
    #[arg(long)]
    pub project: String,

    /// Parameters, e.g. "cohesion: 25 kPa, bearing_capacity: 180 kPa"
    #[arg(long, default_value = "")]
    pub parameters: String,

    /// JSON file of document summaries written by `analyze --save`
    #[arg(short, long)]
    pub docs: Option<PathBuf>,

    /// Write the report JSON to a file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Report for JSON output.
#[derive(Debug, Serialize)]
pub struct ReportOutput {
    pub report: Report,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_check: Option<String>,
}

/// Execute the report command.
pub async fn execute(args: ReportArgs, backend: &dyn Backend, format: OutputFormat) -> Result<()> {
    let mut input = ReportInput::new(args.kind.label(), args.project, args.parameters);
    if let Some(path) = &args.docs {
        input = input.with_doc_summaries(load_summaries(path).await?);
    }

    let outcome =
        output::with_spinner(format, "Generating report...", backend.report(&input)).await?;

    if let Some(path) = &args.output {
        let body = serde_json::to_string_pretty(&outcome.report)?;
        tokio::fs::write(path, body)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    match format {
        OutputFormat::Json => CommandResult::success(ReportOutput {
            report: outcome.report,
            parameter_check: outcome.parameter_check,
        })
        .print(format),
        OutputFormat::Text => {
            if let Some(check) = &outcome.parameter_check {
                output::parameter_check(check);
            }
            println!("\n{}", outcome.report);
            if let Some(path) = &args.output {
                output::success(&format!("Saved report to {}", path.display()));
            }
            Ok(())
        }
    }
}

async fn load_summaries(path: &Path) -> Result<Vec<DocumentSummary>> {
    let body = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&body)
        .with_context(|| format!("{} is not a JSON array of document summaries", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_load_summaries_rejects_other_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.json");
        tokio::fs::write(&path, r#"{"not": "a list"}"#).await.unwrap();

        let err = load_summaries(&path).await.unwrap_err();
        assert!(err.to_string().contains("document summaries"));
    }

    #[tokio::test]
    async fn test_load_summaries_reads_saved_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("docs.json");
        let body = r#"[{"doc_type":"Boring Log","project_info":{"location":"Kelowna"},"confidence":"Medium"}]"#;
        tokio::fs::write(&path, body).await.unwrap();

        let summaries = load_summaries(&path).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert!(summaries[0].soil_profile.is_empty());
        assert!(summaries[0].test_results.is_empty());
    }

    #[test]
    fn test_report_kind_labels() {
        assert_eq!(ReportKind::SiteInvestigation.label(), "Site Investigation");
        assert_eq!(
            ReportKind::FoundationRecommendation.label(),
            "Foundation Recommendation"
        );
    }
}
