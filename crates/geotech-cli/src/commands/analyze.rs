//! Analyze command - extract structured summaries from documents.

use anyhow::{Context, Result};
use clap::Args;
use geotech_core::DocumentSummary;
use serde::Serialize;
use std::path::PathBuf;
use tabled::Tabled;

use crate::backend::Backend;
use crate::output::{self, CommandResult, OutputFormat};

/// Arguments for the analyze command.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Documents to analyze (.pdf, .txt, .md)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Write the summaries as a JSON array, for `report --docs`
    #[arg(short, long)]
    pub save: Option<PathBuf>,
}

/// Outcome for one document.
#[derive(Debug, Serialize)]
pub struct AnalysisOutput {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<DocumentSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Tabled)]
struct SoilLayerRow {
    #[tabled(rename = "Depth (m)")]
    depth: String,
    #[tabled(rename = "Soil Type")]
    soil_type: String,
    #[tabled(rename = "Strength (kPa)")]
    strength: String,
}

#[derive(Tabled)]
struct TestResultRow {
    #[tabled(rename = "Test")]
    test: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Execute the analyze command.
///
/// Each file is analyzed independently; one failure does not stop the rest.
pub async fn execute(args: AnalyzeArgs, backend: &dyn Backend, format: OutputFormat) -> Result<()> {
    let mut outputs = Vec::with_capacity(args.files.len());
    let mut summaries = Vec::new();

    for file in &args.files {
        let label = file.display().to_string();
        let result = output::with_spinner(
            format,
            &format!("Analyzing {label}..."),
            backend.analyze(file),
        )
        .await;

        match result {
            Ok(summary) => {
                if format.is_text() {
                    output::section(&label);
                    print_summary(&summary);
                }
                summaries.push(summary.clone());
                outputs.push(AnalysisOutput {
                    file: label,
                    summary: Some(summary),
                    error: None,
                });
            }
            Err(e) => {
                if format.is_text() {
                    output::error(&format!("{label}: {e:#}"));
                }
                outputs.push(AnalysisOutput {
                    file: label,
                    summary: None,
                    error: Some(format!("{e:#}")),
                });
            }
        }
    }

    if let Some(path) = &args.save {
        let body = serde_json::to_string_pretty(&summaries)?;
        tokio::fs::write(path, body)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        if format.is_text() {
            output::success(&format!(
                "Saved {} summaries to {}",
                summaries.len(),
                path.display()
            ));
        }
    }

    if format == OutputFormat::Json {
        output::json(&outputs)?;
    }

    if summaries.is_empty() {
        anyhow::bail!("No document could be analyzed");
    }
    Ok(())
}

fn print_summary(summary: &DocumentSummary) {
    println!("{summary}");

    if !summary.soil_profile.is_empty() {
        let rows: Vec<SoilLayerRow> = summary
            .soil_profile
            .iter()
            .map(|layer| SoilLayerRow {
                depth: format!("{} - {}", layer.depth_start, layer.depth_end),
                soil_type: layer.soil_type.clone(),
                strength: layer
                    .strength
                    .map_or_else(|| "-".to_string(), |s| s.to_string()),
            })
            .collect();
        output::table(&rows);
    }

    if !summary.test_results.is_empty() {
        let rows: Vec<TestResultRow> = summary
            .test_results
            .iter()
            .map(|(test, value)| TestResultRow {
                test: test.clone(),
                value: value.to_string(),
            })
            .collect();
        output::table(&rows);
    }
}
