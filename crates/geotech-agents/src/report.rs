//! Report generation.

use crate::prompts::PromptBuilder;
use crate::structured::{call_model, parse_reply};
use geotech_core::{
    CompletionProvider, CompletionRequest, DocumentSummary, Error, Report, Result,
    StructuredOutput,
};
use geotech_telemetry::Metrics;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::instrument;

const OPERATION: &str = "generate_report";

/// What the caller wants a report about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportInput {
    /// Report kind, e.g. `Site Investigation`.
    pub report_type: String,
    /// Free-text project description.
    pub project_info: String,
    /// Free-text parameters, e.g. `cohesion: 25 kPa`.
    pub parameters: String,
    /// Summaries of previously analyzed documents.
    #[serde(default)]
    pub doc_summaries: Option<Vec<DocumentSummary>>,
}

impl ReportInput {
    /// Input without referenced documents.
    pub fn new(
        report_type: impl Into<String>,
        project_info: impl Into<String>,
        parameters: impl Into<String>,
    ) -> Self {
        Self {
            report_type: report_type.into(),
            project_info: project_info.into(),
            parameters: parameters.into(),
            doc_summaries: None,
        }
    }

    /// Reference previously analyzed documents.
    #[must_use]
    pub fn with_doc_summaries(mut self, summaries: Vec<DocumentSummary>) -> Self {
        self.doc_summaries = Some(summaries);
        self
    }
}

/// Generates structured reports.
#[derive(Clone)]
pub struct ReportAgent {
    provider: Arc<dyn CompletionProvider>,
    prompts: PromptBuilder,
    metrics: Option<Metrics>,
}

impl std::fmt::Debug for ReportAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportAgent")
            .field("provider", &self.provider.id())
            .field("region", &self.prompts.region())
            .finish()
    }
}

impl ReportAgent {
    /// Create a report agent.
    pub fn new(provider: Arc<dyn CompletionProvider>, prompts: PromptBuilder) -> Self {
        Self {
            provider,
            prompts,
            metrics: None,
        }
    }

    /// Record model latency and schema failures into `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Generate a report. Referenced summaries go into the prompt as one
    /// compact JSON object per line.
    #[instrument(skip_all, fields(report_type = %input.report_type))]
    pub async fn generate(&self, input: &ReportInput) -> Result<Report> {
        if input.report_type.trim().is_empty() {
            return Err(Error::input("report_type must not be empty"));
        }

        let documents = match &input.doc_summaries {
            Some(summaries) => Some(
                summaries
                    .iter()
                    .map(DocumentSummary::encode)
                    .collect::<std::result::Result<Vec<_>, _>>()?
                    .join("\n"),
            ),
            None => None,
        };

        let prompt = self.prompts.report_prompt(
            &input.report_type,
            &input.project_info,
            &input.parameters,
            documents.as_deref(),
        );
        let raw = call_model(
            self.provider.as_ref(),
            self.metrics.as_ref(),
            OPERATION,
            &CompletionRequest::json(prompt),
        )
        .await?;
        Ok(parse_reply::<Report>(&raw, self.metrics.as_ref())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geotech_core::ProjectInfo;
    use geotech_providers::MockProvider;
    use std::collections::BTreeMap;

    const REPORT: &str = r#"{"report_type": "Site Investigation", "executive_summary": "Stable clay layers.", "site_description": "Located in Mercer Island, WA.", "methodology": "Borehole sampling.", "findings": "Clay to 2m, sand below.", "recommendations": "Use shallow foundations."}"#;

    fn summary(doc_type: &str) -> DocumentSummary {
        DocumentSummary {
            doc_type: doc_type.to_string(),
            project_info: ProjectInfo {
                location: "Mercer Island, WA".to_string(),
                client: None,
                date: None,
            },
            soil_profile: Vec::new(),
            groundwater_depth: None,
            test_results: BTreeMap::from([("cohesion".to_string(), 25.0)]),
            confidence: "High".to_string(),
            recommendations: None,
            hazards: None,
            slope_angle: None,
            lake_proximity: None,
        }
    }

    #[tokio::test]
    async fn test_generate_report() {
        let provider = Arc::new(MockProvider::always(REPORT));
        let agent = ReportAgent::new(provider.clone(), PromptBuilder::default());

        let report = agent
            .generate(&ReportInput::new("Site Investigation", "123 Main St", "cohesion: 25"))
            .await
            .unwrap();
        assert_eq!(report.findings, "Clay to 2m, sand below.");
        assert!(provider.last_prompt().unwrap().contains("Documents: None\n"));
    }

    #[tokio::test]
    async fn test_summaries_are_joined_per_line() {
        let provider = Arc::new(MockProvider::always(REPORT));
        let agent = ReportAgent::new(provider.clone(), PromptBuilder::default());

        let input = ReportInput::new("Feasibility", "x", "y")
            .with_doc_summaries(vec![summary("Boring Log"), summary("Soil Report")]);
        agent.generate(&input).await.unwrap();

        let prompt = provider.last_prompt().unwrap();
        let first = summary("Boring Log").encode().unwrap();
        let second = summary("Soil Report").encode().unwrap();
        assert!(prompt.contains(&format!("Documents: {first}\n{second}\n")));
    }

    #[tokio::test]
    async fn test_empty_report_type_rejected() {
        let provider = Arc::new(MockProvider::always(REPORT));
        let agent = ReportAgent::new(provider.clone(), PromptBuilder::default());

        let err = agent
            .generate(&ReportInput::new(" ", "x", "y"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "input");
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_section_is_schema_error() {
        let provider = Arc::new(MockProvider::always(
            r#"{"report_type": "Site Investigation", "executive_summary": "s"}"#,
        ));
        let agent = ReportAgent::new(provider, PromptBuilder::default());

        let err = agent
            .generate(&ReportInput::new("Site Investigation", "x", "y"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Schema(_)));
    }
}
