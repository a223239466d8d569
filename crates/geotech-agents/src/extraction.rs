//! Document analysis: text extraction followed by structured extraction.

use crate::document::{FileTextExtractor, TextExtractor};
use crate::prompts::PromptBuilder;
use crate::structured::{call_model, parse_reply};
use geotech_core::{
    CompletionProvider, CompletionRequest, DocumentSummary, ExtractionError, Result,
};
use geotech_telemetry::Metrics;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, instrument};

const OPERATION: &str = "analyze_document";

/// Turns an uploaded document into a [`DocumentSummary`].
#[derive(Clone)]
pub struct ExtractionAgent {
    provider: Arc<dyn CompletionProvider>,
    extractor: Arc<dyn TextExtractor>,
    prompts: PromptBuilder,
    metrics: Option<Metrics>,
}

impl std::fmt::Debug for ExtractionAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtractionAgent")
            .field("provider", &self.provider.id())
            .field("region", &self.prompts.region())
            .finish_non_exhaustive()
    }
}

impl ExtractionAgent {
    /// Create an agent using the default file extractor.
    pub fn new(provider: Arc<dyn CompletionProvider>, prompts: PromptBuilder) -> Self {
        Self {
            provider,
            extractor: Arc::new(FileTextExtractor),
            prompts,
            metrics: None,
        }
    }

    /// Replace the text extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Record model latency and schema failures into `metrics`.
    #[must_use]
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Extract the text of `path` on the blocking pool, then analyze it.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub async fn analyze_file(&self, path: &Path) -> Result<DocumentSummary> {
        let extractor = Arc::clone(&self.extractor);
        let owned = path.to_path_buf();
        let file = path.display().to_string();

        let text = tokio::task::spawn_blocking(move || extractor.extract(&owned))
            .await
            .map_err(|e| ExtractionError::Failed {
                file,
                message: format!("extraction task failed: {e}"),
            })??;

        info!(chars = text.len(), "Document text extracted");
        self.analyze_text(&text).await
    }

    /// Analyze already-extracted document text.
    #[instrument(skip_all, fields(chars = text.len()))]
    pub async fn analyze_text(&self, text: &str) -> Result<DocumentSummary> {
        let request = CompletionRequest::json(self.prompts.analysis_prompt(text));
        let raw = call_model(
            self.provider.as_ref(),
            self.metrics.as_ref(),
            OPERATION,
            &request,
        )
        .await?;
        Ok(parse_reply::<DocumentSummary>(&raw, self.metrics.as_ref())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geotech_core::{Error, ResponseFormat};
    use geotech_providers::MockProvider;
    use std::io::Write;
    use tempfile::Builder;

    const SUMMARY: &str = r#"{"doc_type": "Soil Report", "project_info": {"location": "8807 SE 55th Pl, Mercer Island, WA 98040", "client": null, "date": null}, "soil_profile": [{"depth_start": 0, "depth_end": 2.5, "soil_type": "Glacial till", "strength": null}], "groundwater_depth": null, "test_results": {"bearing_capacity": 150}, "confidence": "Medium - no groundwater data", "recommendations": null, "hazards": null, "slope_angle": null, "lake_proximity": null}"#;

    #[tokio::test]
    async fn test_analyze_text_parses_fenced_json() {
        let provider = Arc::new(MockProvider::new().with_reply(format!("```json\n{SUMMARY}\n```")));
        let agent = ExtractionAgent::new(provider.clone(), PromptBuilder::default());

        let summary = agent.analyze_text("Boring B-1").await.unwrap();
        assert_eq!(summary.doc_type, "Soil Report");
        assert_eq!(summary.test_results.get("bearing_capacity"), Some(&150.0));
        assert_eq!(summary.soil_profile.len(), 1);

        let request = &provider.requests()[0];
        assert_eq!(request.response_format, ResponseFormat::Json);
        assert!(request.prompt.ends_with("Document Content:\nBoring B-1"));
    }

    #[tokio::test]
    async fn test_analyze_file_reads_text_document() {
        let mut file = Builder::new().suffix(".txt").tempfile().unwrap();
        write!(file, "Allowable bearing capacity 150 kPa").unwrap();

        let provider = Arc::new(MockProvider::always(SUMMARY));
        let agent = ExtractionAgent::new(provider.clone(), PromptBuilder::default());

        agent.analyze_file(file.path()).await.unwrap();
        assert!(provider
            .last_prompt()
            .unwrap()
            .ends_with("Allowable bearing capacity 150 kPa"));
    }

    #[tokio::test]
    async fn test_extraction_failure_skips_model() {
        let file = Builder::new().suffix(".xlsx").tempfile().unwrap();
        let provider = Arc::new(MockProvider::always(SUMMARY));
        let agent = ExtractionAgent::new(provider.clone(), PromptBuilder::default());

        let err = agent.analyze_file(file.path()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Extraction(ExtractionError::Unsupported { .. })
        ));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_incomplete_reply_is_schema_error() {
        let provider = Arc::new(MockProvider::always(r#"{"doc_type": "Soil Report"}"#));
        let agent = ExtractionAgent::new(provider, PromptBuilder::default());

        let err = agent.analyze_text("x").await.unwrap_err();
        assert_eq!(err.kind(), "schema");
    }

    struct FixedText(&'static str);

    impl TextExtractor for FixedText {
        fn extract(&self, _path: &Path) -> std::result::Result<String, ExtractionError> {
            Ok(self.0.to_string())
        }
    }

    #[tokio::test]
    async fn test_custom_extractor() {
        let provider = Arc::new(MockProvider::always(SUMMARY));
        let agent = ExtractionAgent::new(provider.clone(), PromptBuilder::default())
            .with_extractor(Arc::new(FixedText("scanned text")));

        agent.analyze_file(Path::new("anything.bin")).await.unwrap();
        assert!(provider.last_prompt().unwrap().ends_with("scanned text"));
    }
}
