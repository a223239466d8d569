//! # Geotech Agents
//!
//! The application logic of the geotechnical assistant.
//!
//! This crate provides:
//! - [`PromptBuilder`]: the three prompt families (chat, analysis, report)
//! - [`ChatAgent`], [`ExtractionAgent`], [`ReportAgent`]: one model call each
//! - [`validate_parameters`]: advisory range checks
//! - [`TranscriptStore`]: chat history persistence
//!
//! Agents are stateless service objects holding `Arc`s to their
//! collaborators, so cloning them is cheap and they can be shared across
//! request handlers.
//!
//! ## Example
//!
//! ```ignore
//! use geotech_agents::{Agents, PromptBuilder};
//!
//! let agents = Agents::new(provider, PromptBuilder::default());
//! let answer = agents.chat.respond("Bearing capacity of glacial till?", "").await?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod chat;
pub mod document;
pub mod extraction;
pub mod prompts;
pub mod report;
mod structured;
pub mod transcript;
pub mod validation;

pub use chat::ChatAgent;
pub use document::{DocumentKind, FileTextExtractor, TextExtractor};
pub use extraction::ExtractionAgent;
pub use prompts::{PromptBuilder, DEFAULT_REGION};
pub use report::{ReportAgent, ReportInput};
pub use transcript::{
    render_history, JsonFileTranscriptStore, MemoryTranscriptStore, Role, Timestamp,
    TranscriptEntry, TranscriptError, TranscriptStore,
};
pub use validation::{scan_parameters, validate_parameters, ParameterCheck, PARAMETER_RANGES};

use geotech_core::CompletionProvider;
use geotech_telemetry::Metrics;
use std::sync::Arc;

/// The three agents sharing one provider and prompt builder.
#[derive(Debug, Clone)]
pub struct Agents {
    /// Expert chat
    pub chat: ChatAgent,
    /// Document analysis
    pub extraction: ExtractionAgent,
    /// Report generation
    pub report: ReportAgent,
}

impl Agents {
    /// Build all agents over `provider`.
    pub fn new(provider: Arc<dyn CompletionProvider>, prompts: PromptBuilder) -> Self {
        Self {
            chat: ChatAgent::new(Arc::clone(&provider), prompts.clone()),
            extraction: ExtractionAgent::new(Arc::clone(&provider), prompts.clone()),
            report: ReportAgent::new(provider, prompts),
        }
    }

    /// Record metrics from every agent.
    #[must_use]
    pub fn with_metrics(self, metrics: Metrics) -> Self {
        Self {
            chat: self.chat.with_metrics(metrics.clone()),
            extraction: self.extraction.with_metrics(metrics.clone()),
            report: self.report.with_metrics(metrics),
        }
    }

    /// Replace the document text extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn TextExtractor>) -> Self {
        self.extraction = self.extraction.with_extractor(extractor);
        self
    }
}
