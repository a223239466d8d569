//! # Geotech Core
//!
//! Core types, traits, and error handling for the geotechnical assistant.
//!
//! This crate provides the foundational types used throughout the workspace:
//! - The structured schema exchanged with the model ([`DocumentSummary`], [`Report`])
//! - The completion request and provider trait used by every agent
//! - The error taxonomy (input, gateway, schema, extraction)
//! - Cleaning of Markdown code fences from model output

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod clean;
pub mod error;
pub mod lenient;
pub mod provider;
pub mod request;
pub mod schema;

// Re-export commonly used types
pub use clean::{clean, extract_object_span};
pub use error::{Error, ExtractionError, GatewayError, Result, SchemaError};
pub use provider::CompletionProvider;
pub use request::{CompletionRequest, ResponseFormat};
pub use schema::{
    DocumentSummary, HazardInfo, ProjectInfo, Report, SoilLayer, StructuredOutput,
};
