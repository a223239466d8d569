//! # Geotech SDK
//!
//! Async Rust client for the geotechnical assistant HTTP API.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use geotech_sdk::{Client, ParameterSet, ReportInput};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), geotech_sdk::Error> {
//!     let client = Client::builder()
//!         .base_url("http://localhost:8000")
//!         .build()?;
//!
//!     let summary = client.analyze_document("boring_log.pdf").await?;
//!     println!("{} at {}", summary.doc_type, summary.project_info.location);
//!
//!     let input = ReportInput::new(
//!         "Site Investigation",
//!         "Residential lot, West Kelowna",
//!         "cohesion: 25 kPa, bearing_capacity: 180 kPa",
//!     )
//!     .with_doc_summaries(vec![summary]);
//!     let report = client.generate_report(&input).await?;
//!     println!("{}", report.report.executive_summary);
//!
//!     let check = client
//!         .validate_parameters(&ParameterSet::new().with("cohesion", 60.0))
//!         .await?;
//!     println!("{}", check.message);
//!     Ok(())
//! }
//! ```
//!
//! ## Errors
//!
//! Server error bodies (`{"error": {"type", "message"}}`) become
//! [`Error::Api`], [`Error::InvalidRequest`] or [`Error::RateLimited`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod client;
mod config;
mod error;
mod request;
mod response;

pub use client::{Client, ClientBuilder, PARAMETER_CHECK_HEADER};
pub use config::ClientConfig;
pub use error::{ApiErrorDetail, ApiErrorResponse, Error, Result};
pub use request::{ChatRequest, ParameterSet};
pub use response::{ChatResponse, HealthResponse, ReportResponse, ValidationResponse};

// Re-export the payload types for convenience
pub use geotech_agents::{ReportInput, Role, Timestamp, TranscriptEntry};
pub use geotech_core::{DocumentSummary, HazardInfo, ProjectInfo, Report, SoilLayer};
