//! # Geotech Server
//!
//! HTTP API for the geotechnical assistant.
//!
//! This crate provides:
//! - Axum routes for chat, document analysis, report generation and
//!   parameter checks
//! - Upload scoping with automatic cleanup
//! - JSON error responses
//! - Graceful shutdown handling

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bootstrap;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod shutdown;
pub mod state;
pub mod upload;

// Re-export main types
pub use bootstrap::tracing_config;
pub use error::ApiError;
pub use handlers::{
    ChatRequest, ChatResponse, HealthResponse, ValidationResponse, PARAMETER_CHECK_HEADER,
    UPLOAD_FIELD,
};
pub use routes::create_router;
pub use server::{Server, ServerConfig};
pub use shutdown::shutdown_signal;
pub use state::{build_provider, AppState, AppStateBuilder, StateError};
pub use upload::UploadDir;
