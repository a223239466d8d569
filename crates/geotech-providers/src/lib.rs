//! # Geotech Providers
//!
//! Text-completion backends for the geotechnical assistant.
//!
//! - Google Gemini via Google AI Studio or Vertex AI
//! - A scripted mock provider (feature `mock`) for tests and offline runs

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod google;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

pub use geotech_core::CompletionProvider;
pub use google::{GoogleApiType, GoogleConfig, GoogleProvider, DEFAULT_MODEL};

#[cfg(any(test, feature = "mock"))]
pub use mock::MockProvider;
