//! # Collaborator Boundary
//!
//! Everything that touches the analysis service: payload validation, the
//! HTTP client, and the view that joins both fetches into a renderable
//! report. The engine proper (model, layout, sinks) never performs I/O.

pub mod client;
pub mod payload;
pub mod view;

pub use client::ReportClient;
pub use payload::{parse_analysis, parse_insights};
pub use view::{ReportState, ReportView, Session, ViewError};

/// Errors from analysis service calls.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// HTTP transport error.
    #[error("HTTP error calling {endpoint}: {source}")]
    Http {
        endpoint: String,
        source: reqwest::Error,
    },
    /// The service returned a non-2xx status.
    #[error("{endpoint} returned {status}: {body}")]
    Api {
        endpoint: String,
        status: u16,
        body: String,
    },
    /// The response arrived but is not a usable payload.
    #[error("invalid payload from {endpoint}: {reason}")]
    Schema { endpoint: String, reason: String },
    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<crate::config::ConfigError> for SourceError {
    fn from(e: crate::config::ConfigError) -> Self {
        SourceError::Config(e.to_string())
    }
}
