//! Structured error types for the report engine.
//!
//! Composition and layout never fail. Errors come from the edges: decoding
//! the collaborator payloads, talking to the analysis service, and writing
//! the finished document.

use thiserror::Error;

/// The unified error type returned by the public report API.
#[derive(Debug, Error)]
pub enum ReportError {
    /// JSON input failed to parse.
    #[error("Failed to parse input: {source}{}", hint_suffix(.hint))]
    Parse {
        source: serde_json::Error,
        hint: String,
    },
    /// The JSON parsed, but a payload is structurally unusable.
    #[error("Invalid payload: {0}")]
    Schema(String),
    /// A collaborator fetch failed.
    #[error(transparent)]
    Source(#[from] crate::source::SourceError),
    /// Layout output could not be serialized.
    #[error("Render error: {0}")]
    Render(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn hint_suffix(hint: &str) -> String {
    if hint.is_empty() {
        String::new()
    } else {
        format!("\n  Hint: {}", hint)
    }
}

impl From<serde_json::Error> for ReportError {
    fn from(e: serde_json::Error) -> Self {
        let hint = match e.classify() {
            serde_json::error::Category::Syntax => {
                "Check for trailing commas, missing quotes, or unescaped characters.".to_string()
            }
            serde_json::error::Category::Data => {
                "The JSON is valid but doesn't match the report input schema. Check field names and types.".to_string()
            }
            serde_json::error::Category::Eof => {
                "Unexpected end of input. Is the JSON truncated?".to_string()
            }
            serde_json::error::Category::Io => String::new(),
        };
        ReportError::Parse { source: e, hint }
    }
}
