//! # reportform
//!
//! Composition and pagination for SME financial-health reports.
//!
//! A report is assembled from two very different inputs: the structured
//! metrics an analysis service computed from the business's books, and the
//! free-form narrative an AI service wrote about them. This crate folds both
//! into one ordered document, lays it out onto fixed-size pages, and hands
//! the result to a sink: a PDF file for export, or a node tree for screen.
//!
//! The page is the unit of layout. Every unit of content is measured and
//! placed against the real page boundary, so a heading never ends a page
//! alone and a table header is never stranded without its first row.
//!
//! ## Architecture
//!
//! ```text
//! analysis JSON + AI JSON
//!       ↓
//!   [source]   — validate payloads, fetch concurrently, join
//!       ↓
//!   [model]    — ordered sections: header, metrics table, lists, narrative
//!       ↓
//!   [layout]   — page-aware layout (text wrap, table, page breaks)
//!       ↓
//!   [pdf] / [screen]
//! ```

pub mod config;
pub mod error;
pub mod font;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod screen;
pub mod source;
pub mod text;

use chrono::{DateTime, Utc};
use config::ReportConfig;
use error::ReportError;
use layout::LayoutEngine;
use model::{Industry, ReportBuilder, ReportMeta, ReportModel};
use pdf::{ExportMeta, ExportedDocument};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Everything needed to render a report offline: the two collaborator
/// payloads exactly as the service returned them, plus their identity.
#[derive(Debug, Clone, Deserialize)]
pub struct RenderInput {
    pub industry: Industry,
    #[serde(deserialize_with = "string_or_number")]
    pub report_id: String,
    /// Defaults to the time of rendering.
    #[serde(default)]
    pub generated_at: Option<DateTime<Utc>>,
    /// Body of `GET /{industry}/analyses/{id}`.
    pub analysis: Value,
    /// Body of `GET /{industry}/analyses/{id}/ai`.
    pub ai: Value,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "report_id must be a string or number, got {other}"
        ))),
    }
}

/// Validate both payloads and build the report model.
pub fn compose(input: &RenderInput, config: &ReportConfig) -> Result<ReportModel, ReportError> {
    let metrics = source::parse_analysis(&input.analysis)?;
    let ai = source::parse_insights(&input.ai)?;
    let meta = ReportMeta {
        industry: input.industry,
        report_id: input.report_id.clone(),
        generated_at: input.generated_at.unwrap_or_else(Utc::now),
    };
    Ok(ReportBuilder::new()
        .currency(config.currency())
        .build(&metrics, &ai, meta))
}

/// Lay out a report model and export it as PDF.
pub fn render(model: &ReportModel, config: &ReportConfig) -> Result<ExportedDocument, ReportError> {
    let geometry = config.geometry();
    let ops = LayoutEngine::new().layout(model, &geometry);
    let meta = ExportMeta {
        report_id: model.meta.report_id.clone(),
        title: model::builder::REPORT_TITLE.to_string(),
        industry: model.meta.industry,
        currency: config.currency(),
    };
    pdf::export(&ops, &meta, &geometry)
}

/// Render a [`RenderInput`] described as JSON to a PDF.
pub fn render_json(json: &str, config: &ReportConfig) -> Result<ExportedDocument, ReportError> {
    let input: RenderInput = serde_json::from_str(json)?;
    let model = compose(&input, config)?;
    render(&model, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_input_accepts_numeric_id() {
        let input: RenderInput = serde_json::from_str(
            r#"{"industry": "retail", "report_id": 12, "analysis": {}, "ai": {}}"#,
        )
        .unwrap();
        assert_eq!(input.report_id, "12");
        assert_eq!(input.industry, Industry::Retail);
        assert!(input.generated_at.is_none());
    }

    #[test]
    fn test_render_json_rejects_bad_payload() {
        let err = render_json(
            r#"{"industry": "Retail", "report_id": "1", "analysis": {}, "ai": {}}"#,
            &ReportConfig::default(),
        )
        .unwrap_err();
        assert!(matches!(err, ReportError::Schema(_)));
    }
}
