//! The report view: owns one report's state from first fetch to export.

use super::client::ReportClient;
use super::SourceError;
use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::layout::{Geometry, LayoutEngine};
use crate::model::{
    AiInsights, Currency, FinancialMetrics, Industry, ReportBuilder, ReportMeta, ReportModel,
};
use crate::pdf::{self, ExportMeta, ExportedDocument};
use crate::screen::{ScreenNode, ScreenSink};
use std::fmt;

/// Who is asking. Passed explicitly to everything that talks to the
/// analysis service.
#[derive(Clone, Default)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    pub fn anonymous() -> Self {
        Self { token: None }
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.as_deref().is_some_and(|t| !t.is_empty())
    }

    pub(crate) fn token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.is_empty())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Lifecycle of one report.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportState {
    /// Fetches still in flight.
    Loading,
    Ready(ReportModel),
    /// At least one fetch failed; nothing can be rendered.
    Failed { reason: String },
}

impl ReportState {
    /// Combine both fetch outcomes. The model is built only when both
    /// succeeded.
    pub fn join(
        meta: ReportMeta,
        analysis: Result<FinancialMetrics, SourceError>,
        insights: Result<AiInsights, SourceError>,
        builder: &ReportBuilder,
    ) -> Self {
        match (analysis, insights) {
            (Ok(metrics), Ok(ai)) => {
                log::info!("report {} ready", meta.report_id);
                ReportState::Ready(builder.build(&metrics, &ai, meta))
            }
            (analysis, insights) => {
                let reason = [analysis.err(), insights.err()]
                    .into_iter()
                    .flatten()
                    .map(|e| e.to_string())
                    .collect::<Vec<_>>()
                    .join("; ");
                log::warn!("report {} failed: {}", meta.report_id, reason);
                ReportState::Failed { reason }
            }
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, ReportState::Ready(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ViewError {
    /// No signed-in user; the caller should send them to the login screen.
    #[error("not authenticated: sign in to view reports")]
    Unauthenticated,
    #[error(transparent)]
    Source(#[from] SourceError),
}

/// One open report.
#[derive(Debug, Clone)]
pub struct ReportView {
    state: ReportState,
    currency: Currency,
    geometry: Geometry,
}

impl ReportView {
    /// Open a report for a signed-in user, fetching both payloads.
    ///
    /// An anonymous session is turned away before any request is made.
    pub async fn open(
        config: &ReportConfig,
        session: &Session,
        industry: Industry,
        report_id: &str,
    ) -> Result<Self, ViewError> {
        if !session.is_authenticated() {
            log::info!("report {} requested without a session", report_id);
            return Err(ViewError::Unauthenticated);
        }
        let client = ReportClient::new(config, session)?;
        let state = client.fetch_report(industry, report_id).await;
        Ok(Self::from_state(state, config))
    }

    pub fn from_state(state: ReportState, config: &ReportConfig) -> Self {
        Self {
            state,
            currency: config.currency(),
            geometry: config.geometry(),
        }
    }

    pub fn state(&self) -> &ReportState {
        &self.state
    }

    pub fn model(&self) -> Option<&ReportModel> {
        match &self.state {
            ReportState::Ready(model) => Some(model),
            _ => None,
        }
    }

    pub fn screen(&self) -> Option<ScreenNode> {
        self.model().map(ScreenSink::render)
    }

    /// Export the report as PDF. Does nothing until the report is ready.
    pub fn export(&self) -> Result<Option<ExportedDocument>, ReportError> {
        let Some(model) = self.model() else {
            log::debug!("export requested before report was ready; ignoring");
            return Ok(None);
        };
        let ops = LayoutEngine::new().layout(model, &self.geometry);
        let meta = ExportMeta {
            report_id: model.meta.report_id.clone(),
            title: crate::model::builder::REPORT_TITLE.to_string(),
            industry: model.meta.industry,
            currency: self.currency.clone(),
        };
        pdf::export(&ops, &meta, &self.geometry).map(Some)
    }
}
