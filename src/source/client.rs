//! HTTP client for the analysis service.
//!
//! Two endpoints feed a report:
//!
//! | Method | Path | Payload |
//! |--------|------|---------|
//! | GET | `/{industry}/analyses/{id}` | metrics |
//! | GET | `/{industry}/analyses/{id}/ai` | `{"ai_explanation": ...}` |
//!
//! Both are fetched concurrently and joined into a [`ReportState`].

use super::payload::{parse_analysis, parse_insights};
use super::view::{ReportState, Session};
use super::SourceError;
use crate::config::ReportConfig;
use crate::model::{AiInsights, FinancialMetrics, Industry, ReportBuilder, ReportMeta};
use serde_json::Value;
use std::time::Duration;
use url::Url;

#[derive(Debug)]
pub struct ReportClient {
    http: reqwest::Client,
    base_url: Url,
    builder: ReportBuilder,
}

impl ReportClient {
    /// Build a client that authenticates every request with the session's
    /// bearer token.
    pub fn new(config: &ReportConfig, session: &Session) -> Result<Self, SourceError> {
        let token = session
            .token()
            .ok_or_else(|| SourceError::Config("session has no bearer token".into()))?;

        let base_url = Url::parse(&config.base_url)
            .map_err(|e| SourceError::Config(format!("invalid base URL '{}': {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(SourceError::Config(format!(
                "base URL '{}' cannot carry a path",
                config.base_url
            )));
        }

        let mut auth = reqwest::header::HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| SourceError::Config("invalid bearer token characters".into()))?;
        auth.set_sensitive(true);
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(reqwest::header::AUTHORIZATION, auth);
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| SourceError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url,
            builder: ReportBuilder::new().currency(config.currency()),
        })
    }

    /// `{base}/{industry}/analyses/{id}[/{suffix}]`, with each segment escaped.
    fn endpoint(&self, industry: Industry, report_id: &str, suffix: Option<&str>) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend([industry.path_segment(), "analyses", report_id]);
            if let Some(suffix) = suffix {
                segments.push(suffix);
            }
        }
        url
    }

    async fn get_json(&self, url: Url) -> Result<Value, SourceError> {
        let endpoint = url.path().to_string();
        log::info!("GET {}", endpoint);

        let resp = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|source| SourceError::Http {
                endpoint: endpoint.clone(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SourceError::Api {
                endpoint,
                status: status.as_u16(),
                body,
            });
        }

        resp.json::<Value>()
            .await
            .map_err(|e| SourceError::Schema {
                endpoint,
                reason: e.to_string(),
            })
    }

    pub async fn fetch_analysis(
        &self,
        industry: Industry,
        report_id: &str,
    ) -> Result<FinancialMetrics, SourceError> {
        let url = self.endpoint(industry, report_id, None);
        let endpoint = url.path().to_string();
        let body = self.get_json(url).await?;
        parse_analysis(&body).map_err(|e| SourceError::Schema {
            endpoint,
            reason: e.to_string(),
        })
    }

    pub async fn fetch_insights(
        &self,
        industry: Industry,
        report_id: &str,
    ) -> Result<AiInsights, SourceError> {
        let url = self.endpoint(industry, report_id, Some("ai"));
        let endpoint = url.path().to_string();
        let body = self.get_json(url).await?;
        parse_insights(&body).map_err(|e| SourceError::Schema {
            endpoint,
            reason: e.to_string(),
        })
    }

    /// Fetch both payloads concurrently and join them.
    ///
    /// The model is only built once both have resolved; if either fails the
    /// state is `Failed`.
    pub async fn fetch_report(&self, industry: Industry, report_id: &str) -> ReportState {
        let (analysis, insights) = tokio::join!(
            self.fetch_analysis(industry, report_id),
            self.fetch_insights(industry, report_id),
        );
        let meta = ReportMeta {
            industry,
            report_id: report_id.to_string(),
            generated_at: chrono::Utc::now(),
        };
        ReportState::join(meta, analysis, insights, &self.builder)
    }
}
