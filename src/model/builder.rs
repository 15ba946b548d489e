//! Folds fetched metrics and AI insights into a [`ReportModel`].
//!
//! Building never fails. Missing narrative fields become empty lists or
//! empty text; a missing (or empty) recommendations map drops the whole
//! product section rather than rendering an empty heading.

use super::{
    AiInsights, Currency, FinancialMetrics, MetricRow, ProductGroup, ReportMeta, ReportModel,
    Section,
};

pub const REPORT_TITLE: &str = "SME Financial Health Report";
pub const GOOD_TITLE: &str = "What is going well";
pub const RISKS_TITLE: &str = "Risks";
pub const IMPROVEMENTS_TITLE: &str = "Improvements";
pub const GUIDANCE_TITLE: &str = "Guidance";
pub const PRODUCTS_TITLE: &str = "Product Recommendations";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S UTC";

/// Build a report model with the default currency.
pub fn build_model(metrics: &FinancialMetrics, ai: &AiInsights, meta: ReportMeta) -> ReportModel {
    ReportBuilder::new().build(metrics, ai, meta)
}

/// Report builder with presentation options.
#[derive(Debug, Clone, Default)]
pub struct ReportBuilder {
    currency: Currency,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn currency(mut self, currency: Currency) -> Self {
        self.currency = currency;
        self
    }

    pub fn build(&self, metrics: &FinancialMetrics, ai: &AiInsights, meta: ReportMeta) -> ReportModel {
        let mut sections = vec![
            self.header(&meta),
            Section::MetricsTable {
                rows: self.metric_rows(metrics),
            },
            Section::BulletList {
                title: GOOD_TITLE.to_string(),
                items: ai.good.clone(),
            },
            Section::BulletList {
                title: RISKS_TITLE.to_string(),
                items: ai.risks.clone(),
            },
            Section::ActionList {
                title: IMPROVEMENTS_TITLE.to_string(),
                items: ai.improvement.clone(),
            },
            Section::NarrativeBlock {
                title: GUIDANCE_TITLE.to_string(),
                text: ai.guidance.clone(),
            },
        ];

        match &ai.product_recommendations {
            Some(recs) if !recs.is_empty() => {
                let groups = recs
                    .iter()
                    .map(|(category, items)| ProductGroup {
                        category: category.clone(),
                        items: items.clone(),
                    })
                    .collect();
                sections.push(Section::GroupedList {
                    title: PRODUCTS_TITLE.to_string(),
                    groups,
                });
            }
            _ => log::debug!(
                "report {}: no product recommendations, section omitted",
                meta.report_id
            ),
        }

        log::debug!(
            "built report {} ({}) with {} sections",
            meta.report_id,
            meta.industry,
            sections.len()
        );

        ReportModel { meta, sections }
    }

    fn header(&self, meta: &ReportMeta) -> Section {
        Section::Header {
            title: REPORT_TITLE.to_string(),
            subtitle_lines: vec![
                format!("Industry: {}", meta.industry),
                format!("Report ID: {}", meta.report_id),
                format!("Generated On: {}", meta.generated_at.format(TIMESTAMP_FORMAT)),
            ],
        }
    }

    fn metric_rows(&self, metrics: &FinancialMetrics) -> Vec<MetricRow> {
        let row = |label: &str, value: String| MetricRow {
            label: label.to_string(),
            value,
        };
        vec![
            row("Total Revenue", self.currency.format(&metrics.total_revenue)),
            row("Total Expenses", self.currency.format(&metrics.total_expenses)),
            row("Profit", self.currency.format(&metrics.profit)),
            row("Profit Margin", format!("{}%", metrics.profit_margin)),
            row("Health Score", metrics.health_score.to_string()),
            row("Credit Risk", metrics.credit_risk.to_string()),
        ]
    }
}
