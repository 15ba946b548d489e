//! # Report Model
//!
//! The normalized, ordered document a report is rendered from. Two very
//! different inputs feed it: structured financial metrics computed by the
//! analysis service, and the free-form narrative the AI service writes about
//! them. The builder in [`builder`] folds both into a flat list of
//! [`Section`]s whose order is the reading order of the finished report.
//!
//! Everything here is plain data. Layout never reaches back into the raw
//! payloads, and the model never rounds or reformats a monetary value.

pub mod builder;
pub mod currency;

pub use builder::{build_model, ReportBuilder};
pub use currency::Currency;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// The industries the analysis service knows how to score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Industry {
    Agriculture,
    Manufacturing,
    Retail,
    Logistics,
    Ecommerce,
}

impl Industry {
    pub const ALL: [Industry; 5] = [
        Industry::Agriculture,
        Industry::Manufacturing,
        Industry::Retail,
        Industry::Logistics,
        Industry::Ecommerce,
    ];

    /// Display name, as printed in the report header and export filename.
    pub fn name(&self) -> &'static str {
        match self {
            Industry::Agriculture => "Agriculture",
            Industry::Manufacturing => "Manufacturing",
            Industry::Retail => "Retail",
            Industry::Logistics => "Logistics",
            Industry::Ecommerce => "Ecommerce",
        }
    }

    /// URL path segment used by the analysis service.
    pub fn path_segment(&self) -> &'static str {
        match self {
            Industry::Agriculture => "agriculture",
            Industry::Manufacturing => "manufacturing",
            Industry::Retail => "retail",
            Industry::Logistics => "logistics",
            Industry::Ecommerce => "ecommerce",
        }
    }
}

impl fmt::Display for Industry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Industry {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Industry::ALL
            .into_iter()
            .find(|i| i.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown industry '{wanted}'"))
    }
}

impl TryFrom<String> for Industry {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Industry> for String {
    fn from(value: Industry) -> Self {
        value.name().to_string()
    }
}

/// Credit risk band. Unknown bands are carried through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CreditRisk {
    Low,
    Medium,
    High,
    Other(String),
}

impl From<String> for CreditRisk {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Low" => CreditRisk::Low,
            "Medium" => CreditRisk::Medium,
            "High" => CreditRisk::High,
            _ => CreditRisk::Other(value),
        }
    }
}

impl From<CreditRisk> for String {
    fn from(value: CreditRisk) -> Self {
        value.to_string()
    }
}

impl fmt::Display for CreditRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CreditRisk::Low => f.write_str("Low"),
            CreditRisk::Medium => f.write_str("Medium"),
            CreditRisk::High => f.write_str("High"),
            CreditRisk::Other(s) => f.write_str(s),
        }
    }
}

/// The structured half of a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialMetrics {
    pub total_revenue: Decimal,
    pub total_expenses: Decimal,
    pub profit: Decimal,
    /// Percentage, e.g. `22.5` for 22.5 %.
    pub profit_margin: Decimal,
    pub health_score: Decimal,
    pub credit_risk: CreditRisk,
}

/// The narrative half of a report, as written by the AI service.
///
/// Every field may be missing on the wire; missing means empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiInsights {
    #[serde(rename = "Good", default, deserialize_with = "null_as_default")]
    pub good: Vec<String>,
    #[serde(rename = "Risks", default, deserialize_with = "null_as_default")]
    pub risks: Vec<String>,
    #[serde(rename = "Improvement", default, deserialize_with = "null_as_default")]
    pub improvement: Vec<Improvement>,
    #[serde(rename = "Guidance", default, deserialize_with = "null_as_default")]
    pub guidance: String,
    /// Category name to recommendations, in wire order.
    #[serde(
        rename = "ProductRecommendations",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub product_recommendations: Option<IndexMap<String, Vec<ProductRecommendation>>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Improvement {
    #[serde(default, deserialize_with = "null_as_default")]
    pub action: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub benefit: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub timeline: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductRecommendation {
    #[serde(default, deserialize_with = "null_as_default")]
    pub product: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reason: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Identity of one report: which analysis it renders and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportMeta {
    pub industry: Industry,
    pub report_id: String,
    pub generated_at: DateTime<Utc>,
}

/// One row of the metrics table. Both cells are display strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductGroup {
    pub category: String,
    pub items: Vec<ProductRecommendation>,
}

/// One logical block of the report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Section {
    Header {
        title: String,
        subtitle_lines: Vec<String>,
    },
    MetricsTable {
        rows: Vec<MetricRow>,
    },
    BulletList {
        title: String,
        items: Vec<String>,
    },
    ActionList {
        title: String,
        items: Vec<Improvement>,
    },
    NarrativeBlock {
        title: String,
        text: String,
    },
    GroupedList {
        title: String,
        groups: Vec<ProductGroup>,
    },
}

impl Section {
    /// Short kind name, used in logs and by the screen sink.
    pub fn kind(&self) -> &'static str {
        match self {
            Section::Header { .. } => "header",
            Section::MetricsTable { .. } => "metrics-table",
            Section::BulletList { .. } => "bullet-list",
            Section::ActionList { .. } => "action-list",
            Section::NarrativeBlock { .. } => "narrative",
            Section::GroupedList { .. } => "grouped-list",
        }
    }

    /// Section heading, if the section has one.
    pub fn title(&self) -> Option<&str> {
        match self {
            Section::Header { title, .. }
            | Section::BulletList { title, .. }
            | Section::ActionList { title, .. }
            | Section::NarrativeBlock { title, .. }
            | Section::GroupedList { title, .. } => Some(title),
            Section::MetricsTable { .. } => None,
        }
    }
}

/// A complete report, ready for layout or screen rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportModel {
    pub meta: ReportMeta,
    pub sections: Vec<Section>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_industry_parse_is_case_insensitive() {
        assert_eq!("agriculture".parse::<Industry>(), Ok(Industry::Agriculture));
        assert_eq!(" ECOMMERCE ".parse::<Industry>(), Ok(Industry::Ecommerce));
        assert!("fishing".parse::<Industry>().is_err());
        assert_eq!(Industry::Logistics.path_segment(), "logistics");
    }

    #[test]
    fn test_credit_risk_keeps_unknown_bands() {
        let risk: CreditRisk = serde_json::from_str("\"Very High\"").unwrap();
        assert_eq!(risk, CreditRisk::Other("Very High".to_string()));
        let low: CreditRisk = serde_json::from_str("\"Low\"").unwrap();
        assert_eq!(low, CreditRisk::Low);
        assert_eq!(serde_json::to_string(&low).unwrap(), "\"Low\"");
    }

    #[test]
    fn test_insights_missing_fields_default_to_empty() {
        let ai: AiInsights = serde_json::from_str(r#"{"Good": ["Steady sales"]}"#).unwrap();
        assert_eq!(ai.good, vec!["Steady sales".to_string()]);
        assert!(ai.risks.is_empty());
        assert!(ai.improvement.is_empty());
        assert_eq!(ai.guidance, "");
        assert!(ai.product_recommendations.is_none());
    }

    #[test]
    fn test_insights_null_fields_default_to_empty() {
        let ai: AiInsights = serde_json::from_str(
            r#"{"Good": null, "Guidance": null, "ProductRecommendations": null}"#,
        )
        .unwrap();
        assert!(ai.good.is_empty());
        assert_eq!(ai.guidance, "");
        assert!(ai.product_recommendations.is_none());
    }

    #[test]
    fn test_recommendation_categories_keep_wire_order() {
        let ai: AiInsights = serde_json::from_str(
            r#"{"ProductRecommendations": {
                "System": [{"product": "Working Capital Loan", "reason": "Smooths cash"}],
                "Additional": [{"product": "Crop Insurance"}]
            }}"#,
        )
        .unwrap();
        let recs = ai.product_recommendations.unwrap();
        let categories: Vec<&str> = recs.keys().map(String::as_str).collect();
        assert_eq!(categories, vec!["System", "Additional"]);
        assert_eq!(recs["Additional"][0].reason, "");
    }

    #[test]
    fn test_section_title() {
        let table = Section::MetricsTable { rows: vec![] };
        assert_eq!(table.title(), None);
        assert_eq!(table.kind(), "metrics-table");
        let risks = Section::BulletList {
            title: "Risks".to_string(),
            items: vec![],
        };
        assert_eq!(risks.title(), Some("Risks"));
    }
}
