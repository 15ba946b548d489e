//! Decoding and validation of the two collaborator payloads.
//!
//! The analysis endpoint nests its figures (`financials`, `health`) while
//! older records carry them flat at the top level; both shapes are accepted.
//! Anything the engine cannot render from is rejected here, so nothing past
//! this module ever has to second-guess its input.

use crate::error::ReportError;
use crate::model::{AiInsights, CreditRisk, FinancialMetrics};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;

/// Extract [`FinancialMetrics`] from an analysis response body.
pub fn parse_analysis(value: &Value) -> Result<FinancialMetrics, ReportError> {
    let root = value
        .as_object()
        .ok_or_else(|| ReportError::Schema("analysis payload is not a JSON object".into()))?;
    let financials = nested_or_root(root, "financials")?;
    let health = nested_or_root(root, "health")?;

    Ok(FinancialMetrics {
        total_revenue: decimal_field(financials, "total_revenue")?,
        total_expenses: decimal_field(financials, "total_expenses")?,
        profit: decimal_field(financials, "profit")?,
        profit_margin: decimal_field(financials, "profit_margin")?,
        health_score: decimal_field(health, "health_score")?,
        credit_risk: CreditRisk::from(string_field(health, "credit_risk")?),
    })
}

/// Extract [`AiInsights`] from an AI response body.
///
/// Accepts the `{"ai_explanation": ...}` envelope or bare insights. The
/// explanation may itself arrive as a JSON-encoded string. A `null`
/// explanation means the insights were never generated.
pub fn parse_insights(value: &Value) -> Result<AiInsights, ReportError> {
    let inner = match value.as_object() {
        Some(obj) if obj.contains_key("ai_explanation") => &obj["ai_explanation"],
        Some(_) => value,
        None => {
            return Err(ReportError::Schema(
                "AI payload is not a JSON object".into(),
            ))
        }
    };

    match inner {
        Value::Null => Err(ReportError::Schema(
            "no AI explanation is available for this analysis".into(),
        )),
        Value::String(encoded) => {
            let decoded: Value = serde_json::from_str(encoded)?;
            parse_insights(&decoded)
        }
        Value::Object(_) => Ok(serde_json::from_value(inner.clone())?),
        other => Err(ReportError::Schema(format!(
            "AI explanation must be an object, got {}",
            json_kind(other)
        ))),
    }
}

fn nested_or_root<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<&'a Map<String, Value>, ReportError> {
    match root.get(key) {
        None | Some(Value::Null) => Ok(root),
        Some(Value::Object(obj)) => Ok(obj),
        Some(other) => Err(ReportError::Schema(format!(
            "'{}' must be an object, got {}",
            key,
            json_kind(other)
        ))),
    }
}

/// Numbers keep the digits the service sent; integral floats such as
/// `100000.0` print as `100000`.
fn decimal_field(obj: &Map<String, Value>, key: &str) -> Result<Decimal, ReportError> {
    let invalid = |v: &Value| ReportError::Schema(format!("'{}' is not a number: {}", key, v));
    match obj.get(key) {
        None | Some(Value::Null) => Err(ReportError::Schema(format!("missing field '{}'", key))),
        Some(Value::Number(n)) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .map(|d| d.normalize())
                .map_err(|_| invalid(&obj[key]))
        }
        Some(v @ Value::String(s)) => Decimal::from_str(s.trim()).map_err(|_| invalid(v)),
        Some(other) => Err(invalid(other)),
    }
}

fn string_field(obj: &Map<String, Value>, key: &str) -> Result<String, ReportError> {
    match obj.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        None | Some(Value::Null) => Err(ReportError::Schema(format!("missing field '{}'", key))),
        Some(other) => Err(ReportError::Schema(format!(
            "'{}' must be a string, got {}",
            key,
            json_kind(other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_analysis() {
        let body = json!({
            "id": 42,
            "industry": "Agriculture",
            "financials": {
                "total_revenue": 100000.0,
                "total_expenses": 80000,
                "profit": 20000,
                "effective_profit": 19000,
                "profit_margin": 20.0
            },
            "health": {"health_score": 72, "health_status": "Good", "credit_risk": "Low"}
        });
        let m = parse_analysis(&body).unwrap();
        assert_eq!(m.total_revenue.to_string(), "100000");
        assert_eq!(m.profit_margin.to_string(), "20");
        assert_eq!(m.health_score, Decimal::from(72));
        assert_eq!(m.credit_risk, CreditRisk::Low);
    }

    #[test]
    fn test_flat_analysis_keeps_fraction_digits() {
        let body = json!({
            "total_revenue": "1250000.50",
            "total_expenses": 1000000,
            "profit": 250000.5,
            "profit_margin": 22.456,
            "health_score": 61.5,
            "credit_risk": "Medium"
        });
        let m = parse_analysis(&body).unwrap();
        assert_eq!(m.total_revenue.to_string(), "1250000.50");
        assert_eq!(m.profit.to_string(), "250000.5");
        assert_eq!(m.profit_margin.to_string(), "22.456");
    }

    #[test]
    fn test_missing_health_is_rejected() {
        let body = json!({"financials": {
            "total_revenue": 1, "total_expenses": 1, "profit": 0, "profit_margin": 0
        }});
        let err = parse_analysis(&body).unwrap_err();
        assert!(err.to_string().contains("health_score"), "{err}");
    }

    #[test]
    fn test_non_object_sections_rejected() {
        assert!(parse_analysis(&json!([1, 2])).is_err());
        let err = parse_analysis(&json!({"health": "good"})).unwrap_err();
        assert!(matches!(err, ReportError::Schema(_)));
    }

    #[test]
    fn test_insights_envelope() {
        let body = json!({"id": 42, "ai_explanation": {
            "Good": ["Healthy margins"],
            "Guidance": "Keep a cash buffer"
        }});
        let ai = parse_insights(&body).unwrap();
        assert_eq!(ai.good, vec!["Healthy margins".to_string()]);
        assert_eq!(ai.guidance, "Keep a cash buffer");
    }

    #[test]
    fn test_insights_null_explanation_is_an_error() {
        let err = parse_insights(&json!({"id": 42, "ai_explanation": null})).unwrap_err();
        assert!(matches!(err, ReportError::Schema(_)));
    }

    #[test]
    fn test_insights_string_encoded() {
        let body = json!({"ai_explanation": "{\"Risks\": [\"Thin cash reserves\"]}"});
        let ai = parse_insights(&body).unwrap();
        assert_eq!(ai.risks, vec!["Thin cash reserves".to_string()]);
    }

    #[test]
    fn test_bare_insights() {
        let ai = parse_insights(&json!({"Risks": []})).unwrap();
        assert!(ai.risks.is_empty());
    }
}
