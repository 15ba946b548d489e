//! Runtime configuration.
//!
//! Values come from (in increasing precedence) built-in defaults, a JSON
//! file or object, and `REPORTFORM_*` environment variables.

use crate::layout::{Geometry, PageSize};
use crate::model::Currency;
use serde::{Deserialize, Serialize};

pub const ENV_BASE_URL: &str = "REPORTFORM_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "REPORTFORM_TIMEOUT_SECS";
pub const ENV_PAGE: &str = "REPORTFORM_PAGE";
pub const ENV_CURRENCY: &str = "REPORTFORM_CURRENCY";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Root URL of the analysis service.
    pub base_url: String,
    /// Per-request timeout for collaborator fetches.
    pub timeout_secs: u64,
    pub page: PageSize,
    /// ISO 4217 code of the currency metrics are reported in.
    pub currency: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
            page: PageSize::A4,
            currency: "INR".to_string(),
        }
    }
}

impl ReportConfig {
    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|var| std::env::var(var).ok())
    }

    /// Apply overrides from any variable source.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(url) = lookup(ENV_BASE_URL) {
            url::Url::parse(&url).map_err(|e| ConfigError::Invalid {
                var: ENV_BASE_URL,
                reason: e.to_string(),
            })?;
            self.base_url = url;
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            self.timeout_secs = secs.trim().parse().map_err(|_| ConfigError::Invalid {
                var: ENV_TIMEOUT_SECS,
                reason: format!("'{secs}' is not a whole number of seconds"),
            })?;
        }
        if let Some(page) = lookup(ENV_PAGE) {
            self.page = page
                .parse()
                .map_err(|reason| ConfigError::Invalid { var: ENV_PAGE, reason })?;
        }
        if let Some(code) = lookup(ENV_CURRENCY) {
            if Currency::from_code(&code).is_none() {
                return Err(ConfigError::Invalid {
                    var: ENV_CURRENCY,
                    reason: format!("unsupported currency '{code}'"),
                });
            }
            self.currency = code.trim().to_ascii_uppercase();
        }
        Ok(self)
    }

    pub fn geometry(&self) -> Geometry {
        Geometry::for_page(self.page)
    }

    /// The configured currency, falling back to INR for unknown codes.
    pub fn currency(&self) -> Currency {
        Currency::from_code(&self.currency).unwrap_or_else(|| {
            log::warn!("unknown currency '{}', using INR", self.currency);
            Currency::inr()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ReportConfig::default();
        assert_eq!(config.timeout_secs, 30);
        assert_eq!(config.page, PageSize::A4);
        assert_eq!(config.currency().code, "INR");
        assert_eq!(config.geometry(), Geometry::a4());
    }

    #[test]
    fn test_env_overrides() {
        let config = ReportConfig::default()
            .with_overrides(lookup(&[
                (ENV_BASE_URL, "https://api.example.com/v1"),
                (ENV_TIMEOUT_SECS, "5"),
                (ENV_PAGE, "letter"),
                (ENV_CURRENCY, "usd"),
            ]))
            .unwrap();
        assert_eq!(config.base_url, "https://api.example.com/v1");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.geometry(), Geometry::letter());
        assert_eq!(config.currency(), Currency::usd());
    }

    #[test]
    fn test_invalid_override_names_the_variable() {
        let err = ReportConfig::default()
            .with_overrides(lookup(&[(ENV_TIMEOUT_SECS, "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_TIMEOUT_SECS));

        let err = ReportConfig::default()
            .with_overrides(lookup(&[(ENV_BASE_URL, "not a url")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: ENV_BASE_URL, .. }));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ReportConfig = serde_json::from_str(r#"{"timeout_secs": 10}"#).unwrap();
        assert_eq!(config.timeout_secs, 10);
        assert_eq!(config.base_url, "http://localhost:8000");
    }
}
