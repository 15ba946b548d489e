//! Currency display for monetary metrics.
//!
//! The model always carries the native glyph (`₹`). Media that cannot
//! encode it, such as the standard PDF fonts, ask for [`Currency::ascii_safe`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// ISO 4217 code.
    pub code: String,
    /// Native symbol, as shown on screen.
    pub glyph: char,
    /// Replacement for `glyph` where it cannot be encoded.
    pub ascii: String,
}

impl Default for Currency {
    fn default() -> Self {
        Self::inr()
    }
}

impl Currency {
    pub fn inr() -> Self {
        Self {
            code: "INR".to_string(),
            glyph: '\u{20B9}',
            ascii: "Rs.".to_string(),
        }
    }

    pub fn usd() -> Self {
        Self {
            code: "USD".to_string(),
            glyph: '$',
            ascii: "$".to_string(),
        }
    }

    pub fn eur() -> Self {
        Self {
            code: "EUR".to_string(),
            glyph: '\u{20AC}',
            ascii: "EUR".to_string(),
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_ascii_uppercase().as_str() {
            "INR" => Some(Self::inr()),
            "USD" => Some(Self::usd()),
            "EUR" => Some(Self::eur()),
            _ => None,
        }
    }

    /// Format an amount with the native glyph: `₹100000`.
    pub fn format(&self, amount: &Decimal) -> String {
        format!("{}{}", self.glyph, amount)
    }

    /// Replace every occurrence of the glyph with its ASCII fallback.
    ///
    /// Sinks call this only when they cannot encode the glyph itself.
    pub fn ascii_safe(&self, text: &str) -> String {
        if !text.contains(self.glyph) {
            return text.to_string();
        }
        text.replace(self.glyph, &self.ascii)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_format_keeps_value_verbatim() {
        let inr = Currency::inr();
        let amount = Decimal::from_str("1234567.50").unwrap();
        assert_eq!(inr.format(&amount), "\u{20B9}1234567.50");
    }

    #[test]
    fn test_ascii_safe_replaces_glyph_only() {
        let inr = Currency::inr();
        assert_eq!(inr.ascii_safe("\u{20B9}100000"), "Rs.100000");
        assert_eq!(inr.ascii_safe("Profit Margin"), "Profit Margin");
    }

    #[test]
    fn test_from_code() {
        assert_eq!(Currency::from_code("usd"), Some(Currency::usd()));
        assert_eq!(Currency::from_code("GBP"), None);
    }
}
