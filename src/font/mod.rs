//! # Font Management
//!
//! Text measurement against the standard PDF fonts.
//!
//! Reports are painted in Helvetica and Helvetica-Bold. Neither needs
//! embedding, and the same advance widths drive both layout and PDF
//! serialization, so what the layout engine measures is what the exporter
//! paints.

pub mod metrics;

pub use metrics::StandardFontMetrics;
use std::collections::HashMap;

/// A font registry that maps font family + weight to a standard face.
pub struct FontRegistry {
    fonts: HashMap<FontKey, StandardFont>,
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct FontKey {
    pub family: String,
    pub weight: u32,
}

/// The standard PDF fonts the exporter knows how to reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
        }
    }

    pub fn metrics(&self) -> &'static StandardFontMetrics {
        match self {
            Self::Helvetica => &metrics::HELVETICA,
            Self::HelveticaBold => &metrics::HELVETICA_BOLD,
        }
    }
}

impl Default for FontRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FontRegistry {
    pub fn new() -> Self {
        let fonts = [
            (400, StandardFont::Helvetica),
            (700, StandardFont::HelveticaBold),
        ]
        .into_iter()
        .map(|(weight, font)| {
            (
                FontKey {
                    family: "Helvetica".to_string(),
                    weight,
                },
                font,
            )
        })
        .collect();

        Self { fonts }
    }

    /// Look up a font, falling back to Helvetica of the same weight.
    pub fn resolve(&self, family: &str, weight: u32) -> StandardFont {
        // Snap to the two weights the standard fonts ship with
        let snapped_weight = if weight >= 600 { 700 } else { 400 };
        let key = FontKey {
            family: family.to_string(),
            weight: snapped_weight,
        };
        if let Some(font) = self.fonts.get(&key) {
            return *font;
        }

        if snapped_weight == 700 {
            StandardFont::HelveticaBold
        } else {
            StandardFont::Helvetica
        }
    }
}

/// Shared font context used by layout and PDF serialization.
pub struct FontContext {
    registry: FontRegistry,
}

impl Default for FontContext {
    fn default() -> Self {
        Self::new()
    }
}

impl FontContext {
    pub fn new() -> Self {
        Self {
            registry: FontRegistry::new(),
        }
    }

    /// Get the advance width of a single character in points.
    pub fn char_width(&self, ch: char, family: &str, weight: u32, font_size: f64) -> f64 {
        self.registry
            .resolve(family, weight)
            .metrics()
            .char_width(ch, font_size)
    }

    /// Measure the width of a string in points.
    pub fn measure_string(&self, text: &str, family: &str, weight: u32, font_size: f64) -> f64 {
        self.registry
            .resolve(family, weight)
            .metrics()
            .measure_string(text, font_size)
    }

    /// Resolve a family and weight to the standard font that will paint it.
    pub fn resolve(&self, family: &str, weight: u32) -> StandardFont {
        self.registry.resolve(family, weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_font_context_helvetica() {
        let ctx = FontContext::new();
        let w = ctx.char_width(' ', "Helvetica", 400, 12.0);
        assert!((w - 3.336).abs() < 0.001);
    }

    #[test]
    fn test_font_context_bold_wider() {
        let ctx = FontContext::new();
        let regular = ctx.measure_string("Profit Margin", "Helvetica", 400, 12.0);
        let bold = ctx.measure_string("Profit Margin", "Helvetica", 700, 12.0);
        assert!(bold > regular, "bold text should be wider than regular");
    }

    #[test]
    fn test_font_context_fallback() {
        let ctx = FontContext::new();
        let w1 = ctx.char_width('A', "Helvetica", 400, 12.0);
        let w2 = ctx.char_width('A', "UnknownFont", 400, 12.0);
        assert!((w1 - w2).abs() < 0.001);
        assert_eq!(ctx.resolve("UnknownFont", 700), StandardFont::HelveticaBold);
    }

    #[test]
    fn test_font_context_weight_resolution() {
        let ctx = FontContext::new();
        assert_eq!(ctx.resolve("Helvetica", 800), StandardFont::HelveticaBold);
        assert_eq!(ctx.resolve("Helvetica", 500), StandardFont::Helvetica);
        assert_eq!(ctx.resolve("Helvetica", 700).pdf_name(), "Helvetica-Bold");
    }
}
