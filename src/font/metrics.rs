//! Glyph advance widths for the standard PDF fonts we paint with.
//!
//! Widths are in 1/1000 em, taken from the Adobe Core 14 AFM files. Only the
//! printable ASCII block is tabulated; the handful of WinAnsi punctuation
//! glyphs the report text actually uses live in a small side table.

/// Advance widths for one standard font face.
#[derive(Debug)]
pub struct StandardFontMetrics {
    /// Widths for U+0020..=U+007E, indexed by `codepoint - 0x20`.
    ascii: &'static [u16; 95],
    /// Non-ASCII glyphs that WinAnsi can encode.
    extra: &'static [(char, u16)],
    /// Width used for anything not covered above.
    default_width: u16,
}

impl StandardFontMetrics {
    fn width_units(&self, ch: char) -> u16 {
        let cp = ch as u32;
        if (0x20..=0x7E).contains(&cp) {
            return self.ascii[(cp - 0x20) as usize];
        }
        self.extra
            .iter()
            .find(|(c, _)| *c == ch)
            .map(|(_, w)| *w)
            .unwrap_or(self.default_width)
    }

    /// Advance width of a character in points.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        self.width_units(ch) as f64 / 1000.0 * font_size
    }

    /// Width of a whole string in points.
    pub fn measure_string(&self, text: &str, font_size: f64) -> f64 {
        text.chars().map(|ch| self.char_width(ch, font_size)).sum()
    }
}

#[rustfmt::skip]
const HELVETICA_ASCII: [u16; 95] = [
    // space ! " # $ % & ' ( ) * + , - . /
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    // 0-9
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    // : ; < = > ? @
    278, 278, 584, 584, 584, 556, 1015,
    // A-Z
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    // [ \ ] ^ _ `
    278, 278, 278, 469, 556, 333,
    // a-z
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833,
    556, 556, 556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500,
    // { | } ~
    334, 260, 334, 584,
];

#[rustfmt::skip]
const HELVETICA_BOLD_ASCII: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556,
    333, 333, 584, 584, 584, 611, 975,
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833,
    722, 778, 667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611,
    333, 278, 333, 584, 556, 333,
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889,
    611, 611, 611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500,
    389, 280, 389, 584,
];

const HELVETICA_EXTRA: [(char, u16); 9] = [
    ('\u{2022}', 350), // bullet
    ('\u{2013}', 556), // en dash
    ('\u{2014}', 1000), // em dash
    ('\u{2018}', 222),
    ('\u{2019}', 222),
    ('\u{201C}', 333),
    ('\u{201D}', 333),
    ('\u{2026}', 1000),
    ('\u{20AC}', 556), // euro
];

const HELVETICA_BOLD_EXTRA: [(char, u16); 9] = [
    ('\u{2022}', 350),
    ('\u{2013}', 556),
    ('\u{2014}', 1000),
    ('\u{2018}', 278),
    ('\u{2019}', 278),
    ('\u{201C}', 500),
    ('\u{201D}', 500),
    ('\u{2026}', 1000),
    ('\u{20AC}', 556),
];

pub static HELVETICA: StandardFontMetrics = StandardFontMetrics {
    ascii: &HELVETICA_ASCII,
    extra: &HELVETICA_EXTRA,
    default_width: 556,
};

pub static HELVETICA_BOLD: StandardFontMetrics = StandardFontMetrics {
    ascii: &HELVETICA_BOLD_ASCII,
    extra: &HELVETICA_BOLD_EXTRA,
    default_width: 611,
};
