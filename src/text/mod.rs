//! # Text Layout
//!
//! Line breaking and text measurement.
//!
//! Greedy word wrap over UAX#14 break opportunities, measured with the same
//! font metrics the PDF exporter uses. A word is only split when it alone is
//! wider than the line.

use crate::font::FontContext;
use serde::Serialize;
use unicode_linebreak::{linebreaks, BreakOpportunity};

/// A line of text after line-breaking.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BrokenLine {
    /// The text as a string, trailing spaces removed.
    pub text: String,
    /// Total width of the line, excluding trailing spaces.
    pub width: f64,
}

fn is_line_separator(ch: char) -> bool {
    matches!(ch, '\n' | '\r' | '\u{2028}' | '\u{2029}')
}

/// Compute UAX#14 break opportunities indexed by char position.
///
/// Returns a vec of length `text.chars().count()`. Each entry is the break
/// opportunity *before* that character position. Index 0 is always `None`.
fn compute_break_opportunities(text: &str) -> Vec<Option<BreakOpportunity>> {
    let char_count = text.chars().count();
    let mut result = vec![None; char_count];

    // linebreaks() yields the byte offset AFTER the break, i.e. the start of
    // the next segment.
    let byte_to_char: Vec<usize> = {
        let mut map = vec![0usize; text.len() + 1];
        let mut char_idx = 0;
        for (byte_idx, _) in text.char_indices() {
            map[byte_idx] = char_idx;
            char_idx += 1;
        }
        map[text.len()] = char_idx;
        map
    };

    for (byte_offset, opp) in linebreaks(text) {
        let char_idx = byte_to_char[byte_offset];
        if char_idx < char_count {
            result[char_idx] = Some(opp);
        }
    }

    result
}

pub struct TextLayout;

impl Default for TextLayout {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayout {
    pub fn new() -> Self {
        Self
    }

    /// Break a string into lines that fit within `max_width`.
    ///
    /// Always returns at least one line; empty input yields a single empty
    /// line so that an empty unit still occupies a line of height.
    pub fn break_into_lines(
        &self,
        font_context: &FontContext,
        text: &str,
        max_width: f64,
        font_size: f64,
        font_family: &str,
        font_weight: u32,
    ) -> Vec<BrokenLine> {
        if text.is_empty() {
            return vec![BrokenLine {
                text: String::new(),
                width: 0.0,
            }];
        }

        let chars: Vec<char> = text.chars().collect();
        let char_widths: Vec<f64> = chars
            .iter()
            .map(|&ch| {
                if is_line_separator(ch) {
                    0.0
                } else {
                    font_context.char_width(ch, font_family, font_weight, font_size)
                }
            })
            .collect();
        let break_opps = compute_break_opportunities(text);

        let mut lines = Vec::new();
        let mut line_start = 0;
        let mut line_width = 0.0;
        let mut last_break_point: Option<usize> = None;

        for (i, &ch) in chars.iter().enumerate() {
            let char_width = char_widths[i];

            // A break *before* char[i] means the previous line can end at char[i-1]
            if i > 0 {
                match break_opps[i] {
                    Some(BreakOpportunity::Mandatory) => {
                        lines.push(make_line(&chars[line_start..i], &char_widths[line_start..i]));
                        line_start = i;
                        line_width = 0.0;
                        last_break_point = None;
                    }
                    Some(BreakOpportunity::Allowed) => {
                        last_break_point = Some(i - 1);
                    }
                    None => {}
                }
            }

            if is_line_separator(ch) {
                continue;
            }

            // Spaces hang past the edge and never force a wrap, so a wrapped
            // line always starts at the word after them
            if ch == ' ' {
                line_width += char_width;
                continue;
            }

            if line_width + char_width > max_width && line_start < i {
                if let Some(bp) = last_break_point.filter(|bp| *bp >= line_start) {
                    let break_at = bp + 1;
                    lines.push(make_line(
                        &chars[line_start..break_at],
                        &char_widths[line_start..break_at],
                    ));
                    line_start = break_at;
                    line_width = char_widths[line_start..=i].iter().sum();
                    last_break_point = None;
                    continue;
                }

                // The word alone is wider than the line: force a break here
                lines.push(make_line(&chars[line_start..i], &char_widths[line_start..i]));
                line_start = i;
                line_width = char_width;
                last_break_point = None;
                continue;
            }

            line_width += char_width;
        }

        if line_start < chars.len() {
            lines.push(make_line(&chars[line_start..], &char_widths[line_start..]));
        }

        if lines.is_empty() {
            lines.push(BrokenLine {
                text: String::new(),
                width: 0.0,
            });
        }

        lines
    }
}

/// Create a BrokenLine from characters and their widths.
fn make_line(chars: &[char], widths: &[f64]) -> BrokenLine {
    let mut end = chars.len();
    while end > 0 && (chars[end - 1] == ' ' || is_line_separator(chars[end - 1])) {
        end -= 1;
    }

    let text: String = chars[..end]
        .iter()
        .copied()
        .filter(|c| !is_line_separator(*c))
        .collect();

    BrokenLine {
        text,
        width: widths[..end].iter().sum(),
    }
}
