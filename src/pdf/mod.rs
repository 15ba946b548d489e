//! # PDF Serializer
//!
//! Takes the draw ops from the layout engine and writes a valid PDF file.
//!
//! This is a from-scratch PDF 1.7 writer. The report only ever needs two
//! fonts, filled rectangles and stroked borders, so the subset of the format
//! we emit is small: standard Type1 fonts in WinAnsiEncoding, one
//! Flate-compressed content stream per page, and an `/Info` dictionary.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- catalog, page tree, fonts, pages, content streams
//! ...
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```
//!
//! The output carries no timestamps, so identical ops produce identical
//! bytes.
//!
//! ## Character coverage
//!
//! WinAnsi cannot encode `₹`. Text is passed through [`ascii_safe`] on its
//! way into the content stream; the screen sink never sees this.

use std::fmt::Write as FmtWrite; // for write! on String
use std::io::Write as IoWrite; // for write! on Vec<u8>

use crate::error::ReportError;
use crate::font::{FontContext, StandardFont};
use crate::layout::table::{CELL_PADDING_X, CELL_PADDING_Y};
use crate::layout::{Align, DrawKind, DrawOp, Geometry, LayoutEngine, FONT_FAMILY, LINE_HEIGHT};
use crate::model::{Currency, Industry};
use miniz_oxide::deflate::compress_to_vec_zlib;

/// Header row fill, RGB 33,150,243.
const HEADER_FILL: (f64, f64, f64) = (33.0 / 255.0, 150.0 / 255.0, 243.0 / 255.0);
const BORDER_GRAY: f64 = 0.78;
const BORDER_WIDTH: f64 = 0.5;
/// Baseline sits this far below the top of the glyph box, as a fraction of the font size.
const ASCENT: f64 = 0.8;

const FONTS: [StandardFont; 2] = [StandardFont::Helvetica, StandardFont::HelveticaBold];

/// Replacements for characters the standard fonts cannot encode.
const FALLBACKS: &[(char, &str)] = &[
    ('\u{20B9}', "Rs."), // Indian rupee
    ('\u{20A8}', "Rs"),  // rupee sign
    ('\u{2212}', "-"),   // minus
    ('\u{2010}', "-"),
    ('\u{2011}', "-"),
    ('\u{00AD}', ""),
];

/// What the exporter needs to know about the report besides its ops.
#[derive(Debug, Clone)]
pub struct ExportMeta {
    pub report_id: String,
    pub title: String,
    pub industry: Industry,
    pub currency: Currency,
}

/// A finished export: suggested filename plus the file's bytes.
#[derive(Debug, Clone)]
pub struct ExportedDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// `{Industry}_Report_{reportId}.pdf`
pub fn export_filename(industry: Industry, report_id: &str) -> String {
    format!("{}_Report_{}.pdf", industry.name(), report_id)
}

/// Lay the ops out as a PDF and name the file.
pub fn export(
    ops: &[DrawOp],
    meta: &ExportMeta,
    geometry: &Geometry,
) -> Result<ExportedDocument, ReportError> {
    let bytes = PdfWriter::new().write(ops, meta, geometry)?;
    let filename = export_filename(meta.industry, &meta.report_id);
    log::info!("exported {} ({} bytes)", filename, bytes.len());
    Ok(ExportedDocument { filename, bytes })
}

/// Make text encodable by the standard fonts.
///
/// Characters WinAnsi can encode are kept, including a currency glyph such
/// as `€`. A report currency glyph outside WinAnsi becomes its ASCII
/// fallback, known symbols use the fallback table, and anything else
/// becomes `?`.
pub fn ascii_safe(text: &str, currency: &Currency) -> String {
    let text = if unicode_to_winansi(currency.glyph).is_some() {
        text.to_string()
    } else {
        currency.ascii_safe(text)
    };
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if unicode_to_winansi(ch).is_some() {
            out.push(ch);
        } else if let Some((_, replacement)) = FALLBACKS.iter().find(|(c, _)| *c == ch) {
            out.push_str(replacement);
        } else {
            out.push('?');
        }
    }
    out
}

pub struct PdfWriter {
    font_context: FontContext,
}

impl Default for PdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
}

struct PdfObject {
    data: Vec<u8>,
}

impl PdfBuilder {
    fn push(&mut self, data: Vec<u8>) -> usize {
        let id = self.objects.len();
        self.objects.push(PdfObject { data });
        id
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self {
            font_context: FontContext::new(),
        }
    }

    /// Write draw ops to a PDF byte vector.
    ///
    /// Ops must be in page order; a page index that goes backwards is a
    /// render error. An empty op list still yields one blank page.
    pub fn write(
        &self,
        ops: &[DrawOp],
        meta: &ExportMeta,
        geometry: &Geometry,
    ) -> Result<Vec<u8>, ReportError> {
        if let Some(pair) = ops.windows(2).find(|pair| pair[1].page < pair[0].page) {
            return Err(ReportError::Render(format!(
                "draw op '{}' on page {} follows page {}",
                pair[1].content, pair[1].page, pair[0].page
            )));
        }

        let mut builder = PdfBuilder {
            objects: Vec::new(),
        };

        // Reserve object IDs:
        // 0 = placeholder (PDF objects are 1-indexed)
        // 1 = Catalog
        // 2 = Pages (page tree root)
        // 3+ = fonts, then page objects and content streams
        builder.push(vec![]);
        builder.push(vec![]);
        builder.push(vec![]);

        let mut font_resources = String::new();
        for (idx, font) in FONTS.iter().enumerate() {
            let id = builder.push(
                format!(
                    "<< /Type /Font /Subtype /Type1 /BaseFont /{} /Encoding /WinAnsiEncoding >>",
                    font.pdf_name()
                )
                .into_bytes(),
            );
            let _ = write!(font_resources, "/F{} {} 0 R ", idx, id);
        }

        let page_count = LayoutEngine::page_count(ops);
        let mut substituted = 0usize;
        let mut page_obj_ids: Vec<usize> = Vec::with_capacity(page_count);

        for page in 0..page_count {
            let mut content = String::new();
            for op in LayoutEngine::ops_on_page(ops, page) {
                substituted += self.write_op(&mut content, op, meta, geometry);
            }

            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);
            let mut content_data: Vec<u8> = Vec::new();
            let _ = write!(
                content_data,
                "<< /Length {} /Filter /FlateDecode >>\nstream\n",
                compressed.len()
            );
            content_data.extend_from_slice(&compressed);
            content_data.extend_from_slice(b"\nendstream");
            let content_obj_id = builder.push(content_data);

            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << /Font << {}>> >> >>",
                geometry.page_width, geometry.page_height, content_obj_id, font_resources
            );
            page_obj_ids.push(builder.push(page_dict.into_bytes()));
        }

        if substituted > 0 {
            log::warn!(
                "report {}: {} text run(s) needed character substitution for PDF",
                meta.report_id,
                substituted
            );
        }

        builder.objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();

        let kids: String = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        let info = format!(
            "<< /Title ({}) /Subject ({}) /Producer (reportform {}) >>",
            encode_text(&ascii_safe(&meta.title, &meta.currency)),
            encode_text(&format!("{} report {}", meta.industry, meta.report_id)),
            env!("CARGO_PKG_VERSION")
        );
        let info_obj_id = builder.push(info.into_bytes());

        Ok(self.serialize(&builder, info_obj_id))
    }

    /// Write one op as PDF operators. Returns how many of its text runs
    /// had to be rewritten to be encodable.
    fn write_op(
        &self,
        stream: &mut String,
        op: &DrawOp,
        meta: &ExportMeta,
        geometry: &Geometry,
    ) -> usize {
        let page_height = geometry.page_height;
        let mut substituted = 0;
        let font = if op.bold { 1 } else { 0 };
        let line_box = op.font_size * LINE_HEIGHT;
        let baseline = op.font_size * ((LINE_HEIGHT - 1.0) / 2.0 + ASCENT);

        let mut paint = |stream: &mut String, text: &str, left: f64, right: f64, align: Align, top: f64| {
            let safe = ascii_safe(text, &meta.currency);
            if safe != text {
                substituted += 1;
            }
            let width = self.font_context.measure_string(
                &safe,
                FONT_FAMILY,
                if op.bold { 700 } else { 400 },
                op.font_size,
            );
            let x = match align {
                Align::Left => left,
                Align::Center => left + ((right - left) - width) / 2.0,
                Align::Right => right - width,
            };
            let _ = write!(
                stream,
                "1 0 0 1 {:.2} {:.2} Tm\n({}) Tj\n",
                x,
                page_height - top - baseline,
                encode_text(&safe)
            );
        };

        match op.kind {
            DrawKind::Text => {
                let _ = write!(stream, "BT\n0 g\n/F{} {:.1} Tf\n", font, op.font_size);
                for (i, line) in op.lines.iter().enumerate() {
                    paint(
                        stream,
                        &line.text,
                        op.x,
                        op.x + op.width,
                        op.align,
                        op.y + i as f64 * line_box,
                    );
                }
                let _ = write!(stream, "ET\n");
            }
            DrawKind::TableHeader | DrawKind::TableRow => {
                let bottom = page_height - op.y - op.height;
                if op.kind == DrawKind::TableHeader {
                    let (r, g, b) = HEADER_FILL;
                    let _ = write!(
                        stream,
                        "q\n{:.3} {:.3} {:.3} rg\n{:.2} {:.2} {:.2} {:.2} re\nf\nQ\n",
                        r, g, b, op.x, bottom, op.width, op.height
                    );
                }
                let _ = write!(
                    stream,
                    "q\n{:.3} G\n{:.2} w\n",
                    BORDER_GRAY, BORDER_WIDTH
                );
                for cell in &op.cells {
                    let _ = write!(
                        stream,
                        "{:.2} {:.2} {:.2} {:.2} re\nS\n",
                        cell.x, bottom, cell.width, op.height
                    );
                }
                let _ = write!(stream, "Q\n");

                let color = if op.kind == DrawKind::TableHeader { "1 g" } else { "0 g" };
                let _ = write!(stream, "BT\n{}\n/F{} {:.1} Tf\n", color, font, op.font_size);
                for cell in &op.cells {
                    for (i, line) in cell.lines.iter().enumerate() {
                        paint(
                            stream,
                            &line.text,
                            cell.x + CELL_PADDING_X,
                            cell.x + cell.width - CELL_PADDING_X,
                            cell.align,
                            op.y + CELL_PADDING_Y + i as f64 * line_box,
                        );
                    }
                }
                let _ = write!(stream, "ET\n");
            }
        }

        substituted
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, builder: &PdfBuilder, info_obj_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        // Header
        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let header = format!("{} 0 obj\n", i);
            output.extend_from_slice(header.as_bytes());
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        let _ = write!(output, "0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_obj_id,
            xref_offset
        );

        output
    }
}

/// Encode text as the body of a PDF literal string in WinAnsiEncoding.
fn encode_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        let b = unicode_to_winansi(ch).unwrap_or(b'?');
        match b {
            b'\\' => out.push_str("\\\\"),
            b'(' => out.push_str("\\("),
            b')' => out.push_str("\\)"),
            0x20..=0x7E => out.push(b as char),
            _ => {
                // Octal escape for bytes outside ASCII printable range
                let _ = write!(out, "\\{:03o}", b);
            }
        }
    }
    out
}

/// Map a Unicode codepoint to a WinAnsiEncoding byte value.
///
/// WinAnsiEncoding is based on Windows-1252. Most codepoints in
/// 0x20..=0x7E and 0xA0..=0xFF map directly. The 0x80..=0x9F range
/// contains special mappings for smart quotes, bullets, dashes, etc.
fn unicode_to_winansi(ch: char) -> Option<u8> {
    let cp = ch as u32;
    if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
        return Some(cp as u8);
    }
    match cp {
        0x20AC => Some(0x80), // Euro sign
        0x201A => Some(0x82), // Single low-9 quotation mark
        0x0192 => Some(0x83), // Latin small letter f with hook
        0x201E => Some(0x84), // Double low-9 quotation mark
        0x2026 => Some(0x85), // Horizontal ellipsis
        0x2020 => Some(0x86), // Dagger
        0x2021 => Some(0x87), // Double dagger
        0x02C6 => Some(0x88), // Modifier letter circumflex accent
        0x2030 => Some(0x89), // Per mille sign
        0x0160 => Some(0x8A), // Latin capital letter S with caron
        0x2039 => Some(0x8B), // Single left-pointing angle quotation
        0x0152 => Some(0x8C), // Latin capital ligature OE
        0x017D => Some(0x8E), // Latin capital letter Z with caron
        0x2018 => Some(0x91), // Left single quotation mark
        0x2019 => Some(0x92), // Right single quotation mark
        0x201C => Some(0x93), // Left double quotation mark
        0x201D => Some(0x94), // Right double quotation mark
        0x2022 => Some(0x95), // Bullet
        0x2013 => Some(0x96), // En dash
        0x2014 => Some(0x97), // Em dash
        0x02DC => Some(0x98), // Small tilde
        0x2122 => Some(0x99), // Trade mark sign
        0x0161 => Some(0x9A), // Latin small letter s with caron
        0x203A => Some(0x9B), // Single right-pointing angle quotation
        0x0153 => Some(0x9C), // Latin small ligature oe
        0x017E => Some(0x9E), // Latin small letter z with caron
        0x0178 => Some(0x9F), // Latin capital letter Y with diaeresis
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{layout, Cursor, TableCell};
    use crate::model::MetricRow;
    use miniz_oxide::inflate::decompress_to_vec_zlib;

    fn meta() -> ExportMeta {
        ExportMeta {
            report_id: "42".to_string(),
            title: "SME Financial Health Report".to_string(),
            industry: Industry::Agriculture,
            currency: Currency::inr(),
        }
    }

    fn text_op(content: &str, page: usize, y: f64) -> DrawOp {
        DrawOp {
            kind: DrawKind::Text,
            content: content.to_string(),
            x: 40.0,
            y,
            width: 500.0,
            height: 15.4,
            page,
            font_size: 11.0,
            indent: 0.0,
            bold: false,
            align: Align::Left,
            lines: vec![crate::text::BrokenLine {
                text: content.to_string(),
                width: 0.0,
            }],
            cells: vec![],
        }
    }

    /// Inflate every content stream in the file and concatenate them.
    fn content_streams(bytes: &[u8]) -> String {
        let mut out = String::new();
        let mut rest = bytes;
        while let Some(start) = find(rest, b"stream\n") {
            let body = &rest[start + 7..];
            let Some(end) = find(body, b"\nendstream") else { break };
            let inflated = decompress_to_vec_zlib(&body[..end]).unwrap();
            out.push_str(&String::from_utf8_lossy(&inflated));
            rest = &body[end + b"\nendstream".len()..];
        }
        out
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    #[test]
    fn test_escape_pdf_string() {
        assert_eq!(encode_text("Hello (World)"), "Hello \\(World\\)");
        assert_eq!(encode_text("back\\slash"), "back\\\\slash");
        assert_eq!(encode_text("\u{2022} item"), "\\225 item");
    }

    #[test]
    fn test_ascii_safe() {
        let inr = Currency::inr();
        assert_eq!(ascii_safe("\u{20B9}100000", &inr), "Rs.100000");
        assert_eq!(ascii_safe("Caf\u{e9} \u{2022}", &inr), "Caf\u{e9} \u{2022}");
        assert_eq!(ascii_safe("\u{6f22}", &inr), "?");
    }

    #[test]
    fn test_encodable_currency_glyph_is_kept() {
        let eur = Currency::eur();
        assert_eq!(ascii_safe("\u{20AC}2500", &eur), "\u{20AC}2500");
        assert_eq!(encode_text(&ascii_safe("\u{20AC}2500", &eur)), "\\2002500");
        // A rupee in a euro report still needs the table fallback
        assert_eq!(ascii_safe("\u{20B9}5", &eur), "Rs.5");
    }

    #[test]
    fn test_filename_convention() {
        assert_eq!(
            export_filename(Industry::Manufacturing, "17"),
            "Manufacturing_Report_17.pdf"
        );
    }

    #[test]
    fn test_empty_document_produces_valid_pdf() {
        let bytes = PdfWriter::new().write(&[], &meta(), &Geometry::a4()).unwrap();

        assert!(bytes.starts_with(b"%PDF-1.7"));
        assert!(bytes.ends_with(b"%%EOF\n"));
        assert!(find(&bytes, b"xref").is_some());
        assert!(find(&bytes, b"trailer").is_some());
        assert!(find(&bytes, b"/Count 1").is_some());
    }

    #[test]
    fn test_metadata_in_pdf() {
        let bytes = PdfWriter::new().write(&[], &meta(), &Geometry::a4()).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Title (SME Financial Health Report)"));
        assert!(text.contains("/Subject (Agriculture report 42)"));
        assert!(text.contains("/BaseFont /Helvetica-Bold"));
    }

    #[test]
    fn test_one_physical_page_per_page_index() {
        let ops = vec![
            text_op("first", 0, 40.0),
            text_op("second", 1, 40.0),
            text_op("third", 2, 40.0),
        ];
        let bytes = PdfWriter::new().write(&ops, &meta(), &Geometry::a4()).unwrap();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Count 3"));
    }

    #[test]
    fn test_out_of_order_pages_rejected() {
        let ops = vec![text_op("late", 1, 40.0), text_op("early", 0, 40.0)];
        let err = PdfWriter::new()
            .write(&ops, &meta(), &Geometry::a4())
            .unwrap_err();
        assert!(matches!(err, ReportError::Render(_)));
    }

    #[test]
    fn test_rupee_substituted_in_content_stream() {
        let g = Geometry::a4();
        let fc = FontContext::new();
        let rows = vec![MetricRow {
            label: "Total Revenue".into(),
            value: "\u{20B9}100000".into(),
        }];
        let (ops, _) = crate::layout::table::layout_table(&rows, Cursor::start(&g), &g, &fc);
        let bytes = PdfWriter::new().write(&ops, &meta(), &g).unwrap();
        let content = content_streams(&bytes);
        assert!(content.contains("(Rs.100000) Tj"));
        assert!(content.contains("(Metric) Tj"));
        // Header fill
        assert!(content.contains("0.129 0.588 0.953 rg"));
    }

    #[test]
    fn test_right_aligned_value_ends_at_cell_edge() {
        let g = Geometry::a4();
        let cell = |text: &str, x: f64, width: f64, align: Align| TableCell {
            text: text.to_string(),
            lines: vec![crate::text::BrokenLine {
                text: text.to_string(),
                width: 0.0,
            }],
            x,
            width,
            align,
        };
        let op = DrawOp {
            kind: DrawKind::TableRow,
            content: "Profit | 100".into(),
            x: 40.0,
            y: 100.0,
            width: 300.0,
            height: 24.0,
            page: 0,
            font_size: 10.0,
            indent: 0.0,
            bold: false,
            align: Align::Left,
            lines: vec![],
            cells: vec![
                cell("Profit", 40.0, 200.0, Align::Left),
                cell("100", 240.0, 100.0, Align::Right),
            ],
        };
        let bytes = PdfWriter::new().write(&[op], &meta(), &g).unwrap();
        let content = content_streams(&bytes);
        // "100" is 3 x 556/1000 x 10pt = 16.68pt wide
        let expected_x = 240.0 + 100.0 - CELL_PADDING_X - 16.68;
        assert!(content.contains(&format!("1 0 0 1 {:.2} ", expected_x)));
    }

    #[test]
    fn test_output_is_deterministic() {
        let model = crate::model::ReportModel {
            meta: crate::model::ReportMeta {
                industry: Industry::Retail,
                report_id: "9".into(),
                generated_at: chrono::DateTime::<chrono::Utc>::UNIX_EPOCH,
            },
            sections: vec![crate::model::Section::NarrativeBlock {
                title: "Guidance".into(),
                text: "Keep a three month cash buffer.".into(),
            }],
        };
        let ops = layout(&model, &Geometry::a4());
        let a = PdfWriter::new().write(&ops, &meta(), &Geometry::a4()).unwrap();
        let b = PdfWriter::new().write(&ops, &meta(), &Geometry::a4()).unwrap();
        assert_eq!(a, b);
    }
}
