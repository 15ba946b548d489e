//! # Table Layout
//!
//! The metrics table: a two-column bordered grid with a styled header row.
//! Rows go through the same page-break rule as every other unit, and the
//! header never ends a page on its own.

use super::page_break::{decide_break, BreakDecision};
use super::{Align, Cursor, DrawKind, DrawOp, Geometry, TableCell, FONT_FAMILY, LINE_HEIGHT, MM};
use crate::font::FontContext;
use crate::model::MetricRow;
use crate::text::TextLayout;

pub const TABLE_FONT_SIZE: f64 = 11.0;
/// Share of the content width given to the label column.
pub const LABEL_FRACTION: f64 = 0.6;
pub const CELL_PADDING_X: f64 = 2.0 * MM;
pub const CELL_PADDING_Y: f64 = 1.5 * MM;

pub const HEADER_LABELS: [&str; 2] = ["Metric", "Value"];

struct RowSpec<'a> {
    kind: DrawKind,
    label: &'a str,
    value: &'a str,
    bold: bool,
}

/// Lay out the metrics table starting at `cursor`.
///
/// Returns the ops (one header op, then one op per row) and the cursor
/// just below the last row.
pub fn layout_table(
    rows: &[MetricRow],
    mut cursor: Cursor,
    geometry: &Geometry,
    font_context: &FontContext,
) -> (Vec<DrawOp>, Cursor) {
    let text_layout = TextLayout::new();
    let label_width = geometry.content_width * LABEL_FRACTION;
    let value_width = geometry.content_width - label_width;
    let label_x = geometry.left_margin;
    let value_x = label_x + label_width;

    let build = |spec: &RowSpec, cursor: &Cursor| -> DrawOp {
        let weight = if spec.bold { 700 } else { 400 };
        let wrap = |text: &str, width: f64| {
            text_layout.break_into_lines(
                font_context,
                text,
                width - 2.0 * CELL_PADDING_X,
                TABLE_FONT_SIZE,
                FONT_FAMILY,
                weight,
            )
        };
        let cells = vec![
            TableCell {
                text: spec.label.to_string(),
                lines: wrap(spec.label, label_width),
                x: label_x,
                width: label_width,
                align: Align::Left,
            },
            TableCell {
                text: spec.value.to_string(),
                lines: wrap(spec.value, value_width),
                x: value_x,
                width: value_width,
                align: Align::Right,
            },
        ];
        let max_lines = cells.iter().map(|c| c.lines.len()).max().unwrap_or(1);
        let height = max_lines as f64 * TABLE_FONT_SIZE * LINE_HEIGHT + 2.0 * CELL_PADDING_Y;

        DrawOp {
            kind: spec.kind,
            content: format!("{} | {}", spec.label, spec.value),
            x: geometry.left_margin,
            y: cursor.y,
            width: geometry.content_width,
            height,
            page: cursor.page,
            font_size: TABLE_FONT_SIZE,
            indent: 0.0,
            bold: spec.bold,
            align: Align::Left,
            lines: Vec::new(),
            cells,
        }
    };

    let header = RowSpec {
        kind: DrawKind::TableHeader,
        label: HEADER_LABELS[0],
        value: HEADER_LABELS[1],
        bold: true,
    };
    let mut ops = Vec::with_capacity(rows.len() + 1);

    // Header and first row are measured together so they share a page
    let header_op = build(&header, &cursor);
    let first_height = rows
        .first()
        .map(|row| {
            build(
                &RowSpec {
                    kind: DrawKind::TableRow,
                    label: &row.label,
                    value: &row.value,
                    bold: false,
                },
                &cursor,
            )
            .height
        })
        .unwrap_or(0.0);

    if decide_break(&cursor, header_op.height + first_height, geometry)
        == BreakDecision::MoveToNextPage
    {
        log::debug!("metrics table header moved to page {}", cursor.page + 1);
        cursor = cursor.next_page(geometry);
    }
    let header_op = build(&header, &cursor);
    cursor = cursor.advance(header_op.height);
    ops.push(header_op);

    for row in rows {
        let spec = RowSpec {
            kind: DrawKind::TableRow,
            label: &row.label,
            value: &row.value,
            bold: false,
        };
        let mut op = build(&spec, &cursor);
        if decide_break(&cursor, op.height, geometry) == BreakDecision::MoveToNextPage {
            log::debug!("metrics table row '{}' moved to next page", row.label);
            cursor = cursor.next_page(geometry);
            op = build(&spec, &cursor);
        }
        cursor = cursor.advance(op.height);
        ops.push(op);
    }

    (ops, cursor)
}
