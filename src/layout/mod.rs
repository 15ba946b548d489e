//! # Layout Engine
//!
//! Turns a [`ReportModel`] into a flat, ordered list of positioned
//! [`DrawOp`]s on a grid of fixed-size pages.
//!
//! The page is the unit of layout. Every unit of content (a title, a
//! bullet, a table row) is measured before it is placed, and the decision
//! to move to the next page is made against the real page boundary, never
//! by slicing a tall canvas afterwards. A [`Cursor`] threads through every
//! step and is returned by it, so the whole pass is a pure function of the
//! model and the [`Geometry`].
//!
//! Invariants the sinks rely on:
//! - `page` never decreases in emission order
//! - the first op on a new page sits exactly at `top_margin`
//! - units are never split; a unit taller than the page overflows in place

pub mod page_break;
pub mod table;

use crate::font::FontContext;
use crate::model::{ReportModel, Section};
use crate::text::{BrokenLine, TextLayout};
use page_break::{decide_break, BreakDecision};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Points per millimetre.
pub const MM: f64 = 72.0 / 25.4;

/// Line box height as a multiple of the font size.
pub const LINE_HEIGHT: f64 = 1.4;

/// Vertical gap closing every section.
pub const SECTION_GAP: f64 = 4.0 * MM;

pub const FONT_FAMILY: &str = "Helvetica";

/// Standard page sizes in points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

impl FromStr for PageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "a4" => Ok(PageSize::A4),
            "letter" => Ok(PageSize::Letter),
            other => Err(format!("unsupported page size '{other}' (expected A4 or Letter)")),
        }
    }
}

/// Page dimensions and margins, all in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub page_width: f64,
    pub page_height: f64,
    pub top_margin: f64,
    pub bottom_margin: f64,
    pub left_margin: f64,
    pub content_width: f64,
}

impl Default for Geometry {
    fn default() -> Self {
        Self::a4()
    }
}

impl Geometry {
    /// 14 mm top and left, 12 mm bottom, a 180 mm text column.
    pub fn for_page(size: PageSize) -> Self {
        let (page_width, page_height) = size.dimensions();
        let left_margin = 14.0 * MM;
        Self {
            page_width,
            page_height,
            top_margin: 14.0 * MM,
            bottom_margin: 12.0 * MM,
            left_margin,
            content_width: (180.0 * MM).min(page_width - 2.0 * left_margin),
        }
    }

    pub fn a4() -> Self {
        Self::for_page(PageSize::A4)
    }

    pub fn letter() -> Self {
        Self::for_page(PageSize::Letter)
    }

    /// Lowest y a unit may reach without overflowing.
    pub fn content_bottom(&self) -> f64 {
        self.page_height - self.bottom_margin
    }

    pub fn usable_height(&self) -> f64 {
        self.content_bottom() - self.top_margin
    }
}

/// Where the next unit goes. `y` grows downwards from the top of the page.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub page: usize,
    pub y: f64,
}

impl Cursor {
    pub fn start(geometry: &Geometry) -> Self {
        Self {
            page: 0,
            y: geometry.top_margin,
        }
    }

    pub fn next_page(&self, geometry: &Geometry) -> Self {
        Self {
            page: self.page + 1,
            y: geometry.top_margin,
        }
    }

    pub fn advance(&self, dy: f64) -> Self {
        Self {
            page: self.page,
            y: self.y + dy,
        }
    }

    pub fn is_at_page_top(&self, geometry: &Geometry) -> bool {
        self.y <= geometry.top_margin
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DrawKind {
    Text,
    TableHeader,
    TableRow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Align {
    Left,
    Center,
    Right,
}

impl fmt::Display for Align {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Align::Left => "left",
            Align::Center => "center",
            Align::Right => "right",
        })
    }
}

/// One cell of a table op, already wrapped to its column.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableCell {
    pub text: String,
    pub lines: Vec<BrokenLine>,
    /// Left edge of the cell box.
    pub x: f64,
    pub width: f64,
    pub align: Align,
}

/// One atomic, positioned piece of content.
///
/// `(x, y)` is the top-left corner of the op's box; `width` and `height`
/// are the box it occupies. Text ops carry their wrapped lines, table ops
/// carry their cells.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DrawOp {
    pub kind: DrawKind,
    pub content: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub page: usize,
    pub font_size: f64,
    pub indent: f64,
    pub bold: bool,
    pub align: Align,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lines: Vec<BrokenLine>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cells: Vec<TableCell>,
}

/// Typography and spacing of one kind of text unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitStyle {
    pub font_size: f64,
    pub bold: bool,
    pub indent: f64,
    pub align: Align,
    pub spacing_after: f64,
}

impl UnitStyle {
    pub const TITLE: UnitStyle = UnitStyle {
        font_size: 18.0,
        bold: true,
        indent: 0.0,
        align: Align::Center,
        spacing_after: 4.0 * MM,
    };
    pub const SUBTITLE: UnitStyle = UnitStyle {
        font_size: 11.0,
        bold: false,
        indent: 0.0,
        align: Align::Left,
        spacing_after: 1.0 * MM,
    };
    pub const SECTION_TITLE: UnitStyle = UnitStyle {
        font_size: 13.0,
        bold: true,
        indent: 0.0,
        align: Align::Left,
        spacing_after: 2.0 * MM,
    };
    pub const GROUP_TITLE: UnitStyle = UnitStyle {
        font_size: 12.0,
        bold: true,
        indent: 0.0,
        align: Align::Left,
        spacing_after: 1.5 * MM,
    };
    pub const BODY: UnitStyle = UnitStyle {
        font_size: 11.0,
        bold: false,
        indent: 0.0,
        align: Align::Left,
        spacing_after: 2.0 * MM,
    };
    pub const BULLET: UnitStyle = UnitStyle {
        font_size: 11.0,
        bold: false,
        indent: 4.0 * MM,
        align: Align::Left,
        spacing_after: 1.5 * MM,
    };
    pub const DETAIL: UnitStyle = UnitStyle {
        font_size: 10.0,
        bold: false,
        indent: 8.0 * MM,
        align: Align::Left,
        spacing_after: 1.0 * MM,
    };

    fn weight(&self) -> u32 {
        if self.bold {
            700
        } else {
            400
        }
    }
}

/// A text unit waiting to be measured and placed.
#[derive(Debug, Clone)]
struct Unit {
    text: String,
    style: UnitStyle,
    /// Never end a page between this unit and the next one.
    keep_with_next: bool,
}

impl Unit {
    fn new(text: impl Into<String>, style: UnitStyle) -> Self {
        Self {
            text: text.into(),
            style,
            keep_with_next: false,
        }
    }

    fn heading(text: impl Into<String>, style: UnitStyle, has_content: bool) -> Self {
        Self {
            text: text.into(),
            style,
            keep_with_next: has_content,
        }
    }
}

struct MeasuredUnit {
    unit: Unit,
    lines: Vec<BrokenLine>,
    height: f64,
}

/// The main layout engine.
pub struct LayoutEngine {
    font_context: FontContext,
    text_layout: TextLayout,
}

impl Default for LayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LayoutEngine {
    pub fn new() -> Self {
        Self {
            font_context: FontContext::new(),
            text_layout: TextLayout::new(),
        }
    }

    pub fn font_context(&self) -> &FontContext {
        &self.font_context
    }

    /// Lay out the whole report.
    ///
    /// Identical input always produces identical output.
    pub fn layout(&self, model: &ReportModel, geometry: &Geometry) -> Vec<DrawOp> {
        let mut ops = Vec::new();
        let mut cursor = Cursor::start(geometry);

        for section in &model.sections {
            cursor = match section {
                Section::MetricsTable { rows } => {
                    let (table_ops, next) =
                        table::layout_table(rows, cursor, geometry, &self.font_context);
                    ops.extend(table_ops);
                    next
                }
                other => {
                    let units = expand_section(other);
                    self.place_units(&units, cursor, geometry, &mut ops)
                }
            };
            cursor = cursor.advance(SECTION_GAP);
        }

        log::debug!(
            "laid out report {} into {} ops over {} page(s)",
            model.meta.report_id,
            ops.len(),
            Self::page_count(&ops)
        );
        ops
    }

    /// Number of physical pages the ops occupy. An empty list still makes
    /// one (blank) page.
    pub fn page_count(ops: &[DrawOp]) -> usize {
        ops.iter().map(|op| op.page + 1).max().unwrap_or(1)
    }

    /// The ops painted on one page, in emission order.
    pub fn ops_on_page(ops: &[DrawOp], page: usize) -> impl Iterator<Item = &DrawOp> {
        ops.iter().filter(move |op| op.page == page)
    }

    fn measure(&self, unit: &Unit, geometry: &Geometry) -> MeasuredUnit {
        let style = &unit.style;
        let lines = self.text_layout.break_into_lines(
            &self.font_context,
            &unit.text,
            geometry.content_width - style.indent,
            style.font_size,
            FONT_FAMILY,
            style.weight(),
        );
        let height = lines.len() as f64 * style.font_size * LINE_HEIGHT;
        MeasuredUnit {
            unit: unit.clone(),
            lines,
            height,
        }
    }

    fn place_units(
        &self,
        units: &[Unit],
        mut cursor: Cursor,
        geometry: &Geometry,
        ops: &mut Vec<DrawOp>,
    ) -> Cursor {
        let measured: Vec<MeasuredUnit> =
            units.iter().map(|u| self.measure(u, geometry)).collect();

        for (i, m) in measured.iter().enumerate() {
            let group_height = keep_group_height(&measured[i..]);

            match decide_break(&cursor, group_height, geometry) {
                BreakDecision::Place | BreakDecision::Overflow => {}
                BreakDecision::MoveToNextPage => {
                    log::debug!(
                        "page break before '{}' (y={:.1}, needs {:.1})",
                        truncate(&m.unit.text),
                        cursor.y,
                        group_height
                    );
                    cursor = cursor.next_page(geometry);
                }
            }
            if m.height > geometry.usable_height() {
                log::warn!(
                    "unit '{}' is taller than the page ({:.1} > {:.1}), overflowing",
                    truncate(&m.unit.text),
                    m.height,
                    geometry.usable_height()
                );
            }

            let style = &m.unit.style;
            ops.push(DrawOp {
                kind: DrawKind::Text,
                content: m.unit.text.clone(),
                x: geometry.left_margin + style.indent,
                y: cursor.y,
                width: geometry.content_width - style.indent,
                height: m.height,
                page: cursor.page,
                font_size: style.font_size,
                indent: style.indent,
                bold: style.bold,
                align: style.align,
                lines: m.lines.clone(),
                cells: Vec::new(),
            });
            cursor = cursor.advance(m.height + style.spacing_after);
        }

        cursor
    }
}

/// Height of the first unit plus every unit chained to it by
/// keep-with-next, so a section title and a group heading both travel with
/// the first item under them.
fn keep_group_height(units: &[MeasuredUnit]) -> f64 {
    let mut height = 0.0;
    for m in units {
        height += m.height;
        if !m.unit.keep_with_next {
            break;
        }
        height += m.unit.style.spacing_after;
    }
    height
}

/// Lay out a report with a fresh engine.
pub fn layout(model: &ReportModel, geometry: &Geometry) -> Vec<DrawOp> {
    LayoutEngine::new().layout(model, geometry)
}

const BULLET: &str = "\u{2022} ";

/// Flatten a non-table section into text units, in reading order.
fn expand_section(section: &Section) -> Vec<Unit> {
    let mut units = Vec::new();
    match section {
        Section::Header {
            title,
            subtitle_lines,
        } => {
            units.push(Unit::heading(
                title.as_str(),
                UnitStyle::TITLE,
                !subtitle_lines.is_empty(),
            ));
            for line in subtitle_lines {
                units.push(Unit::new(line.as_str(), UnitStyle::SUBTITLE));
            }
        }
        Section::BulletList { title, items } => {
            units.push(Unit::heading(
                title.as_str(),
                UnitStyle::SECTION_TITLE,
                !items.is_empty(),
            ));
            for item in items {
                units.push(Unit::new(format!("{BULLET}{item}"), UnitStyle::BULLET));
            }
        }
        Section::ActionList { title, items } => {
            units.push(Unit::heading(
                title.as_str(),
                UnitStyle::SECTION_TITLE,
                !items.is_empty(),
            ));
            for item in items {
                units.push(Unit::new(format!("{BULLET}{}", item.action), UnitStyle::BULLET));
                units.push(Unit::new(format!("Benefit: {}", item.benefit), UnitStyle::DETAIL));
                units.push(Unit::new(format!("Timeline: {}", item.timeline), UnitStyle::DETAIL));
            }
        }
        Section::NarrativeBlock { title, text } => {
            units.push(Unit::heading(
                title.as_str(),
                UnitStyle::SECTION_TITLE,
                !text.is_empty(),
            ));
            if !text.is_empty() {
                units.push(Unit::new(text.as_str(), UnitStyle::BODY));
            }
        }
        Section::GroupedList { title, groups } => {
            units.push(Unit::heading(
                title.as_str(),
                UnitStyle::SECTION_TITLE,
                !groups.is_empty(),
            ));
            for group in groups {
                units.push(Unit::heading(
                    format!("{}:", group.category),
                    UnitStyle::GROUP_TITLE,
                    !group.items.is_empty(),
                ));
                for rec in &group.items {
                    units.push(Unit::new(format!("{BULLET}{}", rec.product), UnitStyle::BULLET));
                    units.push(Unit::new(format!("Reason: {}", rec.reason), UnitStyle::DETAIL));
                }
            }
        }
        Section::MetricsTable { .. } => {}
    }
    units
}

fn truncate(text: &str) -> String {
    let mut short: String = text.chars().take(32).collect();
    if short.len() < text.len() {
        short.push_str("...");
    }
    short
}
