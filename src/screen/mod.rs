//! # Screen Sink
//!
//! Renders a [`ReportModel`] as a DOM-equivalent node tree for on-screen
//! display. Screens scroll, so nothing here paginates; the sink only needs
//! the sections in order. The native currency glyph is kept as is.

use crate::layout::table::HEADER_LABELS;
use crate::model::{ReportModel, Section};
use std::fmt::Write as FmtWrite;

/// A node of the rendered screen tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ScreenNode {
    Element {
        tag: &'static str,
        class: Option<String>,
        children: Vec<ScreenNode>,
    },
    Text(String),
}

const VOID_TAGS: [&str; 1] = ["br"];

impl ScreenNode {
    fn element(tag: &'static str, class: Option<&str>, children: Vec<ScreenNode>) -> Self {
        ScreenNode::Element {
            tag,
            class: class.map(str::to_string),
            children,
        }
    }

    fn text_el(tag: &'static str, class: Option<&str>, text: &str) -> Self {
        Self::element(tag, class, vec![ScreenNode::Text(text.to_string())])
    }

    pub fn tag(&self) -> Option<&'static str> {
        match self {
            ScreenNode::Element { tag, .. } => Some(*tag),
            ScreenNode::Text(_) => None,
        }
    }

    pub fn class(&self) -> Option<&str> {
        match self {
            ScreenNode::Element { class, .. } => class.as_deref(),
            ScreenNode::Text(_) => None,
        }
    }

    pub fn children(&self) -> &[ScreenNode] {
        match self {
            ScreenNode::Element { children, .. } => children,
            ScreenNode::Text(_) => &[],
        }
    }

    /// All text below this node, concatenated in document order.
    pub fn text_content(&self) -> String {
        match self {
            ScreenNode::Text(t) => t.clone(),
            ScreenNode::Element { children, .. } => {
                children.iter().map(ScreenNode::text_content).collect()
            }
        }
    }

    /// Every element with the given tag, in document order.
    pub fn find_all(&self, wanted: &str) -> Vec<&ScreenNode> {
        let mut found = Vec::new();
        self.collect(wanted, &mut found);
        found
    }

    fn collect<'a>(&'a self, wanted: &str, found: &mut Vec<&'a ScreenNode>) {
        if let ScreenNode::Element { tag, children, .. } = self {
            if *tag == wanted {
                found.push(self);
            }
            for child in children {
                child.collect(wanted, found);
            }
        }
    }

    /// Serialize to HTML markup. All text is escaped.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        match self {
            ScreenNode::Text(t) => out.push_str(&escape_html(t)),
            ScreenNode::Element {
                tag,
                class,
                children,
            } => {
                let _ = write!(out, "<{}", tag);
                if let Some(class) = class {
                    let _ = write!(out, " class=\"{}\"", escape_html(class));
                }
                out.push('>');
                if VOID_TAGS.contains(tag) {
                    return;
                }
                for child in children {
                    child.write_html(out);
                }
                let _ = write!(out, "</{}>", tag);
            }
        }
    }
}

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub struct ScreenSink;

impl ScreenSink {
    /// Render the model as a tree rooted at `<article class="report">`.
    pub fn render(model: &ReportModel) -> ScreenNode {
        let children = model.sections.iter().map(render_section).collect();
        ScreenNode::element("article", Some("report"), children)
    }

    /// Render straight to HTML markup.
    pub fn render_html(model: &ReportModel) -> String {
        Self::render(model).to_html()
    }
}

fn render_section(section: &Section) -> ScreenNode {
    match section {
        Section::Header {
            title,
            subtitle_lines,
        } => {
            let mut children = vec![ScreenNode::text_el("h1", None, title)];
            children.extend(
                subtitle_lines
                    .iter()
                    .map(|line| ScreenNode::text_el("p", Some("subtitle"), line)),
            );
            ScreenNode::element("header", None, children)
        }
        Section::MetricsTable { rows } => {
            let head = ScreenNode::element(
                "thead",
                None,
                vec![ScreenNode::element(
                    "tr",
                    None,
                    vec![
                        ScreenNode::text_el("th", None, HEADER_LABELS[0]),
                        ScreenNode::text_el("th", Some("num"), HEADER_LABELS[1]),
                    ],
                )],
            );
            let body = ScreenNode::element(
                "tbody",
                None,
                rows.iter()
                    .map(|row| {
                        ScreenNode::element(
                            "tr",
                            None,
                            vec![
                                ScreenNode::text_el("td", None, &row.label),
                                ScreenNode::text_el("td", Some("num"), &row.value),
                            ],
                        )
                    })
                    .collect(),
            );
            ScreenNode::element("table", Some("metrics"), vec![head, body])
        }
        Section::BulletList { title, items } => titled(
            section.kind(),
            title,
            vec![ScreenNode::element(
                "ul",
                None,
                items
                    .iter()
                    .map(|item| ScreenNode::text_el("li", None, item))
                    .collect(),
            )],
        ),
        Section::ActionList { title, items } => titled(
            section.kind(),
            title,
            vec![ScreenNode::element(
                "ul",
                None,
                items
                    .iter()
                    .map(|item| {
                        ScreenNode::element(
                            "li",
                            None,
                            vec![
                                ScreenNode::text_el("strong", None, &item.action),
                                ScreenNode::element("br", None, vec![]),
                                ScreenNode::text_el("span", Some("detail"), &format!("Benefit: {}", item.benefit)),
                                ScreenNode::element("br", None, vec![]),
                                ScreenNode::text_el("span", Some("detail"), &format!("Timeline: {}", item.timeline)),
                            ],
                        )
                    })
                    .collect(),
            )],
        ),
        Section::NarrativeBlock { title, text } => {
            let body = if text.is_empty() {
                vec![]
            } else {
                vec![ScreenNode::text_el("p", None, text)]
            };
            titled(section.kind(), title, body)
        }
        Section::GroupedList { title, groups } => {
            let mut body = Vec::new();
            for group in groups {
                body.push(ScreenNode::text_el("h4", None, &format!("{}:", group.category)));
                body.push(ScreenNode::element(
                    "ul",
                    None,
                    group
                        .items
                        .iter()
                        .map(|rec| {
                            ScreenNode::element(
                                "li",
                                None,
                                vec![
                                    ScreenNode::text_el("strong", None, &rec.product),
                                    ScreenNode::element("br", None, vec![]),
                                    ScreenNode::text_el("span", Some("detail"), &format!("Reason: {}", rec.reason)),
                                ],
                            )
                        })
                        .collect(),
                ));
            }
            titled(section.kind(), title, body)
        }
    }
}

fn titled(kind: &str, title: &str, body: Vec<ScreenNode>) -> ScreenNode {
    let mut children = vec![ScreenNode::text_el("h3", None, title)];
    children.extend(body);
    ScreenNode::element("section", Some(kind), children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Industry, MetricRow, ReportMeta};
    use chrono::TimeZone;

    fn model(sections: Vec<Section>) -> ReportModel {
        ReportModel {
            meta: ReportMeta {
                industry: Industry::Logistics,
                report_id: "3".to_string(),
                generated_at: chrono::Utc.with_ymd_and_hms(2024, 5, 5, 12, 0, 0).unwrap(),
            },
            sections,
        }
    }

    #[test]
    fn test_keeps_native_glyph() {
        let m = model(vec![Section::MetricsTable {
            rows: vec![MetricRow {
                label: "Profit".into(),
                value: "\u{20B9}20000".into(),
            }],
        }]);
        let html = ScreenSink::render_html(&m);
        assert!(html.contains("<td class=\"num\">\u{20B9}20000</td>"));
        assert!(!html.contains("Rs."));
    }

    #[test]
    fn test_escapes_content() {
        let m = model(vec![Section::NarrativeBlock {
            title: "Guidance".into(),
            text: "Use <script> & \"quotes\"".into(),
        }]);
        let html = ScreenSink::render_html(&m);
        assert!(html.contains("<p>Use &lt;script&gt; &amp; &quot;quotes&quot;</p>"));
    }

    #[test]
    fn test_sections_in_order() {
        let m = model(vec![
            Section::BulletList {
                title: "What is going well".into(),
                items: vec!["a".into()],
            },
            Section::BulletList {
                title: "Risks".into(),
                items: vec![],
            },
        ]);
        let root = ScreenSink::render(&m);
        let titles: Vec<String> = root.find_all("h3").iter().map(|n| n.text_content()).collect();
        assert_eq!(titles, vec!["What is going well", "Risks"]);
        assert_eq!(root.children()[0].class(), Some("bullet-list"));
    }

    #[test]
    fn test_void_br() {
        let br = ScreenNode::element("br", None, vec![]);
        assert_eq!(br.to_html(), "<br>");
    }
}
