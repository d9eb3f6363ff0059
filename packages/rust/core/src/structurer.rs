//! Flat element stream → typed, paginated [`ContentStructure`].

use std::collections::BTreeMap;

use tracing::{debug, instrument, warn};
use uuid::Uuid;

use madforge_shared::{
    BBox, ContentItem, ContentKind, ContentStructure, Page, ParsedDocument, ParsedElement,
    ParsedItem, RawBBox,
};

const HEADING_LABELS: &[&str] = &["title", "section-header", "page-header"];
const TABLE_LABEL: &str = "table";
const FIGURE_LABEL: &str = "figure";
const UNKNOWN_LABEL: &str = "unknown";

/// Classify a parser label. Missing and unrecognized labels are text chunks.
pub fn classify(label: Option<&str>) -> ContentKind {
    match label {
        Some(l) if HEADING_LABELS.contains(&l) => ContentKind::Heading,
        Some(TABLE_LABEL) => ContentKind::Table,
        Some(FIGURE_LABEL) => ContentKind::Figure,
        _ => ContentKind::TextChunk,
    }
}

/// Convert a `{l, t, r, b}` box to `{x, y, width, height}`. Inverted boxes keep
/// their negative extents.
pub fn normalize_bbox(raw: &RawBBox) -> BBox {
    BBox {
        x: raw.l,
        y: raw.t,
        width: raw.r - raw.l,
        height: raw.b - raw.t,
    }
}

/// Stable id of the `index`-th element of `source`'s stream.
///
/// The same source and stream always yield the same ids, so repeated
/// conversions hash identically.
pub fn item_id(source: &str, index: usize) -> String {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("{source}#{index}").as_bytes()).to_string()
}

/// Build the content structure for a parsed document read from `source`.
#[instrument(skip_all, fields(elements = parsed.elements.len()))]
pub fn structure(parsed: &ParsedDocument, source: &str) -> ContentStructure {
    let mut content = ContentStructure {
        markdown: parsed.markdown.clone(),
        html: parsed.html.clone(),
        ..Default::default()
    };

    // Only text chunks and headings are paginated.
    let mut pages: BTreeMap<u32, Vec<ContentItem>> = BTreeMap::new();

    for (index, item) in parsed.elements.iter().enumerate() {
        let element = match item {
            ParsedItem::Element(el) => el.clone(),
            ParsedItem::Malformed { index: at, reason } => {
                warn!(index = at, %reason, "malformed element, using defaults");
                ParsedElement {
                    label: Some(UNKNOWN_LABEL.to_string()),
                    ..Default::default()
                }
            }
        };

        let kind = classify(element.label.as_deref());
        let content_item = ContentItem {
            id: item_id(source, index),
            text: element.text,
            kind,
            label: element.label,
            page: element.page,
            bbox: element.bbox.as_ref().map(normalize_bbox),
        };

        if !content_item.text.trim().is_empty() {
            content.full_text.push_str(&content_item.text);
            content.full_text.push_str("\n\n");
        }

        match kind {
            ContentKind::Heading => {
                pages
                    .entry(content_item.page)
                    .or_default()
                    .push(content_item.clone());
                content.headings.push(content_item);
            }
            ContentKind::TextChunk => {
                pages
                    .entry(content_item.page)
                    .or_default()
                    .push(content_item.clone());
                content.text_chunks.push(content_item);
            }
            ContentKind::Table => content.tables.push(content_item),
            ContentKind::Figure => content.images.push(content_item),
            ContentKind::Unknown => {}
        }
    }

    content.pages = pages
        .into_iter()
        .map(|(page_number, content)| Page {
            page_number,
            content,
        })
        .collect();

    debug!(
        pages = content.pages.len(),
        text_chunks = content.text_chunks.len(),
        tables = content.tables.len(),
        images = content.images.len(),
        headings = content.headings.len(),
        "content structured"
    );

    content
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn el(text: &str, label: &str, page: u32) -> ParsedItem {
        ParsedItem::Element(ParsedElement::new(text, label, page))
    }

    fn structured(parsed: &ParsedDocument) -> ContentStructure {
        structure(parsed, "reports/q3.json")
    }

    fn doc(elements: Vec<ParsedItem>) -> ParsedDocument {
        ParsedDocument {
            elements,
            ..Default::default()
        }
    }

    #[test]
    fn title_and_paragraph() {
        let content = structured(&doc(vec![
            el("Intro", "title", 0),
            el("Hello world.", "paragraph", 0),
        ]));

        assert_eq!(content.headings.len(), 1);
        assert_eq!(content.text_chunks.len(), 1);
        assert_eq!(content.full_text, "Intro\n\nHello world.\n\n");
        assert_eq!(content.pages.len(), 1);
        assert_eq!(content.pages[0].page_number, 0);
        let texts: Vec<&str> = content.pages[0].content.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["Intro", "Hello world."]);
    }

    #[test]
    fn classification_precedence() {
        assert_eq!(classify(Some("title")), ContentKind::Heading);
        assert_eq!(classify(Some("section-header")), ContentKind::Heading);
        assert_eq!(classify(Some("page-header")), ContentKind::Heading);
        assert_eq!(classify(Some("table")), ContentKind::Table);
        assert_eq!(classify(Some("figure")), ContentKind::Figure);
        assert_eq!(classify(Some("list-item")), ContentKind::TextChunk);
        assert_eq!(classify(None), ContentKind::TextChunk);
    }

    #[test]
    fn ids_are_unique_and_types_known() {
        let content = structured(&doc(vec![
            el("A", "title", 0),
            el("B", "paragraph", 0),
            el("C", "table", 1),
            el("D", "figure", 1),
            el("E", "paragraph", 2),
        ]));

        let all: Vec<&ContentItem> = content
            .text_chunks
            .iter()
            .chain(&content.tables)
            .chain(&content.images)
            .chain(&content.headings)
            .collect();
        let ids: HashSet<&str> = all.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids.len(), 5);
        assert!(all.iter().all(|i| i.kind != ContentKind::Unknown));
    }

    #[test]
    fn full_text_follows_stream_order_across_kinds() {
        let content = structured(&doc(vec![
            el("T", "table", 0),
            el("H", "title", 0),
            el("F", "figure", 1),
        ]));

        assert_eq!(content.full_text, "T\n\nH\n\nF\n\n");
        assert_eq!(content.tables.len(), 1);
        assert_eq!(content.headings.len(), 1);
        assert_eq!(content.images.len(), 1);
    }

    #[test]
    fn ids_are_stable_per_source_and_position() {
        let parsed = doc(vec![el("Intro", "title", 0), el("Body", "paragraph", 0)]);
        let a = structured(&parsed);
        let b = structured(&parsed);
        assert_eq!(a, b);
        assert_eq!(a.headings[0].id, item_id("reports/q3.json", 0));
        assert_eq!(a.text_chunks[0].id, item_id("reports/q3.json", 1));

        let other = structure(&parsed, "reports/q4.json");
        assert_ne!(a.headings[0].id, other.headings[0].id);
    }

    #[test]
    fn pages_exclude_tables_and_figures_and_ascend() {
        let content = structured(&doc(vec![
            el("late", "paragraph", 3),
            el("table", "table", 1),
            el("early", "section-header", 1),
            el("figure", "figure", 2),
        ]));

        let numbers: Vec<u32> = content.pages.iter().map(|p| p.page_number).collect();
        assert_eq!(numbers, vec![1, 3]);
        assert_eq!(content.pages[0].content[0].text, "early");
        assert_eq!(content.tables.len(), 1);
        assert_eq!(content.images.len(), 1);
    }

    #[test]
    fn blank_text_is_kept_but_not_in_full_text() {
        let content = structured(&doc(vec![
            el("   ", "paragraph", 0),
            el("Body", "paragraph", 0),
        ]));
        assert_eq!(content.text_chunks.len(), 2);
        assert_eq!(content.full_text, "Body\n\n");
    }

    #[test]
    fn malformed_element_degrades_to_text_chunk() {
        let content = structured(&doc(vec![
            ParsedItem::Malformed {
                index: 0,
                reason: "bad page".into(),
            },
            el("Fine", "paragraph", 0),
        ]));

        assert_eq!(content.text_chunks.len(), 2);
        let bad = &content.text_chunks[0];
        assert_eq!(bad.text, "");
        assert_eq!(bad.label.as_deref(), Some("unknown"));
        assert_eq!(bad.page, 0);
        assert!(bad.bbox.is_none());
        assert_eq!(content.full_text, "Fine\n\n");
    }

    #[test]
    fn bbox_is_normalized_without_clamping() {
        let item = ParsedItem::Element(
            ParsedElement::new("x", "paragraph", 0).with_bbox(RawBBox {
                l: 10.0,
                t: 50.0,
                r: 30.0,
                b: 20.0,
            }),
        );
        let content = structured(&doc(vec![item]));
        let bbox = content.text_chunks[0].bbox.unwrap();
        assert_eq!(bbox.x, 10.0);
        assert_eq!(bbox.y, 50.0);
        assert_eq!(bbox.width, 20.0);
        assert_eq!(bbox.height, -30.0);
    }

    #[test]
    fn exports_are_carried_over() {
        let parsed = ParsedDocument {
            markdown: "# Intro".into(),
            html: "<h1>Intro</h1>".into(),
            ..Default::default()
        };
        let content = structured(&parsed);
        assert_eq!(content.markdown, "# Intro");
        assert_eq!(content.html, "<h1>Intro</h1>");
        assert!(content.pages.is_empty());
    }
}
