//! HTML parser: walks block-level elements in document order.

use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::{debug, instrument, warn};

use madforge_shared::{
    DocumentParser, ParsedDocument, ParsedElement, ParsedItem, Result, SourceInput,
    SourceMetadata,
};

use crate::render;

/// Tags that become elements. Nested matches are folded into the outermost one.
const BLOCK_TAGS: &[&str] = &[
    "h1", "h2", "h3", "h4", "h5", "h6", "p", "li", "pre", "blockquote", "table", "figure", "img",
];

/// Page chrome that never contributes content.
const SKIP_TAGS: &[&str] = &["nav", "footer", "aside", "script", "style", "noscript", "template"];

static BLOCK_SEL: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse("h1, h2, h3, h4, h5, h6, p, li, pre, blockquote, table, figure, img")
        .expect("valid selector")
});
static TITLE_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("title").expect("valid selector"));
static AUTHOR_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[name="author"]"#).expect("valid selector"));
static GENERATOR_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"meta[name="generator"]"#).expect("valid selector"));
static ROW_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("tr").expect("valid selector"));
static CELL_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("th, td").expect("valid selector"));
static CAPTION_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("figcaption").expect("valid selector"));
static IMG_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("img").expect("valid selector"));

/// Parses HTML pages into an element stream. HTML has no pages: everything is page 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlParser;

impl DocumentParser for HtmlParser {
    fn name(&self) -> &str {
        "html"
    }

    fn accepts(&self, source: &SourceInput) -> bool {
        source.has_extension(&["html", "htm", "xhtml"])
            || source.has_content_type(&["text/html", "application/xhtml+xml"])
    }

    #[instrument(skip_all, fields(source = %source.location))]
    fn parse(&self, source: &SourceInput) -> Result<ParsedDocument> {
        let html = source.text()?;
        let doc = Html::parse_document(html);

        let elements: Vec<ParsedItem> = doc
            .select(&BLOCK_SEL)
            .filter(|el| !is_nested_or_chrome(el))
            .filter_map(to_element)
            .map(ParsedItem::Element)
            .collect();

        let metadata = SourceMetadata {
            title: first_text(&doc, &TITLE_SEL),
            author: meta_content(&doc, &AUTHOR_SEL),
            creator: meta_content(&doc, &GENERATOR_SEL),
        };

        let markdown = to_markdown(html).unwrap_or_else(|| render::render_markdown(&elements));

        debug!(elements = elements.len(), "html parsed");

        Ok(ParsedDocument {
            elements,
            metadata,
            markdown,
            html: html.to_string(),
        })
    }
}

fn is_nested_or_chrome(el: &ElementRef) -> bool {
    el.ancestors().filter_map(ElementRef::wrap).any(|a| {
        let name = a.value().name();
        BLOCK_TAGS.contains(&name) || SKIP_TAGS.contains(&name)
    })
}

fn to_element(el: ElementRef) -> Option<ParsedElement> {
    let tag = el.value().name().to_string();
    let (label, text) = match tag.as_str() {
        "h1" => ("title", collapse(el.text())),
        "h2" | "h3" | "h4" | "h5" | "h6" => ("section-header", collapse(el.text())),
        "li" => ("list-item", collapse(el.text())),
        "pre" => ("code", el.text().collect::<String>().trim_end().to_string()),
        "table" => ("table", table_text(&el)),
        "figure" => ("figure", figure_text(&el)),
        "img" => ("figure", el.value().attr("alt").unwrap_or_default().trim().to_string()),
        _ => ("paragraph", collapse(el.text())),
    };

    if text.is_empty() && label != "figure" {
        return None;
    }

    Some(ParsedElement::new(text, label, 0).with_tag(tag))
}

/// Join text nodes and collapse runs of whitespace.
fn collapse<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// One line per row, cells separated by ` | `.
fn table_text(table: &ElementRef) -> String {
    table
        .select(&ROW_SEL)
        .map(|row| {
            row.select(&CELL_SEL)
                .map(|cell| collapse(cell.text()))
                .collect::<Vec<_>>()
                .join(" | ")
        })
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn figure_text(figure: &ElementRef) -> String {
    if let Some(caption) = figure.select(&CAPTION_SEL).next() {
        return collapse(caption.text());
    }
    figure
        .select(&IMG_SEL)
        .next()
        .and_then(|img| img.value().attr("alt"))
        .unwrap_or_default()
        .trim()
        .to_string()
}

fn first_text(doc: &Html, sel: &Selector) -> Option<String> {
    doc.select(sel)
        .next()
        .map(|el| collapse(el.text()))
        .filter(|t| !t.is_empty())
}

fn meta_content(doc: &Html, sel: &Selector) -> Option<String> {
    doc.select(sel)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
}

fn to_markdown(html: &str) -> Option<String> {
    let converter = htmd::HtmlToMarkdown::builder()
        .skip_tags(vec!["script", "style", "nav", "iframe", "noscript", "svg", "head"])
        .build();

    match converter.convert(html) {
        Ok(md) => Some(md),
        Err(e) => {
            warn!(error = %e, "htmd conversion failed, rendering from elements");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!doctype html>
<html><head>
  <title>Widget Guide</title>
  <meta name="author" content="Ada Lovelace">
  <meta name="generator" content="DocSite 3">
</head><body>
  <nav><p>Home | About</p></nav>
  <h1>Widgets</h1>
  <p>Widgets are   small.</p>
  <ul><li><p>First point</p></li><li>Second point</li></ul>
  <h2>Sizes</h2>
  <table><tr><th>Size</th><th>Weight</th></tr><tr><td>S</td><td>1kg</td></tr></table>
  <figure><img src="w.png" alt="A widget"><figcaption>Figure 1: widget</figcaption></figure>
  <footer><p>Copyright</p></footer>
</body></html>"#;

    fn parse(html: &str) -> ParsedDocument {
        HtmlParser
            .parse(&SourceInput::new("guide.html", html.as_bytes().to_vec()))
            .unwrap()
    }

    fn elements(doc: &ParsedDocument) -> Vec<&ParsedElement> {
        doc.elements
            .iter()
            .filter_map(|item| match item {
                ParsedItem::Element(el) => Some(el),
                ParsedItem::Malformed { .. } => None,
            })
            .collect()
    }

    #[test]
    fn extracts_blocks_in_document_order() {
        let doc = parse(PAGE);
        let els = elements(&doc);
        let summary: Vec<(&str, &str)> = els
            .iter()
            .map(|e| (e.label.as_deref().unwrap(), e.text.as_str()))
            .collect();

        assert_eq!(
            summary,
            vec![
                ("title", "Widgets"),
                ("paragraph", "Widgets are small."),
                ("list-item", "First point"),
                ("list-item", "Second point"),
                ("section-header", "Sizes"),
                ("table", "Size | Weight\nS | 1kg"),
                ("figure", "Figure 1: widget"),
            ]
        );
        assert_eq!(els[0].tag.as_deref(), Some("h1"));
    }

    #[test]
    fn reads_head_metadata() {
        let doc = parse(PAGE);
        assert_eq!(doc.metadata.title.as_deref(), Some("Widget Guide"));
        assert_eq!(doc.metadata.author.as_deref(), Some("Ada Lovelace"));
        assert_eq!(doc.metadata.creator.as_deref(), Some("DocSite 3"));
    }

    #[test]
    fn keeps_source_html_and_exports_markdown() {
        let doc = parse(PAGE);
        assert_eq!(doc.html, PAGE);
        assert!(doc.markdown.contains("Widgets"));
        assert!(!doc.markdown.contains("Home | About"));
    }

    #[test]
    fn standalone_image_becomes_figure() {
        let doc = parse(r#"<body><img src="x.png" alt="Chart"></body>"#);
        let els = elements(&doc);
        assert_eq!(els.len(), 1);
        assert_eq!(els[0].label.as_deref(), Some("figure"));
        assert_eq!(els[0].text, "Chart");
    }
}
