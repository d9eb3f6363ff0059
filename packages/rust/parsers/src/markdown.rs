//! Markdown parser built on `pulldown-cmark` events.

use pulldown_cmark::{Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use tracing::{debug, instrument};

use madforge_shared::{
    DocumentParser, ParsedDocument, ParsedElement, ParsedItem, Result, SourceInput,
    SourceMetadata,
};

/// Parses CommonMark (with tables) into an element stream on page 0.
#[derive(Debug, Clone, Copy, Default)]
pub struct MarkdownParser;

impl DocumentParser for MarkdownParser {
    fn name(&self) -> &str {
        "markdown"
    }

    fn accepts(&self, source: &SourceInput) -> bool {
        source.has_extension(&["md", "markdown", "mdown"])
            || source.has_content_type(&["text/markdown", "text/x-markdown"])
    }

    #[instrument(skip_all, fields(source = %source.location))]
    fn parse(&self, source: &SourceInput) -> Result<ParsedDocument> {
        let text = source.text()?;
        let elements: Vec<ParsedItem> = collect_blocks(text)
            .into_iter()
            .map(ParsedItem::Element)
            .collect();

        let mut html = String::new();
        pulldown_cmark::html::push_html(&mut html, Parser::new_ext(text, options()));

        debug!(elements = elements.len(), "markdown parsed");

        Ok(ParsedDocument {
            elements,
            metadata: SourceMetadata::default(),
            markdown: text.to_string(),
            html,
        })
    }
}

fn options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH
}

/// A block being accumulated from events.
#[derive(Debug, Default)]
struct Block {
    label: &'static str,
    tag: &'static str,
    text: String,
    /// Text seen inside an image (alt text).
    alt: String,
    saw_image: bool,
}

impl Block {
    fn new(label: &'static str, tag: &'static str) -> Self {
        Self {
            label,
            tag,
            ..Self::default()
        }
    }

    fn finish(self) -> Option<ParsedElement> {
        let text = self.text.trim();
        // A paragraph holding nothing but an image is a figure.
        if self.saw_image && text == self.alt.trim() {
            return Some(ParsedElement::new(self.alt.trim(), "figure", 0).with_tag("img"));
        }
        if text.is_empty() {
            return None;
        }
        Some(ParsedElement::new(text, self.label, 0).with_tag(self.tag))
    }
}

#[derive(Debug, Default)]
struct Collector {
    out: Vec<ParsedElement>,
    current: Option<Block>,
    item_depth: usize,
    in_image: bool,
    row: Vec<String>,
    cell: String,
    in_table: bool,
}

impl Collector {
    fn start(&mut self, block: Block) {
        self.flush();
        self.current = Some(block);
    }

    fn flush(&mut self) {
        if let Some(block) = self.current.take() {
            if let Some(el) = block.finish() {
                self.out.push(el);
            }
        }
    }

    fn push_text(&mut self, text: &str) {
        if self.in_table {
            self.cell.push_str(text);
            return;
        }
        let block = self
            .current
            .get_or_insert_with(|| Block::new("paragraph", "p"));
        block.text.push_str(text);
        if self.in_image {
            block.alt.push_str(text);
        }
    }
}

fn heading_tag(level: HeadingLevel) -> (&'static str, &'static str) {
    match level {
        HeadingLevel::H1 => ("title", "h1"),
        HeadingLevel::H2 => ("section-header", "h2"),
        HeadingLevel::H3 => ("section-header", "h3"),
        HeadingLevel::H4 => ("section-header", "h4"),
        HeadingLevel::H5 => ("section-header", "h5"),
        HeadingLevel::H6 => ("section-header", "h6"),
    }
}

fn collect_blocks(text: &str) -> Vec<ParsedElement> {
    let mut c = Collector::default();

    for event in Parser::new_ext(text, options()) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                let (label, tag) = heading_tag(level);
                c.start(Block::new(label, tag));
            }
            Event::End(TagEnd::Heading(_)) => c.flush(),
            Event::Start(Tag::Paragraph) if c.item_depth == 0 => {
                c.start(Block::new("paragraph", "p"));
            }
            Event::End(TagEnd::Paragraph) if c.item_depth == 0 => c.flush(),
            Event::End(TagEnd::Paragraph) => {
                if let Some(block) = c.current.as_mut() {
                    block.text.push(' ');
                }
            }
            Event::Start(Tag::Item) => {
                c.item_depth += 1;
                c.start(Block::new("list-item", "li"));
            }
            Event::End(TagEnd::Item) => {
                c.item_depth = c.item_depth.saturating_sub(1);
                c.flush();
            }
            Event::Start(Tag::CodeBlock(_)) => c.start(Block::new("code", "pre")),
            Event::End(TagEnd::CodeBlock) => c.flush(),
            Event::Start(Tag::Table(_)) => {
                c.start(Block::new("table", "table"));
                c.in_table = true;
            }
            Event::End(TagEnd::TableCell) => {
                let cell = std::mem::take(&mut c.cell);
                c.row.push(cell.trim().to_string());
            }
            Event::End(TagEnd::TableHead) | Event::End(TagEnd::TableRow) => {
                let line = std::mem::take(&mut c.row).join(" | ");
                if let Some(block) = c.current.as_mut() {
                    if !block.text.is_empty() {
                        block.text.push('\n');
                    }
                    block.text.push_str(&line);
                }
            }
            Event::End(TagEnd::Table) => {
                c.in_table = false;
                c.flush();
            }
            Event::Start(Tag::Image { .. }) => {
                c.in_image = true;
                if let Some(block) = c.current.as_mut() {
                    block.saw_image = true;
                }
            }
            Event::End(TagEnd::Image) => c.in_image = false,
            Event::Text(t) | Event::Code(t) => c.push_text(&t),
            Event::SoftBreak | Event::HardBreak => c.push_text(" "),
            _ => {}
        }
    }

    c.flush();
    c.out
}
