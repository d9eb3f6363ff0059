//! Plain-text parser. Blank lines split paragraphs; form feeds split pages.

use tracing::{debug, instrument};

use madforge_shared::{
    DocumentParser, ParsedDocument, ParsedElement, ParsedItem, Result, SourceInput,
    SourceMetadata,
};

use crate::render;

#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextParser;

impl DocumentParser for PlainTextParser {
    fn name(&self) -> &str {
        "plain-text"
    }

    fn accepts(&self, source: &SourceInput) -> bool {
        source.has_extension(&["txt", "text"]) || source.has_content_type(&["text/plain"])
    }

    #[instrument(skip_all, fields(source = %source.location))]
    fn parse(&self, source: &SourceInput) -> Result<ParsedDocument> {
        let text = source.text()?;
        let mut elements = Vec::new();

        // Text extractors such as pdftotext emit \x0c between pages.
        for (page, page_text) in text.split('\x0c').enumerate() {
            let normalized = page_text.replace("\r\n", "\n");
            for para in normalized.split("\n\n") {
                let para = para
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .collect::<Vec<_>>()
                    .join(" ");
                if !para.is_empty() {
                    elements.push(ParsedItem::Element(ParsedElement::new(
                        para,
                        "paragraph",
                        page as u32,
                    )));
                }
            }
        }

        debug!(elements = elements.len(), "plain text parsed");

        Ok(ParsedDocument {
            html: render::render_html(&elements),
            markdown: text.to_string(),
            elements,
            metadata: SourceMetadata::default(),
        })
    }
}
