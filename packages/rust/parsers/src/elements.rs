//! Parser for pre-parsed element dumps.
//!
//! Layout parsers (PDF, OCR, office formats) are external collaborators. They
//! hand us their flat element stream as JSON:
//!
//! ```json
//! { "metadata": { "title": "...", "author": "..." },
//!   "markdown": "...", "html": "...",
//!   "elements": [ { "text": "...", "label": "section-header", "page": 1,
//!                   "bbox": { "l": 0, "t": 0, "r": 10, "b": 5 } } ] }
//! ```
//!
//! A single unreadable element becomes [`ParsedItem::Malformed`] instead of
//! failing the whole document.

use serde_json::Value;
use tracing::{debug, instrument, warn};

use madforge_shared::{
    DocumentParser, MadError, ParsedDocument, ParsedElement, ParsedItem, Result, SourceInput,
    SourceMetadata,
};

use crate::render;

/// Reads the JSON element-dump format.
#[derive(Debug, Clone, Copy, Default)]
pub struct ElementDumpParser;

impl DocumentParser for ElementDumpParser {
    fn name(&self) -> &str {
        "element-dump"
    }

    fn accepts(&self, source: &SourceInput) -> bool {
        source.has_extension(&["json"]) || source.has_content_type(&["application/json"])
    }

    #[instrument(skip_all, fields(source = %source.location))]
    fn parse(&self, source: &SourceInput) -> Result<ParsedDocument> {
        let root: Value = serde_json::from_slice(&source.bytes).map_err(|e| {
            MadError::parse(format!("{}: invalid element dump: {e}", source.location))
        })?;

        let raw_elements = root
            .get("elements")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                MadError::parse(format!(
                    "{}: element dump has no `elements` array",
                    source.location
                ))
            })?;

        let elements: Vec<ParsedItem> = raw_elements
            .iter()
            .enumerate()
            .map(|(index, raw)| read_element(index, raw))
            .collect();

        let metadata = match root.get("metadata") {
            Some(raw) => serde_json::from_value::<SourceMetadata>(raw.clone()).unwrap_or_else(|e| {
                warn!(error = %e, "unreadable document metadata, ignoring");
                SourceMetadata::default()
            }),
            None => SourceMetadata::default(),
        };

        let markdown = string_field(&root, "markdown")
            .unwrap_or_else(|| render::render_markdown(&elements));
        let html = string_field(&root, "html").unwrap_or_else(|| render::render_html(&elements));

        debug!(elements = elements.len(), "element dump parsed");

        Ok(ParsedDocument {
            elements,
            metadata,
            markdown,
            html,
        })
    }
}

fn read_element(index: usize, raw: &Value) -> ParsedItem {
    match serde_json::from_value::<ParsedElement>(raw.clone()) {
        Ok(el) => ParsedItem::Element(el),
        Err(e) => ParsedItem::Malformed {
            index,
            reason: e.to_string(),
        },
    }
}

fn string_field(root: &Value, key: &str) -> Option<String> {
    root.get(key).and_then(Value::as_str).map(str::to_string)
}
