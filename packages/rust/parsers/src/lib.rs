//! Source loading and built-in document parsers for MadForge.
//!
//! Layout-heavy formats (PDF, scanned images, office documents) are handled by
//! external layout parsers; their element streams come in through
//! [`ElementDumpParser`]. Markup and text sources are parsed directly.

mod elements;
mod html;
mod markdown;
pub mod render;
mod source;
mod text;

use madforge_shared::{DocumentParser, MadError, Result, SourceInput};

pub use elements::ElementDumpParser;
pub use html::HtmlParser;
pub use markdown::MarkdownParser;
pub use source::{SourceOptions, is_url, load_source};
pub use text::PlainTextParser;

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Holds registered parsers in priority order.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn DocumentParser>>,
}

impl ParserRegistry {
    /// Create a registry with all built-in parsers.
    pub fn new() -> Self {
        Self {
            parsers: vec![
                Box::new(ElementDumpParser),
                Box::new(HtmlParser),
                Box::new(MarkdownParser),
                Box::new(PlainTextParser),
            ],
        }
    }

    /// Create an empty registry.
    pub fn empty() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Register an additional parser with lower priority than the existing ones.
    pub fn register(&mut self, parser: Box<dyn DocumentParser>) {
        self.parsers.push(parser);
    }

    /// Pick the first parser that accepts the source.
    pub fn detect(&self, source: &SourceInput) -> Result<&dyn DocumentParser> {
        self.parsers
            .iter()
            .find(|p| p.accepts(source))
            .map(|p| p.as_ref())
            .ok_or_else(|| unsupported(source))
    }

    pub fn names(&self) -> Vec<&str> {
        self.parsers.iter().map(|p| p.name()).collect()
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn unsupported(source: &SourceInput) -> MadError {
    let what = source
        .extension
        .clone()
        .or_else(|| source.content_type.clone())
        .unwrap_or_else(|| "unknown".to_string());

    if source.has_extension(&["pdf"]) || source.has_content_type(&["application/pdf"]) {
        MadError::UnsupportedFormat(format!(
            "{}: PDF layout analysis is not built in; export the element stream \
             to JSON with a layout parser and convert that file",
            source.location
        ))
    } else {
        MadError::UnsupportedFormat(format!("{} (format: {what})", source.location))
    }
}
