//! Capability interfaces consumed by the conversion pipeline.
//!
//! The parser, embedder and tagger are collaborators: the pipeline only talks
//! to them through these traits. A missing embedder or tagger is modelled as
//! `None` in [`Capabilities`], never as a runtime failure.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{MadError, Result};

// ---------------------------------------------------------------------------
// Source input
// ---------------------------------------------------------------------------

/// Raw bytes of a source document plus what we know about where they came from.
#[derive(Debug, Clone)]
pub struct SourceInput {
    /// Path or URL exactly as the caller supplied it.
    pub location: String,
    /// Final path segment (e.g. `report.json`), used for title fallback.
    pub file_name: String,
    /// Lower-cased extension without the dot, if any.
    pub extension: Option<String>,
    /// `Content-Type` of an HTTP response, without parameters.
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl SourceInput {
    /// Build an input from a location and its bytes, deriving name and extension.
    pub fn new(location: impl Into<String>, bytes: Vec<u8>) -> Self {
        let location = location.into();
        let trimmed = location
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .trim_end_matches('/');
        let file_name = trimmed.rsplit(['/', '\\']).next().unwrap_or_default().to_string();
        let extension = Path::new(&file_name)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase());

        Self {
            location,
            file_name,
            extension,
            content_type: None,
            bytes,
        }
    }

    /// Attach an HTTP content type (parameters such as `charset` are dropped).
    pub fn with_content_type(mut self, content_type: &str) -> Self {
        let mime = content_type.split(';').next().unwrap_or_default().trim();
        if !mime.is_empty() {
            self.content_type = Some(mime.to_lowercase());
        }
        self
    }

    /// File name without its extension; falls back to `document`.
    pub fn stem(&self) -> String {
        let stem = Path::new(&self.file_name)
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        if stem.is_empty() {
            "document".to_string()
        } else {
            stem
        }
    }

    /// Decode the bytes as UTF-8.
    pub fn text(&self) -> Result<&str> {
        std::str::from_utf8(&self.bytes).map_err(|e| {
            MadError::parse(format!("{} is not valid UTF-8: {e}", self.location))
        })
    }

    pub fn has_extension(&self, candidates: &[&str]) -> bool {
        self.extension
            .as_deref()
            .is_some_and(|ext| candidates.contains(&ext))
    }

    pub fn has_content_type(&self, candidates: &[&str]) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| candidates.contains(&ct))
    }
}

// ---------------------------------------------------------------------------
// Parsed document
// ---------------------------------------------------------------------------

/// Bounding box as reported by a layout parser (left/top/right/bottom).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawBBox {
    pub l: f64,
    pub t: f64,
    pub r: f64,
    pub b: f64,
}

/// One element of the parser's flat, ordered element stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedElement {
    #[serde(default)]
    pub text: String,
    /// Layout label such as `title`, `section-header`, `table`, `paragraph`.
    #[serde(default)]
    pub label: Option<String>,
    /// Markup tag when the source is markup (`h1`, `p`, ...).
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default, alias = "page_no")]
    pub page: u32,
    #[serde(default)]
    pub bbox: Option<RawBBox>,
}

impl ParsedElement {
    pub fn new(text: impl Into<String>, label: impl Into<String>, page: u32) -> Self {
        Self {
            text: text.into(),
            label: Some(label.into()),
            tag: None,
            page,
            bbox: None,
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_bbox(mut self, bbox: RawBBox) -> Self {
        self.bbox = Some(bbox);
        self
    }
}

/// An entry of the element stream: either a readable element or a defect.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedItem {
    Element(ParsedElement),
    /// The parser found an element but could not read its fields.
    Malformed { index: usize, reason: String },
}

/// Document-level metadata reported by the parser.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub creator: Option<String>,
}

/// Output of a [`DocumentParser`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedDocument {
    pub elements: Vec<ParsedItem>,
    pub metadata: SourceMetadata,
    /// Markdown export of the whole document.
    pub markdown: String,
    /// HTML export of the whole document.
    pub html: String,
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Turns source bytes into an ordered element stream with exports.
pub trait DocumentParser: Send + Sync {
    /// Human-readable parser name, recorded as `extraction_tool`.
    fn name(&self) -> &str;

    /// Whether this parser handles the given source.
    fn accepts(&self, source: &SourceInput) -> bool;

    /// Parse the source. An error here is fatal for the conversion.
    fn parse(&self, source: &SourceInput) -> Result<ParsedDocument>;
}

/// Maps text to a fixed-length vector.
pub trait Embedder: Send + Sync {
    fn name(&self) -> &str;

    fn encode(&self, text: &str) -> Result<Vec<f32>>;
}

/// A labelled span returned by an [`EntityTagger`].
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedSpan {
    pub text: String,
    pub label: String,
    /// Offsets into the tagged text, in the tagger's unit.
    pub start: usize,
    pub end: usize,
    pub confidence: Option<f64>,
}

/// Finds labelled entity spans in text.
pub trait EntityTagger: Send + Sync {
    fn name(&self) -> &str;

    /// Spans in the order the tagger discovered them.
    fn tag(&self, text: &str) -> Result<Vec<TaggedSpan>>;

    /// Human-readable explanation of a label, if the tagger knows one.
    fn describe_label(&self, _label: &str) -> Option<String> {
        None
    }
}

/// Optional capabilities injected into a pipeline run.
#[derive(Default)]
pub struct Capabilities {
    pub embedder: Option<Box<dyn Embedder>>,
    pub tagger: Option<Box<dyn EntityTagger>>,
}

impl Capabilities {
    /// No embedder and no tagger configured.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with_embedder(mut self, embedder: Box<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    pub fn with_tagger(mut self, tagger: Box<dyn EntityTagger>) -> Self {
        self.tagger = Some(tagger);
        self
    }
}

impl std::fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Capabilities")
            .field("embedder", &self.embedder.as_ref().map(|e| e.name().to_string()))
            .field("tagger", &self.tagger.as_ref().map(|t| t.name().to_string()))
            .finish()
    }
}
