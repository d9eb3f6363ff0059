//! Core domain types for MAD documents.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Schema version of the MAD document layout. Bumped only on breaking changes.
pub const FORMAT_VERSION: &str = "1.0";

// ---------------------------------------------------------------------------
// DocumentId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper for document identifiers (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub Uuid);

impl DocumentId {
    /// Generate a fresh document identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for DocumentId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for DocumentId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// Classification of a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Heading,
    Table,
    Figure,
    TextChunk,
    /// Only seen when loading bundles written by other producers.
    Unknown,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Heading => "heading",
            Self::Table => "table",
            Self::Figure => "figure",
            Self::TextChunk => "text_chunk",
            Self::Unknown => "unknown",
        }
    }
}

/// Normalized bounding box. Width/height may be negative on bad parser data.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// One classified unit of extracted document content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentItem {
    /// UUID v5 of the source and stream position; stable across re-runs.
    pub id: String,
    pub text: String,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    /// Raw label reported by the parser (e.g. `section-header`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub page: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BBox>,
}

/// Content items of a single page, in discovery order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub page_number: u32,
    pub content: Vec<ContentItem>,
}

/// The typed, paginated structure of a document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentStructure {
    pub pages: Vec<Page>,
    pub text_chunks: Vec<ContentItem>,
    pub tables: Vec<ContentItem>,
    pub images: Vec<ContentItem>,
    pub headings: Vec<ContentItem>,
    /// Non-blank texts in stream order, each followed by a blank line.
    /// Entity offsets index into this string.
    pub full_text: String,
    pub markdown: String,
    pub html: String,
}

impl ContentStructure {
    /// Total number of classified items.
    pub fn item_count(&self) -> usize {
        self.text_chunks.len() + self.tables.len() + self.images.len() + self.headings.len()
    }
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// A named entity found in `full_text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub text: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start: usize,
    pub end: usize,
    pub confidence: f64,
}

/// Relationship type between two entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationKind {
    CoOccurs,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CoOccurs => "CO_OCCURS",
        }
    }
}

/// A derived, directed edge between two entities of the same run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    pub id: String,
    pub from: String,
    pub to: String,
    #[serde(rename = "type")]
    pub kind: RelationKind,
    pub distance: usize,
    pub confidence: f64,
}

// ---------------------------------------------------------------------------
// Embeddings
// ---------------------------------------------------------------------------

/// Vector embedding of one content item, keyed by the item's id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub text: String,
    pub embedding: Vec<f32>,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub page: u32,
}

pub type EmbeddingMap = BTreeMap<String, EmbeddingRecord>;
pub type EntityMap = BTreeMap<String, Entity>;
pub type RelationshipMap = BTreeMap<String, Relationship>;

// ---------------------------------------------------------------------------
// MadDocument
// ---------------------------------------------------------------------------

/// Descriptive metadata stored in the manifest and the full document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: String,
    pub author: String,
    /// RFC 3339 timestamp of the conversion.
    pub created: String,
    /// Source path or URL as given by the caller.
    pub source: String,
    /// Parser that produced the element stream.
    pub extraction_tool: String,
    /// Tool and version that wrote the bundle.
    pub conversion_tool: String,
}

/// The top-level MAD document record; the unit of persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MadDocument {
    pub format_version: String,
    pub document_id: DocumentId,
    /// SHA-256 over the conversion inputs. Any later mutation invalidates it.
    pub content_hash: String,
    pub metadata: DocumentMetadata,
    pub content: ContentStructure,
    pub embeddings: EmbeddingMap,
    pub entities: EntityMap,
    pub relationships: RelationshipMap,
}

impl MadDocument {
    /// The `manifest.json` view of this document.
    pub fn manifest(&self) -> Manifest {
        Manifest {
            format_version: self.format_version.clone(),
            document_id: self.document_id.clone(),
            content_hash: self.content_hash.clone(),
            metadata: self.metadata.clone(),
        }
    }

    pub fn stats(&self) -> ConversionStats {
        ConversionStats {
            pages: self.content.pages.len(),
            text_chunks: self.content.text_chunks.len(),
            tables: self.content.tables.len(),
            images: self.content.images.len(),
            headings: self.content.headings.len(),
            entities: self.entities.len(),
            relationships: self.relationships.len(),
            embeddings: self.embeddings.len(),
        }
    }
}

/// The `manifest.json` structure stored at the root of each bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub format_version: String,
    pub document_id: DocumentId,
    pub content_hash: String,
    pub metadata: DocumentMetadata,
}

/// Counts reported for every conversion, so callers can spot degraded stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionStats {
    pub pages: usize,
    pub text_chunks: usize,
    pub tables: usize,
    pub images: usize,
    pub headings: usize,
    pub entities: usize,
    pub relationships: usize,
    pub embeddings: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(kind: ContentKind) -> ContentItem {
        ContentItem {
            id: Uuid::now_v7().to_string(),
            text: "Intro".into(),
            kind,
            label: Some("title".into()),
            page: 0,
            bbox: None,
        }
    }

    #[test]
    fn document_id_roundtrip() {
        let id = DocumentId::new();
        let parsed: DocumentId = id.to_string().parse().expect("parse DocumentId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn content_item_uses_type_key() {
        let json = serde_json::to_value(item(ContentKind::TextChunk)).unwrap();
        assert_eq!(json["type"], "text_chunk");
        assert!(json.get("bbox").is_none());
        assert!(json.get("kind").is_none());
    }

    #[test]
    fn relationship_kind_serializes_upper_case() {
        let rel = Relationship {
            id: "rel_a_b".into(),
            from: "a".into(),
            to: "b".into(),
            kind: RelationKind::CoOccurs,
            distance: 10,
            confidence: 0.8,
        };
        let json = serde_json::to_value(&rel).unwrap();
        assert_eq!(json["type"], "CO_OCCURS");
        assert_eq!(json["from"], "a");
    }

    #[test]
    fn stats_count_every_section() {
        let mut content = ContentStructure::default();
        content.headings.push(item(ContentKind::Heading));
        content.text_chunks.push(item(ContentKind::TextChunk));
        content.pages.push(Page {
            page_number: 0,
            content: vec![item(ContentKind::Heading)],
        });
        let doc = MadDocument {
            format_version: FORMAT_VERSION.into(),
            document_id: DocumentId::new(),
            content_hash: "abc".into(),
            metadata: DocumentMetadata {
                title: "T".into(),
                author: "Unknown".into(),
                created: "2025-01-01T00:00:00Z".into(),
                source: "t.json".into(),
                extraction_tool: "elements".into(),
                conversion_tool: "madforge".into(),
            },
            content,
            embeddings: EmbeddingMap::new(),
            entities: EntityMap::new(),
            relationships: RelationshipMap::new(),
        };

        let stats = doc.stats();
        assert_eq!(stats.pages, 1);
        assert_eq!(stats.headings, 1);
        assert_eq!(stats.text_chunks, 1);
        assert_eq!(stats.entities, 0);
        assert_eq!(doc.manifest().content_hash, "abc");
    }
}
