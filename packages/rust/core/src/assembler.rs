//! Document assembly: metadata resolution and content hashing.
//!
//! The content hash is SHA-256 over the canonical JSON form (object keys
//! sorted, no whitespace) of title, author, source and the derived data.
//! `document_id` and the creation timestamp are not hashed.

use chrono::Utc;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

use madforge_shared::{
    ContentStructure, DocumentId, DocumentMetadata, EmbeddingMap, EntityMap, FORMAT_VERSION,
    MadDocument, ParsedDocument, ParsedItem, RelationshipMap, Result, SourceMetadata,
};

/// Longest title taken from the document body.
pub const MAX_TITLE_CHARS: usize = 100;

pub const UNKNOWN_AUTHOR: &str = "Unknown";

/// Everything the assembler needs besides the derived stages.
#[derive(Debug, Clone, Default)]
pub struct AssembleInput {
    /// Source path or URL as given by the caller.
    pub source: String,
    /// Fallback title when nothing better is found.
    pub source_stem: String,
    /// Name of the parser that produced the element stream.
    pub extraction_tool: String,
    pub title: Option<String>,
    pub author: Option<String>,
}

/// Outputs of the structuring, graph and embedding stages.
#[derive(Debug, Clone, Default)]
pub struct Derived {
    pub content: ContentStructure,
    pub embeddings: EmbeddingMap,
    pub entities: EntityMap,
    pub relationships: RelationshipMap,
}

/// The hashed projection of a document. Field names are part of the hash.
#[derive(Serialize)]
struct HashInput<'a> {
    title: &'a str,
    author: &'a str,
    source: &'a str,
    content_data: &'a ContentStructure,
    embeddings_data: &'a EmbeddingMap,
    entities_data: &'a EntityMap,
    relationships_data: &'a RelationshipMap,
}

// ---------------------------------------------------------------------------
// Metadata resolution
// ---------------------------------------------------------------------------

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Title precedence: override, parser metadata, first title-like element, source stem.
pub fn resolve_title(title: Option<&str>, parsed: &ParsedDocument, source_stem: &str) -> String {
    if let Some(t) = non_blank(title).or_else(|| non_blank(parsed.metadata.title.as_deref())) {
        return t.to_string();
    }

    let from_body = parsed.elements.iter().find_map(|item| {
        let ParsedItem::Element(el) = item else {
            return None;
        };
        let title_like = el
            .label
            .as_deref()
            .is_some_and(|l| l.to_ascii_lowercase().contains("title"))
            || matches!(el.tag.as_deref(), Some("h1" | "title"));
        let text = el.text.trim();
        (title_like && !text.is_empty()).then(|| text.chars().take(MAX_TITLE_CHARS).collect::<String>())
    });

    from_body.unwrap_or_else(|| source_stem.to_string())
}

/// Author precedence: override, metadata author, metadata creator, `"Unknown"`.
pub fn resolve_author(author: Option<&str>, metadata: &SourceMetadata) -> String {
    non_blank(author)
        .or_else(|| non_blank(metadata.author.as_deref()))
        .or_else(|| non_blank(metadata.creator.as_deref()))
        .unwrap_or(UNKNOWN_AUTHOR)
        .to_string()
}

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

/// SHA-256 hex digest of the canonical JSON of the hashed fields.
pub fn content_hash(
    metadata: &DocumentMetadata,
    content: &ContentStructure,
    embeddings: &EmbeddingMap,
    entities: &EntityMap,
    relationships: &RelationshipMap,
) -> Result<String> {
    let input = HashInput {
        title: &metadata.title,
        author: &metadata.author,
        source: &metadata.source,
        content_data: content,
        embeddings_data: embeddings,
        entities_data: entities,
        relationships_data: relationships,
    };

    let canonical = canonical_json(&input)?;

    let mut hasher = Sha256::new();
    hasher.update(canonical.as_bytes());
    Ok(format!("{:x}", hasher.finalize()))
}

/// Compact JSON with every object's keys in byte order, whatever map type
/// `serde_json` is built with.
fn canonical_json<T: Serialize>(data: &T) -> Result<String> {
    Ok(serde_json::to_string(&sort_keys(serde_json::to_value(data)?))?)
}

fn sort_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sort_keys(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_keys).collect()),
        other => other,
    }
}

/// Recompute the hash of a stored document and compare.
pub fn verify_content_hash(doc: &MadDocument) -> Result<bool> {
    let expected = content_hash(
        &doc.metadata,
        &doc.content,
        &doc.embeddings,
        &doc.entities,
        &doc.relationships,
    )?;
    Ok(expected == doc.content_hash)
}

// ---------------------------------------------------------------------------
// Assembly
// ---------------------------------------------------------------------------

/// Merge the stage outputs into a versioned, hashed document.
#[instrument(skip_all, fields(source = %input.source))]
pub fn assemble(
    input: &AssembleInput,
    parsed: &ParsedDocument,
    derived: Derived,
) -> Result<MadDocument> {
    let Derived {
        content,
        embeddings,
        entities,
        relationships,
    } = derived;

    let metadata = DocumentMetadata {
        title: resolve_title(input.title.as_deref(), parsed, &input.source_stem),
        author: resolve_author(input.author.as_deref(), &parsed.metadata),
        created: Utc::now().to_rfc3339(),
        source: input.source.clone(),
        extraction_tool: input.extraction_tool.clone(),
        conversion_tool: format!("madforge {}", env!("CARGO_PKG_VERSION")),
    };

    let content_hash = content_hash(&metadata, &content, &embeddings, &entities, &relationships)?;
    let document_id = DocumentId::new();

    debug!(%document_id, %content_hash, title = %metadata.title, "document assembled");

    Ok(MadDocument {
        format_version: FORMAT_VERSION.to_string(),
        document_id,
        content_hash,
        metadata,
        content,
        embeddings,
        entities,
        relationships,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use madforge_shared::{Entity, ParsedElement};

    fn parsed(elements: Vec<ParsedElement>, metadata: SourceMetadata) -> ParsedDocument {
        ParsedDocument {
            elements: elements.into_iter().map(ParsedItem::Element).collect(),
            metadata,
            ..Default::default()
        }
    }

    fn input() -> AssembleInput {
        AssembleInput {
            source: "reports/q3.json".into(),
            source_stem: "q3".into(),
            extraction_tool: "element-dump".into(),
            ..Default::default()
        }
    }

    fn sample_content() -> ContentStructure {
        ContentStructure {
            full_text: "Intro\n\nHello world.\n\n".into(),
            markdown: "# Intro".into(),
            ..Default::default()
        }
    }

    #[test]
    fn title_precedence() {
        let meta = SourceMetadata {
            title: Some("Meta Title".into()),
            ..Default::default()
        };
        let body = vec![
            ParsedElement::new("Body text", "paragraph", 0),
            ParsedElement::new("Body Title", "title", 0),
        ];

        let p = parsed(body.clone(), meta);
        assert_eq!(resolve_title(Some("Given"), &p, "stem"), "Given");
        assert_eq!(resolve_title(Some("  "), &p, "stem"), "Meta Title");

        let p = parsed(body, SourceMetadata::default());
        assert_eq!(resolve_title(None, &p, "stem"), "Body Title");

        let p = parsed(
            vec![ParsedElement::new("Heading", "paragraph", 0).with_tag("h1")],
            SourceMetadata::default(),
        );
        assert_eq!(resolve_title(None, &p, "stem"), "Heading");

        let p = parsed(vec![], SourceMetadata::default());
        assert_eq!(resolve_title(None, &p, "stem"), "stem");
    }

    #[test]
    fn body_title_is_truncated() {
        let long = "é".repeat(150);
        let p = parsed(vec![ParsedElement::new(long, "title", 0)], SourceMetadata::default());
        assert_eq!(resolve_title(None, &p, "stem").chars().count(), MAX_TITLE_CHARS);
    }

    #[test]
    fn author_precedence() {
        let both = SourceMetadata {
            author: Some("Ada".into()),
            creator: Some("Writer 2.0".into()),
            ..Default::default()
        };
        let creator_only = SourceMetadata {
            creator: Some("Writer 2.0".into()),
            ..Default::default()
        };
        assert_eq!(resolve_author(Some("Grace"), &both), "Grace");
        assert_eq!(resolve_author(None, &both), "Ada");
        assert_eq!(resolve_author(None, &creator_only), "Writer 2.0");
        assert_eq!(resolve_author(None, &SourceMetadata::default()), "Unknown");
    }

    fn build(input: &AssembleInput, entities: EntityMap) -> MadDocument {
        let p = parsed(vec![], SourceMetadata::default());
        let derived = Derived {
            content: sample_content(),
            entities,
            ..Default::default()
        };
        assemble(input, &p, derived).unwrap()
    }

    #[test]
    fn hash_ignores_id_and_timestamp() {
        let a = build(&input(), EntityMap::new());
        let b = build(&input(), EntityMap::new());

        assert_ne!(a.document_id, b.document_id);
        assert_eq!(a.content_hash, b.content_hash);
        assert_eq!(a.content_hash.len(), 64);
        assert_eq!(a.format_version, "1.0");
    }

    #[test]
    fn canonical_json_sorts_nested_keys() {
        let value = serde_json::json!({"b": 1, "a": {"z": [{"y": 0, "x": 0}], "c": null}});
        assert_eq!(
            canonical_json(&value).unwrap(),
            r#"{"a":{"c":null,"z":[{"x":0,"y":0}]},"b":1}"#
        );
    }

    #[test]
    fn hash_is_pinned_for_fixed_input() {
        let doc = build(&input(), EntityMap::new());
        assert_eq!(
            doc.content_hash,
            "0aca81ad7268f0dc3aa20ec4afa2da1a7dcb9bd9d5fc7f9496396681e6a4611b"
        );
    }

    #[test]
    fn hash_changes_with_inputs() {
        let base = build(&input(), EntityMap::new());

        let mut other = input();
        other.author = Some("Someone".into());
        assert_ne!(base.content_hash, build(&other, EntityMap::new()).content_hash);

        let mut entities = EntityMap::new();
        entities.insert(
            "entity_0_5".into(),
            Entity {
                id: "entity_0_5".into(),
                text: "Intro".into(),
                label: "NAME".into(),
                description: None,
                start: 0,
                end: 5,
                confidence: 1.0,
            },
        );
        assert_ne!(base.content_hash, build(&input(), entities).content_hash);
    }

    #[test]
    fn verify_detects_tampering() {
        let mut doc = build(&input(), EntityMap::new());
        assert!(verify_content_hash(&doc).unwrap());

        // Not part of the hash.
        doc.metadata.created = "1999-01-01T00:00:00Z".into();
        assert!(verify_content_hash(&doc).unwrap());

        doc.content.full_text.push('!');
        assert!(!verify_content_hash(&doc).unwrap());
    }

    #[test]
    fn metadata_records_tools() {
        let doc = build(&input(), EntityMap::new());
        assert_eq!(doc.metadata.title, "q3");
        assert_eq!(doc.metadata.author, "Unknown");
        assert_eq!(doc.metadata.extraction_tool, "element-dump");
        assert!(doc.metadata.conversion_tool.starts_with("madforge "));
        assert!(chrono::DateTime::parse_from_rfc3339(&doc.metadata.created).is_ok());
    }
}
