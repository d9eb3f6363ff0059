//! MAD bundle persistence.
//!
//! - [`write_bundle`]: the fixed multi-file JSON layout
//! - [`load_bundle`]: read a bundle back, optional files as `Option`
//! - [`write_script`]: the JavaScript integration script

mod bundle;
pub mod script;
mod writer;

pub use bundle::{Bundle, load_bundle};
pub use script::{SCRIPT_FILE_NAME, generate_script, write_script};
pub use writer::{FileRole, write_bundle};

#[cfg(test)]
pub(crate) mod test_support {
    use std::path::PathBuf;

    use madforge_shared::{
        ContentItem, ContentKind, ContentStructure, DocumentId, DocumentMetadata, FORMAT_VERSION,
        MadDocument, Page,
    };

    pub fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("madforge-artifacts-{}", uuid::Uuid::now_v7()))
    }

    pub fn sample_document() -> MadDocument {
        let heading = ContentItem {
            id: "item-heading".into(),
            text: "Intro".into(),
            kind: ContentKind::Heading,
            label: Some("title".into()),
            page: 0,
            bbox: None,
        };
        let chunk = ContentItem {
            id: "item-chunk".into(),
            text: "Hello world.".into(),
            kind: ContentKind::TextChunk,
            label: Some("paragraph".into()),
            page: 0,
            bbox: None,
        };

        MadDocument {
            format_version: FORMAT_VERSION.into(),
            document_id: DocumentId::new(),
            content_hash: "0".repeat(64),
            metadata: DocumentMetadata {
                title: "Intro".into(),
                author: "Unknown".into(),
                created: "2025-01-01T00:00:00Z".into(),
                source: "intro.md".into(),
                extraction_tool: "markdown".into(),
                conversion_tool: "madforge 0.1.0".into(),
            },
            content: ContentStructure {
                pages: vec![Page {
                    page_number: 0,
                    content: vec![heading.clone(), chunk.clone()],
                }],
                text_chunks: vec![chunk],
                tables: vec![],
                images: vec![],
                headings: vec![heading],
                full_text: "Intro\n\nHello world.\n\n".into(),
                markdown: "# Intro\n\nHello world.\n".into(),
                html: "<h1>Intro</h1>\n<p>Hello world.</p>\n".into(),
            },
            embeddings: Default::default(),
            entities: Default::default(),
            relationships: Default::default(),
        }
    }
}
