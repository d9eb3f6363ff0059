//! Attach vector embeddings to text chunks and headings.

use tracing::{debug, error, instrument};

use madforge_shared::{ContentStructure, Embedder, EmbeddingMap, EmbeddingRecord, Result};

/// Embed every non-blank text chunk and heading, keyed by content item id.
///
/// All or nothing: if the embedder fails on any item the map is empty.
#[instrument(skip_all, fields(items = content.text_chunks.len() + content.headings.len()))]
pub fn attach(content: &ContentStructure, embedder: Option<&dyn Embedder>) -> EmbeddingMap {
    let Some(embedder) = embedder else {
        debug!("no embedder configured");
        return EmbeddingMap::new();
    };

    match embed_all(content, embedder) {
        Ok(map) => {
            debug!(embedder = embedder.name(), embeddings = map.len(), "embeddings attached");
            map
        }
        Err(e) => {
            error!(embedder = embedder.name(), error = %e, "embedding failed, skipping embeddings");
            EmbeddingMap::new()
        }
    }
}

fn embed_all(content: &ContentStructure, embedder: &dyn Embedder) -> Result<EmbeddingMap> {
    let mut map = EmbeddingMap::new();

    for item in content.text_chunks.iter().chain(&content.headings) {
        if item.text.trim().is_empty() {
            continue;
        }
        let embedding = embedder.encode(&item.text)?;
        map.insert(
            item.id.clone(),
            EmbeddingRecord {
                text: item.text.clone(),
                embedding,
                kind: item.kind,
                page: item.page,
            },
        );
    }

    Ok(map)
}
