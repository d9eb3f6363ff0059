//! Built-in embedding and entity-tagging capabilities.
//!
//! Model selectors come from the CLI or config. `none` disables a capability;
//! an unrecognized selector is logged and also leaves the capability
//! unconfigured, so the corresponding pipeline stage degrades to empty output.

mod embedder;
pub mod labels;
mod tagger;

use tracing::{info, warn};

use madforge_shared::{Capabilities, DISABLED_MODEL, Embedder, EntityTagger};

pub use embedder::{DEFAULT_DIMS, HashingEmbedder, MAX_DIMS};
pub use tagger::PatternTagger;

/// Resolve an embedding model selector (`hashing`, `hashing-<dims>`, `none`).
pub fn embedder_for(model: &str) -> Option<Box<dyn Embedder>> {
    let model = model.trim();
    if model.is_empty() || model.eq_ignore_ascii_case(DISABLED_MODEL) {
        info!("embedding capability disabled");
        return None;
    }

    let dims = match model.strip_prefix("hashing") {
        Some("") => Some(DEFAULT_DIMS),
        Some(rest) => rest.strip_prefix('-').and_then(|d| d.parse::<usize>().ok()),
        None => None,
    };

    let Some(dims) = dims else {
        warn!(model, "unknown embedding model, embeddings disabled");
        return None;
    };

    match HashingEmbedder::new(dims) {
        Ok(embedder) => {
            info!(model = embedder.name(), "loaded embedding model");
            Some(Box::new(embedder))
        }
        Err(e) => {
            warn!(model, error = %e, "invalid embedding model, embeddings disabled");
            None
        }
    }
}

/// Resolve an entity tagger selector (`patterns`, `none`).
pub fn tagger_for(model: &str) -> Option<Box<dyn EntityTagger>> {
    match model.trim() {
        "" => None,
        m if m.eq_ignore_ascii_case(DISABLED_MODEL) => {
            info!("entity tagger disabled");
            None
        }
        "patterns" => {
            info!(model = "patterns", "loaded entity tagger");
            Some(Box::new(PatternTagger))
        }
        other => {
            warn!(model = other, "unknown tagger model, entity extraction disabled");
            None
        }
    }
}

/// Build the capability set for a pair of selectors.
pub fn capabilities_for(embedding_model: &str, tagger_model: &str) -> Capabilities {
    Capabilities {
        embedder: embedder_for(embedding_model),
        tagger: tagger_for(tagger_model),
    }
}
