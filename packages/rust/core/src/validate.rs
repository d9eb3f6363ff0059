//! Bundle validation: structure, version and content hash.

use std::path::Path;

use tracing::{info, instrument, warn};

use madforge_artifacts::load_bundle;
use madforge_shared::{ConversionStats, DocumentId, MadError, Result};

use crate::assembler::verify_content_hash;

/// Summary of a bundle that passed validation.
#[derive(Debug, Clone)]
pub struct ValidationReport {
    pub document_id: DocumentId,
    pub content_hash: String,
    pub title: String,
    pub stats: ConversionStats,
}

/// Check that `dir` holds a complete, consistent bundle whose content hash
/// matches its contents.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn validate_bundle(dir: &Path) -> Result<ValidationReport> {
    let bundle = load_bundle(dir)?;

    let mut problems = bundle.problems();
    if !verify_content_hash(&bundle.document)? {
        problems.push(format!(
            "content_hash {} does not match document contents",
            bundle.document.content_hash
        ));
    }

    if !problems.is_empty() {
        for problem in &problems {
            warn!(%problem, "bundle problem");
        }
        return Err(MadError::validation(problems.join("; ")));
    }

    info!(document_id = %bundle.document.document_id, "bundle valid");
    Ok(ValidationReport {
        stats: bundle.document.stats(),
        document_id: bundle.document.document_id,
        content_hash: bundle.document.content_hash,
        title: bundle.document.metadata.title,
    })
}
