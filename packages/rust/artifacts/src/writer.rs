//! Bundle writer.
//!
//! Every file is written to a hidden temp file next to its target and renamed
//! into place, so a reader never observes a half-written file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info, instrument};

use madforge_shared::{MadDocument, MadError, Result};

/// The files that make up a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileRole {
    Manifest,
    Content,
    Embeddings,
    Entities,
    Relationships,
    FullDocument,
}

impl FileRole {
    pub const ALL: [FileRole; 6] = [
        FileRole::Manifest,
        FileRole::Content,
        FileRole::Embeddings,
        FileRole::Entities,
        FileRole::Relationships,
        FileRole::FullDocument,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manifest => "manifest",
            Self::Content => "content",
            Self::Embeddings => "embeddings",
            Self::Entities => "entities",
            Self::Relationships => "relationships",
            Self::FullDocument => "full_document",
        }
    }

    pub fn filename(&self) -> &'static str {
        match self {
            Self::Manifest => "manifest.json",
            Self::Content => "content.json",
            Self::Embeddings => "embeddings.json",
            Self::Entities => "entities.json",
            Self::Relationships => "relationships.json",
            Self::FullDocument => "document.json",
        }
    }

    /// Optional files are only written when their map is non-empty.
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Embeddings | Self::Entities | Self::Relationships)
    }
}

impl std::fmt::Display for FileRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Write `doc` into `dir` and return the path of every file produced.
#[instrument(skip_all, fields(dir = %dir.display(), document_id = %doc.document_id))]
pub fn write_bundle(doc: &MadDocument, dir: &Path) -> Result<BTreeMap<FileRole, PathBuf>> {
    std::fs::create_dir_all(dir).map_err(|e| MadError::io(dir, e))?;

    // Stale optional files are only ours to remove inside an earlier bundle.
    let earlier_bundle = dir.join(FileRole::Manifest.filename()).exists();
    let mut files = BTreeMap::new();

    let manifest = doc.manifest();
    files.insert(
        FileRole::Manifest,
        write_json(dir, FileRole::Manifest.filename(), &manifest)?,
    );
    files.insert(
        FileRole::Content,
        write_json(dir, FileRole::Content.filename(), &doc.content)?,
    );

    let optional = [
        (FileRole::Embeddings, doc.embeddings.is_empty()),
        (FileRole::Entities, doc.entities.is_empty()),
        (FileRole::Relationships, doc.relationships.is_empty()),
    ];
    for (role, empty) in optional {
        let target = dir.join(role.filename());
        if empty {
            // Absent means "not produced by this run".
            if earlier_bundle && target.exists() {
                std::fs::remove_file(&target).map_err(|e| MadError::io(&target, e))?;
                debug!(file = role.filename(), "removed stale bundle file");
            }
            continue;
        }
        let path = match role {
            FileRole::Embeddings => write_json(dir, role.filename(), &doc.embeddings)?,
            FileRole::Entities => write_json(dir, role.filename(), &doc.entities)?,
            _ => write_json(dir, role.filename(), &doc.relationships)?,
        };
        files.insert(role, path);
    }

    files.insert(
        FileRole::FullDocument,
        write_json(dir, FileRole::FullDocument.filename(), doc)?,
    );

    info!(files = files.len(), "bundle written");
    Ok(files)
}

/// Serialize `data` as pretty JSON and write it atomically to `dir/filename`.
pub(crate) fn write_json<T: Serialize + ?Sized>(
    dir: &Path,
    filename: &str,
    data: &T,
) -> Result<PathBuf> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| MadError::Serialization(format!("{filename}: {e}")))?;
    write_atomic(dir, filename, json.as_bytes())
}

/// Write bytes to a temp file in `dir`, then rename over `dir/filename`.
pub(crate) fn write_atomic(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf> {
    let target = dir.join(filename);
    let temp = dir.join(format!(".{filename}.tmp"));

    std::fs::write(&temp, bytes).map_err(|e| MadError::io(&temp, e))?;
    std::fs::rename(&temp, &target).map_err(|e| MadError::io(&target, e))?;

    debug!(file = filename, size = bytes.len(), "wrote bundle file");
    Ok(target)
}
