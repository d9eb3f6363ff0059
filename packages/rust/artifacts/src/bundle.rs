//! Reading a bundle back from disk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use madforge_shared::{
    ContentStructure, EmbeddingMap, EntityMap, FORMAT_VERSION, MadDocument, MadError, Manifest,
    RelationshipMap, Result,
};

use crate::FileRole;

/// A bundle as found on disk. Optional files that were not produced are `None`.
#[derive(Debug, Clone)]
pub struct Bundle {
    pub dir: PathBuf,
    pub manifest: Manifest,
    pub content: ContentStructure,
    pub document: MadDocument,
    pub embeddings: Option<EmbeddingMap>,
    pub entities: Option<EntityMap>,
    pub relationships: Option<RelationshipMap>,
}

/// Load every bundle file in `dir`.
///
/// Missing required files and unreadable JSON are validation errors.
#[instrument(skip_all, fields(dir = %dir.display()))]
pub fn load_bundle(dir: &Path) -> Result<Bundle> {
    if !dir.is_dir() {
        return Err(MadError::validation(format!(
            "bundle directory not found: {}",
            dir.display()
        )));
    }

    let bundle = Bundle {
        dir: dir.to_path_buf(),
        manifest: read_required(dir, FileRole::Manifest)?,
        content: read_required(dir, FileRole::Content)?,
        document: read_required(dir, FileRole::FullDocument)?,
        embeddings: read_optional(dir, FileRole::Embeddings)?,
        entities: read_optional(dir, FileRole::Entities)?,
        relationships: read_optional(dir, FileRole::Relationships)?,
    };

    debug!(document_id = %bundle.manifest.document_id, "bundle loaded");
    Ok(bundle)
}

impl Bundle {
    /// Structural inconsistencies between the bundle's files.
    ///
    /// Does not check the content hash; that needs the hashing rules of the assembler.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        if self.manifest.format_version != FORMAT_VERSION {
            problems.push(format!(
                "unsupported format_version {:?} (expected {FORMAT_VERSION:?})",
                self.manifest.format_version
            ));
        }
        if self.manifest != self.document.manifest() {
            problems.push(format!(
                "{} does not match {}",
                FileRole::Manifest.filename(),
                FileRole::FullDocument.filename()
            ));
        }
        if self.content != self.document.content {
            problems.push(format!(
                "{} does not match {}",
                FileRole::Content.filename(),
                FileRole::FullDocument.filename()
            ));
        }

        check_optional(
            &mut problems,
            FileRole::Embeddings,
            self.embeddings.as_ref(),
            &self.document.embeddings,
        );
        check_optional(
            &mut problems,
            FileRole::Entities,
            self.entities.as_ref(),
            &self.document.entities,
        );
        check_optional(
            &mut problems,
            FileRole::Relationships,
            self.relationships.as_ref(),
            &self.document.relationships,
        );

        for rel in self.document.relationships.values() {
            for end in [&rel.from, &rel.to] {
                if !self.document.entities.contains_key(end) {
                    problems.push(format!(
                        "relationship {} references unknown entity {end}",
                        rel.id
                    ));
                }
            }
        }

        problems
    }
}

/// An optional file must be present exactly when the document's map is non-empty.
fn check_optional<T: PartialEq>(
    problems: &mut Vec<String>,
    role: FileRole,
    file: Option<&BTreeMap<String, T>>,
    in_document: &BTreeMap<String, T>,
) {
    match file {
        None if !in_document.is_empty() => {
            problems.push(format!("{} is missing", role.filename()));
        }
        Some(map) if map != in_document => {
            problems.push(format!(
                "{} does not match {}",
                role.filename(),
                FileRole::FullDocument.filename()
            ));
        }
        _ => {}
    }
}

fn read_required<T: DeserializeOwned>(dir: &Path, role: FileRole) -> Result<T> {
    let path = dir.join(role.filename());
    if !path.exists() {
        return Err(MadError::validation(format!(
            "missing required file {}",
            role.filename()
        )));
    }
    read_json(&path, role)
}

fn read_optional<T: DeserializeOwned>(dir: &Path, role: FileRole) -> Result<Option<T>> {
    let path = dir.join(role.filename());
    if !path.exists() {
        return Ok(None);
    }
    read_json(&path, role).map(Some)
}

fn read_json<T: DeserializeOwned>(path: &Path, role: FileRole) -> Result<T> {
    let raw = std::fs::read_to_string(path).map_err(|e| MadError::io(path, e))?;
    serde_json::from_str(&raw)
        .map_err(|e| MadError::validation(format!("invalid {}: {e}", role.filename())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_document, temp_dir};
    use crate::write_bundle;

    #[test]
    fn load_round_trips_written_bundle() {
        let dir = temp_dir();
        let doc = sample_document();
        write_bundle(&doc, &dir).unwrap();

        let bundle = load_bundle(&dir).unwrap();
        assert_eq!(bundle.document, doc);
        assert!(bundle.embeddings.is_none());
        assert!(bundle.entities.is_none());
        assert!(bundle.relationships.is_none());
        assert!(bundle.problems().is_empty(), "{:?}", bundle.problems());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_required_file_is_validation_error() {
        let dir = temp_dir();
        write_bundle(&sample_document(), &dir).unwrap();
        std::fs::remove_file(dir.join("content.json")).unwrap();

        let err = load_bundle(&dir).unwrap_err();
        assert!(matches!(err, MadError::Validation { .. }));
        assert!(err.to_string().contains("content.json"));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn reports_version_and_manifest_drift() {
        let dir = temp_dir();
        write_bundle(&sample_document(), &dir).unwrap();

        let mut bundle = load_bundle(&dir).unwrap();
        bundle.manifest.format_version = "0.9".into();
        let problems = bundle.problems();
        assert!(problems.iter().any(|p| p.contains("format_version")));
        assert!(problems.iter().any(|p| p.contains("manifest.json")));

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn missing_directory_is_reported() {
        let dir = temp_dir().join("nope");
        assert!(load_bundle(&dir).is_err());
    }
}
