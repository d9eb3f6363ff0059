//! End-to-end `convert` pipeline: source → parse → structure → graph →
//! embeddings → assemble → bundle + script.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{info, instrument};

use madforge_artifacts::FileRole;
use madforge_parsers::{ParserRegistry, SourceOptions, is_url, load_source};
use madforge_shared::{
    Capabilities, ConversionStats, ConvertSettings, DocumentId, MadDocument, Result, SourceInput,
};

use crate::assembler::{self, AssembleInput, Derived};
use crate::{embeddings, relationships, structurer};

/// One conversion request, as given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConvertRequest {
    /// Local path or `http(s)` URL.
    pub source: String,
    /// Exact output directory. Derived from the source when `None`.
    pub output_dir: Option<PathBuf>,
    pub title: Option<String>,
    pub author: Option<String>,
}

/// Result of the `convert` pipeline.
#[derive(Debug, Clone)]
pub struct ConversionResult {
    pub output_dir: PathBuf,
    /// Bundle files by role. Optional roles are absent when not produced.
    pub files: BTreeMap<FileRole, PathBuf>,
    pub script_path: PathBuf,
    pub document_id: DocumentId,
    pub content_hash: String,
    pub title: String,
    pub stats: ConversionStats,
    pub elapsed: std::time::Duration,
}

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when the pipeline completes.
    fn done(&self, result: &ConversionResult);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn done(&self, _result: &ConversionResult) {}
}

/// Run the full `convert` pipeline.
///
/// 1. Load the source (file or URL)
/// 2. Parse it with the first accepting parser
/// 3. Build the document (structure, graph, embeddings, hash)
/// 4. Write the bundle and the integration script
#[instrument(skip_all, fields(source = %request.source))]
pub async fn convert(
    request: &ConvertRequest,
    registry: &ParserRegistry,
    capabilities: &Capabilities,
    settings: &ConvertSettings,
    progress: &dyn ProgressReporter,
) -> Result<ConversionResult> {
    let start = Instant::now();
    info!(?capabilities, "starting conversion");

    // --- Phase 1: Source ---
    progress.phase("Loading source");
    let source = load_source(&request.source, &SourceOptions::from(settings)).await?;

    // --- Phase 2-3: Parse and build ---
    let doc = build_document(&source, request, registry, capabilities, progress)?;

    // --- Phase 4: Persist ---
    progress.phase("Writing bundle");
    let output_dir = resolve_output_dir(request, settings, &source);
    let files = madforge_artifacts::write_bundle(&doc, &output_dir)?;
    let script_path = madforge_artifacts::write_script(&doc, &output_dir)?;

    let result = ConversionResult {
        output_dir,
        files,
        script_path,
        stats: doc.stats(),
        document_id: doc.document_id,
        content_hash: doc.content_hash,
        title: doc.metadata.title,
        elapsed: start.elapsed(),
    };

    progress.done(&result);

    info!(
        document_id = %result.document_id,
        content_hash = %result.content_hash,
        output_dir = %result.output_dir.display(),
        elapsed_ms = result.elapsed.as_millis(),
        "conversion complete"
    );

    Ok(result)
}

/// Parse an already loaded source and run every in-memory stage.
pub fn build_document(
    source: &SourceInput,
    request: &ConvertRequest,
    registry: &ParserRegistry,
    capabilities: &Capabilities,
    progress: &dyn ProgressReporter,
) -> Result<MadDocument> {
    progress.phase("Parsing document");
    let parser = registry.detect(source)?;
    let parsed = parser.parse(source)?;
    info!(parser = parser.name(), elements = parsed.elements.len(), "document parsed");

    progress.phase("Structuring content");
    let content = structurer::structure(&parsed, &source.location);

    progress.phase("Extracting entities");
    let (entities, relationships) =
        relationships::derive(&content.full_text, capabilities.tagger.as_deref());

    progress.phase("Generating embeddings");
    let embeddings = embeddings::attach(&content, capabilities.embedder.as_deref());

    progress.phase("Assembling document");
    let input = AssembleInput {
        source: source.location.clone(),
        source_stem: source.stem(),
        extraction_tool: parser.name().to_string(),
        title: request.title.clone(),
        author: request.author.clone(),
    };
    assembler::assemble(
        &input,
        &parsed,
        Derived {
            content,
            embeddings,
            entities,
            relationships,
        },
    )
}

/// Output directory precedence: request, configured root, next to the source.
pub fn resolve_output_dir(
    request: &ConvertRequest,
    settings: &ConvertSettings,
    source: &SourceInput,
) -> PathBuf {
    if let Some(dir) = &request.output_dir {
        return dir.clone();
    }

    let name = format!("{}_mad", source.stem());
    if let Some(root) = &settings.output_dir {
        return root.join(name);
    }

    if is_url(&source.location) {
        return PathBuf::from(name);
    }

    Path::new(&source.location)
        .parent()
        .map(|parent| parent.join(&name))
        .unwrap_or_else(|| PathBuf::from(name))
}
