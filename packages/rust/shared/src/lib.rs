//! Shared types, error model, capability traits and configuration for MadForge.
//!
//! This crate is the foundation depended on by all other MadForge crates.
//! It provides:
//! - [`MadError`]: the unified error type
//! - Domain types ([`MadDocument`], [`ContentStructure`], [`Entity`], [`Relationship`])
//! - Capability traits ([`DocumentParser`], [`Embedder`], [`EntityTagger`])
//! - Configuration ([`AppConfig`], [`ConvertSettings`], config loading)

pub mod capabilities;
pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use capabilities::{
    Capabilities, DocumentParser, Embedder, EntityTagger, ParsedDocument, ParsedElement,
    ParsedItem, RawBBox, SourceInput, SourceMetadata, TaggedSpan,
};
pub use config::{
    AppConfig, ConvertSettings, DISABLED_MODEL, DefaultsConfig, EmbeddingConfig, SourceConfig,
    TaggerConfig, config_dir, config_file_path, init_config, load_config, load_config_from,
};
pub use error::{MadError, Result};
pub use types::{
    BBox, ContentItem, ContentKind, ContentStructure, ConversionStats, DocumentId,
    DocumentMetadata, EmbeddingMap, EmbeddingRecord, Entity, EntityMap, FORMAT_VERSION,
    MadDocument, Manifest, Page, RelationKind, Relationship, RelationshipMap,
};
