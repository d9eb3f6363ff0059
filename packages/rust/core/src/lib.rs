//! Core conversion pipeline for MadForge.
//!
//! Stages run strictly in order, each consuming the previous stage's output:
//! [`structurer`] → [`relationships`] → [`embeddings`] → [`assembler`], then
//! the bundle and script writers from `madforge-artifacts`. [`pipeline`]
//! ties them into the end-to-end `convert` workflow.

pub mod assembler;
pub mod embeddings;
pub mod pipeline;
pub mod relationships;
pub mod structurer;
pub mod validate;

pub use pipeline::{
    ConversionResult, ConvertRequest, ProgressReporter, SilentProgress, build_document, convert,
};
pub use validate::{ValidationReport, validate_bundle};
