//! Error types for MadForge.
//!
//! Library crates use [`MadError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all MadForge operations.
#[derive(Debug, thiserror::Error)]
pub enum MadError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// The source could not be loaded (bad path, unreachable URL, HTTP failure).
    #[error("source error: {0}")]
    Source(String),

    /// No parser accepts the source.
    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    /// The parser could not produce a document at all.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// The embedding capability failed.
    #[error("embedding error: {0}")]
    Embedding(String),

    /// The entity tagger capability failed.
    #[error("tagger error: {0}")]
    Tagger(String),

    /// JSON serialization or deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Bundle validation error (missing file, version mismatch, hash mismatch).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, MadError>;

impl MadError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error aborts a conversion (as opposed to degrading a stage).
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Embedding(_) | Self::Tagger(_))
    }
}

impl From<serde_json::Error> for MadError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_formatting() {
        let err = MadError::config("bad model selector");
        assert_eq!(err.to_string(), "config error: bad model selector");

        let err = MadError::validation("format_version 9.0 not supported");
        assert!(err.to_string().contains("format_version 9.0"));

        let err = MadError::UnsupportedFormat("report.pdf".into());
        assert_eq!(err.to_string(), "unsupported format: report.pdf");
    }

    #[test]
    fn capability_errors_are_not_fatal() {
        assert!(!MadError::Embedding("model offline".into()).is_fatal());
        assert!(!MadError::Tagger("bad span".into()).is_fatal());
        assert!(MadError::parse("empty").is_fatal());
        assert!(MadError::Source("404".into()).is_fatal());
    }
}
