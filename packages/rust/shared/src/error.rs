//! Error types for docingest.
//!
//! Library crates use [`DocIngestError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! The chunking engine itself is total and never produces these; they come
//! from configuration, the storage collaborators, and serialization.

use std::path::PathBuf;

/// Top-level error type for all docingest operations.
#[derive(Debug, thiserror::Error)]
pub enum DocIngestError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (bad event document, unknown tag, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// JSON encoding/decoding error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The content source could not provide a document.
    #[error("source error: {0}")]
    Source(String),

    /// The chunk sink rejected a write.
    #[error("sink error: {0}")]
    Sink(String),
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocIngestError>;

impl DocIngestError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
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
}

impl From<serde_json::Error> for DocIngestError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
