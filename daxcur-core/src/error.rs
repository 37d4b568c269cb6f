//! Error types for the DAXCUR core library.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::ModelType;

/// Top-level error type for all example-store operations.
#[derive(Error, Debug)]
pub enum CurationError {
    /// Caller supplied bad input (empty field, unknown model type, bad name).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// No example with the given id exists in the collection.
    #[error("Example not found: {id} (model: {model_type})")]
    NotFound {
        /// Collection that was searched.
        model_type: ModelType,
        /// The id that was requested.
        id: String,
    },

    /// The storage medium could not be read or written.
    #[error("Storage unavailable at {}: {source}", path.display())]
    StorageUnavailable {
        /// File or directory the operation touched.
        path: PathBuf,
        /// Underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A collection or backup file exists but is not a valid example array.
    #[error("Corrupt data in {}: {message}", path.display())]
    CorruptData {
        /// File that failed to parse.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// Encoding an in-memory collection failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CurationError {
    /// Wrap an I/O error with the path it occurred on.
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::StorageUnavailable {
            path: path.into(),
            source,
        }
    }

    /// Whether this error is the caller's fault (maps to a 4xx response).
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::NotFound { .. })
    }
}

/// Convenience Result type alias.
pub type Result<T> = std::result::Result<T, CurationError>;
