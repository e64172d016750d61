//! Error types for scriptwatch.
//!
//! Library crates use [`ScriptwatchError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.
//!
//! Outbound fetch failures are deliberately NOT part of this enum: they are
//! recovered at the registry boundary (stored content wins) and carried as a
//! typed `FetchError` value, never as a failure of the enclosing call.

use std::path::PathBuf;

use crate::types::FileId;

/// Top-level error type for all scriptwatch operations.
#[derive(Debug, thiserror::Error)]
pub enum ScriptwatchError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Bad input shape or content — the caller's fault, never retried.
    #[error("validation error: {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    /// A referenced file record does not exist.
    #[error("file {id} not found")]
    NotFound { id: FileId },

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ScriptwatchError>;

impl ScriptwatchError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a validation error for a named descriptor field.
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field,
            reason: reason.into(),
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
