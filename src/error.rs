//! Custom error types for Nexus Backup
//!
//! This module defines the error hierarchy for the snapshot engine using
//! thiserror for ergonomic error definitions.

use std::path::PathBuf;

use thiserror::Error;

/// The main error type for Nexus Backup operations
#[derive(Error, Debug)]
pub enum BackupError {
    /// Source or destination unset, or a setting out of range
    #[error("Configuration error: {0}")]
    Config(String),

    /// The source tree does not exist at cycle start
    #[error("Source path does not exist: {}", .0.display())]
    SourceNotFound(PathBuf),

    /// Any failure while copying the source tree into a snapshot
    #[error("Copy failed at {}: {source}", .path.display())]
    Copy {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File I/O errors outside the copy itself
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for settings values
    #[error("Validation error: {0}")]
    Validation(String),

    /// A cycle worker panicked or was cancelled
    #[error("Internal error: {0}")]
    Internal(String),
}

impl BackupError {
    /// Create a copy error for the given path
    pub fn copy(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Copy {
            path: path.into(),
            source,
        }
    }

    /// Check if this is a configuration error
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if this is a missing-source error
    pub fn is_source_not_found(&self) -> bool {
        matches!(self, Self::SourceNotFound(_))
    }

    /// Check if this is a copy error
    pub fn is_copy(&self) -> bool {
        matches!(self, Self::Copy { .. })
    }
}

impl From<std::io::Error> for BackupError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for BackupError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for Nexus Backup operations
pub type BackupResult<T> = Result<T, BackupError>;
