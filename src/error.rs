//! Error types for AttrSync
//!
//! This module defines all error types used throughout the application,
//! separating per-entry recoverable failures from errors that abort a run.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for AttrSync operations
#[derive(Error, Debug)]
pub enum SyncError {
    /// I/O error during file operations
    #[error("I/O error at '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Directory traversal failed
    #[error("Directory walk failed: {0}")]
    Walk(#[from] walkdir::Error),

    /// A scanned path could not be resolved against its scan root
    #[error("Cannot resolve '{path}' relative to '{root}'")]
    RelativePath { root: PathBuf, path: PathBuf },

    /// Source or destination address could not be parsed
    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    /// Object store request failed
    #[error("Remote error ({context}): {message}")]
    Remote { context: String, message: String },

    /// Checkpoint file could not be read or written
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Async runtime could not be started
    #[error("Runtime error: {0}")]
    Runtime(String),
}

impl SyncError {
    /// Create an I/O error with path context
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a remote-store error with operation context
    pub fn remote(context: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Remote {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Check whether this error must abort the run.
    ///
    /// Transfer-level failures (I/O, remote requests) are recorded per entry
    /// and the pool moves on; everything else propagates to the orchestrator.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Io { .. } | Self::Remote { .. })
    }

    /// Get the path associated with this error, if any
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            Self::Io { path, .. } | Self::RelativePath { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Result type alias for AttrSync operations
pub type Result<T> = std::result::Result<T, SyncError>;

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Checkpoint(err.to_string())
    }
}

/// Extension trait for adding path context to std::io::Result
pub trait IoResultExt<T> {
    /// Add path context to an I/O error
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::io::Result<T> {
    fn with_path(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|e| SyncError::io(path, e))
    }
}
