//! Error types for the dependency map builder.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for dependency map operations.
pub type Result<T> = std::result::Result<T, DepsError>;

/// Errors raised while building or refreshing a dependency map.
#[derive(Debug, Error)]
pub enum DepsError {
    /// Provider root does not exist or is not a directory
    #[error("Provider root is not a directory: {0}")]
    InvalidRoot(PathBuf),

    /// IO error while scanning provider files
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File watcher error
    #[error("Watch error: {0}")]
    Watch(#[from] notify::Error),
}
