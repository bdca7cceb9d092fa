//! Error types for project document operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur loading or saving a project document.
#[derive(Error, Debug)]
pub enum ProjectError {
    /// The project file does not exist.
    #[error("project not found: {path:?}")]
    NotFound {
        /// Path that failed to resolve.
        path: PathBuf,
    },

    /// I/O error during file operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file exists but its content is not a parseable project document.
    #[error("invalid project document: {0}")]
    Json(#[from] serde_json::Error),
}
