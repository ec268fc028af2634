//! Error types for scene loading.

use std::path::PathBuf;

use scmi_common::CommonError;
use thiserror::Error;

/// Errors that can occur while reading a scene and its flat binary files.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse scene document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Flat binary filename '{0}' must look like stem.type.cols.rows")]
    InvalidName(String),

    #[error("Unknown flat binary data type '{type_name}' in '{name}'")]
    UnknownType { name: String, type_name: String },

    #[error("'{0}' not found in workspace")]
    NotFound(String),

    #[error("Found too many files for '{0}' in workspace")]
    Ambiguous(String),

    #[error("Flat binary file with stem '{0}' already exists")]
    StemConflict(String),

    #[error("{path}: expected {expected} bytes, found {actual}")]
    SizeMismatch {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },

    #[error("Product '{product}' references unknown grid '{grid}'")]
    UnknownGrid { product: String, grid: String },

    #[error("Failed to walk workspace: {0}")]
    Walk(#[from] walkdir::Error),

    #[error(transparent)]
    Product(#[from] CommonError),
}

/// Result type for scene operations.
pub type Result<T> = std::result::Result<T, SceneError>;
