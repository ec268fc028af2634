//! Error types for product and grid definitions.

use thiserror::Error;

/// Result type alias using CommonError.
pub type CommonResult<T> = Result<T, CommonError>;

#[derive(Debug, Error)]
pub enum CommonError {
    #[error("Shape mismatch for {what}: expected {expected} samples, got {actual}")]
    ShapeMismatch {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid grid definition '{grid}': {message}")]
    InvalidGrid { grid: String, message: String },
}

impl CommonError {
    pub fn invalid_grid(grid: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidGrid {
            grid: grid.into(),
            message: message.into(),
        }
    }
}
