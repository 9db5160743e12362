//! Error types for vector reprojection.

use thiserror::Error;

/// Errors that can occur while building or applying a reprojection.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReprojectionError {
    /// Buffer size does not match the matrix grid.
    #[error("size mismatch: expected {expected} cells, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// The matrix cannot be built from the given coefficients.
    #[error("invalid reprojection matrix: {0}")]
    InvalidMatrix(String),

    /// Invalid projection parameters.
    #[error("projection error: {0}")]
    Projection(String),
}

impl ReprojectionError {
    /// Create a SizeMismatch error.
    pub fn size_mismatch(expected: usize, actual: usize) -> Self {
        Self::SizeMismatch { expected, actual }
    }

    /// Create an InvalidMatrix error.
    pub fn invalid_matrix(msg: impl Into<String>) -> Self {
        Self::InvalidMatrix(msg.into())
    }

    /// Create a Projection error.
    pub fn projection(msg: impl Into<String>) -> Self {
        Self::Projection(msg.into())
    }
}

/// Result type for reprojection operations.
pub type Result<T> = std::result::Result<T, ReprojectionError>;
