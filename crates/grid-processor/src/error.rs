//! Error types for grid processing.

use reprojection::ReprojectionError;
use thiserror::Error;
use units::UnitsError;

/// Errors that can occur during grid processing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridProcessorError {
    /// A slice range does not fit inside its dimension.
    #[error("slice {start}+{length} is outside dimension '{dimension}' of length {size}")]
    OutOfBounds {
        dimension: String,
        start: usize,
        length: usize,
        size: usize,
    },

    /// A slice names a dimension that is not part of the variable's shape.
    #[error("unknown dimension '{0}'")]
    UnknownDimension(String),

    /// The variable does not exist in the dataset.
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),

    /// Dataset schema violates the data model.
    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// A buffer does not have the number of elements its slice requires.
    #[error("size mismatch: expected {expected} elements, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Unit parsing or conversion failed.
    #[error(transparent)]
    Units(#[from] UnitsError),

    /// Vector reprojection failed.
    #[error(transparent)]
    Reprojection(#[from] ReprojectionError),

    /// The storage backend failed.
    #[error("backend error: {0}")]
    Backend(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl GridProcessorError {
    /// Create an OutOfBounds error.
    pub fn out_of_bounds(dimension: impl Into<String>, start: usize, length: usize, size: usize) -> Self {
        Self::OutOfBounds {
            dimension: dimension.into(),
            start,
            length,
            size,
        }
    }

    /// Create an UnknownDimension error.
    pub fn unknown_dimension(name: impl Into<String>) -> Self {
        Self::UnknownDimension(name.into())
    }

    /// Create an UnknownVariable error.
    pub fn unknown_variable(name: impl Into<String>) -> Self {
        Self::UnknownVariable(name.into())
    }

    /// Create an InvalidSchema error.
    pub fn invalid_schema(msg: impl Into<String>) -> Self {
        Self::InvalidSchema(msg.into())
    }

    /// Create a SizeMismatch error.
    pub fn size_mismatch(expected: usize, actual: usize) -> Self {
        Self::SizeMismatch { expected, actual }
    }

    /// Create a Backend error.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

impl From<std::io::Error> for GridProcessorError {
    fn from(err: std::io::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

/// Result type for grid processor operations.
pub type Result<T> = std::result::Result<T, GridProcessorError>;
