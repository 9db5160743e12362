//! Error types for unit parsing and conversion.

use thiserror::Error;

/// Errors that can occur while parsing or converting units.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UnitsError {
    /// The unit string could not be parsed.
    #[error("cannot parse unit '{unit}': {reason}")]
    Parse { unit: String, reason: String },

    /// Both units parsed but there is no dimension-preserving conversion.
    #[error("unit '{from}' is not convertible to '{to}'")]
    Incompatible { from: String, to: String },

    /// A linear (scale, offset) form was requested from a non-affine conversion.
    #[error("conversion is not linear: {0}")]
    NonLinear(String),

    /// The unit registry could not be built.
    #[error("unit system failed to initialize: {0}")]
    SystemInit(String),
}

impl UnitsError {
    /// Create a Parse error.
    pub fn parse(unit: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            unit: unit.into(),
            reason: reason.into(),
        }
    }

    /// Create an Incompatible error.
    pub fn incompatible(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self::Incompatible {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Create a NonLinear error.
    pub fn non_linear(msg: impl Into<String>) -> Self {
        Self::NonLinear(msg.into())
    }

    /// Create a SystemInit error.
    pub fn system_init(msg: impl Into<String>) -> Self {
        Self::SystemInit(msg.into())
    }
}

/// Result type for unit operations.
pub type Result<T> = std::result::Result<T, UnitsError>;
