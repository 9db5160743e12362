//! Configuration for the grid processor.

use serde::{Deserialize, Serialize};

/// Configuration for the grid processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridProcessorConfig {
    /// Element count above which element-wise transforms use rayon.
    pub parallel_threshold: usize,

    /// Element type of buffers returned by scaled reads.
    pub scaled_output: ScaledOutput,

    /// How scaled writes narrow values into integer variables, unless the
    /// sink defines its own rule.
    pub narrowing: Narrowing,
}

impl Default for GridProcessorConfig {
    fn default() -> Self {
        Self {
            parallel_threshold: 64 * 1024,
            scaled_output: ScaledOutput::Float64,
            narrowing: Narrowing::Round,
        }
    }
}

impl GridProcessorConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("GRID_PARALLEL_THRESHOLD") {
            if let Ok(threshold) = val.parse() {
                config.parallel_threshold = threshold;
            }
        }

        if let Ok(val) = std::env::var("GRID_SCALED_OUTPUT") {
            config.scaled_output = ScaledOutput::from_str(&val);
        }

        if let Ok(val) = std::env::var("GRID_NARROWING") {
            config.narrowing = Narrowing::from_str(&val);
        }

        config
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if self.parallel_threshold == 0 {
            return Err("parallel_threshold must be > 0".to_string());
        }

        Ok(())
    }
}

/// Element type of scaled read results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ScaledOutput {
    /// Always `f32`.
    Float32,
    /// Always `f64`.
    #[default]
    Float64,
    /// The variable's own type when nothing is converted, otherwise floats
    /// keep their width and integers widen to `f64`.
    Native,
}

impl ScaledOutput {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "float32" | "f32" | "float" => Self::Float32,
            "native" => Self::Native,
            _ => Self::Float64,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Float32 => "float32",
            Self::Float64 => "float64",
            Self::Native => "native",
        }
    }
}

impl std::fmt::Display for ScaledOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rule for storing a floating value in an integer element.
///
/// Values outside the integer type's range saturate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Narrowing {
    /// Round half away from zero.
    #[default]
    Round,
    /// Drop the fractional part.
    Truncate,
}

impl Narrowing {
    /// Parse from string (case-insensitive).
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "truncate" | "trunc" => Self::Truncate,
            _ => Self::Round,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Round => "round",
            Self::Truncate => "truncate",
        }
    }

    /// Apply the rule to a value.
    #[inline]
    pub fn apply(&self, value: f64) -> f64 {
        match self {
            Self::Round => value.round(),
            Self::Truncate => value.trunc(),
        }
    }
}

impl std::fmt::Display for Narrowing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GridProcessorConfig::default();
        assert_eq!(config.parallel_threshold, 64 * 1024);
        assert_eq!(config.scaled_output, ScaledOutput::Float64);
        assert_eq!(config.narrowing, Narrowing::Round);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zero_threshold() {
        let config = GridProcessorConfig {
            parallel_threshold: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_scaled_output_from_str() {
        assert_eq!(ScaledOutput::from_str("FLOAT32"), ScaledOutput::Float32);
        assert_eq!(ScaledOutput::from_str("native"), ScaledOutput::Native);
        assert_eq!(ScaledOutput::from_str("unknown"), ScaledOutput::Float64);
    }

    #[test]
    fn test_narrowing() {
        assert_eq!(Narrowing::from_str("Truncate"), Narrowing::Truncate);
        assert_eq!(Narrowing::Round.apply(2.5), 3.0);
        assert_eq!(Narrowing::Round.apply(-2.5), -3.0);
        assert_eq!(Narrowing::Truncate.apply(-2.7), -2.0);
        assert_eq!(Narrowing::Truncate.to_string(), "truncate");
    }
}
