//! Configuration for the unit system.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Environment variable naming an additional unit database file.
pub const DATABASE_PATH_ENV: &str = "UNITS_DATABASE_PATH";

/// Configuration for the process-wide unit registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSystemConfig {
    /// Optional YAML/JSON unit database merged over the built-in units.
    pub database_path: Option<PathBuf>,
}

impl UnitSystemConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var(DATABASE_PATH_ENV) {
            if !val.trim().is_empty() {
                config.database_path = Some(PathBuf::from(val));
            }
        }

        config
    }

    /// Use a unit database file.
    pub fn with_database(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = Some(path.into());
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(path) = &self.database_path {
            if !path.is_file() {
                return Err(format!("unit database {} is not a file", path.display()));
            }
        }
        Ok(())
    }
}
