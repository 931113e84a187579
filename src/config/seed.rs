//! Seed configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Fixture loading at startup
#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// YAML fixtures; the bundled defaults are used when unset
    #[serde(default)]
    pub fixtures_path: Option<PathBuf>,
}

impl SeedConfig {
    /// Validate seed configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.fixtures_path {
            Some(path) if self.enabled && !path.is_file() => {
                Err(ValidationError::FixturesNotFound(path.clone()))
            }
            _ => Ok(()),
        }
    }
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            fixtures_path: None,
        }
    }
}

fn default_enabled() -> bool {
    true
}
