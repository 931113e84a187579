//! Document store configuration

use serde::Deserialize;

use super::database::DatabaseConfig;
use super::error::ValidationError;

/// Which DocumentStore adapter backs the repositories
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Process-local collections, lost on exit
    #[default]
    Memory,
    /// JSONB documents in PostgreSQL
    Postgres,
}

/// Document store configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,

    /// Required when `backend = postgres`
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
}

impl StoreConfig {
    /// Validate store configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        match (self.backend, &self.database) {
            (StoreBackend::Memory, _) => Ok(()),
            (StoreBackend::Postgres, Some(database)) => database.validate(),
            (StoreBackend::Postgres, None) => {
                Err(ValidationError::MissingRequired("STORE__DATABASE__URL"))
            }
        }
    }
}
