//! Configuration error types

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while building [`AppConfig`](super::AppConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// A loaded configuration that cannot be used.
///
/// Setting names are given without the `CHATBOT_DATA__` prefix.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("{setting} must use one of the schemes {expected:?}")]
    UnsupportedScheme {
        setting: &'static str,
        expected: &'static [&'static str],
    },

    #[error("Pool min_connections ({min}) exceeds max_connections ({max})")]
    InvalidPoolSize { min: u32, max: u32 },

    #[error("Pool max_connections ({max}) exceeds the limit of {limit}")]
    PoolSizeTooLarge { max: u32, limit: u32 },

    #[error("Event channel capacity {capacity} is outside 1..={limit}")]
    InvalidChannelCapacity { capacity: usize, limit: usize },

    #[error("Redis channel prefix '{0}' contains whitespace")]
    InvalidChannelPrefix(String),

    #[error("Invalid log filter '{0}'")]
    InvalidLogFilter(String),

    #[error("Seed fixtures not found at {0}")]
    FixturesNotFound(PathBuf),
}
