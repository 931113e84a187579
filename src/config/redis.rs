//! Redis settings for event fan-out

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::redact_url;

const SCHEMES: &[&str] = &["redis", "rediss"];

/// `events.redis` section.
///
/// Events are published on `<channel_prefix><event type>`, e.g.
/// `chatbot:hook:nlp:entity:create`.
#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,

    /// Seconds to wait for the initial connection.
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_channel_prefix")]
    pub channel_prefix: String,
}

impl RedisConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout_secs: default_connect_timeout(),
            channel_prefix: default_channel_prefix(),
        }
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// The URL with its password masked, for logs.
    pub fn display_url(&self) -> String {
        redact_url(&self.url)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.url.is_empty() {
            return Err(ValidationError::MissingRequired("EVENTS__REDIS__URL"));
        }
        if !SCHEMES.iter().any(|s| self.url.starts_with(&format!("{}://", s))) {
            return Err(ValidationError::UnsupportedScheme {
                setting: "EVENTS__REDIS__URL",
                expected: SCHEMES,
            });
        }
        if self.channel_prefix.chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidChannelPrefix(
                self.channel_prefix.clone(),
            ));
        }
        Ok(())
    }
}

fn default_connect_timeout() -> u64 {
    5
}

fn default_channel_prefix() -> String {
    "chatbot:".to_string()
}
