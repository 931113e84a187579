//! Event bus configuration

use serde::Deserialize;

use super::error::ValidationError;
use super::redis::RedisConfig;

const MAX_CHANNEL_CAPACITY: usize = 1 << 20;

/// Which event bus adapter receives lifecycle events
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EventBackend {
    /// Synchronous in-process delivery
    InMemory,
    /// Bounded queue drained by a dispatcher task
    #[default]
    Channel,
    /// Redis pub/sub
    Redis,
}

/// Event bus configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    #[serde(default)]
    pub backend: EventBackend,

    /// Queue size for the channel backend
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,

    /// Required when `backend = redis`
    #[serde(default)]
    pub redis: Option<RedisConfig>,
}

impl EventsConfig {
    /// Validate event bus configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self.backend {
            EventBackend::InMemory => Ok(()),
            EventBackend::Channel => {
                if self.channel_capacity == 0 || self.channel_capacity > MAX_CHANNEL_CAPACITY {
                    return Err(ValidationError::InvalidChannelCapacity {
                        capacity: self.channel_capacity,
                        limit: MAX_CHANNEL_CAPACITY,
                    });
                }
                Ok(())
            }
            EventBackend::Redis => match &self.redis {
                Some(redis) => redis.validate(),
                None => Err(ValidationError::MissingRequired("EVENTS__REDIS__URL")),
            },
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            backend: EventBackend::default(),
            channel_capacity: default_channel_capacity(),
            redis: None,
        }
    }
}

fn default_channel_capacity() -> usize {
    1024
}
