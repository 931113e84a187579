//! Redis-backed event publisher for multi-process deployments.
//!
//! Each envelope is serialized to JSON and sent with `PUBLISH` on the
//! channel `<prefix><event_type>`, so consumers in other processes can
//! `PSUBSCRIBE <prefix>hook:nlp:*` and similar patterns.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use crate::config::RedisConfig;
use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::ports::EventPublisher;

/// Publishes lifecycle events to Redis pub/sub.
///
/// Redis pub/sub is fire-and-forget: an event published while nobody is
/// subscribed is dropped by the server.
#[derive(Clone)]
pub struct RedisEventPublisher {
    conn: MultiplexedConnection,
    channel_prefix: String,
}

impl RedisEventPublisher {
    /// Create a publisher over an established connection.
    pub fn new(conn: MultiplexedConnection, channel_prefix: impl Into<String>) -> Self {
        Self {
            conn,
            channel_prefix: channel_prefix.into(),
        }
    }

    /// Open a multiplexed connection using the given configuration.
    pub async fn connect(config: &RedisConfig) -> Result<Self, DomainError> {
        let client = redis::Client::open(config.url.as_str()).map_err(bus_error)?;
        let timeout = config.connect_timeout();
        let conn = tokio::time::timeout(timeout, client.get_multiplexed_tokio_connection())
            .await
            .map_err(|_| {
                DomainError::new(
                    ErrorCode::EventBusError,
                    format!("Timed out connecting to Redis after {:?}", timeout),
                )
            })?
            .map_err(bus_error)?;

        tracing::info!(
            url = %config.display_url(),
            prefix = %config.channel_prefix,
            "connected to Redis event channel"
        );
        Ok(Self::new(conn, config.channel_prefix.clone()))
    }

    /// Channel an event type is published on.
    pub fn channel_for(&self, event_type: &str) -> String {
        channel_name(&self.channel_prefix, event_type)
    }
}

fn channel_name(prefix: &str, event_type: &str) -> String {
    format!("{}{}", prefix, event_type)
}

fn bus_error(e: redis::RedisError) -> DomainError {
    DomainError::new(ErrorCode::EventBusError, format!("Redis error: {}", e))
}

#[async_trait]
impl EventPublisher for RedisEventPublisher {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        let channel = self.channel_for(&event.event_type);
        let payload = serde_json::to_string(&event).map_err(DomainError::serialization)?;

        let mut conn = self.conn.clone();
        let receivers: i64 = conn.publish(&channel, payload).await.map_err(bus_error)?;

        tracing::debug!(channel = %channel, event_id = %event.event_id, receivers, "event published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Publishing requires a live Redis server; only naming is covered here.
    // The integration path is exercised by running the binary with
    // CHATBOT_DATA__EVENTS__BACKEND=redis.

    #[test]
    fn channel_is_prefixed_event_type() {
        assert_eq!(
            channel_name("chatbot:", "hook:nlp:entity:create"),
            "chatbot:hook:nlp:entity:create"
        );
    }

    #[test]
    fn empty_prefix_uses_bare_event_type() {
        assert_eq!(
            channel_name("", "hook:chatbot:attachment:upload"),
            "hook:chatbot:attachment:upload"
        );
    }
}
