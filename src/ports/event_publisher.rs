//! Outbound side of record lifecycle events.
//!
//! Repositories hold an `Arc<dyn EventPublisher>` handed to them when they
//! are built. Whether events land in a test recorder, a tokio queue or a
//! Redis channel is decided by whoever wires the repositories.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Publishes lifecycle events to zero or more subscribers.
///
/// Delivery guarantees expected from implementations:
/// - at-least-once: a subscriber may see the same `event_id` twice
/// - events of one type arrive in the order a publisher sent them
/// - `publish` returns without waiting for subscribers, except on the
///   synchronous in-memory bus used in tests
///
/// An `Err` means the event was not accepted for delivery. Repositories log
/// it and carry on; a lost notification never rolls back a write.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError>;

    /// Publishes `events` in order, stopping at the first rejection.
    async fn publish_all(&self, events: Vec<EventEnvelope>) -> Result<(), DomainError> {
        for event in events {
            self.publish(event).await?;
        }
        Ok(())
    }
}
