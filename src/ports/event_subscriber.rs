//! Inbound side of record lifecycle events.
//!
//! Downstream consumers (search indexing, audit, webhook dispatch) register
//! handlers on a bus instead of being called by repositories directly.

use async_trait::async_trait;
use std::sync::Arc;

use crate::domain::foundation::{DomainError, EventEnvelope};

/// Consumer of lifecycle events.
///
/// Delivery is at-least-once, so `handle` must tolerate duplicates. A
/// failing handler is reported by the bus and never prevents other
/// handlers from seeing the event.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError>;

    /// Name used in logs when the handler fails.
    fn name(&self) -> &'static str;

    /// Event types the handler wants when registered through
    /// [`EventSubscriber::register`].
    fn event_types(&self) -> &'static [&'static str] {
        &[]
    }
}

/// Routing table from event type to handlers.
pub trait EventSubscriber: Send + Sync {
    fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>);

    fn subscribe_all(&self, event_types: &[&str], handler: Arc<dyn EventHandler>) {
        for event_type in event_types {
            self.subscribe(event_type, Arc::clone(&handler));
        }
    }

    /// Subscribes `handler` to the event types it declares.
    fn register(&self, handler: Arc<dyn EventHandler>) {
        let event_types = handler.event_types();
        if event_types.is_empty() {
            tracing::warn!(handler = handler.name(), "handler declares no event types");
        }
        self.subscribe_all(event_types, handler);
    }
}

/// A bus both repositories and consumers can be wired to.
pub trait EventBus: super::EventPublisher + EventSubscriber {}

impl<T: super::EventPublisher + EventSubscriber> EventBus for T {}
