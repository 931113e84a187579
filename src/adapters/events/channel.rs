//! ChannelEventBus - Message-passing event bus over a bounded tokio queue.
//!
//! Repositories publish into the queue and return immediately; a separate
//! [`EventDispatcher`] task drains it and fans events out to subscribers.
//!
//! ## Delivery
//!
//! - Events are dispatched in publish order
//! - Publishing waits for queue space when the queue is full, never for
//!   subscribers, so no event is dropped while the dispatcher runs
//! - Every handler subscribed to the event type is invoked
//! - A failing handler is logged and does not affect the others
//!
//! ## Graceful Shutdown
//!
//! The dispatcher listens for a shutdown signal and dispatches everything
//! still queued before stopping.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tokio::sync::mpsc;
use tokio::sync::watch;

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope};
use crate::ports::{EventHandler, EventPublisher, EventSubscriber};

type HandlerMap = Arc<RwLock<HashMap<String, Vec<Arc<dyn EventHandler>>>>>;

/// Publishing half of the channel bus.
///
/// Cloning shares the queue and the subscriber table.
#[derive(Clone)]
pub struct ChannelEventBus {
    sender: mpsc::Sender<EventEnvelope>,
    handlers: HandlerMap,
}

impl ChannelEventBus {
    /// Creates a bus with room for `capacity` queued events and the
    /// dispatcher that drains it.
    pub fn new(capacity: usize) -> (Self, EventDispatcher) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        let handlers: HandlerMap = Arc::default();

        let bus = Self {
            sender,
            handlers: Arc::clone(&handlers),
        };
        let dispatcher = EventDispatcher { receiver, handlers };
        (bus, dispatcher)
    }

    /// Events waiting for the dispatcher.
    pub fn queued(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }
}

#[async_trait]
impl EventPublisher for ChannelEventBus {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        self.sender.send(event).await.map_err(|e| {
            DomainError::new(
                ErrorCode::EventBusError,
                format!("Event dispatcher stopped, dropped '{}'", e.0.event_type),
            )
        })
    }
}

impl EventSubscriber for ChannelEventBus {
    fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(event_type.to_string())
            .or_default()
            .push(handler);
    }
}

/// Consuming half of the channel bus.
pub struct EventDispatcher {
    receiver: mpsc::Receiver<EventEnvelope>,
    handlers: HandlerMap,
}

impl EventDispatcher {
    /// Dispatches events until shutdown is signalled or every publisher is
    /// dropped. Returns the number of events dispatched.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) -> usize {
        let mut dispatched = 0;

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        dispatched += self.drain().await;
                        tracing::info!(dispatched, "event dispatcher stopped");
                        return dispatched;
                    }
                }

                next = self.receiver.recv() => match next {
                    Some(event) => {
                        self.dispatch(event).await;
                        dispatched += 1;
                    }
                    None => {
                        tracing::info!(dispatched, "event queue closed");
                        return dispatched;
                    }
                }
            }
        }
    }

    /// Dispatches every event currently queued without waiting for more.
    pub async fn drain(&mut self) -> usize {
        let mut dispatched = 0;
        while let Ok(event) = self.receiver.try_recv() {
            self.dispatch(event).await;
            dispatched += 1;
        }
        dispatched
    }

    async fn dispatch(&self, event: EventEnvelope) {
        let type_handlers: Vec<Arc<dyn EventHandler>> = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&event.event_type)
            .cloned()
            .unwrap_or_default();

        if type_handlers.is_empty() {
            tracing::trace!(event_type = %event.event_type, "no subscribers");
            return;
        }

        for handler in type_handlers {
            if let Err(e) = handler.handle(event.clone()).await {
                tracing::warn!(
                    handler = handler.name(),
                    event_id = %event.event_id,
                    event_type = %event.event_type,
                    error = %e,
                    "event handler failed"
                );
            }
        }
    }
}
