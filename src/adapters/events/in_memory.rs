//! Recording event bus for unit and integration tests.
//!
//! Handlers run inline on the publishing task, so once a repository call
//! returns every subscriber has already seen its events.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::domain::foundation::{DomainError, ErrorCode, EventEnvelope, RecordId};
use crate::ports::{EventHandler, EventPublisher, EventSubscriber};

#[derive(Default)]
struct BusState {
    routes: HashMap<String, Vec<Arc<dyn EventHandler>>>,
    log: Vec<EventEnvelope>,
}

/// Event bus that keeps a log of everything published to it.
///
/// Handler failures are collected and reported once every handler for the
/// event has run. The event stays in the log either way.
///
/// ```ignore
/// let bus = Arc::new(InMemoryEventBus::new());
/// let repo = NlpEntityRepository::new(store, bus.clone());
///
/// repo.create(NlpEntity::new("color")?).await?;
/// assert!(bus.has_event("hook:nlp:entity:create"));
/// ```
pub struct InMemoryEventBus {
    state: RwLock<BusState>,
}

impl InMemoryEventBus {
    pub fn new() -> Self {
        Self {
            state: RwLock::new(BusState::default()),
        }
    }

    // The log is append-only, so a writer that panicked cannot corrupt it.
    fn read(&self) -> RwLockReadGuard<'_, BusState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BusState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn recorded(&self, keep: impl Fn(&EventEnvelope) -> bool) -> Vec<EventEnvelope> {
        self.read().log.iter().filter(|e| keep(e)).cloned().collect()
    }

    /// Every event published so far, oldest first.
    pub fn published_events(&self) -> Vec<EventEnvelope> {
        self.read().log.clone()
    }

    pub fn events_of_type(&self, event_type: &str) -> Vec<EventEnvelope> {
        self.recorded(|e| e.event_type == event_type)
    }

    pub fn events_for_record(&self, record_id: RecordId) -> Vec<EventEnvelope> {
        self.recorded(|e| e.record_id == record_id)
    }

    pub fn has_event(&self, event_type: &str) -> bool {
        self.read().log.iter().any(|e| e.event_type == event_type)
    }

    pub fn event_count(&self) -> usize {
        self.read().log.len()
    }

    /// Forgets the log. Subscriptions are kept.
    pub fn clear(&self) {
        self.write().log.clear();
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventBus {
    async fn publish(&self, event: EventEnvelope) -> Result<(), DomainError> {
        let handlers = {
            let mut state = self.write();
            state.log.push(event.clone());
            state.routes.get(&event.event_type).cloned().unwrap_or_default()
        };

        let mut failures = Vec::new();
        for handler in handlers {
            if let Err(err) = handler.handle(event.clone()).await {
                failures.push(format!("{} ({})", handler.name(), err.message));
            }
        }

        if failures.is_empty() {
            return Ok(());
        }
        Err(DomainError::new(
            ErrorCode::EventBusError,
            format!("{} handler(s) failed for {}", failures.len(), event.event_type),
        )
        .with_detail("handlers", failures.join("; ")))
    }
}

impl EventSubscriber for InMemoryEventBus {
    fn subscribe(&self, event_type: &str, handler: Arc<dyn EventHandler>) {
        self.write()
            .routes
            .entry(event_type.to_owned())
            .or_default()
            .push(handler);
    }
}
