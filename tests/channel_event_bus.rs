//! Integration tests for repositories publishing through the channel bus.
//!
//! Repositories return before subscribers run; the dispatcher task delivers
//! queued events and drains what is left on shutdown.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;

use chatbot_data::adapters::{ChannelEventBus, InMemoryDocumentStore};
use chatbot_data::domain::foundation::{DomainError, ErrorCode, EventEnvelope, Filter, Record};
use chatbot_data::domain::nlp::{events, NlpEntity, NlpEntityRepository, NlpValue};
use chatbot_data::ports::{EventHandler, EventSubscriber};

// =============================================================================
// Test Infrastructure
// =============================================================================

#[derive(Default)]
struct Recorder {
    seen: Mutex<Vec<(String, String)>>,
}

impl Recorder {
    fn seen(&self) -> Vec<(String, String)> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl EventHandler for Recorder {
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError> {
        self.seen
            .lock()
            .unwrap()
            .push((event.event_type, event.record_id.to_string()));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "Recorder"
    }
}

struct Rejecting;

#[async_trait]
impl EventHandler for Rejecting {
    async fn handle(&self, _: EventEnvelope) -> Result<(), DomainError> {
        Err(DomainError::new(ErrorCode::InternalError, "subscriber down"))
    }

    fn name(&self) -> &'static str {
        "Rejecting"
    }
}

// =============================================================================
// Tests
// =============================================================================

#[tokio::test]
async fn events_are_delivered_in_publish_order_after_shutdown() {
    let (bus, dispatcher) = ChannelEventBus::new(64);
    let recorder = Arc::new(Recorder::default());
    bus.subscribe_all(events::ALL, recorder.clone());

    let (stop, stopped) = watch::channel(false);
    let task = tokio::spawn(dispatcher.run(stopped));

    let repo = NlpEntityRepository::new(Arc::new(InMemoryDocumentStore::new()), Arc::new(bus));
    let entity = repo.create(NlpEntity::new("first_name").unwrap()).await.unwrap();
    let value = repo
        .values()
        .create(NlpValue::new(entity.id(), "jhon").unwrap())
        .await
        .unwrap();
    repo.delete_one(entity.id()).await.unwrap();

    stop.send(true).unwrap();
    let dispatched = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(dispatched, 4);
    assert_eq!(
        recorder.seen(),
        vec![
            (events::ENTITY_CREATED.to_string(), entity.id().to_string()),
            (events::VALUE_CREATED.to_string(), value.id().to_string()),
            (events::VALUE_DELETED.to_string(), value.id().to_string()),
            (events::ENTITY_DELETED.to_string(), entity.id().to_string()),
        ]
    );
}

#[tokio::test]
async fn writes_beyond_queue_capacity_are_all_delivered() {
    let (bus, dispatcher) = ChannelEventBus::new(1);
    let recorder = Arc::new(Recorder::default());
    bus.subscribe(events::ENTITY_CREATED, recorder.clone());
    let (stop, stopped) = watch::channel(false);
    let task = tokio::spawn(dispatcher.run(stopped));
    let repo = NlpEntityRepository::new(Arc::new(InMemoryDocumentStore::new()), Arc::new(bus));

    let mut created = Vec::new();
    for name in ["a", "b", "c", "d", "e"] {
        let entity = repo.create(NlpEntity::new(name).unwrap()).await.unwrap();
        created.push(entity.id().to_string());
    }

    stop.send(true).unwrap();
    let dispatched = tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(repo.count(&Filter::new()).await.unwrap(), 5);
    assert_eq!(dispatched, 5);
    let delivered: Vec<_> = recorder.seen().into_iter().map(|(_, id)| id).collect();
    assert_eq!(delivered, created);
}

#[tokio::test]
async fn failing_subscriber_does_not_block_others() {
    let (bus, mut dispatcher) = ChannelEventBus::new(16);
    let recorder = Arc::new(Recorder::default());
    bus.subscribe(events::ENTITY_CREATED, Arc::new(Rejecting));
    bus.subscribe(events::ENTITY_CREATED, recorder.clone());
    let repo = NlpEntityRepository::new(Arc::new(InMemoryDocumentStore::new()), Arc::new(bus));

    repo.create(NlpEntity::new("color").unwrap()).await.unwrap();

    assert_eq!(dispatcher.drain().await, 1);
    assert_eq!(recorder.seen().len(), 1);
}

#[tokio::test]
async fn stopped_dispatcher_does_not_fail_writes() {
    let (bus, dispatcher) = ChannelEventBus::new(16);
    drop(dispatcher);
    let repo = NlpEntityRepository::new(Arc::new(InMemoryDocumentStore::new()), Arc::new(bus));

    let created = repo.create(NlpEntity::new("color").unwrap()).await.unwrap();

    assert!(repo.find_by_id(created.id()).await.unwrap().is_some());
}
