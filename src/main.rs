//! chatbot-data - Bootstraps the data layer.
//!
//! Loads configuration, connects the configured store and event bus,
//! seeds builtin NLP fixtures into an empty store and reports collection
//! sizes before draining pending events and exiting.

use async_trait::async_trait;
use std::error::Error;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use chatbot_data::adapters::{
    ChannelEventBus, InMemoryDocumentStore, InMemoryEventBus, PostgresDocumentStore,
    RedisEventPublisher,
};
use chatbot_data::application::{NlpFixtures, NlpSeeder};
use chatbot_data::config::{
    AppConfig, EventBackend, EventsConfig, LoggingConfig, StoreBackend, StoreConfig,
    ValidationError as ConfigValidationError,
};
use chatbot_data::domain::attachment::{AttachmentRepository, ATTACHMENT_UPLOADED};
use chatbot_data::domain::foundation::{DomainError, EventEnvelope, Filter};
use chatbot_data::domain::nlp::{self, NlpEntityRepository, NlpSampleEntityRepository};
use chatbot_data::ports::{DocumentStore, EventHandler, EventPublisher, EventSubscriber};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config.logging);
    config.validate()?;

    tracing::info!(
        store = ?config.store.backend,
        events = ?config.events.backend,
        "starting chatbot-data"
    );

    let store = build_store(&config.store).await?;
    let events = build_events(&config.events).await?;

    let entities = NlpEntityRepository::new(Arc::clone(&store), Arc::clone(&events.publisher));
    let samples = NlpSampleEntityRepository::new(Arc::clone(&store));
    let attachments = AttachmentRepository::new(Arc::clone(&store), Arc::clone(&events.publisher));

    if config.seed.enabled {
        let fixtures = match &config.seed.fixtures_path {
            Some(path) => NlpFixtures::from_path(path)?,
            None => NlpFixtures::bundled()?,
        };
        NlpSeeder::new(entities.clone()).seed(&fixtures).await?;
    }

    let all = Filter::new();
    let nlp_entities = entities.count(&all).await?;
    let nlp_values = entities.values().count(&all).await?;
    let nlp_sample_entities = samples.count(&all).await?;
    let attachment_count = attachments.count(&all).await?;
    tracing::info!(
        nlp_entities,
        nlp_values,
        nlp_sample_entities,
        attachments = attachment_count,
        "data layer ready"
    );

    events.shutdown().await;
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let registry = tracing_subscriber::registry().with(logging.env_filter());
    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn build_store(config: &StoreConfig) -> Result<Arc<dyn DocumentStore>, Box<dyn Error>> {
    match (config.backend, &config.database) {
        (StoreBackend::Memory, _) => Ok(Arc::new(InMemoryDocumentStore::new())),
        (StoreBackend::Postgres, Some(database)) => {
            Ok(Arc::new(PostgresDocumentStore::connect(database).await?))
        }
        (StoreBackend::Postgres, None) => {
            Err(ConfigValidationError::MissingRequired("STORE__DATABASE__URL").into())
        }
    }
}

/// Publisher handed to repositories, plus the dispatcher task when events
/// are delivered in-process through a queue.
struct EventWiring {
    publisher: Arc<dyn EventPublisher>,
    dispatcher: Option<(watch::Sender<bool>, JoinHandle<usize>)>,
}

impl EventWiring {
    async fn shutdown(self) {
        let Some((stop, task)) = self.dispatcher else {
            return;
        };
        if stop.send(true).is_err() {
            tracing::warn!("event dispatcher already gone");
        }
        match task.await {
            Ok(dispatched) => tracing::info!(dispatched, "events delivered"),
            Err(e) => tracing::error!(error = %e, "event dispatcher panicked"),
        }
    }
}

async fn build_events(config: &EventsConfig) -> Result<EventWiring, Box<dyn Error>> {
    let logger: Arc<dyn EventHandler> = Arc::new(EventLogger);

    match config.backend {
        EventBackend::InMemory => {
            let bus = Arc::new(InMemoryEventBus::new());
            bus.register(logger);
            Ok(EventWiring {
                publisher: bus,
                dispatcher: None,
            })
        }
        EventBackend::Channel => {
            let (bus, dispatcher) = ChannelEventBus::new(config.channel_capacity);
            bus.register(logger);
            let (stop, stopped) = watch::channel(false);
            let task = tokio::spawn(dispatcher.run(stopped));
            Ok(EventWiring {
                publisher: Arc::new(bus),
                dispatcher: Some((stop, task)),
            })
        }
        EventBackend::Redis => {
            let redis = config
                .redis
                .as_ref()
                .ok_or(ConfigValidationError::MissingRequired("EVENTS__REDIS__URL"))?;
            Ok(EventWiring {
                publisher: Arc::new(RedisEventPublisher::connect(redis).await?),
                dispatcher: None,
            })
        }
    }
}

/// Logs every lifecycle event delivered in-process.
struct EventLogger;

#[async_trait]
impl EventHandler for EventLogger {
    async fn handle(&self, event: EventEnvelope) -> Result<(), DomainError> {
        tracing::info!(
            event_type = %event.event_type,
            collection = %event.collection,
            id = %event.record_id,
            "lifecycle event"
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "EventLogger"
    }

    fn event_types(&self) -> &'static [&'static str] {
        &[
            nlp::events::ENTITY_CREATED,
            nlp::events::ENTITY_UPDATED,
            nlp::events::ENTITY_DELETED,
            nlp::events::VALUE_CREATED,
            nlp::events::VALUE_UPDATED,
            nlp::events::VALUE_DELETED,
            ATTACHMENT_UPLOADED,
        ]
    }
}
