//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence Port
//!
//! - `DocumentStore` - Collections of JSON documents keyed by record id
//!
//! ## Event Ports
//!
//! - `EventPublisher` - Port for publishing lifecycle events
//! - `EventSubscriber` - Port for subscribing to lifecycle events
//! - `EventHandler` - Handler that processes incoming events

mod document_store;
mod event_publisher;
mod event_subscriber;

pub use document_store::{document_id, DocumentStore};
pub use event_publisher::EventPublisher;
pub use event_subscriber::{EventBus, EventHandler, EventSubscriber};
