//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `storage` - Document stores (in-memory, PostgreSQL)
//! - `events` - Event bus implementations (in-memory, channel, Redis)

pub mod events;
pub mod storage;

pub use events::{ChannelEventBus, EventDispatcher, InMemoryEventBus, RedisEventPublisher};
pub use storage::{InMemoryDocumentStore, PostgresDocumentStore};
