//! Event bus adapters.
//!
//! Adapters implement the event publishing and subscribing ports
//! for different environments:
//!
//! - `InMemoryEventBus` - Synchronous, recording bus for tests
//! - `ChannelEventBus` - Bounded tokio queue drained by an `EventDispatcher` task
//! - `RedisEventPublisher` - Redis pub/sub fan-out to other processes

mod channel;
mod in_memory;
mod redis_publisher;

pub use channel::{ChannelEventBus, EventDispatcher};
pub use in_memory::InMemoryEventBus;
pub use redis_publisher::RedisEventPublisher;
