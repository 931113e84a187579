//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, query criteria, the record contract, lifecycle
//! events, error types and the generic base repository every domain
//! repository is built on.

mod emitter;
mod errors;
mod events;
mod filter;
mod ids;
mod page;
mod record;
mod repository;
mod timestamp;

pub use emitter::RecordEventEmitter;
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use events::{EventEnvelope, EventId, EventMetadata};
pub use filter::{Condition, Filter, ID_FIELD};
pub use ids::RecordId;
pub use page::{compare_json, PageQuery, Sort, SortDirection};
pub use record::{Record, RecordMeta};
pub use repository::{BaseRepository, DeleteResult, LifecycleHooks, NoHooks};
pub use timestamp::Timestamp;
