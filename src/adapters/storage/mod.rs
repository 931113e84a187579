//! Storage Adapters
//!
//! Implementations of the DocumentStore port.
//!
//! ## Available Adapters
//!
//! - **InMemoryDocumentStore** - Collections held in memory (testing/development)
//! - **PostgresDocumentStore** - JSONB documents in a single PostgreSQL table
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{InMemoryDocumentStore, PostgresDocumentStore};
//!
//! // Production: PostgreSQL
//! let store = PostgresDocumentStore::connect(&config.store.database).await?;
//!
//! // Testing: in-memory
//! let store = InMemoryDocumentStore::new();
//! ```

mod in_memory_document_store;
mod postgres_document_store;

pub use in_memory_document_store::InMemoryDocumentStore;
pub use postgres_document_store::PostgresDocumentStore;
