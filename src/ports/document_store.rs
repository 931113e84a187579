//! DocumentStore port - Persistence model accessor.
//!
//! Repositories never talk to a database directly. They go through this
//! port, which stores JSON documents in named collections keyed by the
//! document's `id` field.

use async_trait::async_trait;
use serde_json::{Map as JsonMap, Value as JsonValue};

use crate::domain::foundation::{DomainError, Filter, PageQuery, RecordId, ID_FIELD};

/// Port for document persistence.
///
/// Implementations must ensure:
/// - Per-document atomicity (no torn writes)
/// - `find` without a page query returns documents in insertion order
/// - `delete_many` on an already-empty match returns `0`, not an error
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Inserts a document.
    ///
    /// # Errors
    ///
    /// - `DuplicateKey` if a document with the same id exists
    /// - `ValidationFailed` if the document has no valid `id`
    async fn insert(&self, collection: &str, document: JsonValue) -> Result<JsonValue, DomainError>;

    /// Returns documents matching `filter`, sorted and sliced by `page`.
    ///
    /// Zero matches is an empty vector, never an error.
    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        page: Option<&PageQuery>,
    ) -> Result<Vec<JsonValue>, DomainError>;

    /// Counts documents matching `filter`.
    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, DomainError>;

    /// Shallow-merges `patch` into the document with the given id.
    ///
    /// Returns the updated document, or `None` if it does not exist.
    async fn update_one(
        &self,
        collection: &str,
        id: RecordId,
        patch: JsonMap<String, JsonValue>,
    ) -> Result<Option<JsonValue>, DomainError>;

    /// Removes the first matching document. Returns `0` or `1`.
    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64, DomainError>;

    /// Removes every matching document. Returns how many were removed.
    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64, DomainError>;
}

/// Extracts the record id from a document.
pub fn document_id(document: &JsonValue) -> Result<RecordId, DomainError> {
    document
        .get(ID_FIELD)
        .and_then(|value| RecordId::try_from(value).ok())
        .ok_or_else(|| DomainError::validation(ID_FIELD, "Document has no valid identifier"))
}
