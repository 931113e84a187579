//! In-Memory Document Store Adapter
//!
//! Keeps collections as insertion-ordered vectors of JSON documents.
//! Useful for testing and development. Supports injecting failures per
//! collection to exercise cascade error paths.

use async_trait::async_trait;
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, Filter, PageQuery, RecordId};
use crate::ports::{document_id, DocumentStore};

/// In-memory document storage
#[derive(Debug, Clone, Default)]
pub struct InMemoryDocumentStore {
    collections: Arc<RwLock<HashMap<String, Vec<JsonValue>>>>,
    delete_faults: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemoryDocumentStore {
    /// Create a new, empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every delete on `collection` fail with a database error.
    pub async fn fail_deletes_in(&self, collection: &str, message: impl Into<String>) {
        self.delete_faults
            .write()
            .await
            .insert(collection.to_string(), message.into());
    }

    /// Remove all injected failures
    pub async fn clear_faults(&self) {
        self.delete_faults.write().await.clear();
    }

    /// Number of documents in a collection
    pub async fn document_count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }

    /// Drop all collections
    pub async fn clear(&self) {
        self.collections.write().await.clear();
    }

    async fn check_delete_fault(&self, collection: &str) -> Result<(), DomainError> {
        match self.delete_faults.read().await.get(collection) {
            Some(message) => Err(DomainError::database(
                &format!("delete from '{}'", collection),
                message,
            )),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(&self, collection: &str, document: JsonValue) -> Result<JsonValue, DomainError> {
        let id = document_id(&document)?;
        let mut collections = self.collections.write().await;
        let documents = collections.entry(collection.to_string()).or_default();

        if documents
            .iter()
            .any(|d| document_id(d).is_ok_and(|existing| existing == id))
        {
            return Err(DomainError::new(
                ErrorCode::DuplicateKey,
                format!("Document {} already exists in '{}'", id, collection),
            ));
        }

        documents.push(document.clone());
        Ok(document)
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Filter,
        page: Option<&PageQuery>,
    ) -> Result<Vec<JsonValue>, DomainError> {
        let collections = self.collections.read().await;
        let matching: Vec<JsonValue> = collections
            .get(collection)
            .map(|documents| {
                documents
                    .iter()
                    .filter(|d| filter.matches(d))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        Ok(match page {
            Some(page) => page.apply(matching),
            None => matching,
        })
    }

    async fn count(&self, collection: &str, filter: &Filter) -> Result<u64, DomainError> {
        let collections = self.collections.read().await;
        let count = collections
            .get(collection)
            .map_or(0, |documents| documents.iter().filter(|d| filter.matches(d)).count());
        Ok(count as u64)
    }

    async fn update_one(
        &self,
        collection: &str,
        id: RecordId,
        patch: JsonMap<String, JsonValue>,
    ) -> Result<Option<JsonValue>, DomainError> {
        let mut collections = self.collections.write().await;
        let target = collections.get_mut(collection).and_then(|documents| {
            documents
                .iter_mut()
                .find(|d| document_id(d).is_ok_and(|existing| existing == id))
        });

        let Some(document) = target else {
            return Ok(None);
        };
        let Some(fields) = document.as_object_mut() else {
            return Err(DomainError::serialization(format!(
                "Document {} in '{}' is not an object",
                id, collection
            )));
        };
        fields.extend(patch);

        Ok(Some(document.clone()))
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<u64, DomainError> {
        self.check_delete_fault(collection).await?;

        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(0);
        };
        match documents.iter().position(|d| filter.matches(d)) {
            Some(index) => {
                documents.remove(index);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_many(&self, collection: &str, filter: &Filter) -> Result<u64, DomainError> {
        self.check_delete_fault(collection).await?;

        let mut collections = self.collections.write().await;
        let Some(documents) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = documents.len();
        documents.retain(|d| !filter.matches(d));
        Ok((before - documents.len()) as u64)
    }
}
