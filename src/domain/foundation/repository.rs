//! Generic base repository with lifecycle extension points.
//!
//! `BaseRepository<T>` wraps a [`DocumentStore`] collection and offers
//! CRUD, pagination and counting for any [`Record`] type. Entity-specific
//! behavior (cascading deletes, event emission) is not written by
//! overriding methods; a [`LifecycleHooks<T>`] strategy is supplied when the
//! repository is constructed.
//!
//! # Example
//!
//! ```ignore
//! struct EntityHooks { emitter: RecordEventEmitter }
//!
//! #[async_trait]
//! impl LifecycleHooks<NlpEntity> for EntityHooks {
//!     async fn post_create(&self, created: &NlpEntity) -> Result<(), DomainError> {
//!         self.emitter.emit_unless_builtin("hook:nlp:entity:create", created).await;
//!         Ok(())
//!     }
//! }
//!
//! let repo = BaseRepository::with_hooks(store, Arc::new(EntityHooks { emitter }));
//! ```

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::sync::Arc;

use super::{DomainError, ErrorCode, Filter, PageQuery, Record, RecordId, Timestamp, ID_FIELD};
use crate::ports::DocumentStore;

/// Fields a patch may never touch.
const IMMUTABLE_FIELDS: &[&str] = &[ID_FIELD, "createdAt"];

/// Outcome of a delete operation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeleteResult {
    pub deleted_count: u64,
}

/// Extension points invoked by [`BaseRepository`].
///
/// All hooks default to no-ops. A failing `pre_delete` aborts the delete
/// before anything is removed from the collection.
#[async_trait]
pub trait LifecycleHooks<T: Record>: Send + Sync {
    /// Runs after a record was persisted.
    async fn post_create(&self, _created: &T) -> Result<(), DomainError> {
        Ok(())
    }

    /// Runs after a record was updated, with the resulting state.
    async fn post_update(&self, _updated: &T) -> Result<(), DomainError> {
        Ok(())
    }

    /// Runs before records matching `criteria` are removed.
    ///
    /// `repo` gives access to the records about to be deleted.
    async fn pre_delete(
        &self,
        _repo: &BaseRepository<T>,
        _criteria: &Filter,
    ) -> Result<(), DomainError> {
        Ok(())
    }
}

/// Hooks that do nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHooks;

impl<T: Record> LifecycleHooks<T> for NoHooks {}

/// CRUD access to the collection of `T`.
pub struct BaseRepository<T: Record> {
    store: Arc<dyn DocumentStore>,
    hooks: Arc<dyn LifecycleHooks<T>>,
}

impl<T: Record> Clone for BaseRepository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            hooks: Arc::clone(&self.hooks),
        }
    }
}

impl<T: Record> BaseRepository<T> {
    /// Creates a repository without hooks.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_hooks(store, Arc::new(NoHooks))
    }

    /// Creates a repository driven by the given hooks.
    pub fn with_hooks(store: Arc<dyn DocumentStore>, hooks: Arc<dyn LifecycleHooks<T>>) -> Self {
        Self { store, hooks }
    }

    /// Name of the backing collection.
    pub fn collection(&self) -> &'static str {
        T::COLLECTION
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Returns every record matching `filter`, in insertion order.
    pub async fn find(&self, filter: &Filter) -> Result<Vec<T>, DomainError> {
        let documents = self.store.find(T::COLLECTION, filter, None).await?;
        decode_all(documents)
    }

    /// Returns every record of the collection.
    pub async fn find_all(&self) -> Result<Vec<T>, DomainError> {
        self.find(&Filter::new()).await
    }

    /// Returns one page of records matching `filter`.
    pub async fn find_page(&self, filter: &Filter, page: &PageQuery) -> Result<Vec<T>, DomainError> {
        let documents = self.store.find(T::COLLECTION, filter, Some(page)).await?;
        decode_all(documents)
    }

    /// Counts records matching `filter`.
    pub async fn count(&self, filter: &Filter) -> Result<u64, DomainError> {
        self.store.count(T::COLLECTION, filter).await
    }

    /// Returns the first record matching `filter`.
    ///
    /// # Errors
    ///
    /// `NotFound` when nothing matches.
    pub async fn find_one(&self, filter: &Filter) -> Result<T, DomainError> {
        let page = PageQuery::new().limit(1);
        let mut documents = self.store.find(T::COLLECTION, filter, Some(&page)).await?;
        match documents.pop() {
            Some(document) => T::from_document(document),
            None => Err(DomainError::not_found(T::COLLECTION, filter)),
        }
    }

    /// Looks up a record by id, `None` when absent.
    pub async fn find_by_id(&self, id: RecordId) -> Result<Option<T>, DomainError> {
        match self.find_one(&Filter::by_id(id)).await {
            Ok(record) => Ok(Some(record)),
            Err(e) if e.is(ErrorCode::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Looks up a record by id.
    ///
    /// # Errors
    ///
    /// `NotFound` when the id does not exist.
    pub async fn find_one_by_id(&self, id: RecordId) -> Result<T, DomainError> {
        self.find_one(&Filter::by_id(id)).await
    }

    /// Persists a record, then runs `post_create`.
    pub async fn create(&self, record: T) -> Result<T, DomainError> {
        let stored = self
            .store
            .insert(T::COLLECTION, record.to_document()?)
            .await?;
        let created = T::from_document(stored)?;

        tracing::debug!(collection = T::COLLECTION, id = %created.id(), "record created");
        self.hooks.post_create(&created).await?;
        Ok(created)
    }

    /// Persists several records in order; hooks run once per record.
    pub async fn create_many(&self, records: Vec<T>) -> Result<Vec<T>, DomainError> {
        let mut created = Vec::with_capacity(records.len());
        for record in records {
            created.push(self.create(record).await?);
        }
        Ok(created)
    }

    /// Applies a partial update, then runs `post_update` with the result.
    ///
    /// `patch` must be a JSON object. `updatedAt` is always refreshed.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if the patch is not an object or touches `id`/`createdAt`
    /// - `NotFound` if the id does not exist
    pub async fn update_one(&self, id: RecordId, patch: JsonValue) -> Result<T, DomainError> {
        let JsonValue::Object(mut patch) = patch else {
            return Err(DomainError::validation("patch", "Patch must be a JSON object"));
        };
        if let Some(field) = IMMUTABLE_FIELDS.iter().find(|f| patch.contains_key(**f)) {
            return Err(DomainError::validation(
                *field,
                format!("Field '{}' cannot be updated", field),
            ));
        }
        patch.insert("updatedAt".to_string(), Timestamp::now().to_document());

        let updated = self
            .store
            .update_one(T::COLLECTION, id, patch)
            .await?
            .ok_or_else(|| DomainError::not_found(T::COLLECTION, &Filter::by_id(id)))?;
        let updated = T::from_document(updated)?;

        tracing::debug!(collection = T::COLLECTION, id = %id, "record updated");
        self.hooks.post_update(&updated).await?;
        Ok(updated)
    }

    /// Deletes a record by id after running `pre_delete`.
    pub async fn delete_one(&self, id: RecordId) -> Result<DeleteResult, DomainError> {
        let criteria = Filter::by_id(id);
        self.hooks.pre_delete(self, &criteria).await?;

        let deleted_count = self.store.delete_one(T::COLLECTION, &criteria).await?;
        tracing::debug!(collection = T::COLLECTION, id = %id, deleted_count, "delete one");
        Ok(DeleteResult { deleted_count })
    }

    /// Deletes every record matching `filter` after running `pre_delete`.
    pub async fn delete_many(&self, filter: &Filter) -> Result<DeleteResult, DomainError> {
        self.hooks.pre_delete(self, filter).await?;

        let deleted_count = self.store.delete_many(T::COLLECTION, filter).await?;
        tracing::debug!(collection = T::COLLECTION, criteria = %filter, deleted_count, "delete many");
        Ok(DeleteResult { deleted_count })
    }

    /// Re-inserts previously removed records, bypassing hooks.
    ///
    /// Records still present are left as they are. Used as compensation
    /// when a multi-step delete fails halfway. Returns how many records
    /// were re-inserted.
    pub async fn restore(&self, records: &[T]) -> Result<usize, DomainError> {
        let mut restored = 0;
        for record in records {
            match self.store.insert(T::COLLECTION, record.to_document()?).await {
                Ok(_) => restored += 1,
                Err(e) if e.is(ErrorCode::DuplicateKey) => {}
                Err(e) => return Err(e),
            }
        }
        if restored > 0 {
            tracing::warn!(collection = T::COLLECTION, restored, "records restored");
        }
        Ok(restored)
    }
}

fn decode_all<T: Record>(documents: Vec<JsonValue>) -> Result<Vec<T>, DomainError> {
    documents.into_iter().map(T::from_document).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryDocumentStore;
    use crate::domain::foundation::RecordMeta;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Setting {
        #[serde(flatten)]
        meta: RecordMeta,
        label: String,
        weight: i64,
    }

    impl Setting {
        fn new(label: &str, weight: i64) -> Self {
            Self {
                meta: RecordMeta::new(),
                label: label.to_string(),
                weight,
            }
        }
    }

    impl Record for Setting {
        const COLLECTION: &'static str = "settings";

        fn meta(&self) -> &RecordMeta {
            &self.meta
        }
    }

    #[derive(Default)]
    struct RecordingHooks {
        calls: Mutex<Vec<String>>,
        reject_deletes: bool,
    }

    #[async_trait]
    impl LifecycleHooks<Setting> for RecordingHooks {
        async fn post_create(&self, created: &Setting) -> Result<(), DomainError> {
            self.calls.lock().unwrap().push(format!("create:{}", created.label));
            Ok(())
        }

        async fn post_update(&self, updated: &Setting) -> Result<(), DomainError> {
            self.calls.lock().unwrap().push(format!("update:{}", updated.label));
            Ok(())
        }

        async fn pre_delete(
            &self,
            repo: &BaseRepository<Setting>,
            criteria: &Filter,
        ) -> Result<(), DomainError> {
            let doomed = repo.count(criteria).await?;
            self.calls.lock().unwrap().push(format!("delete:{}", doomed));
            if self.reject_deletes {
                return Err(DomainError::invalid_criteria(Setting::COLLECTION, criteria));
            }
            Ok(())
        }
    }

    fn repo_with(hooks: Arc<RecordingHooks>) -> BaseRepository<Setting> {
        BaseRepository::with_hooks(Arc::new(InMemoryDocumentStore::new()), hooks)
    }

    fn plain_repo() -> BaseRepository<Setting> {
        BaseRepository::new(Arc::new(InMemoryDocumentStore::new()))
    }

    #[tokio::test]
    async fn create_persists_and_runs_post_create() {
        let hooks = Arc::new(RecordingHooks::default());
        let repo = repo_with(hooks.clone());

        let created = repo.create(Setting::new("fallback", 1)).await.unwrap();

        assert_eq!(repo.find_one_by_id(created.id()).await.unwrap(), created);
        assert_eq!(*hooks.calls.lock().unwrap(), vec!["create:fallback"]);
    }

    #[tokio::test]
    async fn find_returns_empty_for_zero_matches() {
        let repo = plain_repo();
        let found = repo.find(&Filter::new().eq("label", "ghost")).await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn find_one_fails_with_not_found() {
        let repo = plain_repo();
        let err = repo.find_one(&Filter::new().eq("label", "ghost")).await.unwrap_err();

        assert!(err.is(ErrorCode::NotFound));
        assert!(err.details["criteria"].contains("ghost"));
    }

    #[tokio::test]
    async fn find_by_id_returns_none_when_missing() {
        let repo = plain_repo();
        assert_eq!(repo.find_by_id(RecordId::new()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn find_page_sorts_by_requested_field() {
        let repo = plain_repo();
        repo.create_many(vec![
            Setting::new("b", 2),
            Setting::new("c", 3),
            Setting::new("a", 1),
        ])
        .await
        .unwrap();

        let page = repo
            .find_page(&Filter::new(), &PageQuery::sorted("weight", "desc").unwrap().limit(2))
            .await
            .unwrap();

        let labels: Vec<_> = page.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["c", "b"]);
    }

    #[tokio::test]
    async fn update_one_merges_patch_and_runs_post_update() {
        let hooks = Arc::new(RecordingHooks::default());
        let repo = repo_with(hooks.clone());
        let created = repo.create(Setting::new("fallback", 1)).await.unwrap();

        let updated = repo
            .update_one(created.id(), json!({"label": "fallback_message"}))
            .await
            .unwrap();

        assert_eq!(updated.label, "fallback_message");
        assert_eq!(updated.weight, 1);
        assert_eq!(updated.meta.created_at, created.meta.created_at);
        assert!(updated.meta.updated_at >= created.meta.updated_at);
        assert_eq!(hooks.calls.lock().unwrap().last().unwrap(), "update:fallback_message");
    }

    #[tokio::test]
    async fn update_one_rejects_identity_changes() {
        let repo = plain_repo();
        let created = repo.create(Setting::new("x", 1)).await.unwrap();

        let err = repo
            .update_one(created.id(), json!({"id": RecordId::new()}))
            .await
            .unwrap_err();
        assert!(err.is(ErrorCode::ValidationFailed));

        let err = repo.update_one(created.id(), json!("label")).await.unwrap_err();
        assert!(err.is(ErrorCode::ValidationFailed));
    }

    #[tokio::test]
    async fn update_one_fails_for_missing_record() {
        let repo = plain_repo();
        let err = repo
            .update_one(RecordId::new(), json!({"label": "nobody"}))
            .await
            .unwrap_err();
        assert!(err.is(ErrorCode::NotFound));
    }

    #[tokio::test]
    async fn delete_one_runs_pre_delete_with_id_criteria() {
        let hooks = Arc::new(RecordingHooks::default());
        let repo = repo_with(hooks.clone());
        let created = repo.create(Setting::new("x", 1)).await.unwrap();

        let result = repo.delete_one(created.id()).await.unwrap();

        assert_eq!(result.deleted_count, 1);
        assert_eq!(hooks.calls.lock().unwrap().last().unwrap(), "delete:1");
        assert_eq!(repo.find_by_id(created.id()).await.unwrap(), None);
    }

    #[tokio::test]
    async fn failing_pre_delete_leaves_data_untouched() {
        let hooks = Arc::new(RecordingHooks {
            reject_deletes: true,
            ..Default::default()
        });
        let repo = repo_with(hooks);
        repo.create(Setting::new("x", 1)).await.unwrap();

        let err = repo.delete_many(&Filter::new()).await.unwrap_err();

        assert!(err.is(ErrorCode::InvalidCriteria));
        assert_eq!(repo.count(&Filter::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn delete_many_is_idempotent() {
        let repo = plain_repo();
        repo.create_many(vec![Setting::new("a", 1), Setting::new("a", 2)])
            .await
            .unwrap();
        let filter = Filter::new().eq("label", "a");

        assert_eq!(repo.delete_many(&filter).await.unwrap().deleted_count, 2);
        assert_eq!(repo.delete_many(&filter).await.unwrap().deleted_count, 0);
    }

    #[tokio::test]
    async fn restore_reinserts_without_hooks() {
        let hooks = Arc::new(RecordingHooks::default());
        let repo = repo_with(hooks.clone());
        let setting = Setting::new("kept", 1);

        let restored = repo.restore(std::slice::from_ref(&setting)).await.unwrap();

        assert_eq!(restored, 1);
        assert_eq!(repo.find_one_by_id(setting.id()).await.unwrap(), setting);
        assert!(hooks.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn restore_skips_records_still_present() {
        let repo = plain_repo();
        let kept = repo.create(Setting::new("kept", 1)).await.unwrap();
        let lost = Setting::new("lost", 2);

        let restored = repo.restore(&[kept, lost]).await.unwrap();

        assert_eq!(restored, 1);
        assert_eq!(repo.count(&Filter::new()).await.unwrap(), 2);
    }
}
