//! Repository for NLP entities.
//!
//! # Deleting entities
//!
//! Entities own their values and the sample annotations that mention
//! them. A delete runs, in order:
//!
//! 1. Resolve the criteria to entity ids; anything else is rejected with
//!    `InvalidCriteria` before touching data.
//! 2. Snapshot the dependents about to be removed.
//! 3. Remove annotations referencing the entities.
//! 4. Remove the values (which removes annotations referencing them).
//! 5. Publish `hook:nlp:entity:delete` for every non-builtin entity matched.
//! 6. Remove the entities themselves.
//!
//! The store offers no transaction spanning collections. When step 3 or 4
//! fails, the snapshot taken in step 2 is re-inserted and the delete fails
//! with `CascadeFailure`; the entity is never removed with dependents left
//! behind.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::ops::Deref;
use std::sync::Arc;

use crate::domain::foundation::{
    BaseRepository, DomainError, Filter, LifecycleHooks, PageQuery, Record, RecordEventEmitter,
    RecordId,
};
use crate::ports::{DocumentStore, EventPublisher};

use super::{
    events, NlpEntity, NlpEntityFull, NlpSampleEntity, NlpSampleEntityRepository, NlpValue,
    NlpValueRepository,
};

/// Field of values and annotations pointing at their entity.
const ENTITY_FIELD: &str = "entity";

/// Repository over `nlpentities`.
#[derive(Clone)]
pub struct NlpEntityRepository {
    base: BaseRepository<NlpEntity>,
    values: NlpValueRepository,
}

impl NlpEntityRepository {
    /// Wires the entity repository together with the value and annotation
    /// repositories it cascades into.
    pub fn new(store: Arc<dyn DocumentStore>, publisher: Arc<dyn EventPublisher>) -> Self {
        let values = NlpValueRepository::new(Arc::clone(&store), Arc::clone(&publisher));
        let hooks = NlpEntityHooks {
            values: values.clone(),
            samples: NlpSampleEntityRepository::new(Arc::clone(&store)),
            emitter: RecordEventEmitter::new(publisher),
        };

        Self {
            base: BaseRepository::with_hooks(store, Arc::new(hooks)),
            values,
        }
    }

    /// The value repository this repository cascades into.
    pub fn values(&self) -> &NlpValueRepository {
        &self.values
    }

    /// Every entity with its values.
    pub async fn find_all_and_populate(&self) -> Result<Vec<NlpEntityFull>, DomainError> {
        let entities = self.base.find_all().await?;
        self.populate(entities).await
    }

    /// One page of entities matching `filter`, each with its values.
    pub async fn find_page_and_populate(
        &self,
        filter: &Filter,
        page: &PageQuery,
    ) -> Result<Vec<NlpEntityFull>, DomainError> {
        let entities = self.base.find_page(filter, page).await?;
        self.populate(entities).await
    }

    /// A single entity with its values.
    ///
    /// # Errors
    ///
    /// `NotFound` when the id does not exist.
    pub async fn find_one_and_populate(&self, id: RecordId) -> Result<NlpEntityFull, DomainError> {
        let entity = self.base.find_one_by_id(id).await?;
        let mut populated = self.populate(vec![entity]).await?;
        populated
            .pop()
            .ok_or_else(|| DomainError::not_found(NlpEntity::COLLECTION, &Filter::by_id(id)))
    }

    /// Attaches values to entities with one query, keeping entity order and
    /// value insertion order.
    async fn populate(&self, entities: Vec<NlpEntity>) -> Result<Vec<NlpEntityFull>, DomainError> {
        if entities.is_empty() {
            return Ok(Vec::new());
        }

        let ids = entities.iter().map(Record::id);
        let values = self
            .values
            .find(&Filter::new().is_in(ENTITY_FIELD, ids))
            .await?;

        let mut by_entity: HashMap<RecordId, Vec<NlpValue>> = HashMap::new();
        for value in values {
            by_entity.entry(value.entity).or_default().push(value);
        }

        Ok(entities
            .into_iter()
            .map(|entity| NlpEntityFull {
                values: by_entity.remove(&entity.id()).unwrap_or_default(),
                entity,
            })
            .collect())
    }
}

impl Deref for NlpEntityRepository {
    type Target = BaseRepository<NlpEntity>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

struct NlpEntityHooks {
    values: NlpValueRepository,
    samples: NlpSampleEntityRepository,
    emitter: RecordEventEmitter,
}

impl NlpEntityHooks {
    /// Annotations that will disappear with the entities: those naming the
    /// entity and those naming one of its values.
    async fn doomed_samples(
        &self,
        by_entity: &Filter,
        values: &[NlpValue],
    ) -> Result<Vec<NlpSampleEntity>, DomainError> {
        let mut samples = self.samples.find(by_entity).await?;
        if values.is_empty() {
            return Ok(samples);
        }

        let mut seen: HashSet<RecordId> = samples.iter().map(Record::id).collect();
        let by_value = Filter::new().is_in("value", values.iter().map(Record::id));
        for sample in self.samples.find(&by_value).await? {
            if seen.insert(sample.id()) {
                samples.push(sample);
            }
        }
        Ok(samples)
    }

    /// Puts back dependents removed before a cascade step failed.
    async fn compensate(
        &self,
        error: DomainError,
        samples: &[NlpSampleEntity],
        values: &[NlpValue],
    ) -> DomainError {
        let restored = async {
            let samples = self.samples.restore(samples).await?;
            let values = self.values.restore(values).await?;
            Ok::<_, DomainError>(samples + values)
        }
        .await;

        match restored {
            Ok(restored) => {
                tracing::warn!(restored, error = %error, "cascade aborted, dependents restored");
                error
            }
            Err(e) => {
                tracing::error!(error = %error, compensation = %e, "cascade aborted, restoring dependents failed");
                error.with_detail("compensation", e.to_string())
            }
        }
    }
}

#[async_trait]
impl LifecycleHooks<NlpEntity> for NlpEntityHooks {
    async fn post_create(&self, created: &NlpEntity) -> Result<(), DomainError> {
        self.emitter
            .emit_unless_builtin(events::ENTITY_CREATED, created)
            .await;
        Ok(())
    }

    async fn post_update(&self, updated: &NlpEntity) -> Result<(), DomainError> {
        self.emitter
            .emit_unless_builtin(events::ENTITY_UPDATED, updated)
            .await;
        Ok(())
    }

    async fn pre_delete(
        &self,
        repo: &BaseRepository<NlpEntity>,
        criteria: &Filter,
    ) -> Result<(), DomainError> {
        if criteria.resolve_ids().is_none() {
            return Err(DomainError::invalid_criteria(NlpEntity::COLLECTION, criteria));
        }

        // Only entities the whole criteria match lose their dependents.
        let doomed = repo.find(criteria).await?;
        if doomed.is_empty() {
            return Ok(());
        }
        let by_entity = Filter::new().is_in(ENTITY_FIELD, doomed.iter().map(Record::id));

        let values = self.values.find(&by_entity).await?;
        let samples = self.doomed_samples(&by_entity, &values).await?;

        if let Err(e) = self.samples.delete_many(&by_entity).await {
            let error = DomainError::cascade_failure(
                NlpEntity::COLLECTION,
                NlpSampleEntity::COLLECTION,
                criteria,
                &e,
            );
            return Err(self.compensate(error, &samples, &[]).await);
        }

        if let Err(e) = self.values.delete_many(&by_entity).await {
            let error = DomainError::cascade_failure(
                NlpEntity::COLLECTION,
                NlpValue::COLLECTION,
                criteria,
                &e,
            );
            return Err(self.compensate(error, &samples, &values).await);
        }

        tracing::debug!(
            criteria = %criteria,
            values = values.len(),
            samples = samples.len(),
            "entity dependents removed"
        );

        for entity in &doomed {
            self.emitter
                .emit_unless_builtin(events::ENTITY_DELETED, entity)
                .await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryDocumentStore, InMemoryEventBus};
    use crate::domain::foundation::ErrorCode;

    fn repo() -> (NlpEntityRepository, Arc<InMemoryEventBus>) {
        let bus = Arc::new(InMemoryEventBus::new());
        let repo = NlpEntityRepository::new(Arc::new(InMemoryDocumentStore::new()), bus.clone());
        (repo, bus)
    }

    #[tokio::test]
    async fn builtin_entities_publish_nothing() {
        let (repo, bus) = repo();
        let intent = repo
            .create(NlpEntity::new("intent").unwrap().builtin())
            .await
            .unwrap();

        repo.update_one(intent.id(), serde_json::json!({"doc": "intents"}))
            .await
            .unwrap();
        repo.delete_one(intent.id()).await.unwrap();

        assert_eq!(bus.event_count(), 0);
    }

    #[tokio::test]
    async fn delete_without_id_predicate_is_rejected() {
        let (repo, _) = repo();
        repo.create(NlpEntity::new("intent").unwrap()).await.unwrap();

        let err = repo
            .delete_many(&Filter::new().eq("name", "intent"))
            .await
            .unwrap_err();

        assert!(err.is(ErrorCode::InvalidCriteria));
        assert!(err.details["criteria"].contains("intent"));
        assert_eq!(repo.count(&Filter::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn populate_keeps_values_with_their_entity() {
        let (repo, _) = repo();
        let color = repo.create(NlpEntity::new("color").unwrap()).await.unwrap();
        let size = repo.create(NlpEntity::new("size").unwrap()).await.unwrap();
        repo.values()
            .create_many(vec![
                NlpValue::new(color.id(), "red").unwrap(),
                NlpValue::new(size.id(), "small").unwrap(),
                NlpValue::new(color.id(), "blue").unwrap(),
            ])
            .await
            .unwrap();

        let all = repo.find_all_and_populate().await.unwrap();

        assert_eq!(all.len(), 2);
        let colors: Vec<_> = all[0].values.iter().map(|v| v.value.as_str()).collect();
        assert_eq!(all[0].entity.name, "color");
        assert_eq!(colors, vec!["red", "blue"]);
        assert_eq!(all[1].values.len(), 1);
    }

    #[tokio::test]
    async fn find_one_and_populate_fails_for_unknown_id() {
        let (repo, _) = repo();
        let err = repo.find_one_and_populate(RecordId::new()).await.unwrap_err();
        assert!(err.is(ErrorCode::NotFound));
    }
}
