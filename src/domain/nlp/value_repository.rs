//! Repository for NLP values.
//!
//! Deleting values removes the sample annotations pointing at them and
//! publishes `hook:nlp:value:delete` for every non-builtin value removed.

use async_trait::async_trait;
use std::ops::Deref;
use std::sync::Arc;

use crate::domain::foundation::{
    BaseRepository, Condition, DomainError, Filter, LifecycleHooks, Record, RecordEventEmitter,
    RecordId,
};
use crate::ports::{DocumentStore, EventPublisher};

use super::{events, NlpSampleEntity, NlpSampleEntityRepository, NlpValue};

/// Field of a value pointing at its entity.
const ENTITY_FIELD: &str = "entity";

/// Repository over `nlpvalues`.
#[derive(Clone)]
pub struct NlpValueRepository {
    base: BaseRepository<NlpValue>,
}

impl NlpValueRepository {
    pub fn new(store: Arc<dyn DocumentStore>, publisher: Arc<dyn EventPublisher>) -> Self {
        let hooks = NlpValueHooks {
            samples: NlpSampleEntityRepository::new(Arc::clone(&store)),
            emitter: RecordEventEmitter::new(publisher),
        };
        Self {
            base: BaseRepository::with_hooks(store, Arc::new(hooks)),
        }
    }

    /// Values belonging to an entity, in insertion order.
    pub async fn find_by_entity(&self, entity: RecordId) -> Result<Vec<NlpValue>, DomainError> {
        self.base.find(&Filter::new().eq(ENTITY_FIELD, entity)).await
    }
}

impl Deref for NlpValueRepository {
    type Target = BaseRepository<NlpValue>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

struct NlpValueHooks {
    samples: NlpSampleEntityRepository,
    emitter: RecordEventEmitter,
}

#[async_trait]
impl LifecycleHooks<NlpValue> for NlpValueHooks {
    async fn post_create(&self, created: &NlpValue) -> Result<(), DomainError> {
        self.emitter
            .emit_unless_builtin(events::VALUE_CREATED, created)
            .await;
        Ok(())
    }

    async fn post_update(&self, updated: &NlpValue) -> Result<(), DomainError> {
        self.emitter
            .emit_unless_builtin(events::VALUE_UPDATED, updated)
            .await;
        Ok(())
    }

    /// Accepts an id predicate, or an entity predicate when the entity
    /// repository cascades into its values.
    async fn pre_delete(
        &self,
        repo: &BaseRepository<NlpValue>,
        criteria: &Filter,
    ) -> Result<(), DomainError> {
        if criteria.resolve_ids().is_none() && !scoped_to_entity(criteria) {
            return Err(DomainError::invalid_criteria(NlpValue::COLLECTION, criteria));
        }

        let doomed = repo.find(criteria).await?;
        let ids: Vec<RecordId> = doomed.iter().map(Record::id).collect();

        if !ids.is_empty() {
            let removed = self
                .samples
                .delete_many(&Filter::new().is_in("value", ids))
                .await
                .map_err(|e| {
                    DomainError::cascade_failure(
                        NlpValue::COLLECTION,
                        NlpSampleEntity::COLLECTION,
                        criteria,
                        &e,
                    )
                })?;
            tracing::debug!(criteria = %criteria, removed = removed.deleted_count, "value annotations removed");
        }

        for value in &doomed {
            self.emitter
                .emit_unless_builtin(events::VALUE_DELETED, value)
                .await;
        }
        Ok(())
    }
}

fn scoped_to_entity(criteria: &Filter) -> bool {
    matches!(
        criteria.get(ENTITY_FIELD),
        Some(Condition::Eq(_) | Condition::In(_))
    )
}
