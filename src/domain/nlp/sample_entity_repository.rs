//! Repository for sample annotations.

use std::ops::Deref;
use std::sync::Arc;

use crate::domain::foundation::{BaseRepository, DomainError, Filter, RecordId};
use crate::ports::DocumentStore;

use super::NlpSampleEntity;

/// Plain repository over `nlpsampleentities`; annotations have no
/// dependents and publish no events.
#[derive(Clone)]
pub struct NlpSampleEntityRepository {
    base: BaseRepository<NlpSampleEntity>,
}

impl NlpSampleEntityRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            base: BaseRepository::new(store),
        }
    }

    /// Annotations of a training sample.
    pub async fn find_by_sample(&self, sample: RecordId) -> Result<Vec<NlpSampleEntity>, DomainError> {
        self.base.find(&Filter::new().eq("sample", sample)).await
    }
}

impl Deref for NlpSampleEntityRepository {
    type Target = BaseRepository<NlpSampleEntity>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}
