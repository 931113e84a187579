use async_trait::async_trait;
use std::ops::Deref;
use std::sync::Arc;

use crate::domain::foundation::{BaseRepository, DomainError, LifecycleHooks, RecordEventEmitter};
use crate::ports::{DocumentStore, EventPublisher};

use super::Attachment;

/// Published after every attachment is stored.
pub const ATTACHMENT_UPLOADED: &str = "hook:chatbot:attachment:upload";

/// Repository over `attachments`.
///
/// Attachments have no dependents, so deletes need no cascade.
#[derive(Clone)]
pub struct AttachmentRepository {
    base: BaseRepository<Attachment>,
}

impl AttachmentRepository {
    pub fn new(store: Arc<dyn DocumentStore>, publisher: Arc<dyn EventPublisher>) -> Self {
        let hooks = AttachmentHooks {
            emitter: RecordEventEmitter::new(publisher),
        };
        Self {
            base: BaseRepository::with_hooks(store, Arc::new(hooks)),
        }
    }
}

impl Deref for AttachmentRepository {
    type Target = BaseRepository<Attachment>;

    fn deref(&self) -> &Self::Target {
        &self.base
    }
}

struct AttachmentHooks {
    emitter: RecordEventEmitter,
}

#[async_trait]
impl LifecycleHooks<Attachment> for AttachmentHooks {
    async fn post_create(&self, created: &Attachment) -> Result<(), DomainError> {
        self.emitter.emit(ATTACHMENT_UPLOADED, created).await;
        Ok(())
    }
}
