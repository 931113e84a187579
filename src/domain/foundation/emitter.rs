//! Fire-and-forget publication of record lifecycle events.

use std::sync::Arc;

use super::{EventEnvelope, Record};
use crate::ports::EventPublisher;

/// Publishes record snapshots on behalf of repository hooks.
///
/// Publication never fails the calling repository operation: errors are
/// logged and dropped.
#[derive(Clone)]
pub struct RecordEventEmitter {
    publisher: Arc<dyn EventPublisher>,
}

impl RecordEventEmitter {
    pub fn new(publisher: Arc<dyn EventPublisher>) -> Self {
        Self { publisher }
    }

    /// Publishes `event_type` with a snapshot of `record`.
    pub async fn emit<T: Record>(&self, event_type: &str, record: &T) {
        let envelope = match EventEnvelope::for_record(event_type, record) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(event_type, id = %record.id(), error = %e, "cannot snapshot record");
                return;
            }
        };

        if let Err(e) = self.publisher.publish(envelope).await {
            tracing::warn!(event_type, id = %record.id(), error = %e, "event publication failed");
        }
    }

    /// Same as [`emit`](Self::emit), skipping builtin records.
    pub async fn emit_unless_builtin<T: Record>(&self, event_type: &str, record: &T) {
        if record.is_builtin() {
            tracing::trace!(event_type, id = %record.id(), "builtin record, event bypassed");
            return;
        }
        self.emit(event_type, record).await;
    }
}
