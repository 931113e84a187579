//! Lifecycle events raised by repositories.
//!
//! An [`EventEnvelope`] names the event (`hook:<module>:<entity>:<action>`),
//! points at the record it concerns and carries the record's JSON snapshot.
//! Envelopes serialize in camelCase, like the documents they describe.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use uuid::Uuid;

use super::{DomainError, Record, RecordId, Timestamp};

/// Identifier of one published event.
///
/// Delivery is at-least-once, so subscribers deduplicate on this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(Uuid);

impl EventId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Correlation context linking events raised by one logical operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,

    /// Event whose handling led to this one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub causation_id: Option<EventId>,
}

/// A lifecycle event and the record snapshot it carries.
///
/// For deletions the payload is the state before removal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    pub event_id: EventId,

    /// Routing key, e.g. `hook:nlp:entity:create`.
    pub event_type: String,

    pub record_id: RecordId,

    /// Collection the record lives in, e.g. `nlpentities`.
    pub collection: String,

    pub occurred_at: Timestamp,

    pub payload: JsonValue,

    #[serde(default)]
    pub metadata: EventMetadata,
}

impl EventEnvelope {
    pub fn new(
        event_type: impl Into<String>,
        record_id: RecordId,
        collection: impl Into<String>,
        payload: JsonValue,
    ) -> Self {
        Self {
            event_id: EventId::new(),
            event_type: event_type.into(),
            record_id,
            collection: collection.into(),
            occurred_at: Timestamp::now(),
            payload,
            metadata: EventMetadata::default(),
        }
    }

    /// Snapshots `record` into a new envelope.
    pub fn for_record<T: Record>(event_type: &str, record: &T) -> Result<Self, DomainError> {
        Ok(Self::new(
            event_type,
            record.id(),
            T::COLLECTION,
            record.to_document()?,
        ))
    }

    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.metadata.correlation_id = Some(id.into());
        self
    }

    /// Marks this event as a consequence of `cause`, inheriting its
    /// correlation id when none is set.
    pub fn caused_by(mut self, cause: &EventEnvelope) -> Self {
        self.metadata.causation_id = Some(cause.event_id);
        if self.metadata.correlation_id.is_none() {
            self.metadata.correlation_id = cause.metadata.correlation_id.clone();
        }
        self
    }

    /// Decodes the snapshot back into its record type.
    pub fn record<T: Record>(&self) -> Result<T, DomainError> {
        T::from_document(self.payload.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::RecordMeta;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        #[serde(flatten)]
        meta: RecordMeta,
        title: String,
    }

    impl Record for Note {
        const COLLECTION: &'static str = "notes";

        fn meta(&self) -> &RecordMeta {
            &self.meta
        }
    }

    fn note() -> Note {
        Note {
            meta: RecordMeta::new(),
            title: "hello".to_string(),
        }
    }

    #[test]
    fn for_record_snapshots_the_record() {
        let note = note();
        let envelope = EventEnvelope::for_record("hook:note:create", &note).unwrap();

        assert_eq!(envelope.event_type, "hook:note:create");
        assert_eq!(envelope.collection, "notes");
        assert_eq!(envelope.record_id, note.id());
        assert_eq!(envelope.record::<Note>().unwrap(), note);
    }

    #[test]
    fn serializes_in_camel_case_without_empty_metadata() {
        let envelope = EventEnvelope::new("hook:note:delete", RecordId::new(), "notes", json!({}));
        let json = serde_json::to_value(&envelope).unwrap();

        assert_eq!(json["eventType"], "hook:note:delete");
        assert_eq!(json["recordId"], envelope.record_id.to_string());
        assert_eq!(json["eventId"], envelope.event_id.to_string());
        assert_eq!(json["metadata"], json!({}));
    }

    #[test]
    fn caused_by_links_and_inherits_correlation() {
        let cause = EventEnvelope::for_record("hook:note:delete", &note())
            .unwrap()
            .with_correlation_id("req-42");
        let effect = EventEnvelope::for_record("hook:note:update", &note())
            .unwrap()
            .caused_by(&cause);

        assert_eq!(effect.metadata.causation_id, Some(cause.event_id));
        assert_eq!(effect.metadata.correlation_id.as_deref(), Some("req-42"));
    }

    #[test]
    fn explicit_correlation_wins_over_cause() {
        let cause = EventEnvelope::new("a", RecordId::new(), "notes", json!({}))
            .with_correlation_id("outer");
        let effect = EventEnvelope::new("b", RecordId::new(), "notes", json!({}))
            .with_correlation_id("inner")
            .caused_by(&cause);

        assert_eq!(effect.metadata.correlation_id.as_deref(), Some("inner"));
    }

    #[test]
    fn envelope_survives_the_wire() {
        let envelope = EventEnvelope::for_record("hook:note:create", &note()).unwrap();
        let text = serde_json::to_string(&envelope).unwrap();
        let back: EventEnvelope = serde_json::from_str(&text).unwrap();

        assert_eq!(back.event_id, envelope.event_id);
        assert_eq!(back.occurred_at, envelope.occurred_at);
        assert_eq!(back.record::<Note>().unwrap().title, "hello");
    }
}
