//! Persisted record contract.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::{DomainError, RecordId, Timestamp};

/// Identity and timestamps shared by every persisted record.
///
/// Flattened into each record so documents read
/// `{"id": ..., "createdAt": ..., "updatedAt": ..., <fields>}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMeta {
    pub id: RecordId,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl RecordMeta {
    /// Fresh identity stamped with the current time.
    pub fn new() -> Self {
        let now = Timestamp::now();
        Self {
            id: RecordId::new(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for RecordMeta {
    fn default() -> Self {
        Self::new()
    }
}

/// A record type stored in a named collection.
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Collection the record lives in.
    const COLLECTION: &'static str;

    fn meta(&self) -> &RecordMeta;

    fn id(&self) -> RecordId {
        self.meta().id
    }

    /// Builtin records are system-seeded and never emit lifecycle events.
    fn is_builtin(&self) -> bool {
        false
    }

    /// Serializes the record into a store document.
    fn to_document(&self) -> Result<JsonValue, DomainError> {
        serde_json::to_value(self).map_err(DomainError::serialization)
    }

    /// Deserializes a store document.
    fn from_document(document: JsonValue) -> Result<Self, DomainError> {
        serde_json::from_value(document).map_err(|e| {
            DomainError::serialization(e).with_detail("collection", Self::COLLECTION)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_serializes_camel_case() {
        let meta = RecordMeta::new();
        let json = serde_json::to_value(&meta).unwrap();

        assert_eq!(json["id"], JsonValue::from(meta.id));
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());
    }

    #[test]
    fn new_meta_has_equal_timestamps() {
        let meta = RecordMeta::new();
        assert_eq!(meta.created_at, meta.updated_at);
    }
}
