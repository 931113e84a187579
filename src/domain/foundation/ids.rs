//! Record identity.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identity of a stored record, written to documents as a hyphenated
/// lowercase UUID string.
///
/// Foreign references (a value's `entity`, an annotation's `value`) hold
/// the referenced record's id. Ordering matches the order of the string form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(Uuid);

impl RecordId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.as_hyphenated().fmt(f)
    }
}

impl FromStr for RecordId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<RecordId> for JsonValue {
    fn from(id: RecordId) -> Self {
        JsonValue::String(id.to_string())
    }
}

/// Reads an id out of a document field. Anything but a UUID string fails.
impl TryFrom<&JsonValue> for RecordId {
    type Error = ();

    fn try_from(value: &JsonValue) -> Result<Self, Self::Error> {
        value.as_str().and_then(|s| s.parse().ok()).ok_or(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fresh_ids_differ() {
        assert_ne!(RecordId::new(), RecordId::new());
    }

    #[test]
    fn display_form_parses_back() {
        let id = RecordId::new();
        assert_eq!(id.to_string().parse::<RecordId>().unwrap(), id);
    }

    #[test]
    fn object_id_strings_are_not_ids() {
        assert!("65940d115178607da65c82b6".parse::<RecordId>().is_err());
        assert!(RecordId::try_from(&json!("65940d115178607da65c82b6")).is_err());
        assert!(RecordId::try_from(&json!(42)).is_err());
    }

    #[test]
    fn document_value_is_the_plain_string() {
        let id = RecordId::new();
        let value = serde_json::to_value(id).unwrap();

        assert_eq!(value, JsonValue::from(id));
        assert_eq!(RecordId::try_from(&value), Ok(id));
    }

    #[test]
    fn ordering_agrees_with_string_ordering() {
        let mut ids: Vec<RecordId> = (0..32).map(|_| RecordId::new()).collect();
        let mut by_string = ids.clone();
        ids.sort();
        by_string.sort_by_key(|id| id.to_string());
        assert_eq!(ids, by_string);
    }
}
