//! Query criteria over stored documents.
//!
//! A [`Filter`] is a conjunction of per-field [`Condition`]s evaluated
//! against the top-level fields of a JSON document. The empty filter
//! matches every document.

use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

use super::RecordId;

/// Field holding a document's identifier.
pub const ID_FIELD: &str = "id";

/// Predicate applied to a single document field.
///
/// A missing field compares as JSON `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    /// Field equals the value.
    Eq(JsonValue),
    /// Field equals one of the values.
    In(Vec<JsonValue>),
    /// Field differs from the value.
    Ne(JsonValue),
}

impl Condition {
    /// Evaluates the condition against a field value.
    pub fn matches(&self, field: Option<&JsonValue>) -> bool {
        let field = field.unwrap_or(&JsonValue::Null);
        match self {
            Condition::Eq(expected) => field == expected,
            Condition::In(candidates) => candidates.iter().any(|c| c == field),
            Condition::Ne(unexpected) => field != unexpected,
        }
    }
}

/// Conjunction of field conditions.
///
/// One condition per field; setting a field twice replaces the earlier
/// condition.
///
/// # Example
///
/// ```ignore
/// let filter = Filter::new().eq("name", "intent").ne("builtin", true);
/// let children = Filter::new().is_in("entity", parent_ids);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Filter {
    conditions: BTreeMap<String, Condition>,
}

impl Filter {
    /// Creates an empty filter (matches everything).
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter selecting a single record by identifier.
    pub fn by_id(id: RecordId) -> Self {
        Self::new().eq(ID_FIELD, id)
    }

    /// Filter selecting records whose identifier is in `ids`.
    pub fn by_ids(ids: impl IntoIterator<Item = RecordId>) -> Self {
        Self::new().is_in(ID_FIELD, ids)
    }

    /// Adds an equality condition.
    pub fn eq(mut self, field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.conditions
            .insert(field.into(), Condition::Eq(value.into()));
        self
    }

    /// Adds a membership condition.
    pub fn is_in<V: Into<JsonValue>>(
        mut self,
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.conditions.insert(field.into(), Condition::In(values));
        self
    }

    /// Adds an inequality condition.
    pub fn ne(mut self, field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.conditions
            .insert(field.into(), Condition::Ne(value.into()));
        self
    }

    /// Returns `true` when no condition is set.
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Returns the condition set on `field`, if any.
    pub fn get(&self, field: &str) -> Option<&Condition> {
        self.conditions.get(field)
    }

    /// Iterates conditions in field-name order.
    pub fn conditions(&self) -> impl Iterator<Item = (&str, &Condition)> {
        self.conditions.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Evaluates the filter against a document.
    pub fn matches(&self, document: &JsonValue) -> bool {
        self.conditions
            .iter()
            .all(|(field, condition)| condition.matches(document.get(field)))
    }

    /// Resolves the identifier predicate to concrete ids.
    ///
    /// Returns `None` unless the filter carries an `Eq` or `In` condition on
    /// the id field whose every value parses as a [`RecordId`].
    pub fn resolve_ids(&self) -> Option<Vec<RecordId>> {
        match self.conditions.get(ID_FIELD)? {
            Condition::Eq(value) => parse_id(value).map(|id| vec![id]),
            Condition::In(values) => values.iter().map(parse_id).collect(),
            Condition::Ne(_) => None,
        }
    }
}

fn parse_id(value: &JsonValue) -> Option<RecordId> {
    value.as_str()?.parse().ok()
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(s) => f.write_str(&s),
            Err(_) => write!(f, "{:?}", self.conditions),
        }
    }
}
