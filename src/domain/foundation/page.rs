//! Pagination and sorting of query results.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::{ValidationError, ID_FIELD};

/// Sort direction for a page query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

impl FromStr for SortDirection {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "1" => Ok(SortDirection::Asc),
            "desc" | "descending" | "-1" => Ok(SortDirection::Desc),
            other => Err(ValidationError::invalid_format(
                "sort",
                format!("unknown direction '{}'", other),
            )),
        }
    }
}

/// Sort key for a page query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub direction: SortDirection,
}

/// Sorting, offset and limit applied to a query.
///
/// Ordering is stable: documents with equal sort keys are ordered by
/// identifier. Without a sort key, documents keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    pub sort: Option<Sort>,
    #[serde(default)]
    pub skip: u64,
    pub limit: Option<u64>,
}

impl PageQuery {
    /// Creates an unsorted, unbounded page query.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a page query from a `[field, direction]` pair.
    pub fn sorted(field: &str, direction: &str) -> Result<Self, ValidationError> {
        if field.trim().is_empty() {
            return Err(ValidationError::empty_field("sort"));
        }
        Ok(Self::new().sort_by(field, direction.parse()?))
    }

    /// Sets the sort key.
    pub fn sort_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort = Some(Sort {
            field: field.into(),
            direction,
        });
        self
    }

    /// Sets the number of documents to skip.
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    /// Sets the maximum number of documents returned.
    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sorts and slices documents already in insertion order.
    pub fn apply(&self, mut documents: Vec<JsonValue>) -> Vec<JsonValue> {
        if let Some(sort) = &self.sort {
            documents.sort_by(|a, b| {
                let by_key = compare_json(a.get(&sort.field), b.get(&sort.field));
                let by_key = match sort.direction {
                    SortDirection::Asc => by_key,
                    SortDirection::Desc => by_key.reverse(),
                };
                by_key.then_with(|| compare_json(a.get(ID_FIELD), b.get(ID_FIELD)))
            });
        }

        let skip = usize::try_from(self.skip).unwrap_or(usize::MAX);
        let limit = self
            .limit
            .map(|l| usize::try_from(l).unwrap_or(usize::MAX))
            .unwrap_or(usize::MAX);

        documents.into_iter().skip(skip).take(limit).collect()
    }
}

/// Total order over JSON values, matching PostgreSQL `jsonb` ordering:
/// null < string < number < boolean < array < object.
///
/// A missing value compares as null.
pub fn compare_json(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    let a = a.unwrap_or(&JsonValue::Null);
    let b = b.unwrap_or(&JsonValue::Null);

    match (a, b) {
        (JsonValue::String(x), JsonValue::String(y)) => x.cmp(y),
        (JsonValue::Number(x), JsonValue::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (JsonValue::Bool(x), JsonValue::Bool(y)) => x.cmp(y),
        (JsonValue::Array(x), JsonValue::Array(y)) => x
            .iter()
            .zip(y.iter())
            .map(|(l, r)| compare_json(Some(l), Some(r)))
            .find(|o| o.is_ne())
            .unwrap_or_else(|| x.len().cmp(&y.len())),
        (JsonValue::Object(_), JsonValue::Object(_)) => a.to_string().cmp(&b.to_string()),
        _ => rank(a).cmp(&rank(b)),
    }
}

fn rank(value: &JsonValue) -> u8 {
    match value {
        JsonValue::Null => 0,
        JsonValue::String(_) => 1,
        JsonValue::Number(_) => 2,
        JsonValue::Bool(_) => 3,
        JsonValue::Array(_) => 4,
        JsonValue::Object(_) => 5,
    }
}
