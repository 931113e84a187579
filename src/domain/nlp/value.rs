//! NLP value records.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, Record, RecordId, RecordMeta, ValidationError};

/// A possible value of an NLP entity (`greeting` for `intent`, ...).
///
/// `entity` references the owning [`NlpEntity`](super::NlpEntity); the
/// storage engine does not enforce it, the entity repository does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NlpValue {
    #[serde(flatten)]
    pub meta: RecordMeta,

    pub entity: RecordId,

    pub value: String,

    /// Synonyms matched by keyword lookup.
    #[serde(default)]
    pub expressions: Vec<String>,

    #[serde(default)]
    pub builtin: bool,
}

impl NlpValue {
    /// Create a non-builtin value of `entity`.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if the value is blank
    pub fn new(entity: RecordId, value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::empty_field("value").into());
        }

        Ok(Self {
            meta: RecordMeta::new(),
            entity,
            value,
            expressions: Vec::new(),
            builtin: false,
        })
    }

    pub fn with_expressions<S: Into<String>>(
        mut self,
        expressions: impl IntoIterator<Item = S>,
    ) -> Self {
        self.expressions = expressions.into_iter().map(Into::into).collect();
        self
    }

    pub fn builtin(mut self) -> Self {
        self.builtin = true;
        self
    }
}

impl Record for NlpValue {
    const COLLECTION: &'static str = "nlpvalues";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn is_builtin(&self) -> bool {
        self.builtin
    }
}
