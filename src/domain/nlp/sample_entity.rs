//! Annotations linking training samples to entity values.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, Record, RecordId, RecordMeta, ValidationError};

/// One entity annotation on a training sample.
///
/// `start`/`end` delimit the annotated span for keyword and free-text
/// entities; trait annotations cover the whole sample and leave them unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NlpSampleEntity {
    #[serde(flatten)]
    pub meta: RecordMeta,

    pub sample: RecordId,

    pub entity: RecordId,

    pub value: RecordId,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<u32>,
}

impl NlpSampleEntity {
    /// Whole-sample annotation.
    pub fn new(sample: RecordId, entity: RecordId, value: RecordId) -> Self {
        Self {
            meta: RecordMeta::new(),
            sample,
            entity,
            value,
            start: None,
            end: None,
        }
    }

    /// Restricts the annotation to `start..end`.
    ///
    /// # Errors
    ///
    /// - `OutOfRange` if `end` is not after `start`
    pub fn with_span(mut self, start: u32, end: u32) -> Result<Self, DomainError> {
        if end <= start {
            return Err(ValidationError::out_of_range(
                "end",
                i64::from(start) + 1,
                i64::from(u32::MAX),
                i64::from(end),
            )
            .into());
        }
        self.start = Some(start);
        self.end = Some(end);
        Ok(self)
    }
}

impl Record for NlpSampleEntity {
    const COLLECTION: &'static str = "nlpsampleentities";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }
}
