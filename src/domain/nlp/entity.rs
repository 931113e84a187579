//! NLP entity records.
//!
//! An NLP entity is a named slot the language-understanding pipeline can
//! extract (`intent`, `first_name`, ...). Its possible values live in the
//! `nlpvalues` collection and reference the entity by id.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{DomainError, Record, RecordMeta, ValidationError};

use super::NlpValue;

/// How an entity's values are detected in a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LookupStrategy {
    /// Whole-message classification.
    Trait,
    /// Matching one of the value's expressions.
    Keywords,
    /// Free text extracted from the message.
    FreeText,
}

/// An NLP entity.
///
/// # Invariants
///
/// - `name` is non-empty and contains only ASCII letters, digits, `_` or `-`
/// - builtin entities never emit lifecycle events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NlpEntity {
    #[serde(flatten)]
    pub meta: RecordMeta,

    pub name: String,

    #[serde(default)]
    pub lookups: Vec<LookupStrategy>,

    /// Free-form description shown to editors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub doc: Option<String>,

    #[serde(default)]
    pub builtin: bool,
}

impl NlpEntity {
    /// Create a non-builtin entity with `trait` lookup.
    ///
    /// # Errors
    ///
    /// - `EmptyField` if the name is blank
    /// - `InvalidFormat` if the name contains other characters than
    ///   letters, digits, `_` or `-`
    pub fn new(name: impl Into<String>) -> Result<Self, DomainError> {
        let name = name.into();
        validate_name(&name)?;

        Ok(Self {
            meta: RecordMeta::new(),
            name,
            lookups: vec![LookupStrategy::Trait],
            doc: None,
            builtin: false,
        })
    }

    pub fn with_lookups(mut self, lookups: impl IntoIterator<Item = LookupStrategy>) -> Self {
        self.lookups = lookups.into_iter().collect();
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Marks the entity as system-seeded.
    pub fn builtin(mut self) -> Self {
        self.builtin = true;
        self
    }
}

impl Record for NlpEntity {
    const COLLECTION: &'static str = "nlpentities";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }

    fn is_builtin(&self) -> bool {
        self.builtin
    }
}

fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::empty_field("name"));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(ValidationError::invalid_format(
            "name",
            "only letters, digits, '_' and '-' are allowed",
        ));
    }
    Ok(())
}

/// An entity with its values eagerly loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NlpEntityFull {
    #[serde(flatten)]
    pub entity: NlpEntity,

    pub values: Vec<NlpValue>,
}
