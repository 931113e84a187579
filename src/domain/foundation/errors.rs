//! Domain errors.
//!
//! [`ValidationError`] covers malformed input to constructors and is
//! folded into [`DomainError`], which is what every repository and store
//! operation returns. A `DomainError` pairs a stable [`ErrorCode`] with a
//! message and string details such as the collection and criteria involved.

use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

use super::Filter;

/// Rejected input to a record constructor.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be blank")]
    Blank { field: &'static str },

    #[error("{field} is {actual}, expected {min}..={max}")]
    OutOfRange {
        field: &'static str,
        min: i64,
        max: i64,
        actual: i64,
    },

    #[error("{field} is malformed: {reason}")]
    Malformed { field: &'static str, reason: String },
}

impl ValidationError {
    pub fn empty_field(field: &'static str) -> Self {
        Self::Blank { field }
    }

    pub fn out_of_range(field: &'static str, min: i64, max: i64, actual: i64) -> Self {
        Self::OutOfRange {
            field,
            min,
            max,
            actual,
        }
    }

    pub fn invalid_format(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            field,
            reason: reason.into(),
        }
    }

    pub fn field(&self) -> &'static str {
        match self {
            Self::Blank { field } | Self::OutOfRange { field, .. } | Self::Malformed { field, .. } => {
                *field
            }
        }
    }

    fn code(&self) -> ErrorCode {
        match self {
            Self::Blank { .. } => ErrorCode::EmptyField,
            Self::OutOfRange { .. } => ErrorCode::OutOfRange,
            Self::Malformed { .. } => ErrorCode::InvalidFormat,
        }
    }
}

/// Stable, machine-readable error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ValidationFailed,
    EmptyField,
    OutOfRange,
    InvalidFormat,

    NotFound,

    /// Delete criteria that do not resolve to record ids.
    InvalidCriteria,
    CascadeFailure,
    DuplicateKey,

    SerializationError,
    DatabaseError,
    EventBusError,
    InternalError,
}

impl ErrorCode {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ValidationFailed => "VALIDATION_FAILED",
            Self::EmptyField => "EMPTY_FIELD",
            Self::OutOfRange => "OUT_OF_RANGE",
            Self::InvalidFormat => "INVALID_FORMAT",
            Self::NotFound => "NOT_FOUND",
            Self::InvalidCriteria => "INVALID_CRITERIA",
            Self::CascadeFailure => "CASCADE_FAILURE",
            Self::DuplicateKey => "DUPLICATE_KEY",
            Self::SerializationError => "SERIALIZATION_ERROR",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::EventBusError => "EVENT_BUS_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a domain, repository or store operation.
///
/// Integrity errors record the attempted criteria under the `criteria`
/// detail.
#[derive(Debug, Clone, Error)]
#[error("[{code}] {message}")]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
    pub details: BTreeMap<String, String>,
}

impl DomainError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: BTreeMap::new(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationFailed, message).with_detail("field", field)
    }

    /// A single-record lookup matched nothing.
    pub fn not_found(collection: &str, criteria: &Filter) -> Self {
        Self::new(
            ErrorCode::NotFound,
            format!("nothing in {} matches {}", collection, criteria),
        )
        .scoped(collection, criteria)
    }

    pub fn invalid_criteria(collection: &str, criteria: &Filter) -> Self {
        Self::new(
            ErrorCode::InvalidCriteria,
            format!("delete from {} must select records by id", collection),
        )
        .scoped(collection, criteria)
    }

    /// Removing the dependents of `collection` held in `child` failed.
    pub fn cascade_failure(
        collection: &str,
        child: &str,
        criteria: &Filter,
        cause: &DomainError,
    ) -> Self {
        Self::new(
            ErrorCode::CascadeFailure,
            format!("cascade {} -> {} failed: {}", collection, child, cause.message),
        )
        .scoped(collection, criteria)
        .with_detail("child", child)
        .with_detail("cause", cause.code.as_str())
    }

    pub fn database(context: &str, err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::DatabaseError, format!("{}: {}", context, err))
    }

    pub fn serialization(err: impl fmt::Display) -> Self {
        Self::new(ErrorCode::SerializationError, err.to_string())
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    fn scoped(self, collection: &str, criteria: &Filter) -> Self {
        self.with_detail("collection", collection)
            .with_detail("criteria", criteria.to_string())
    }

    pub fn is(&self, code: ErrorCode) -> bool {
        self.code == code
    }
}

impl From<ValidationError> for DomainError {
    fn from(err: ValidationError) -> Self {
        Self::new(err.code(), err.to_string()).with_detail("field", err.field())
    }
}
