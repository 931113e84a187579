//! Attachment module - Uploaded files and their repository.

mod repository;

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::foundation::{DomainError, Record, RecordMeta, ValidationError};

pub use repository::{AttachmentRepository, ATTACHMENT_UPLOADED};

/// Metadata of an uploaded file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    #[serde(flatten)]
    pub meta: RecordMeta,

    /// Original file name.
    pub name: String,

    /// MIME type, e.g. `image/png`.
    #[serde(rename = "type")]
    pub mime_type: String,

    /// Size in bytes.
    pub size: u64,

    /// Where the file content is stored.
    pub location: String,

    /// Channel-specific data, keyed by channel name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<JsonValue>,
}

impl Attachment {
    /// # Errors
    ///
    /// - `EmptyField` if `name`, `mime_type` or `location` is blank
    pub fn new(
        name: impl Into<String>,
        mime_type: impl Into<String>,
        size: u64,
        location: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let attachment = Self {
            meta: RecordMeta::new(),
            name: name.into(),
            mime_type: mime_type.into(),
            size,
            location: location.into(),
            channel: None,
        };

        for (field, value) in [
            ("name", &attachment.name),
            ("type", &attachment.mime_type),
            ("location", &attachment.location),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::empty_field(field).into());
            }
        }
        Ok(attachment)
    }

    pub fn with_channel(mut self, channel: JsonValue) -> Self {
        self.channel = Some(channel);
        self
    }
}

impl Record for Attachment {
    const COLLECTION: &'static str = "attachments";

    fn meta(&self) -> &RecordMeta {
        &self.meta
    }
}
