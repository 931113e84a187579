//! Domain layer containing record types and their repositories.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, criteria, records, events, errors, base repository)
//! - `nlp` - NLP entities, values and sample annotations with cascading deletes
//! - `attachment` - Uploaded file metadata

pub mod attachment;
pub mod foundation;
pub mod nlp;
