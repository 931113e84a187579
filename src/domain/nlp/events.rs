//! Lifecycle event names published by the NLP repositories.
//!
//! Builtin records never produce any of these.

pub const ENTITY_CREATED: &str = "hook:nlp:entity:create";
pub const ENTITY_UPDATED: &str = "hook:nlp:entity:update";
pub const ENTITY_DELETED: &str = "hook:nlp:entity:delete";

pub const VALUE_CREATED: &str = "hook:nlp:value:create";
pub const VALUE_UPDATED: &str = "hook:nlp:value:update";
pub const VALUE_DELETED: &str = "hook:nlp:value:delete";

/// Every NLP event name, for subscribers interested in all of them.
pub const ALL: &[&str] = &[
    ENTITY_CREATED,
    ENTITY_UPDATED,
    ENTITY_DELETED,
    VALUE_CREATED,
    VALUE_UPDATED,
    VALUE_DELETED,
];
