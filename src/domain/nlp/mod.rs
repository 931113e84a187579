//! NLP module - Entities, values and sample annotations.
//!
//! Records reference each other by id:
//!
//! ```text
//! NlpEntity ◄── NlpValue.entity
//!     ▲              ▲
//!     └── NlpSampleEntity.entity / NlpSampleEntity.value
//! ```
//!
//! The storage engine does not enforce these references. The repositories
//! do: deleting an entity removes its values and annotations, deleting a
//! value removes its annotations.

mod entity;
mod entity_repository;
pub mod events;
mod sample_entity;
mod sample_entity_repository;
mod value;
mod value_repository;

pub use entity::{LookupStrategy, NlpEntity, NlpEntityFull};
pub use entity_repository::NlpEntityRepository;
pub use sample_entity::NlpSampleEntity;
pub use sample_entity_repository::NlpSampleEntityRepository;
pub use value::NlpValue;
pub use value_repository::NlpValueRepository;
