//! Application layer - Startup workflows built on the repositories.

pub mod seed;

pub use seed::{NlpFixtures, NlpSeeder, SeedError, SeedOutcome};
