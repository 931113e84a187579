//! NlpSeeder - Loads builtin NLP fixtures into an empty store.
//!
//! Fixtures go through the regular repositories, so builtin records are
//! persisted exactly like user records but publish no lifecycle events.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::domain::foundation::{DomainError, Filter, Record};
use crate::domain::nlp::{LookupStrategy, NlpEntity, NlpEntityRepository, NlpValue};

const BUNDLED_FIXTURES: &str = include_str!("../../fixtures/nlp.yaml");

/// Errors raised while loading or applying fixtures.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Cannot read fixtures at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid fixtures: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Fixture document: entities with their values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NlpFixtures {
    #[serde(default)]
    pub entities: Vec<EntityFixture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityFixture {
    pub name: String,

    /// Empty means the entity default (`trait`).
    #[serde(default)]
    pub lookups: Vec<LookupStrategy>,

    #[serde(default)]
    pub doc: Option<String>,

    #[serde(default)]
    pub builtin: bool,

    #[serde(default)]
    pub values: Vec<ValueFixture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ValueFixture {
    pub value: String,

    #[serde(default)]
    pub expressions: Vec<String>,

    /// Inherits the entity's flag when unset.
    #[serde(default)]
    pub builtin: Option<bool>,
}

impl NlpFixtures {
    /// The fixtures shipped with the crate.
    pub fn bundled() -> Result<Self, SeedError> {
        Self::from_yaml_str(BUNDLED_FIXTURES)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self, SeedError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_path(path: &Path) -> Result<Self, SeedError> {
        let yaml = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&yaml)
    }

    /// Number of values across all entities.
    pub fn value_count(&self) -> usize {
        self.entities.iter().map(|e| e.values.len()).sum()
    }
}

/// What a seeding run did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    /// The collection already held entities; nothing was written.
    Skipped { existing: u64 },
    Seeded { entities: usize, values: usize },
}

/// Seeds NLP entities and values.
pub struct NlpSeeder {
    entities: NlpEntityRepository,
}

impl NlpSeeder {
    pub fn new(entities: NlpEntityRepository) -> Self {
        Self { entities }
    }

    /// Inserts `fixtures` unless the entity collection already has records.
    ///
    /// # Errors
    ///
    /// Fails on the first invalid fixture or storage error; records
    /// inserted before the failure are kept.
    pub async fn seed(&self, fixtures: &NlpFixtures) -> Result<SeedOutcome, SeedError> {
        let existing = self.entities.count(&Filter::new()).await?;
        if existing > 0 {
            tracing::info!(existing, "nlp entities present, seeding skipped");
            return Ok(SeedOutcome::Skipped { existing });
        }

        let mut values = 0;
        for fixture in &fixtures.entities {
            let entity = self.entities.create(entity_from(fixture)?).await?;

            for value in &fixture.values {
                let mut record = NlpValue::new(entity.id(), value.value.as_str())?
                    .with_expressions(value.expressions.iter().cloned());
                record.builtin = value.builtin.unwrap_or(fixture.builtin);
                self.entities.values().create(record).await?;
                values += 1;
            }
        }

        let outcome = SeedOutcome::Seeded {
            entities: fixtures.entities.len(),
            values,
        };
        tracing::info!(?outcome, "nlp fixtures seeded");
        Ok(outcome)
    }
}

fn entity_from(fixture: &EntityFixture) -> Result<NlpEntity, DomainError> {
    let mut entity = NlpEntity::new(fixture.name.as_str())?;
    if !fixture.lookups.is_empty() {
        entity = entity.with_lookups(fixture.lookups.iter().copied());
    }
    if let Some(doc) = &fixture.doc {
        entity = entity.with_doc(doc.as_str());
    }
    entity.builtin = fixture.builtin;
    Ok(entity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryDocumentStore, InMemoryEventBus};
    use std::io::Write;
    use std::sync::Arc;

    const FIXTURES: &str = r#"
entities:
  - name: intent
    builtin: true
    values:
      - value: greeting
        expressions: [hello, hi]
      - value: goodbye
  - name: first_name
    lookups: [keywords]
    values:
      - value: jhon
        builtin: true
      - value: doe
"#;

    fn seeder() -> (NlpSeeder, NlpEntityRepository, Arc<InMemoryEventBus>) {
        let bus = Arc::new(InMemoryEventBus::new());
        let repo = NlpEntityRepository::new(Arc::new(InMemoryDocumentStore::new()), bus.clone());
        (NlpSeeder::new(repo.clone()), repo, bus)
    }

    #[test]
    fn bundled_fixtures_parse() {
        let fixtures = NlpFixtures::bundled().unwrap();
        assert!(fixtures.entities.iter().any(|e| e.name == "intent" && e.builtin));
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let err = NlpFixtures::from_yaml_str("entities: [name: [").unwrap_err();
        assert!(matches!(err, SeedError::Parse(_)));
    }

    #[test]
    fn from_path_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(FIXTURES.as_bytes()).unwrap();

        let fixtures = NlpFixtures::from_path(file.path()).unwrap();

        assert_eq!(fixtures.entities.len(), 2);
        assert_eq!(fixtures.value_count(), 4);
    }

    #[test]
    fn from_path_reports_missing_file() {
        let err = NlpFixtures::from_path(Path::new("/nonexistent/nlp.yaml")).unwrap_err();
        assert!(matches!(err, SeedError::Io { .. }));
    }

    #[tokio::test]
    async fn seeds_empty_store_and_bypasses_builtin_events() {
        let (seeder, repo, bus) = seeder();
        let fixtures = NlpFixtures::from_yaml_str(FIXTURES).unwrap();

        let outcome = seeder.seed(&fixtures).await.unwrap();

        assert_eq!(outcome, SeedOutcome::Seeded { entities: 2, values: 4 });
        let first_name = repo.find_one(&Filter::new().eq("name", "first_name")).await.unwrap();
        assert_eq!(first_name.lookups, vec![LookupStrategy::Keywords]);

        // intent and its values are builtin; first_name and doe are not.
        assert_eq!(bus.events_of_type("hook:nlp:entity:create").len(), 1);
        let value_events = bus.events_of_type("hook:nlp:value:create");
        assert_eq!(value_events.len(), 1);
        assert_eq!(value_events[0].payload["value"], "doe");
    }

    #[tokio::test]
    async fn second_run_is_skipped() {
        let (seeder, _, _) = seeder();
        let fixtures = NlpFixtures::from_yaml_str(FIXTURES).unwrap();
        seeder.seed(&fixtures).await.unwrap();

        let outcome = seeder.seed(&fixtures).await.unwrap();

        assert_eq!(outcome, SeedOutcome::Skipped { existing: 2 });
    }

    #[tokio::test]
    async fn invalid_entity_name_fails() {
        let (seeder, _, _) = seeder();
        let fixtures = NlpFixtures::from_yaml_str("entities:\n  - name: first name\n").unwrap();

        let err = seeder.seed(&fixtures).await.unwrap_err();
        assert!(matches!(err, SeedError::Domain(_)));
    }
}
