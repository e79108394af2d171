use std::collections::HashMap;

use async_trait::async_trait;

use super::repository::{EstimateRepository, RepositoryError};

/// Which store to open and where it lives. `connection_string` is handed to
/// the factory untouched.
///
/// | backend    | connection_string examples                 |
/// |------------|--------------------------------------------|
/// | `memory`   | ignored                                    |
/// | `json`     | `./data` (directory holding the documents) |
/// | `sqlite`   | `sqlite:estimates.db?mode=rwc`, `sqlite::memory:` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub backend: String,
    pub connection_string: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            backend: "memory".to_string(),
            connection_string: String::new(),
        }
    }
}

/// Opens one kind of estimate store. `vet-db-json` and `vet-db-sqlite` each
/// export one of these; the in-memory store lives next to the trait.
#[async_trait]
pub trait RepositoryFactory: Send + Sync {
    /// Name used in `--backend` and in `[storage] backend`.
    fn backend_name(&self) -> &'static str;

    /// Open the store described by `config.connection_string`, bringing it
    /// up to date (schema, data directory) before returning it.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn EstimateRepository>, RepositoryError>;
}

/// The backends a binary was built with. Binaries register every factory
/// they link and then open the one the configuration names.
pub struct RepositoryRegistry {
    factories: HashMap<&'static str, Box<dyn RepositoryFactory>>,
}

impl RepositoryRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A later factory with the same name wins.
    pub fn register(
        &mut self,
        factory: Box<dyn RepositoryFactory>,
    ) {
        self.factories.insert(factory.backend_name(), factory);
    }

    /// Sorted, for help text and error messages.
    pub fn available_backends(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.factories.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Open the store for `config.backend`. An unregistered name is a
    /// [`RepositoryError::Configuration`] listing the known ones.
    pub async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn EstimateRepository>, RepositoryError> {
        match self.factories.get(config.backend.as_str()) {
            Some(factory) => factory.create(config).await,
            None => Err(RepositoryError::Configuration(format!(
                "no storage backend named '{}' (known: {})",
                config.backend,
                self.available_backends().join(", ")
            ))),
        }
    }
}

impl Default for RepositoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}
