use async_trait::async_trait;
use vet_core::db::{DbConfig, RepositoryFactory};
use vet_core::{EstimateRepository, RepositoryError};

use crate::repository::JsonFileRepository;

/// [`RepositoryFactory`] for flat JSON files.
///
/// `connection_string` is the data directory; it is created on first use.
///
/// ```rust,no_run
/// use vet_core::db::RepositoryRegistry;
/// use vet_db_json::JsonFileRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(JsonFileRepositoryFactory));
/// ```
pub struct JsonFileRepositoryFactory;

#[async_trait]
impl RepositoryFactory for JsonFileRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "json"
    }

    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn EstimateRepository>, RepositoryError> {
        let dir = config.connection_string.trim();
        if dir.is_empty() {
            return Err(RepositoryError::Configuration(
                "the json backend needs a data directory".to_string(),
            ));
        }

        let repo = JsonFileRepository::open(dir).await?;
        Ok(Box::new(repo))
    }
}
