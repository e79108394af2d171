use std::sync::Arc;

use tracing::debug;
use vet_core::db::{MemoryRepositoryFactory, RepositoryRegistry};
use vet_core::{EstimateService, RepositoryError};
use vet_db_json::JsonFileRepositoryFactory;
use vet_db_sqlite::SqliteRepositoryFactory;

use crate::config::AppConfig;

/// Every storage backend this binary knows about.
pub fn build_registry() -> RepositoryRegistry {
    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(MemoryRepositoryFactory));
    registry.register(Box::new(JsonFileRepositoryFactory));
    registry.register(Box::new(SqliteRepositoryFactory));
    registry
}

/// Open the configured backend and wrap it in a service.
pub async fn open_service(config: &AppConfig) -> Result<EstimateService, RepositoryError> {
    let db_config = config.db_config();
    debug!(
        backend = %db_config.backend,
        connection = %db_config.connection_string,
        "opening storage"
    );

    let repo = build_registry().create(&db_config).await?;
    Ok(EstimateService::new(Arc::from(repo)))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn registry_knows_all_backends() {
        assert_eq!(
            build_registry().available_backends(),
            vec!["json", "memory", "sqlite"]
        );
    }

    #[tokio::test]
    async fn unknown_backend_is_a_configuration_error() {
        let config = AppConfig::default().with_storage_overrides(Some("mongo".to_string()), None);

        let result = open_service(&config).await;

        assert!(matches!(result, Err(RepositoryError::Configuration(_))));
    }

    #[tokio::test]
    async fn opens_memory_backend() {
        let config = AppConfig::default().with_storage_overrides(Some("memory".to_string()), None);

        let service = open_service(&config).await.unwrap();

        assert!(service.estimates().await.unwrap().is_empty());
    }
}
