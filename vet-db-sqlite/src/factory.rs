use async_trait::async_trait;
use vet_core::db::{DbConfig, RepositoryFactory};
use vet_core::{EstimateRepository, RepositoryError};

use crate::repository::SqliteRepository;

/// Turn a connection string from configuration into a sqlx url.
///
/// * `":memory:"` opens an ephemeral in-memory database.
/// * Anything starting with `sqlite:` is passed through unchanged.
/// * Anything else is a file path; the file is created if missing.
fn database_url(connection_string: &str) -> Option<String> {
    let s = connection_string.trim();
    if s.is_empty() {
        None
    } else if s == ":memory:" {
        Some("sqlite::memory:".to_string())
    } else if s.starts_with("sqlite:") {
        Some(s.to_string())
    } else {
        Some(format!("sqlite:{}?mode=rwc", s))
    }
}

/// [`RepositoryFactory`] for SQLite.
///
/// Register this with a [`vet_core::db::RepositoryRegistry`] to make the
/// `"sqlite"` backend available:
///
/// ```rust,no_run
/// use vet_core::db::RepositoryRegistry;
/// use vet_db_sqlite::SqliteRepositoryFactory;
///
/// let mut registry = RepositoryRegistry::new();
/// registry.register(Box::new(SqliteRepositoryFactory));
/// ```
pub struct SqliteRepositoryFactory;

#[async_trait]
impl RepositoryFactory for SqliteRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    /// Open the database described by `config.connection_string` and bring
    /// its schema up to date.
    async fn create(
        &self,
        config: &DbConfig,
    ) -> Result<Box<dyn EstimateRepository>, RepositoryError> {
        let url = database_url(&config.connection_string).ok_or_else(|| {
            RepositoryError::Configuration("the sqlite backend needs a database path".to_string())
        })?;

        let repo = SqliteRepository::new(&url)
            .await
            .map_err(|e| RepositoryError::Connection(format!("{e:#}")))?;
        repo.run_migrations()
            .await
            .map_err(|e| RepositoryError::Storage(format!("{e:#}")))?;
        Ok(Box::new(repo))
    }
}
