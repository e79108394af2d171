use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Company, CompanyPatch, Estimate};

/// Storage faults. A record that simply is not there is reported as `None`
/// by the query methods, never as an error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

#[async_trait]
pub trait EstimateRepository: Send + Sync {
    // Company profile
    /// `None` until the clinic saves its settings for the first time.
    async fn get_company(&self) -> Result<Option<Company>, RepositoryError>;

    /// Merge `patch` onto the stored profile (or an empty one) and persist it.
    async fn update_company(
        &self,
        patch: CompanyPatch,
    ) -> Result<Company, RepositoryError>;

    // Estimates
    /// Every stored estimate, newest `created_at` first.
    async fn get_estimates(&self) -> Result<Vec<Estimate>, RepositoryError>;

    async fn get_estimate_by_id(
        &self,
        id: &str,
    ) -> Result<Option<Estimate>, RepositoryError>;

    /// Overwrite the estimate with the same id, keeping its stored
    /// `created_at`, or store it as a new estimate with a freshly allocated
    /// id and timestamp. Returns the record as stored.
    async fn save_estimate(
        &self,
        estimate: Estimate,
    ) -> Result<Estimate, RepositoryError>;

    /// Returns whether an estimate with that id existed.
    async fn delete_estimate(
        &self,
        id: &str,
    ) -> Result<bool, RepositoryError>;
}
