use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::collection::{Upsert, remove_estimate, sort_newest_first, upsert_estimate};
use super::factory::{DbConfig, RepositoryFactory};
use super::repository::{EstimateRepository, RepositoryError};
use crate::models::{Company, CompanyPatch, Estimate, apply_update};

#[derive(Debug, Default)]
struct MemoryState {
    company: Option<Company>,
    estimates: Vec<Estimate>,
    last_estimate_number: u64,
}

/// Repository that lives only as long as the process. Used by tests and by
/// `--backend memory` for throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: RwLock<MemoryState>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing profile and collection.
    pub fn with_data(
        company: Option<Company>,
        estimates: Vec<Estimate>,
    ) -> Self {
        Self {
            state: RwLock::new(MemoryState {
                company,
                estimates,
                last_estimate_number: 0,
            }),
        }
    }
}

#[async_trait]
impl EstimateRepository for MemoryRepository {
    async fn get_company(&self) -> Result<Option<Company>, RepositoryError> {
        Ok(self.state.read().await.company.clone())
    }

    async fn update_company(
        &self,
        patch: CompanyPatch,
    ) -> Result<Company, RepositoryError> {
        let mut state = self.state.write().await;
        let company = apply_update(state.company.take(), patch);
        state.company = Some(company.clone());
        info!(name = %company.name, "company profile updated");
        Ok(company)
    }

    async fn get_estimates(&self) -> Result<Vec<Estimate>, RepositoryError> {
        let mut estimates = self.state.read().await.estimates.clone();
        sort_newest_first(&mut estimates);
        debug!(count = estimates.len(), "listed estimates");
        Ok(estimates)
    }

    async fn get_estimate_by_id(
        &self,
        id: &str,
    ) -> Result<Option<Estimate>, RepositoryError> {
        let state = self.state.read().await;
        Ok(state.estimates.iter().find(|e| e.id == id).cloned())
    }

    async fn save_estimate(
        &self,
        estimate: Estimate,
    ) -> Result<Estimate, RepositoryError> {
        let mut state = self.state.write().await;
        let MemoryState {
            estimates,
            last_estimate_number,
            ..
        } = &mut *state;

        let (saved, outcome) =
            upsert_estimate(estimates, last_estimate_number, estimate, Utc::now());
        match outcome {
            Upsert::Created => info!(id = %saved.id, "estimate created"),
            Upsert::Updated => info!(id = %saved.id, "estimate updated"),
        }
        Ok(saved)
    }

    async fn delete_estimate(
        &self,
        id: &str,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.state.write().await;
        let removed = remove_estimate(&mut state.estimates, id);
        if removed {
            info!(id, "estimate deleted");
        }
        Ok(removed)
    }
}

/// [`RepositoryFactory`] for the `"memory"` backend. The connection string
/// is ignored.
pub struct MemoryRepositoryFactory;

#[async_trait]
impl RepositoryFactory for MemoryRepositoryFactory {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn create(
        &self,
        _config: &DbConfig,
    ) -> Result<Box<dyn EstimateRepository>, RepositoryError> {
        Ok(Box::new(MemoryRepository::new()))
    }
}
