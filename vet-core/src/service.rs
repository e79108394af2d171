//! Entry point the UI layer talks to.
//!
//! [`EstimateService`] validates what the user typed, hands it to whichever
//! [`EstimateRepository`] the process was started with, and builds the
//! dashboard figures from the stored estimates.

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone};
use thiserror::Error;
use tracing::{debug, warn};

use crate::calculations::{DailyMetrics, daily_metrics};
use crate::db::{EstimateRepository, RepositoryError};
use crate::models::{Company, CompanyPatch, Estimate};
use crate::validation::ValidationErrors;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Input was rejected before anything was written.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    #[error(transparent)]
    Storage(#[from] RepositoryError),
}

#[derive(Clone)]
pub struct EstimateService {
    repo: Arc<dyn EstimateRepository>,
}

impl EstimateService {
    pub fn new(repo: Arc<dyn EstimateRepository>) -> Self {
        Self { repo }
    }

    pub fn repository(&self) -> &dyn EstimateRepository {
        &*self.repo
    }

    pub async fn company(&self) -> Result<Option<Company>, ServiceError> {
        Ok(self.repo.get_company().await?)
    }

    pub async fn update_company(
        &self,
        patch: CompanyPatch,
    ) -> Result<Company, ServiceError> {
        if let Err(errors) = patch.validate() {
            warn!(%errors, "rejected company update");
            return Err(errors.into());
        }
        Ok(self.repo.update_company(patch).await?)
    }

    pub async fn estimates(&self) -> Result<Vec<Estimate>, ServiceError> {
        Ok(self.repo.get_estimates().await?)
    }

    /// The `limit` most recently created estimates.
    pub async fn recent_estimates(
        &self,
        limit: usize,
    ) -> Result<Vec<Estimate>, ServiceError> {
        let mut estimates = self.repo.get_estimates().await?;
        estimates.truncate(limit);
        Ok(estimates)
    }

    pub async fn estimate(
        &self,
        id: &str,
    ) -> Result<Option<Estimate>, ServiceError> {
        let estimate = self.repo.get_estimate_by_id(id).await?;
        if estimate.is_none() {
            debug!(id, "estimate not found");
        }
        Ok(estimate)
    }

    pub async fn save_estimate(
        &self,
        estimate: Estimate,
    ) -> Result<Estimate, ServiceError> {
        if let Err(errors) = estimate.validate() {
            warn!(id = %estimate.id, %errors, "rejected estimate");
            return Err(errors.into());
        }
        Ok(self.repo.save_estimate(estimate).await?)
    }

    pub async fn delete_estimate(
        &self,
        id: &str,
    ) -> Result<bool, ServiceError> {
        Ok(self.repo.delete_estimate(id).await?)
    }

    /// Dashboard figures for `day` in `tz`, listing at most `top_n` services.
    pub async fn daily_metrics<Tz: TimeZone + Sync>(
        &self,
        day: NaiveDate,
        tz: &Tz,
        top_n: usize,
    ) -> Result<DailyMetrics, ServiceError> {
        let estimates = self.repo.get_estimates().await?;
        Ok(daily_metrics(&estimates, day, tz, top_n))
    }
}
