pub mod calculations;
pub mod db;
pub mod models;
pub mod service;
pub mod validation;

pub use calculations::{DailyMetrics, ServiceCount, Totals, compute_totals, daily_metrics};
pub use db::repository::{EstimateRepository, RepositoryError};
pub use models::*;
pub use service::{EstimateService, ServiceError};
pub use validation::{FieldError, ValidationErrors};
