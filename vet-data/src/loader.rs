use std::collections::BTreeMap;
use std::io::Read;

use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;
use vet_core::{EstimateRepository, LineItem, RepositoryError, ValidationErrors};

/// Errors that can occur when loading line items.
#[derive(Debug, Error)]
pub enum LineItemLoaderError {
    #[error("CSV parse error: {0}")]
    CsvParse(String),

    #[error("Estimate '{0}' not found (line items can only be loaded into saved estimates)")]
    EstimateNotFound(String),

    #[error("Estimate '{id}' rejected: {source}")]
    Invalid {
        id: String,
        source: ValidationErrors,
    },

    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<csv::Error> for LineItemLoaderError {
    fn from(err: csv::Error) -> Self {
        LineItemLoaderError::CsvParse(err.to_string())
    }
}

/// A single row of the line items CSV file.
///
/// - `estimate_id`: id of a stored estimate, e.g. `EST-001`
/// - `id`: line item id, unique within the estimate
/// - `service`, `description`: free text
/// - `quantity`: units, greater than 0
/// - `price`: unit price, not negative
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LineItemRecord {
    pub estimate_id: String,
    pub id: String,
    pub service: String,
    pub description: String,
    pub quantity: Decimal,
    pub price: Decimal,
}

impl From<&LineItemRecord> for LineItem {
    fn from(record: &LineItemRecord) -> Self {
        LineItem {
            id: record.id.clone(),
            service: record.service.clone(),
            description: record.description.clone(),
            quantity: record.quantity,
            price: record.price,
        }
    }
}

/// Loader for line items from CSV files.
///
/// Goes through the [`EstimateRepository`] trait, so it works with any
/// storage backend.
pub struct LineItemLoader;

impl LineItemLoader {
    /// Parse line item records from a CSV reader. Fields are trimmed.
    pub fn parse<R: Read>(reader: R) -> Result<Vec<LineItemRecord>, LineItemLoaderError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut records = Vec::new();

        for result in csv_reader.deserialize() {
            let record: LineItemRecord = result?;
            records.push(record);
        }

        Ok(records)
    }

    /// Replace the line items of every estimate named in `records`.
    ///
    /// Rows are grouped by estimate id, keeping file order within a group.
    /// Each group becomes the complete item list of its estimate, so loading
    /// the same file twice gives the same result. An estimate is checked
    /// against the usual form rules before it is saved; the first failure
    /// stops the load, and estimates saved before it stay saved.
    ///
    /// Returns the number of line items written.
    pub async fn load<R: EstimateRepository + ?Sized>(
        repo: &R,
        records: &[LineItemRecord],
    ) -> Result<usize, LineItemLoaderError> {
        let mut groups: BTreeMap<&str, Vec<&LineItemRecord>> = BTreeMap::new();
        for record in records {
            groups
                .entry(record.estimate_id.as_str())
                .or_default()
                .push(record);
        }

        let mut loaded = 0;
        for (estimate_id, group) in groups {
            let mut estimate = repo
                .get_estimate_by_id(estimate_id)
                .await?
                .ok_or_else(|| LineItemLoaderError::EstimateNotFound(estimate_id.to_string()))?;

            estimate.line_items = group.iter().map(|r| LineItem::from(*r)).collect();
            estimate
                .validate()
                .map_err(|source| LineItemLoaderError::Invalid {
                    id: estimate_id.to_string(),
                    source,
                })?;

            let saved = repo.save_estimate(estimate).await?;
            info!(id = %saved.id, items = saved.line_items.len(), "line items replaced");
            loaded += saved.line_items.len();
        }

        Ok(loaded)
    }
}
