use std::io::Write;

use chrono::SecondsFormat;
use serde::Serialize;
use thiserror::Error;
use vet_core::Estimate;

const HEADER: [&str; 10] = [
    "id",
    "created_at",
    "status",
    "owner",
    "pet",
    "items",
    "subtotal",
    "tax_rate",
    "tax_amount",
    "total",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// One summary row per estimate. Money columns are rounded to cents and
/// written as exact decimal text.
#[derive(Debug, Serialize)]
struct EstimateRow<'a> {
    id: &'a str,
    created_at: String,
    status: &'static str,
    owner: &'a str,
    pet: &'a str,
    items: usize,
    subtotal: String,
    tax_rate: String,
    tax_amount: String,
    total: String,
}

impl<'a> From<&'a Estimate> for EstimateRow<'a> {
    fn from(estimate: &'a Estimate) -> Self {
        let totals = estimate.totals().rounded();
        EstimateRow {
            id: &estimate.id,
            created_at: estimate
                .created_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
            status: estimate.status.as_str(),
            owner: &estimate.owner.name,
            pet: &estimate.pet.name,
            items: estimate.line_items.len(),
            subtotal: format!("{:.2}", totals.subtotal),
            tax_rate: estimate.tax_rate.normalize().to_string(),
            tax_amount: format!("{:.2}", totals.tax_amount),
            total: format!("{:.2}", totals.total),
        }
    }
}

/// Writes estimate summaries as CSV.
pub struct EstimateExporter;

impl EstimateExporter {
    /// Write the header and one row per estimate, in the order given. The
    /// header is written even when there are no estimates.
    ///
    /// Returns the number of rows written.
    pub fn write<W: Write>(
        writer: W,
        estimates: &[Estimate],
    ) -> Result<usize, ExportError> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);

        csv_writer.write_record(HEADER)?;
        for estimate in estimates {
            csv_writer.serialize(EstimateRow::from(estimate))?;
        }
        csv_writer.flush()?;

        Ok(estimates.len())
    }
}
