//! What each `vetquote` subcommand does, minus argument parsing.
//!
//! Handlers return the text to print so they can be driven from tests with
//! an in-memory service.

use std::io::Write;

use anyhow::{Context, Result, bail};
use chrono::{Local, NaiveDate, Utc};
use tracing::info;
use vet_core::{CompanyPatch, EstimateInput, EstimateService, ServiceError};
use vet_data::EstimateExporter;

use crate::report;

const COMPANY_NOT_CONFIGURED: &str =
    "Company profile not configured. Run `vetquote company set --name ... --address ...` first.";

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to encode JSON")
}

/// Validation failures are listed field by field; anything else is passed on.
fn explain(err: ServiceError) -> anyhow::Error {
    match err {
        ServiceError::Validation(errors) => {
            let lines: Vec<String> = errors.0.iter().map(|e| format!("  {e}")).collect();
            anyhow::anyhow!("invalid input:\n{}", lines.join("\n"))
        }
        ServiceError::Storage(e) => anyhow::Error::new(e).context("Storage failure"),
    }
}

pub async fn company_show(
    service: &EstimateService,
    json: bool,
) -> Result<String> {
    let company = service.company().await.map_err(explain)?;
    match company {
        Some(company) if json => to_json(&company),
        Some(company) => {
            let mut text = report::company_details(&company);
            if !company.is_configured() {
                text.push('\n');
                text.push_str(COMPANY_NOT_CONFIGURED);
            }
            Ok(text)
        }
        None if json => Ok("null".to_string()),
        None => Ok(COMPANY_NOT_CONFIGURED.to_string()),
    }
}

pub async fn company_set(
    service: &EstimateService,
    patch: CompanyPatch,
) -> Result<String> {
    if patch.is_empty() {
        bail!("nothing to update; pass at least one field (see `vetquote company set --help`)");
    }
    let company = service.update_company(patch).await.map_err(explain)?;
    Ok(report::company_details(&company))
}

pub async fn estimates_list(
    service: &EstimateService,
    limit: Option<usize>,
    json: bool,
) -> Result<String> {
    let estimates = match limit {
        Some(limit) => service.recent_estimates(limit).await,
        None => service.estimates().await,
    }
    .map_err(explain)?;

    if json {
        return to_json(&estimates);
    }
    if estimates.is_empty() {
        return Ok("No estimates yet.".to_string());
    }
    Ok(report::estimates_table(&estimates).to_string())
}

pub async fn estimate_show(
    service: &EstimateService,
    id: &str,
    json: bool,
) -> Result<String> {
    let Some(estimate) = service.estimate(id).await.map_err(explain)? else {
        bail!("estimate '{id}' not found");
    };

    if json {
        return to_json(&estimate);
    }
    let company = service.company().await.map_err(explain)?;
    Ok(report::estimate_detail(&estimate, company.as_ref()))
}

/// Save the estimate in `document` (JSON, same shape `show --json` prints).
/// An `id` of `"new"` or one that is not stored creates a new estimate.
pub async fn estimate_save(
    service: &EstimateService,
    document: &str,
) -> Result<String> {
    let input: EstimateInput =
        serde_json::from_str(document).context("Estimate file is not a valid estimate document")?;

    let saved = service
        .save_estimate(input.into_estimate(Utc::now()))
        .await
        .map_err(explain)?;
    info!(id = %saved.id, "saved from file");
    to_json(&saved)
}

pub async fn estimate_delete(
    service: &EstimateService,
    id: &str,
) -> Result<String> {
    if service.delete_estimate(id).await.map_err(explain)? {
        Ok(format!("Deleted {id}."))
    } else {
        bail!("estimate '{id}' not found")
    }
}

/// Write every estimate, newest first, as CSV. Returns the row count.
pub async fn estimates_export<W: Write>(
    service: &EstimateService,
    out: W,
) -> Result<usize> {
    let estimates = service.estimates().await.map_err(explain)?;
    EstimateExporter::write(out, &estimates).context("Failed to write CSV")
}

/// Daily figures for `day` (today when `None`) in local time.
pub async fn metrics(
    service: &EstimateService,
    day: Option<NaiveDate>,
    top: usize,
    json: bool,
) -> Result<String> {
    let day = day.unwrap_or_else(|| Local::now().date_naive());
    let metrics = service
        .daily_metrics(day, &Local, top)
        .await
        .map_err(explain)?;

    if json {
        return to_json(&metrics);
    }
    Ok(report::metrics_report(&metrics))
}
