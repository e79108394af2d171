use std::fs::File;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use vet_core::db::{DbConfig, MemoryRepositoryFactory, RepositoryRegistry};
use vet_data::LineItemLoader;
use vet_db_json::JsonFileRepositoryFactory;
use vet_db_sqlite::SqliteRepositoryFactory;

/// Load line items from a CSV file into stored estimates.
///
/// The CSV file should have the following columns:
/// - estimate_id: id of a stored estimate (e.g., EST-001)
/// - id: line item id, unique within the estimate
/// - service: service or product name
/// - description: free text
/// - quantity: units (greater than 0)
/// - price: unit price
///
/// Every estimate named in the file has its line items replaced by the rows
/// for it, so loading the same file twice is harmless.
#[derive(Parser, Debug)]
#[command(name = "vet-data-loader")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the CSV file containing line items
    #[arg(short, long)]
    file: PathBuf,

    /// Storage backend (json or sqlite)
    #[arg(short, long, default_value = "json")]
    backend: String,

    /// Data directory for json, database path for sqlite
    #[arg(short, long, default_value = "./data")]
    database: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .without_time()
        .with_target(false)
        .init();

    let args = Args::parse();

    let mut registry = RepositoryRegistry::new();
    registry.register(Box::new(MemoryRepositoryFactory));
    registry.register(Box::new(JsonFileRepositoryFactory));
    registry.register(Box::new(SqliteRepositoryFactory));

    let config = DbConfig {
        backend: args.backend.clone(),
        connection_string: args.database.clone(),
    };
    let repo = registry
        .create(&config)
        .await
        .with_context(|| format!("Failed to open {} storage at: {}", args.backend, args.database))?;

    println!("Loading line items from: {}", args.file.display());

    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open: {}", args.file.display()))?;

    let records = LineItemLoader::parse(file)
        .with_context(|| format!("Failed to parse CSV: {}", args.file.display()))?;

    println!("Parsed {} records from CSV", records.len());

    let loaded = LineItemLoader::load(repo.as_ref(), &records)
        .await
        .context("Failed to load line items")?;

    println!("Successfully loaded {} line items.", loaded);

    Ok(())
}
