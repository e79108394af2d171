use std::fs::{self, File};
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use tracing::{debug, warn};

use vet_app::config::{AppConfig, DEFAULT_CONFIG_FILE};
use vet_app::{app, commands, logging};
use vet_core::CompanyPatch;

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Estimates for veterinary clinics.
///
/// Keeps the clinic profile and its estimates in the configured storage
/// backend and prints them, their totals and the daily activity.
#[derive(Debug, Parser)]
#[command(name = "vetquote", version)]
struct Cli {
    /// TOML configuration file. A missing file means defaults.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Storage backend (memory, json or sqlite). Overrides the config file.
    #[arg(long, global = true)]
    backend: Option<String>,

    /// Data directory for json, database file for sqlite (`:memory:` works).
    /// Overrides the config file.
    #[arg(long, global = true)]
    db: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Clinic profile printed on every estimate.
    #[command(subcommand)]
    Company(CompanyCommand),

    #[command(subcommand)]
    Estimates(EstimatesCommand),

    /// Activity for one day: count, income, average ticket, top services.
    Metrics {
        /// Day to report, in local time. Defaults to today.
        #[arg(long)]
        date: Option<NaiveDate>,

        /// How many services to rank. Defaults to `metrics.top_services`.
        #[arg(long)]
        top: Option<usize>,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Subcommand)]
enum CompanyCommand {
    Show {
        #[arg(long)]
        json: bool,
    },
    /// Update the given fields and keep the rest.
    Set(CompanyArgs),
}

#[derive(Debug, Args)]
struct CompanyArgs {
    #[arg(long)]
    name: Option<String>,
    #[arg(long)]
    address: Option<String>,
    #[arg(long)]
    contact_info: Option<String>,
    #[arg(long)]
    tax_id: Option<String>,
    #[arg(long)]
    logo_url: Option<String>,
    #[arg(long)]
    disclaimer: Option<String>,
    /// Hex colour, e.g. `#4f46e5`.
    #[arg(long)]
    accent_color: Option<String>,
}

impl From<CompanyArgs> for CompanyPatch {
    fn from(args: CompanyArgs) -> Self {
        CompanyPatch {
            name: args.name,
            address: args.address,
            contact_info: args.contact_info,
            tax_id: args.tax_id,
            logo_url: args.logo_url,
            disclaimer: args.disclaimer,
            accent_color: args.accent_color,
        }
    }
}

#[derive(Debug, Subcommand)]
enum EstimatesCommand {
    /// Stored estimates, newest first.
    List {
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    Show {
        id: String,
        #[arg(long)]
        json: bool,
    },
    /// Create or update an estimate from a JSON file. Use `"id": "new"` to
    /// get the next number.
    Save { file: PathBuf },
    Delete { id: String },
    /// Write a CSV summary of every estimate.
    Export { out: PathBuf },
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    logging::init_logging("info");

    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config)?.with_storage_overrides(cli.backend, cli.db);
    if std::env::var_os("RUST_LOG").is_none() {
        if let Err(e) = logging::set_log_level(&config.log.level) {
            warn!("{e:#}");
        }
    }
    if let Some(path) = &config.log.file {
        logging::enable_file_logging(path)?;
    }

    let service = app::open_service(&config)
        .await
        .context("Failed to open storage")?;

    let output = match cli.command {
        Command::Company(CompanyCommand::Show { json }) => {
            commands::company_show(&service, json).await?
        }
        Command::Company(CompanyCommand::Set(args)) => {
            commands::company_set(&service, args.into()).await?
        }
        Command::Estimates(EstimatesCommand::List { limit, json }) => {
            commands::estimates_list(&service, limit, json).await?
        }
        Command::Estimates(EstimatesCommand::Show { id, json }) => {
            commands::estimate_show(&service, &id, json).await?
        }
        Command::Estimates(EstimatesCommand::Save { file }) => {
            let document = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            commands::estimate_save(&service, &document).await?
        }
        Command::Estimates(EstimatesCommand::Delete { id }) => {
            commands::estimate_delete(&service, &id).await?
        }
        Command::Estimates(EstimatesCommand::Export { out }) => {
            let file = File::create(&out)
                .with_context(|| format!("Failed to create {}", out.display()))?;
            let rows = commands::estimates_export(&service, BufWriter::new(file)).await?;
            format!("Exported {rows} estimates to {}.", out.display())
        }
        Command::Metrics { date, top, json } => {
            let top = top.unwrap_or(config.metrics.top_services);
            commands::metrics(&service, date, top, json).await?
        }
    };

    debug!("command finished");
    println!("{output}");
    Ok(())
}
