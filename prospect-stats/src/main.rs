//! prospect-stats - operator CLI for the statistics engine
//!
//! Administrative entry points: schema initialization, bulk
//! recalculation, coherence audit, a one-off building sync, and a dump of
//! the status taxonomy. Reports are printed as JSON on stdout.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use prospect_common::config::{default_config_path, resolve_root_folder, TomlConfig};
use prospect_common::db::init_database;
use prospect_common::status::metadata_table;
use prospect_stats::{StatsEngine, SyncOutcome};
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

/// Command-line arguments for prospect-stats
#[derive(Parser, Debug)]
#[command(name = "prospect-stats")]
#[command(about = "Door-to-door prospecting statistics maintenance")]
#[command(version)]
struct Args {
    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, env = "PROSPECT_CONFIG")]
    config: Option<PathBuf>,

    /// Root folder holding the database
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database and schema if missing
    Init,
    /// Recompute the aggregate of every salesperson
    Recalc,
    /// Compare stored aggregates with ground truth
    Validate {
        /// Run a recalculation when drift is found, then audit again
        #[arg(long)]
        repair: bool,
    },
    /// Re-sync the salesperson owning one building
    Sync {
        building_id: Uuid,
    },
    /// Print the status metadata table
    Taxonomy,
}

#[derive(Serialize)]
struct SyncReport {
    building_id: Uuid,
    outcome: &'static str,
    salesperson_id: Option<Uuid>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = args.config.clone().or_else(default_config_path);
    let config = match &config_path {
        Some(path) => TomlConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => TomlConfig::with_defaults(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        "Starting prospect-stats v{}",
        env!("CARGO_PKG_VERSION")
    );

    match args.command {
        Command::Taxonomy => {
            print_json(&metadata_table())?;
        }
        Command::Init => {
            open_engine(&args.root_folder, &config).await?;
            info!("Database ready");
        }
        Command::Recalc => {
            let engine = open_engine(&args.root_folder, &config).await?;
            let report = engine.recalc_all().await.context("Recalculation aborted")?;
            print_json(&report)?;
        }
        Command::Validate { repair } => {
            let engine = open_engine(&args.root_folder, &config).await?;
            let report = engine.validate().await.context("Coherence check aborted")?;
            print_json(&report)?;

            if repair && !report.is_coherent() {
                info!(invalid = report.invalid.len(), "Repairing drifted aggregates");
                let recalc = engine.recalc_all().await.context("Recalculation aborted")?;
                print_json(&recalc)?;
                let after = engine.validate().await.context("Coherence check aborted")?;
                print_json(&after)?;
            }
        }
        Command::Sync { building_id } => {
            let engine = open_engine(&args.root_folder, &config).await?;
            let outcome = engine
                .try_sync(building_id)
                .await
                .with_context(|| format!("Sync failed for building {}", building_id))?;

            let report = match outcome {
                SyncOutcome::Updated(aggregate) => SyncReport {
                    building_id,
                    outcome: "updated",
                    salesperson_id: Some(aggregate.salesperson_id),
                },
                SyncOutcome::BuildingNotFound => SyncReport {
                    building_id,
                    outcome: "building_not_found",
                    salesperson_id: None,
                },
                SyncOutcome::Unassigned => SyncReport {
                    building_id,
                    outcome: "unassigned",
                    salesperson_id: None,
                },
            };
            print_json(&report)?;
        }
    }

    Ok(())
}

/// Resolve the database location and open it with the schema in place
async fn open_engine(root_arg: &Option<PathBuf>, config: &TomlConfig) -> Result<StatsEngine> {
    let root_folder = resolve_root_folder(root_arg.as_deref(), config);
    let db_path = config.database_path(&root_folder);
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    Ok(StatsEngine::new(pool))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
