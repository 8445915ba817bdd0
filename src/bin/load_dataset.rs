//! Reloads the restaurant catalogue from a JSON or JSON-lines export.
//!
//! Records are cleaned (aliases resolved, ratings and prices normalized,
//! duplicates dropped) and replace the whole table in one transaction.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use restaurant_recs::{
    db::{
        create_pool,
        ingest::{clean_records, read_records, CleaningOptions},
        SqliteRestaurantStore,
    },
    telemetry,
};

#[derive(Parser)]
#[command(name = "load-dataset")]
#[command(about = "Load restaurant data into the catalogue database")]
struct Args {
    /// JSON array or JSON-lines file with restaurant records
    input: PathBuf,

    /// SQLite database URL
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://data/restaurants.db")]
    database_url: String,

    /// Prices in the source are for two people
    #[arg(long)]
    price_for_two: bool,

    /// Clean and report without touching the database
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    telemetry::init_tracing();

    let args = Args::parse();

    let raw = read_records(&args.input)
        .await
        .with_context(|| format!("Failed to load {}", args.input.display()))?;

    let (rows, summary) = clean_records(
        &raw,
        CleaningOptions {
            price_for_two: args.price_for_two,
        },
    );

    tracing::info!(
        original = summary.original_count,
        cleaned = summary.cleaned_count,
        removed = summary.removed_count,
        retention = %summary.retention_rate,
        "Dataset cleaned"
    );

    if args.dry_run {
        tracing::info!("Dry run, database left untouched");
        return Ok(());
    }

    let pool = create_pool(&args.database_url)
        .await
        .context("Failed to open database")?;
    let inserted = SqliteRestaurantStore::new(pool)
        .replace_all(&rows)
        .await
        .context("Failed to write restaurants")?;

    tracing::info!(inserted, database = %args.database_url, "Dataset loaded");
    Ok(())
}
