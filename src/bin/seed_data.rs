//! Seed data tool - fabricates demo inventory data and backfills history
//!
//! Run with: cargo run --bin seed-data -- <command>
//!
//! Commands:
//! - `migrate`  apply schema migrations
//! - `seed`     write categories, suppliers, products and a year of orders,
//!              then rebuild stock history and forecasts
//! - `backfill` rebuild stock history and forecasts from existing orders

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{ArgAction, Args, Parser, Subcommand};
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;
use tracing::{info, warn};
use validator::Validate;

use inventory_backfill::{
    config::{self, AppConfig, NegativeStockPolicy},
    db::{self, DbPool},
    repositories::SeaOrmInventoryStore,
    services::{
        catalog_seeder::{clear_demo_data, persist_catalog, plan_catalog, CatalogSummary},
        inventory_backfill::{BackfillReport, InventoryBackfill},
    },
};

#[derive(Parser)]
#[command(
    name = "seed-data",
    about = "Seed demo inventory data and backfill stock history and forecasts",
    version
)]
struct Cli {
    /// Seed for the random generator; omit for a fresh run each time
    #[arg(long, global = true)]
    seed: Option<u64>,
    /// Overrides the configured database URL
    #[arg(long, global = true)]
    database_url: Option<String>,
    #[arg(
        long,
        global = true,
        action = ArgAction::SetTrue,
        help = "Render command output as pretty JSON"
    )]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply pending schema migrations
    Migrate,
    /// Write a demo catalog with order history, then backfill it
    Seed(SeedArgs),
    /// Rebuild stock history and forecasts for every product
    Backfill(BackfillArgs),
}

#[derive(Args)]
struct SeedArgs {
    /// Delete existing demo rows first
    #[arg(long)]
    reset: bool,
    /// Only write the catalog and orders
    #[arg(long)]
    skip_backfill: bool,
    #[command(flatten)]
    policy: PolicyArgs,
}

#[derive(Args)]
struct BackfillArgs {
    #[command(flatten)]
    policy: PolicyArgs,
}

#[derive(Args)]
struct PolicyArgs {
    /// Months of history to reconstruct
    #[arg(long)]
    historical_months: Option<u32>,
    /// `clamp` keeps reconstructed levels non-negative, `allow` does not
    #[arg(long)]
    negative_stock: Option<NegativeStockPolicy>,
}

impl PolicyArgs {
    /// Writes the overrides into `config` and re-validates the result.
    fn apply(&self, config: &mut AppConfig) -> Result<()> {
        if let Some(months) = self.historical_months {
            config.generator.historical_months = months;
        }
        if let Some(policy) = self.negative_stock {
            config.generator.negative_stock = policy;
        }
        config
            .validate()
            .context("command-line overrides produced an invalid generator config")
    }
}

impl Commands {
    fn policy(&self) -> Option<&PolicyArgs> {
        match self {
            Commands::Migrate => None,
            Commands::Seed(args) => Some(&args.policy),
            Commands::Backfill(args) => Some(&args.policy),
        }
    }
}

#[derive(Serialize)]
struct SeedOutput {
    catalog: CatalogSummary,
    backfill: Option<BackfillReport>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = config::load_config().context("failed to load application config")?;
    config::init_tracing(config.log_level(), config.log_json);
    if let Some(url) = cli.database_url.clone() {
        config.database_url = url;
    }
    if let Some(policy) = cli.command.policy() {
        policy.apply(&mut config)?;
    }

    let seed = cli.seed.or(config.generator.seed);
    let mut rng = match seed {
        Some(seed) => {
            info!(seed, "Using seeded random generator");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    };

    let pool = db::connect_and_prepare(&config)
        .await
        .context("failed to prepare database")?;

    match cli.command {
        Commands::Migrate => {
            db::run_migrations(&pool)
                .await
                .context("failed to apply migrations")?;
            println!("Migrations applied");
        }
        Commands::Seed(args) => {
            let output = run_seed(&pool, &config, &args, &mut rng).await?;
            if cli.json {
                print_json(&output)?;
            } else {
                render_catalog(&output.catalog);
                if let Some(report) = &output.backfill {
                    render_report(report);
                }
            }
        }
        Commands::Backfill(args) => {
            let report = run_backfill(Arc::new(pool.clone()), &config, &mut rng).await?;
            if cli.json {
                print_json(&report)?;
            } else {
                render_report(&report);
            }
            if !report.is_clean() {
                bail!("{} product(s) failed to backfill", report.failed.len());
            }
        }
    }

    db::close_pool(pool).await.context("failed to close database pool")?;
    Ok(())
}

async fn run_seed(
    pool: &DbPool,
    config: &AppConfig,
    args: &SeedArgs,
    rng: &mut StdRng,
) -> Result<SeedOutput> {
    if args.reset {
        clear_demo_data(pool)
            .await
            .context("failed to clear existing demo data")?;
    }

    let now = Utc::now();
    let plan = plan_catalog(
        &config.catalog,
        config.generator.historical_months,
        &config.generator.seasonal_multipliers,
        now,
        rng,
    )
    .context("failed to plan demo catalog")?;
    let catalog = persist_catalog(pool, &plan)
        .await
        .context("failed to write demo catalog")?;

    let backfill = if args.skip_backfill {
        info!("Skipping history backfill");
        None
    } else {
        Some(run_backfill(Arc::new(pool.clone()), config, rng).await?)
    };

    Ok(SeedOutput { catalog, backfill })
}

async fn run_backfill(
    db: Arc<DbPool>,
    config: &AppConfig,
    rng: &mut StdRng,
) -> Result<BackfillReport> {
    let store = Arc::new(SeaOrmInventoryStore::new(db));
    let runner = InventoryBackfill::new(
        store.clone(),
        store.clone(),
        store,
        config.generator.clone(),
    );

    let report = runner
        .run(rng, Utc::now())
        .await
        .context("inventory backfill aborted")?;
    for (product_id, reason) in &report.failed {
        warn!(%product_id, %reason, "Product not backfilled");
    }
    Ok(report)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn render_catalog(summary: &CatalogSummary) {
    println!(
        "Seeded {} categories, {} suppliers, {} products, {} orders ({} items)",
        summary.categories,
        summary.suppliers,
        summary.products,
        summary.orders,
        summary.order_items
    );
}

fn render_report(report: &BackfillReport) {
    println!(
        "Backfilled {} products: {} ledger rows, {} forecast points",
        report.products_processed, report.ledger_rows, report.forecast_points
    );
    for (product_id, reason) in &report.failed {
        println!("- {} failed: {}", product_id, reason);
    }
}
