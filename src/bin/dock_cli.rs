use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{ArgAction, Args, Parser, Subcommand};
use dock_ledger::{
    config::{self, AppConfig},
    db::{self, DbPool},
    services::{
        catalog::{CatalogService, CompanySummary, ProductView},
        day_ledger::{DayLedgerService, LedgerView},
    },
};
use serde::Serialize;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize().await?;

    match cli.command {
        Commands::Migrate => handle_migrate(&context).await?,
        Commands::Summary(args) => handle_summary(&context, args, cli.json).await?,
        Commands::Close(args) => handle_close(&context, args, cli.json).await?,
        Commands::Reopen(args) => handle_reopen(&context, args, cli.json).await?,
        Commands::Ledgers(args) => handle_ledgers(&context, args, cli.json).await?,
        Commands::Companies(args) => handle_companies(&context, args, cli.json).await?,
        Commands::Products => handle_products(&context, cli.json).await?,
    }

    Ok(())
}

#[derive(Parser)]
#[command(
    name = "dock-cli",
    about = "Operator CLI for the dock unloading ledger",
    version
)]
struct Cli {
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
    /// Live totals and events for one day
    Summary(DateArgs),
    /// Freeze the day total and block further changes
    Close(CloseArgs),
    /// Put a closed day back to open
    Reopen(DateArgs),
    /// Most recent day ledgers
    Ledgers(LedgersArgs),
    /// Active companies, optionally filtered by name
    Companies(CompaniesArgs),
    /// Active products with their pallet packing
    Products,
}

#[derive(Args)]
struct DateArgs {
    #[arg(long, help = "Ledger date as YYYY-MM-DD; defaults to today")]
    date: Option<NaiveDate>,
}

#[derive(Args)]
struct CloseArgs {
    #[arg(long, help = "Ledger date as YYYY-MM-DD; defaults to today")]
    date: Option<NaiveDate>,
    #[arg(long, default_value = "", help = "Closing notes stored on the ledger")]
    notes: String,
}

#[derive(Args)]
struct LedgersArgs {
    #[arg(long, help = "Maximum number of ledgers to list")]
    limit: Option<u64>,
}

#[derive(Args)]
struct CompaniesArgs {
    #[arg(long, help = "Case-insensitive name fragment")]
    query: Option<String>,
}

struct CliContext {
    db: Arc<DbPool>,
    config: Arc<AppConfig>,
}

impl CliContext {
    async fn initialize() -> Result<Self> {
        let cfg = config::load_config().context("failed to load configuration")?;
        config::init_tracing(cfg.log_level(), cfg.log_json);
        debug!(environment = %cfg.environment, "dock-cli starting");

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .context("failed to connect to the database")?;

        Ok(Self {
            db: Arc::new(pool),
            config: Arc::new(cfg),
        })
    }

    fn ledgers(&self) -> DayLedgerService {
        DayLedgerService::new(self.db.clone())
    }

    fn catalog(&self) -> CatalogService {
        CatalogService::new(self.db.clone(), self.config.clone())
    }
}

fn resolve_date(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Local::now().date_naive())
}

async fn handle_migrate(context: &CliContext) -> Result<()> {
    db::run_migrations(&context.db)
        .await
        .context("failed to run migrations")?;
    println!("Migrations applied");
    Ok(())
}

async fn handle_summary(context: &CliContext, args: DateArgs, json: bool) -> Result<()> {
    let date = resolve_date(args.date);
    let summary = context
        .ledgers()
        .day_summary(date)
        .await
        .with_context(|| format!("failed to load summary for {}", date))?;

    if json {
        return print_json(&summary);
    }

    println!(
        "{} [{}] {} events, {} pallets",
        summary.ledger_date, summary.state, summary.event_count, summary.total_pallets
    );
    for event in &summary.events {
        println!(
            "  {}-{}  {:<24} {:<10} {:>10}",
            event.arrival, event.estimated_end, event.company, event.plate, event.total_pallets
        );
    }
    Ok(())
}

async fn handle_close(context: &CliContext, args: CloseArgs, json: bool) -> Result<()> {
    let date = resolve_date(args.date);
    let ledger = context
        .ledgers()
        .close(date, &args.notes)
        .await
        .with_context(|| format!("failed to close {}", date))?;

    if json {
        return print_json(&LedgerView::from(ledger));
    }
    println!(
        "Day {} closed with {} pallets",
        ledger.ledger_date, ledger.total_pallets
    );
    Ok(())
}

async fn handle_reopen(context: &CliContext, args: DateArgs, json: bool) -> Result<()> {
    let date = resolve_date(args.date);
    let ledger = context
        .ledgers()
        .reopen(date)
        .await
        .with_context(|| format!("failed to reopen {}", date))?;

    if json {
        return print_json(&LedgerView::from(ledger));
    }
    println!("Day {} reopened", ledger.ledger_date);
    Ok(())
}

async fn handle_ledgers(context: &CliContext, args: LedgersArgs, json: bool) -> Result<()> {
    let ledgers: Vec<LedgerView> = context
        .ledgers()
        .list_ledgers(None, args.limit)
        .await
        .context("failed to list ledgers")?
        .into_iter()
        .map(LedgerView::from)
        .collect();

    if json {
        return print_json(&ledgers);
    }
    if ledgers.is_empty() {
        println!("No ledgers recorded");
    }
    for ledger in &ledgers {
        let closed_at = ledger
            .closed_at
            .map(|at| at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {:<6}  {:>10}  {}",
            ledger.ledger_date, ledger.state, ledger.total_pallets, closed_at
        );
    }
    Ok(())
}

async fn handle_companies(context: &CliContext, args: CompaniesArgs, json: bool) -> Result<()> {
    let companies: Vec<CompanySummary> = context
        .catalog()
        .search_companies(args.query.as_deref(), true, None)
        .await
        .context("failed to search companies")?
        .into_iter()
        .map(CompanySummary::from)
        .collect();

    if json {
        return print_json(&companies);
    }
    for company in &companies {
        println!("{}  {}", company.id, company.name);
    }
    Ok(())
}

async fn handle_products(context: &CliContext, json: bool) -> Result<()> {
    let products: Vec<ProductView> = context
        .catalog()
        .search_products(true)
        .await
        .context("failed to list products")?
        .into_iter()
        .map(ProductView::from)
        .collect();

    if json {
        return print_json(&products);
    }
    for product in &products {
        println!(
            "{:<28} {:<10} {:>4} x {:<4} = {}",
            product.name,
            product.category,
            product.units_per_layer,
            product.layers_per_pallet,
            product.full_pallet_units
        );
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
