mod commands;
mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt};

use crate::commands::{
    cmd_chart, cmd_day_save, cmd_food_list, cmd_food_show, cmd_history_export,
    cmd_history_import, cmd_history_show, cmd_log_add, cmd_log_clear, cmd_log_remove,
    cmd_log_show, cmd_preview, cmd_weight,
};
use crate::config::{Config, FOODS_ENV};
use nutriter_core::TrackerError;
use nutriter_core::catalog::Catalog;
use nutriter_core::service::NutriterService;

#[derive(Parser)]
#[command(
    name = "nutriter",
    version,
    about = "Log what you eat by measure, track macros and weight over time"
)]
struct Cli {
    /// Food catalog JSON file (default: $NUTRITER_FOODS, then foods.json in the data directory)
    #[arg(long, global = true, value_name = "PATH")]
    foods: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse the food catalog
    Food {
        #[command(subcommand)]
        command: FoodCommands,
    },
    /// Show calories and macros for an amount without logging it
    Preview {
        /// Food ID (unknown IDs fall back to the first food)
        food: String,
        /// Amount in the chosen measure
        #[arg(allow_negative_numbers = true)]
        amount: f64,
        /// Measure ID (default: the food's first measure)
        #[arg(short, long)]
        measure: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Manage today's running log
    Log {
        #[command(subcommand)]
        command: LogCommands,
    },
    /// Save the log totals as a day in history
    Day {
        #[command(subcommand)]
        command: DayCommands,
    },
    /// Record body weight for a day, keeping that day's macros
    Weight {
        /// Weight value
        #[arg(allow_negative_numbers = true)]
        value: f64,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show, export or import saved days
    History {
        #[command(subcommand)]
        command: HistoryCommands,
    },
    /// Draw saved history as a text chart
    Chart {
        /// First date to include (default: earliest saved day)
        #[arg(long)]
        start: Option<String>,
        /// Last date to include (default: latest saved day)
        #[arg(long)]
        end: Option<String>,
        /// Comma-separated series: calories, protein, fat, carbs, weight,
        /// `protein_ratio`, `fat_ratio`, `carb_ratio` (default: all)
        #[arg(short, long)]
        series: Option<String>,
        /// Plot height in rows
        #[arg(long, default_value = "10")]
        height: usize,
        /// Output the chart data as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum FoodCommands {
    /// List all foods in the catalog
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a food and its measures
    Show {
        /// Food ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum LogCommands {
    /// Add an entry to the log
    Add {
        /// Food ID (unknown IDs fall back to the first food)
        food: String,
        /// Amount in the chosen measure
        #[arg(allow_negative_numbers = true)]
        amount: f64,
        /// Measure ID (default: the food's first measure)
        #[arg(short, long)]
        measure: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show logged entries and running totals
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove an entry by ID
    Remove {
        /// Entry ID
        id: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove every entry
    Clear {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum DayCommands {
    /// Save current totals, replacing anything saved for that date
    Save {
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow, default: today)
        #[arg(long)]
        date: Option<String>,
        /// Body weight to store with the day
        #[arg(long, allow_negative_numbers = true)]
        weight: Option<f64>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum HistoryCommands {
    /// Show saved days
    Show {
        /// First date to include
        #[arg(long)]
        start: Option<String>,
        /// Last date to include
        #[arg(long)]
        end: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Write the whole history to a JSON file
    Export {
        /// Output file (default: history.json)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Replace the whole history with the contents of a JSON file
    Import {
        /// Path to a JSON array of saved days
        file: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        if matches!(
            e.downcast_ref::<TrackerError>(),
            Some(TrackerError::EmptyCatalog)
        ) {
            eprintln!("Add foods to the catalog file, or point --foods / {FOODS_ENV} at one.");
        }
        process::exit(1);
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

impl Commands {
    fn uses_catalog(&self) -> bool {
        matches!(
            self,
            Commands::Food { .. }
                | Commands::Preview { .. }
                | Commands::Log {
                    command: LogCommands::Add { .. }
                }
        )
    }
}

/// Load the catalog. A broken catalog is only an error for commands that
/// read it; everything else runs against an empty catalog.
fn load_catalog(path: &Path, required: bool) -> Result<Catalog> {
    match Catalog::load(path) {
        Ok(catalog) => Ok(catalog),
        Err(e) if !required => {
            warn!(path = %path.display(), error = %e, "ignoring unreadable food catalog");
            Ok(Catalog::default())
        }
        Err(e) => Err(e).with_context(|| format!("Failed to load food catalog: {}", path.display())),
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load(cli.foods)?;
    let catalog = load_catalog(&config.foods_path, cli.command.uses_catalog())?;
    let mut svc = NutriterService::new(&config.db_path, catalog)?;

    match cli.command {
        Commands::Food { command } => match command {
            FoodCommands::List { json } => cmd_food_list(&svc, json),
            FoodCommands::Show { id, json } => cmd_food_show(&svc, &id, json),
        },
        Commands::Preview {
            food,
            amount,
            measure,
            json,
        } => cmd_preview(&svc, &food, amount, measure.as_deref(), json),
        Commands::Log { command } => match command {
            LogCommands::Add {
                food,
                amount,
                measure,
                json,
            } => cmd_log_add(&mut svc, &food, amount, measure.as_deref(), json),
            LogCommands::Show { json } => cmd_log_show(&svc, json),
            LogCommands::Remove { id, json } => cmd_log_remove(&mut svc, &id, json),
            LogCommands::Clear { json } => cmd_log_clear(&mut svc, json),
        },
        Commands::Day { command } => match command {
            DayCommands::Save { date, weight, json } => cmd_day_save(&mut svc, date, weight, json),
        },
        Commands::Weight { value, date, json } => cmd_weight(&mut svc, value, date, json),
        Commands::History { command } => match command {
            HistoryCommands::Show { start, end, json } => cmd_history_show(&svc, start, end, json),
            HistoryCommands::Export { out, json } => cmd_history_export(&svc, out, json).await,
            HistoryCommands::Import { file, json } => {
                cmd_history_import(&mut svc, &file, json).await
            }
        },
        Commands::Chart {
            start,
            end,
            series,
            height,
            json,
        } => cmd_chart(&svc, start, end, series.as_deref(), height, json),
    }
}
