#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that scans run seeds for unlock choices and shop stock.

mod commands;
mod config;

use std::{
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use seed_scanner_catalog::Catalog;
use seed_scanner_core::{ContentCatalog, Seed};
use tracing_subscriber::EnvFilter;

use crate::config::ScannerConfig;

/// Log filter applied when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "warn,seed_scanner=info";

/// Predicts the unlock choices and shop stock a seed produces.
#[derive(Debug, Parser)]
#[command(name = "seed-scanner", version)]
struct Cli {
    /// Scanner configuration file; `seed-scanner.toml` is used when present
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Content catalog describing settings, unlocks and appliances
    #[arg(long, global = true, default_value = "assets/catalog.toml")]
    catalog: PathBuf,

    /// Days scanned ahead of a node for its next unlock offer
    #[arg(long, global = true)]
    lookahead: Option<u32>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List restaurant settings
    Settings,
    /// List dishes a run can start with
    Dishes,
    /// Print the unlock choice tree a few generations deep
    Tree {
        #[command(flatten)]
        run: RunArgs,
        /// Generations printed below the starting unlocks
        #[arg(long, default_value_t = 2)]
        depth: u32,
    },
    /// Follow a sequence of choices and show what comes next
    Path {
        #[command(flatten)]
        run: RunArgs,
        /// Chosen slot (1 or 2) at each offer, comma separated
        #[arg(long, value_delimiter = ',')]
        choose: Vec<u32>,
    },
    /// Export every path up to a day as CSV
    Export {
        #[command(flatten)]
        run: RunArgs,
        /// Last day included; defaults to the configured export day
        #[arg(long, allow_hyphen_values = true)]
        day: Option<i32>,
    },
    /// Export the cards reachable up to a day
    Cards {
        #[command(flatten)]
        run: RunArgs,
        /// Last day included; defaults to the configured export day
        #[arg(long, allow_hyphen_values = true)]
        day: Option<i32>,
        /// Directory of pre-rendered `<unlock id>.png` card images to copy
        #[arg(long)]
        art_dir: Option<PathBuf>,
    },
    /// Show the blueprint stock each shop slot may offer after a day
    Shop(ShopArgs),
}

/// Starting conditions shared by the tree commands.
#[derive(Debug, Args)]
pub(crate) struct RunArgs {
    /// Run seed, up to eight characters
    #[arg(long)]
    pub(crate) seed: Seed,
    /// Setting name or identifier
    #[arg(long)]
    pub(crate) setting: String,
    /// Starting dish name or identifier
    #[arg(long)]
    pub(crate) dish: String,
    /// Franchise tier used for unlock eligibility
    #[arg(long, default_value_t = 0)]
    pub(crate) tier: u32,
    /// Unlock rerolls available in the run
    #[arg(long, default_value_t = 0)]
    pub(crate) rerolls: u32,
}

/// Run state the shop is simulated for.
#[derive(Debug, Args)]
pub(crate) struct ShopArgs {
    /// Day whose end-of-day shop is shown
    #[arg(long, allow_hyphen_values = true)]
    pub(crate) day: i32,
    /// Owned appliance identifiers, comma separated
    #[arg(long, value_delimiter = ',')]
    pub(crate) owned: Vec<i32>,
    /// Processes required by the menu, comma separated
    #[arg(long, value_delimiter = ',')]
    pub(crate) processes: Vec<i32>,
    /// Active theme flag values, comma separated
    #[arg(long, value_delimiter = ',')]
    pub(crate) themes: Vec<u32>,
    /// Host filter names in execution order; defaults to the standard order
    #[arg(long, value_delimiter = ',')]
    pub(crate) filters: Vec<String>,
    /// Rerolls already spent on the day
    #[arg(long, default_value_t = 0)]
    pub(crate) reroll: u32,
    /// Letters are delivered inside the restaurant
    #[arg(long)]
    pub(crate) letters_inside: bool,
}

/// Entry point for the seed scanner command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    run(cli, &mut out)?;
    out.flush().context("failed to flush output")
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(cli: Cli, out: &mut impl Write) -> Result<()> {
    let mut config = ScannerConfig::load(cli.config.as_deref())?;
    if let Some(days) = cli.lookahead {
        config.lookahead_days = days;
    }

    let catalog = Catalog::from_path(&cli.catalog)
        .with_context(|| format!("failed to load catalog {}", cli.catalog.display()))?;
    tracing::debug!(
        unlocks = catalog.unlocks().len(),
        lookahead = config.lookahead_days,
        "catalog loaded"
    );

    match cli.command {
        Command::Settings => commands::list_settings(out, &catalog),
        Command::Dishes => commands::list_dishes(out, &catalog),
        Command::Tree { run, depth } => commands::print_tree(out, &catalog, &config, &run, depth),
        Command::Path { run, choose } => {
            commands::print_path(out, &catalog, &config, &run, &choose)
        }
        Command::Export { run, day } => {
            let day = day.unwrap_or(config.export_day);
            commands::export_csv(out, &catalog, &config, &run, day)
        }
        Command::Cards { run, day, art_dir } => {
            let day = day.unwrap_or(config.export_day);
            commands::export_cards(out, &catalog, &config, &run, day, art_dir.as_deref())
        }
        Command::Shop(args) => commands::print_shop(out, &catalog, &config, &args),
    }
}
