//! shopsmart - workshop dashboard sync engine driver
//!
//! Runs the dashboard against the in-memory store: prints the seeded views,
//! the overview metrics, or a concurrent seeding simulation.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use shopsmart_sync::{DashboardConfig, SeedStrategy};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

mod commands;
mod render;

/// shopsmart - workshop dashboard sync engine driver
#[derive(Parser, Debug)]
#[command(name = "shopsmart")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Application namespace (overrides config and environment)
    #[arg(long)]
    app_id: Option<String>,

    /// Log level or filter directive; falls back to RUST_LOG
    #[arg(long, env = "RUST_LOG", default_value = "warn")]
    log_level: String,

    /// Emit JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print one collection's ordered view
    View {
        /// Collection to print
        #[arg(value_enum)]
        collection: commands::CollectionArg,
    },

    /// Print the shop overview metrics
    Overview {
        /// Reference date for overdue maintenance (YYYY-MM-DD, default today)
        #[arg(long)]
        today: Option<chrono::NaiveDate>,
    },

    /// Race several listeners against one fresh collection and check seeding
    Simulate {
        /// Concurrent listeners
        #[arg(long, default_value_t = 4)]
        listeners: usize,

        /// Artificial store latency per operation, in milliseconds
        #[arg(long, default_value_t = 20)]
        latency_ms: u64,

        /// Seeding strategy (defaults to the configured one)
        #[arg(long)]
        strategy: Option<SeedStrategy>,

        /// Give every listener its own coordinator, as separate processes would
        #[arg(long)]
        isolated: bool,
    },
}

fn load_config(cli: &Cli) -> Result<DashboardConfig> {
    let mut config =
        DashboardConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(app_id) = &cli.app_id {
        config = config.with_app_id(app_id.clone());
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = EnvFilter::try_new(&cli.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let config = load_config(&cli)?;
    let format = render::Format::from_json_flag(cli.json);

    match cli.command {
        Commands::View { collection } => commands::view(config, collection, format).await,
        Commands::Overview { today } => {
            let today = today.unwrap_or_else(|| chrono::Local::now().date_naive());
            commands::overview(config, today, format).await
        }
        Commands::Simulate {
            listeners,
            latency_ms,
            strategy,
            isolated,
        } => {
            let strategy = strategy.unwrap_or(config.seed_strategy);
            let report =
                commands::simulate(config, listeners, latency_ms, strategy, isolated).await?;
            render::simulation(&report, format)?;
            if !report.passed() {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
