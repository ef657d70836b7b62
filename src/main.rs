use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use quotetrack::core::InstrumentKind;
use quotetrack::core::log::init_logging;
use quotetrack::{AppCommand, ScrapeOptions, UpdateOptions};
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

impl From<Commands> for AppCommand {
    fn from(cmd: Commands) -> AppCommand {
        match cmd {
            Commands::Update {
                symbols_dir,
                dist_dir,
                only,
            } => AppCommand::Update(UpdateOptions {
                symbols_dir,
                dist_dir,
                only,
            }),
            Commands::Scrape {
                symbol,
                kind,
                attempts,
            } => AppCommand::Scrape(ScrapeOptions {
                symbol,
                kind,
                attempts,
            }),
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Fetch a quote for every tracked symbol and publish it
    Update {
        /// Directory of symbol descriptors
        #[arg(long)]
        symbols_dir: Option<PathBuf>,
        /// Output directory
        #[arg(long)]
        dist_dir: Option<PathBuf>,
        /// Only update the symbol with this id (repeatable)
        #[arg(long = "only", value_name = "ID")]
        only: Vec<String>,
    },
    /// Scrape a single Maya price and print it
    Scrape {
        /// TASE security number
        symbol: String,
        /// Instrument type, selects the page to scrape
        #[arg(long, default_value_t = InstrumentKind::Etf)]
        kind: InstrumentKind,
        /// Override the configured number of attempts
        #[arg(long)]
        attempts: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => quotetrack::cli::setup::setup_at_path(path),
            None => quotetrack::cli::setup::setup(),
        },
        Some(cmd) => quotetrack::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
