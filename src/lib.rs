pub mod cli;
pub mod core;
pub mod providers;
pub mod scrape;
pub mod store;

use anyhow::Result;
use tracing::{debug, info};

pub use cli::scrape::ScrapeOptions;
pub use cli::update::UpdateOptions;

pub enum AppCommand {
    Update(UpdateOptions),
    Scrape(ScrapeOptions),
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("quotetrack starting...");

    let config = match config_path {
        Some(path) => core::config::AppConfig::load_from_path(path)?,
        None => core::config::AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    match command {
        AppCommand::Update(options) => cli::update::run(&config, &options).await,
        AppCommand::Scrape(options) => cli::scrape::run(&config, &options).await,
    }
}
