use crate::scrape::renderer::Locator;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use std::{fs, path::PathBuf};
use tracing::debug;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36";

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct JustEtfProviderConfig {
    pub base_url: String,
}

impl Default for JustEtfProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.justetf.com".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct YahooProviderConfig {
    pub base_url: String,
}

impl Default for YahooProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
        }
    }
}

/// Settings of the browser-scraped Maya TASE source.
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct IssaProviderConfig {
    /// Page of a foreign ETF, `{symbol}` is substituted.
    pub etf_url: String,
    /// Page of a mutual fund, `{symbol}` is substituted.
    pub fund_url: String,
    pub max_attempts: usize,
    /// Backoff unit; attempt `n` waits `n * backoff_ms` before the next one.
    pub backoff_ms: u64,
    pub page_load_timeout_secs: u64,
    /// Wait budget of each selector candidate.
    pub element_timeout_secs: u64,
    pub price_ceiling: Decimal,
    pub chrome_executable: Option<PathBuf>,
    /// Where failed attempts dump page source and a screenshot. Off when unset.
    pub diagnostics_dir: Option<PathBuf>,
    /// Coarse marker awaited after navigation, before probing for the price.
    pub ready_locator: Option<Locator>,
    pub locators: Vec<Locator>,
}

impl Default for IssaProviderConfig {
    fn default() -> Self {
        Self {
            etf_url: "https://maya.tase.co.il/foreignetf/{symbol}".to_string(),
            fund_url: "https://maya.tase.co.il/fund/{symbol}".to_string(),
            max_attempts: 3,
            backoff_ms: 2000,
            page_load_timeout_secs: 30,
            element_timeout_secs: 10,
            price_ceiling: Decimal::from(100_000),
            chrome_executable: None,
            diagnostics_dir: None,
            ready_locator: Some(Locator::Css("main".to_string())),
            locators: Locator::default_price_chain(),
        }
    }
}

impl IssaProviderConfig {
    pub fn backoff(&self) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }

    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_secs(self.element_timeout_secs)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct ProvidersConfig {
    pub justetf: JustEtfProviderConfig,
    pub yahoo: YahooProviderConfig,
    pub issa: IssaProviderConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub symbols_dir: PathBuf,
    pub dist_dir: PathBuf,
    pub user_agent: String,
    pub providers: ProvidersConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            symbols_dir: PathBuf::from("symbols"),
            dist_dir: PathBuf::from("dist"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            providers: ProvidersConfig::default(),
        }
    }
}

impl AppConfig {
    /// Loads the config from the default location, falling back to built-in
    /// defaults when no file has been set up.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!(
                "No config at {}, using defaults",
                config_path.display()
            );
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("io", "quotetrack", "quotetrack")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}
