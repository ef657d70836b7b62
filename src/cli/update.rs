use super::ui;
use crate::core::config::AppConfig;
use crate::core::{QuoteProvider, QuoteResult, QuoteSource, SymbolTrackInfo};
use crate::providers::{IssaProvider, JustEtfProvider, YahooFinanceProvider};
use crate::store::{DistWriter, load_symbols};
use anyhow::{Result, anyhow, bail};
use comfy_table::Cell;
use rust_decimal::Decimal;
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Command line overrides for the update run.
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    pub symbols_dir: Option<PathBuf>,
    pub dist_dir: Option<PathBuf>,
    /// Restrict the run to these symbol ids.
    pub only: Vec<String>,
}

/// One provider per quote source.
pub struct QuoteProviders {
    justetf: Box<dyn QuoteProvider>,
    yahoo: Box<dyn QuoteProvider>,
    issa: Box<dyn QuoteProvider>,
}

impl QuoteProviders {
    pub fn new(
        justetf: Box<dyn QuoteProvider>,
        yahoo: Box<dyn QuoteProvider>,
        issa: Box<dyn QuoteProvider>,
    ) -> Self {
        Self {
            justetf,
            yahoo,
            issa,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let providers = &config.providers;
        Ok(Self::new(
            Box::new(JustEtfProvider::new(
                &providers.justetf.base_url,
                &config.user_agent,
            )?),
            Box::new(YahooFinanceProvider::new(
                &providers.yahoo.base_url,
                &config.user_agent,
            )?),
            Box::new(IssaProvider::from_config(
                &providers.issa,
                &config.user_agent,
            )),
        ))
    }

    pub fn for_source(&self, source: QuoteSource) -> &dyn QuoteProvider {
        match source {
            QuoteSource::JustEtf => self.justetf.as_ref(),
            QuoteSource::YahooFinance => self.yahoo.as_ref(),
            QuoteSource::Issa => self.issa.as_ref(),
        }
    }
}

/// What happened to one descriptor file.
#[derive(Debug)]
pub struct UpdateOutcome {
    pub id: String,
    pub source: Option<QuoteSource>,
    pub currency: Option<String>,
    pub result: Result<QuoteResult>,
}

impl UpdateOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

async fn update_symbol(
    info: &SymbolTrackInfo,
    providers: &QuoteProviders,
    writer: &DistWriter,
) -> Result<QuoteResult> {
    let quote = providers
        .for_source(info.source)
        .fetch_quote(&info.quote_request())
        .await?;

    if quote.price <= Decimal::ZERO {
        bail!("Failed to get price for {}", info.symbol);
    }

    writer.write(info, &quote)?;
    info!(
        "Symbol \"{}\" update completed. Price: {} {} Date: {}",
        info.id,
        quote.price,
        info.currency,
        quote.date_string()
    );
    Ok(quote)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Fetches and publishes every descriptor in `symbols_dir`, one after the
/// other. A failing symbol is recorded and the loop moves on.
pub async fn update_symbols(
    symbols_dir: &Path,
    only: &[String],
    providers: &QuoteProviders,
    writer: &DistWriter,
) -> Result<Vec<UpdateOutcome>> {
    let loaded = load_symbols(symbols_dir)?;
    let selected: Vec<_> = loaded
        .into_iter()
        .filter(|(path, info)| {
            only.is_empty()
                || match info {
                    Ok(info) => only.contains(&info.id),
                    Err(_) => only.contains(&file_stem(path)),
                }
        })
        .collect();

    let pb = ui::new_progress_bar(selected.len() as u64, true);
    let mut outcomes = Vec::with_capacity(selected.len());

    for (path, info) in selected {
        let outcome = match info {
            Ok(info) => {
                info!("Processing {} ...", path.display());
                pb.set_message(info.id.clone());
                let result = update_symbol(&info, providers, writer).await;
                UpdateOutcome {
                    id: info.id,
                    source: Some(info.source),
                    currency: Some(info.currency),
                    result,
                }
            }
            Err(e) => UpdateOutcome {
                id: file_stem(&path),
                source: None,
                currency: None,
                result: Err(e),
            },
        };

        if let Err(e) = &outcome.result {
            error!("Failed to process {}: {:#}", path.display(), e);
        }
        outcomes.push(outcome);
        pb.inc(1);
    }
    pb.finish_and_clear();

    Ok(outcomes)
}

pub fn display_outcomes(outcomes: &[UpdateOutcome]) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Symbol"),
        ui::header_cell("Source"),
        ui::header_cell("Price"),
        ui::header_cell("Date"),
        ui::header_cell("Status"),
    ]);

    for outcome in outcomes {
        let source = outcome
            .source
            .map_or_else(|| ui::na_cell(false), |s| Cell::new(s.to_string()));
        let (price, date, status) = match &outcome.result {
            Ok(quote) => (
                ui::number_cell(format!(
                    "{} {}",
                    quote.price,
                    outcome.currency.as_deref().unwrap_or_default()
                )),
                Cell::new(quote.date_string()),
                ui::status_cell(None),
            ),
            Err(e) => (
                ui::na_cell(true),
                ui::na_cell(true),
                ui::status_cell(Some(&e.to_string())),
            ),
        };
        table.add_row(vec![Cell::new(&outcome.id), source, price, date, status]);
    }

    let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
    let summary = if failed == 0 {
        ui::style_text(
            &format!("{} symbol(s) updated", outcomes.len()),
            ui::StyleType::Success,
        )
    } else {
        ui::style_text(
            &format!("{failed} of {} symbol(s) failed", outcomes.len()),
            ui::StyleType::Error,
        )
    };

    format!(
        "{}\n\n{}\n\n{}",
        ui::style_text("Quote update", ui::StyleType::Title),
        table,
        summary
    )
}

pub async fn run(config: &AppConfig, options: &UpdateOptions) -> Result<()> {
    let symbols_dir = options
        .symbols_dir
        .as_deref()
        .unwrap_or(&config.symbols_dir);
    let dist_dir = options.dist_dir.as_deref().unwrap_or(&config.dist_dir);

    let providers = QuoteProviders::from_config(config)?;
    let writer = DistWriter::new(dist_dir);
    let outcomes = update_symbols(symbols_dir, &options.only, &providers, &writer).await?;

    if outcomes.is_empty() {
        println!(
            "{}",
            ui::style_text(
                &format!("No symbols found in {}", symbols_dir.display()),
                ui::StyleType::Subtle
            )
        );
        return Ok(());
    }

    println!("{}", display_outcomes(&outcomes));

    let failed: Vec<&str> = outcomes
        .iter()
        .filter(|o| !o.is_ok())
        .map(|o| o.id.as_str())
        .collect();
    if !failed.is_empty() {
        return Err(anyhow!("Failed to update: {}", failed.join(", ")));
    }
    Ok(())
}
