//! Scrapes the current price of an instrument from a browser-rendered page.
//!
//! One attempt walks `Loading → Probing → Parsing → Validating`. Any failure
//! sends the attempt to the diagnostics sink, disposes its session and, while
//! attempts remain, waits `attempt * backoff` before loading again.

use super::diagnostics::{DiagnosticsSink, NoDiagnostics};
use super::error::{ExtractError, ExtractionFailed};
use super::normalize::{normalize, validate};
use super::renderer::{Locator, PageRenderer, RenderSession};
use crate::core::config::IssaProviderConfig;
use crate::core::retry::{linear_backoff, with_backoff};
use crate::core::{InstrumentKind, InstrumentRef, QuoteResult};
use chrono::Local;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Knobs of the extraction routine.
#[derive(Debug, Clone)]
pub struct ExtractorSettings {
    pub etf_url: String,
    pub fund_url: String,
    pub locators: Vec<Locator>,
    pub ready_locator: Option<Locator>,
    pub page_load_timeout: Duration,
    pub element_timeout: Duration,
    pub backoff: Duration,
    pub price_ceiling: Decimal,
}

impl From<&IssaProviderConfig> for ExtractorSettings {
    fn from(config: &IssaProviderConfig) -> Self {
        Self {
            etf_url: config.etf_url.clone(),
            fund_url: config.fund_url.clone(),
            locators: config.locators.clone(),
            ready_locator: config.ready_locator.clone(),
            page_load_timeout: config.page_load_timeout(),
            element_timeout: config.element_timeout(),
            backoff: config.backoff(),
            price_ceiling: config.price_ceiling,
        }
    }
}

impl Default for ExtractorSettings {
    fn default() -> Self {
        Self::from(&IssaProviderConfig::default())
    }
}

impl ExtractorSettings {
    pub fn page_url(&self, instrument: &InstrumentRef) -> String {
        let template = match instrument.kind {
            InstrumentKind::Etf => &self.etf_url,
            InstrumentKind::Fund => &self.fund_url,
        };
        template.replace("{symbol}", &instrument.symbol)
    }
}

pub struct PriceExtractor<R: PageRenderer> {
    renderer: R,
    settings: ExtractorSettings,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl<R: PageRenderer> PriceExtractor<R> {
    pub fn new(renderer: R, settings: ExtractorSettings) -> Self {
        Self {
            renderer,
            settings,
            diagnostics: Arc::new(NoDiagnostics),
        }
    }

    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn settings(&self) -> &ExtractorSettings {
        &self.settings
    }

    /// Scrapes the price of `instrument`, trying at most `max_attempts` times
    /// (zero counts as one).
    #[instrument(
        name = "ScrapePrice",
        skip(self, instrument),
        fields(symbol = %instrument.symbol, kind = %instrument.kind)
    )]
    pub async fn extract(
        &self,
        instrument: &InstrumentRef,
        max_attempts: usize,
    ) -> Result<QuoteResult, ExtractionFailed> {
        let max_attempts = max_attempts.max(1);
        with_backoff(
            max_attempts,
            linear_backoff(self.settings.backoff),
            |attempt| self.attempt(instrument, attempt),
        )
        .await
        .map_err(|source| ExtractionFailed {
            symbol: instrument.symbol.clone(),
            attempts: max_attempts,
            source,
        })
    }

    async fn attempt(
        &self,
        instrument: &InstrumentRef,
        attempt: usize,
    ) -> Result<QuoteResult, ExtractError> {
        info!("Attempt {} for symbol {}", attempt, instrument.symbol);
        let mut session = self.renderer.open().await?;

        let outcome = self.scrape(session.as_mut(), instrument).await;
        if let Err(e) = &outcome {
            warn!(attempt, error = %e, "Attempt failed");
            self.diagnostics
                .capture(&instrument.symbol, attempt, session.as_mut())
                .await;
        }

        if let Err(e) = session.dispose().await {
            warn!(error = %e, "Failed to dispose browser session");
        }
        outcome
    }

    async fn scrape(
        &self,
        session: &mut dyn RenderSession,
        instrument: &InstrumentRef,
    ) -> Result<QuoteResult, ExtractError> {
        let url = self.settings.page_url(instrument);
        debug!(state = "loading", %url, "Accessing URL");
        session
            .navigate(&url, self.settings.page_load_timeout)
            .await?;

        if let Some(ready) = &self.settings.ready_locator {
            let found = session
                .wait_for_element(ready, self.settings.page_load_timeout)
                .await?;
            if found.is_none() {
                warn!(locator = %ready, "Page ready marker not seen, probing anyway");
            }
        }

        debug!(state = "probing", candidates = self.settings.locators.len());
        let raw = self.probe(session).await?;

        debug!(state = "parsing", raw = %raw);
        let price = normalize(&raw)?;

        debug!(state = "validating", value = %price.value, unit = ?price.unit);
        let value = validate(price.value, self.settings.price_ceiling)?;

        Ok(QuoteResult::new(value, Local::now().date_naive()))
    }

    /// Text of the first locator that matches, in list order.
    async fn probe(&self, session: &mut dyn RenderSession) -> Result<String, ExtractError> {
        for locator in &self.settings.locators {
            if let Some(element) = session
                .wait_for_element(locator, self.settings.element_timeout)
                .await?
            {
                debug!(%locator, "Price element located");
                return session.text(&element).await.map_err(ExtractError::from);
            }
            debug!(%locator, "No match");
        }
        Err(ExtractError::PriceElementNotFound {
            probed: self.settings.locators.len(),
        })
    }
}
