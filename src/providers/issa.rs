use crate::core::config::IssaProviderConfig;
use crate::core::{QuoteProvider, QuoteRequest, QuoteResult};
use crate::scrape::chromium::ChromiumRenderer;
use crate::scrape::diagnostics::FileDiagnostics;
use crate::scrape::{ExtractorSettings, PageRenderer, PriceExtractor};
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Prices scraped from Maya, the TASE disclosure site, through a headless
/// browser. Every call may take several browser launches.
pub struct IssaProvider<R: PageRenderer> {
    extractor: PriceExtractor<R>,
    max_attempts: usize,
}

impl IssaProvider<ChromiumRenderer> {
    pub fn from_config(config: &IssaProviderConfig, user_agent: &str) -> Self {
        let renderer = ChromiumRenderer::new(user_agent)
            .with_executable(config.chrome_executable.clone());
        let mut extractor = PriceExtractor::new(renderer, ExtractorSettings::from(config));
        if let Some(dir) = &config.diagnostics_dir {
            extractor = extractor.with_diagnostics(Arc::new(FileDiagnostics::new(dir)));
        }
        Self::new(extractor, config.max_attempts)
    }
}

impl<R: PageRenderer> IssaProvider<R> {
    pub fn new(extractor: PriceExtractor<R>, max_attempts: usize) -> Self {
        Self {
            extractor,
            max_attempts,
        }
    }
}

#[async_trait]
impl<R: PageRenderer> QuoteProvider for IssaProvider<R> {
    async fn fetch_quote(&self, request: &QuoteRequest) -> Result<QuoteResult> {
        let quote = self
            .extractor
            .extract(&request.instrument(), self.max_attempts)
            .await?;
        Ok(quote)
    }
}
