use super::ui;
use crate::core::config::AppConfig;
use crate::core::{InstrumentKind, InstrumentRef, QuoteResult};
use crate::scrape::chromium::ChromiumRenderer;
use crate::scrape::diagnostics::FileDiagnostics;
use crate::scrape::{ExtractorSettings, PageRenderer, PriceExtractor};
use anyhow::Result;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    pub symbol: String,
    pub kind: InstrumentKind,
    /// Overrides `providers.issa.max_attempts`.
    pub attempts: Option<usize>,
}

pub fn display_quote(instrument: &InstrumentRef, quote: &QuoteResult) -> String {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Symbol"),
        ui::header_cell("Type"),
        ui::header_cell("Price"),
        ui::header_cell("Date"),
    ]);
    table.add_row(vec![
        comfy_table::Cell::new(&instrument.symbol),
        comfy_table::Cell::new(instrument.kind.to_string()),
        ui::number_cell(quote.price.to_string()),
        comfy_table::Cell::new(quote.date_string()),
    ]);
    format!(
        "{}\n\n{}",
        ui::style_text("Scraped quote", ui::StyleType::Title),
        table
    )
}

/// Runs one extraction and renders the result.
pub async fn scrape_with<R: PageRenderer>(
    extractor: &PriceExtractor<R>,
    options: &ScrapeOptions,
    default_attempts: usize,
) -> Result<String> {
    let instrument = InstrumentRef::new(&options.symbol, options.kind);
    let attempts = options.attempts.unwrap_or(default_attempts);
    let quote = extractor.extract(&instrument, attempts).await?;
    Ok(display_quote(&instrument, &quote))
}

pub async fn run(config: &AppConfig, options: &ScrapeOptions) -> Result<()> {
    let issa = &config.providers.issa;
    let renderer =
        ChromiumRenderer::new(&config.user_agent).with_executable(issa.chrome_executable.clone());
    let mut extractor = PriceExtractor::new(renderer, ExtractorSettings::from(issa));
    if let Some(dir) = &issa.diagnostics_dir {
        extractor = extractor.with_diagnostics(Arc::new(FileDiagnostics::new(dir)));
    }

    let output = scrape_with(&extractor, options, issa.max_attempts).await?;
    println!("{output}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scrape::{ElementHandle, Locator, RenderSession, RendererError};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Finds nothing on any page and counts sessions.
    #[derive(Default)]
    struct EmptyPage {
        opened: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl PageRenderer for EmptyPage {
        async fn open(&self) -> Result<Box<dyn RenderSession>, RendererError> {
            self.opened.fetch_add(1, Ordering::SeqCst);
            Ok(Box::new(EmptySession))
        }
    }

    struct EmptySession;

    #[async_trait]
    impl RenderSession for EmptySession {
        async fn navigate(&mut self, _url: &str, _timeout: Duration) -> Result<(), RendererError> {
            Ok(())
        }

        async fn wait_for_element(
            &mut self,
            _locator: &Locator,
            _timeout: Duration,
        ) -> Result<Option<ElementHandle>, RendererError> {
            Ok(None)
        }

        async fn text(&mut self, element: &ElementHandle) -> Result<String, RendererError> {
            Err(RendererError::StaleElement(element.id()))
        }

        async fn page_source(&mut self) -> Result<String, RendererError> {
            Ok(String::new())
        }

        async fn screenshot(&mut self) -> Result<Vec<u8>, RendererError> {
            Ok(Vec::new())
        }

        async fn dispose(self: Box<Self>) -> Result<(), RendererError> {
            Ok(())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempts_override_default() {
        let renderer = EmptyPage::default();
        let opened = Arc::clone(&renderer.opened);
        let extractor = PriceExtractor::new(renderer, ExtractorSettings::default());
        let options = ScrapeOptions {
            symbol: "5122510".to_string(),
            kind: InstrumentKind::Fund,
            attempts: Some(2),
        };

        let err = scrape_with(&extractor, &options, 5).await.unwrap_err();

        assert_eq!(opened.load(Ordering::SeqCst), 2);
        assert!(err.to_string().contains("after 2 attempt(s)"));
    }

    #[test]
    fn test_display_quote() {
        let instrument = InstrumentRef::new("1159250", InstrumentKind::Etf);
        let quote = QuoteResult::new(
            rust_decimal::Decimal::new(15210, 2),
            chrono::NaiveDate::from_ymd_opt(2024, 3, 7).unwrap(),
        );

        let output = display_quote(&instrument, &quote);

        assert!(output.contains("1159250"));
        assert!(output.contains("152.10"));
        assert!(output.contains("2024-03-07"));
    }
}
