use crate::core::retry::{linear_backoff, with_backoff};
use crate::core::{QuoteProvider, QuoteRequest, QuoteResult};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{FixedOffset, Local, NaiveDate, TimeZone};
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

/// Picks the most recent daily close and the day it belongs to, dated in
/// the exchange's own time zone.
fn latest_close(item: &PriceChartItem) -> Option<(f64, NaiveDate)> {
    let exchange_tz = FixedOffset::east_opt(item.meta.gmtoffset.unwrap_or(0))?;
    let timestamps = item.timestamp.as_ref()?;
    let closes = item
        .indicators
        .as_ref()
        .and_then(|inds| inds.quote.first())
        .and_then(|q| q.close.as_ref())?;

    timestamps
        .iter()
        .zip(closes.iter())
        .rev()
        .find_map(|(ts, close)| {
            let close = (*close)?;
            let date = exchange_tz.timestamp_opt(*ts, 0).single()?.date_naive();
            Some((close, date))
        })
}

// YahooFinanceProvider implementation for QuoteProvider
pub struct YahooFinanceProvider {
    base_url: String,
    client: reqwest::Client,
}

impl YahooFinanceProvider {
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(YahooFinanceProvider {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[derive(Deserialize, Debug)]
struct YahooPriceResponse {
    chart: PriceChartResult,
}

#[derive(Deserialize, Debug)]
struct PriceChartResult {
    result: Option<Vec<PriceChartItem>>,
}

#[derive(Deserialize, Debug)]
struct Indicators {
    quote: Vec<Quote>,
}

#[derive(Deserialize, Debug)]
struct Quote {
    close: Option<Vec<Option<f64>>>,
}

#[derive(Deserialize, Debug)]
struct PriceChartItem {
    meta: PriceChartMeta,
    timestamp: Option<Vec<i64>>,
    indicators: Option<Indicators>,
}

#[derive(Deserialize, Debug)]
struct PriceChartMeta {
    #[serde(alias = "regularMarketPrice")]
    regular_market_price: Option<f64>,
    /// Seconds east of UTC for the listing exchange.
    gmtoffset: Option<i32>,
}

#[async_trait]
impl QuoteProvider for YahooFinanceProvider {
    #[instrument(
        name = "YahooQuoteFetch",
        skip(self, request),
        fields(symbol = %request.symbol)
    )]
    async fn fetch_quote(&self, request: &QuoteRequest) -> Result<QuoteResult> {
        let symbol = &request.symbol;
        let url = format!(
            "{}/v8/finance/chart/{}?interval=1d&range=1mo",
            self.base_url, symbol
        );
        debug!("Requesting price data from {}", url);

        let response = with_backoff(3, linear_backoff(Duration::from_millis(500)), |_| {
            self.client.get(&url).send()
        })
        .await
        .map_err(|e| anyhow!("Request error: {} for symbol: {} URL: {}", e, symbol, url))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for symbol: {}",
                response.status(),
                symbol
            ));
        }

        let text = response.text().await?;
        let data: YahooPriceResponse = serde_json::from_str(&text)
            .map_err(|e| anyhow!("Failed to parse JSON response for {}: {}", symbol, e))?;

        let item = data
            .chart
            .result
            .as_ref()
            .and_then(|items| items.first())
            .ok_or_else(|| anyhow!("No price data found for symbol: {}", symbol))?;

        let (close, as_of) = match latest_close(item) {
            Some(found) => found,
            None => {
                let price = item
                    .meta
                    .regular_market_price
                    .ok_or_else(|| anyhow!("No price data found for symbol: {}", symbol))?;
                debug!("No daily bars for {}, using market price", symbol);
                (price, Local::now().date_naive())
            }
        };

        let price = Decimal::from_f64(close)
            .ok_or_else(|| anyhow!("Invalid price {} for symbol: {}", close, symbol))?;
        Ok(QuoteResult::new(price, as_of))
    }
}
