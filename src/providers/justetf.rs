use crate::core::retry::{linear_backoff, with_backoff};
use crate::core::{QuoteProvider, QuoteRequest, QuoteResult};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

/// Quotes from the public justETF quote endpoint. Symbols are ISINs.
pub struct JustEtfProvider {
    base_url: String,
    client: reqwest::Client,
}

impl JustEtfProvider {
    pub fn new(base_url: &str, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder().user_agent(user_agent).build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JustEtfQuoteResponse {
    latest_quote: JustEtfQuote,
    latest_quote_date: String,
}

#[derive(Debug, Deserialize)]
struct JustEtfQuote {
    raw: f64,
}

#[async_trait]
impl QuoteProvider for JustEtfProvider {
    #[instrument(
        name = "JustEtfQuoteFetch",
        skip(self, request),
        fields(symbol = %request.symbol, currency = %request.currency)
    )]
    async fn fetch_quote(&self, request: &QuoteRequest) -> Result<QuoteResult> {
        let url = format!(
            "{}/api/etfs/{symbol}/quote?locale=en&currency={}&isin={symbol}",
            self.base_url,
            request.currency,
            symbol = request.symbol
        );
        debug!("Requesting quote from {}", url);

        let response = with_backoff(3, linear_backoff(Duration::from_millis(500)), |_| {
            self.client
                .get(&url)
                .header(reqwest::header::ACCEPT, "application/json")
                .send()
        })
        .await
        .with_context(|| format!("Request failed for symbol: {}", request.symbol))?;

        if !response.status().is_success() {
            return Err(anyhow!(
                "HTTP error: {} for symbol: {}",
                response.status(),
                request.symbol
            ));
        }

        let text = response.text().await?;
        let data: JustEtfQuoteResponse = serde_json::from_str(&text).with_context(|| {
            format!("Failed to parse justETF response for {}", request.symbol)
        })?;

        let price = Decimal::from_f64(data.latest_quote.raw)
            .ok_or_else(|| anyhow!("Invalid quote {} for {}", data.latest_quote.raw, request.symbol))?;
        let as_of = NaiveDate::parse_from_str(&data.latest_quote_date, "%Y-%m-%d")
            .with_context(|| format!("Failed to parse date: {}", data.latest_quote_date))?;

        Ok(QuoteResult::new(price, as_of))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::InstrumentKind;
    use std::str::FromStr;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ISIN: &str = "IE00BK5BQT80";

    fn request() -> QuoteRequest {
        QuoteRequest {
            symbol: ISIN.to_string(),
            currency: "EUR".to_string(),
            kind: InstrumentKind::Etf,
        }
    }

    async fn create_mock_server(status: u16, body: &str) -> MockServer {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/api/etfs/{ISIN}/quote")))
            .and(query_param("locale", "en"))
            .and(query_param("currency", "EUR"))
            .and(query_param("isin", ISIN))
            .and(header("accept", "application/json"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;
        mock_server
    }

    #[tokio::test]
    async fn test_successful_quote_fetch() {
        let body = r#"{
            "latestQuote": {"raw": 118.42, "localized": "118.42"},
            "latestQuoteDate": "2024-03-07",
            "previousQuote": {"raw": 117.9, "localized": "117.90"}
        }"#;
        let mock_server = create_mock_server(200, body).await;
        let provider = JustEtfProvider::new(&mock_server.uri(), "quotetrack-test").unwrap();

        let quote = provider.fetch_quote(&request()).await.unwrap();
        assert_eq!(quote.price, Decimal::from_str("118.42").unwrap());
        assert_eq!(quote.date_string(), "2024-03-07");
    }

    #[tokio::test]
    async fn test_server_error() {
        let mock_server = create_mock_server(500, "").await;
        let provider = JustEtfProvider::new(&mock_server.uri(), "quotetrack-test").unwrap();

        let err = provider.fetch_quote(&request()).await.unwrap_err();
        assert_eq!(
            err.to_string(),
            format!("HTTP error: 500 Internal Server Error for symbol: {ISIN}")
        );
    }

    #[tokio::test]
    async fn test_malformed_response() {
        let mock_server = create_mock_server(200, r#"{"latestQuote": {}}"#).await;
        let provider = JustEtfProvider::new(&mock_server.uri(), "quotetrack-test").unwrap();

        let err = provider.fetch_quote(&request()).await.unwrap_err();
        assert!(
            err.to_string()
                .contains(&format!("Failed to parse justETF response for {ISIN}"))
        );
    }
}
