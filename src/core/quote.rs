//! Quote abstractions and core types

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;

/// What kind of listing a symbol refers to. Selects the page template on
/// sources that publish ETFs and mutual funds under different paths.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstrumentKind {
    #[default]
    Etf,
    Fund,
}

impl Display for InstrumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                InstrumentKind::Etf => "etf",
                InstrumentKind::Fund => "fund",
            }
        )
    }
}

impl FromStr for InstrumentKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "etf" => Ok(InstrumentKind::Etf),
            "fund" => Ok(InstrumentKind::Fund),
            _ => Err(anyhow::anyhow!("Invalid instrument kind: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentRef {
    pub symbol: String,
    pub kind: InstrumentKind,
}

impl InstrumentRef {
    pub fn new(symbol: impl Into<String>, kind: InstrumentKind) -> Self {
        Self {
            symbol: symbol.into(),
            kind,
        }
    }
}

/// A price and the trading day it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteResult {
    pub price: Decimal,
    pub as_of: NaiveDate,
}

impl QuoteResult {
    pub fn new(price: Decimal, as_of: NaiveDate) -> Self {
        Self { price, as_of }
    }

    /// The date as written to disk, `YYYY-MM-DD`.
    pub fn date_string(&self) -> String {
        self.as_of.format("%Y-%m-%d").to_string()
    }
}

#[derive(Debug, Clone)]
pub struct QuoteRequest {
    pub symbol: String,
    pub currency: String,
    pub kind: InstrumentKind,
}

impl QuoteRequest {
    pub fn instrument(&self) -> InstrumentRef {
        InstrumentRef::new(self.symbol.clone(), self.kind)
    }
}

#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn fetch_quote(&self, request: &QuoteRequest) -> Result<QuoteResult>;
}
