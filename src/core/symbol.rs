use super::quote::{InstrumentKind, QuoteRequest};
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Where the price of a tracked symbol comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuoteSource {
    #[serde(rename = "justetf")]
    JustEtf,
    #[serde(rename = "yahoo_finance")]
    YahooFinance,
    #[serde(rename = "issa")]
    Issa,
}

impl Display for QuoteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                QuoteSource::JustEtf => "justetf",
                QuoteSource::YahooFinance => "yahoo_finance",
                QuoteSource::Issa => "issa",
            }
        )
    }
}

/// One tracked symbol, as read from `symbols/<name>.json`.
///
/// Keys the tool does not understand are kept in `extra` and written back
/// unchanged to `info.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymbolTrackInfo {
    pub id: String,
    pub symbol: String,
    pub currency: String,
    pub source: QuoteSource,
    #[serde(rename = "type", default)]
    pub kind: InstrumentKind,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SymbolTrackInfo {
    pub fn quote_request(&self) -> QuoteRequest {
        QuoteRequest {
            symbol: self.symbol.clone(),
            currency: self.currency.clone(),
            kind: self.kind,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_info_deserialization() {
        let json = r#"{
            "id": "ta-125",
            "symbol": "1159250",
            "currency": "ILS",
            "source": "issa",
            "type": "fund",
            "display_name": "Tel Aviv 125"
        }"#;
        let info: SymbolTrackInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.id, "ta-125");
        assert_eq!(info.source, QuoteSource::Issa);
        assert_eq!(info.kind, InstrumentKind::Fund);
        assert_eq!(info.extra["display_name"], "Tel Aviv 125");

        let request = info.quote_request();
        assert_eq!(request.symbol, "1159250");
        assert_eq!(request.currency, "ILS");
    }

    #[test]
    fn test_track_info_defaults_to_etf() {
        let json = r#"{"id": "vwce", "symbol": "IE00BK5BQT80", "currency": "EUR", "source": "justetf"}"#;
        let info: SymbolTrackInfo = serde_json::from_str(json).unwrap();
        assert_eq!(info.kind, InstrumentKind::Etf);
        assert_eq!(info.source, QuoteSource::JustEtf);
        assert!(info.extra.is_empty());
    }

    #[test]
    fn test_unknown_source_is_rejected() {
        let json = r#"{"id": "x", "symbol": "X", "currency": "USD", "source": "bloomberg"}"#;
        assert!(serde_json::from_str::<SymbolTrackInfo>(json).is_err());
    }
}
