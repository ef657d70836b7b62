use super::renderer::RendererError;
use rust_decimal::Decimal;
use thiserror::Error;

/// Why a single extraction attempt failed.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("price element not found after probing {probed} selector(s)")]
    PriceElementNotFound { probed: usize },
    #[error("price element has no text")]
    EmptyPriceText,
    #[error("cannot read a number from {raw:?}")]
    UnparseableQuote { raw: String },
    #[error("price {value} outside of (0, {ceiling}]")]
    InvalidPriceRange { value: Decimal, ceiling: Decimal },
    #[error(transparent)]
    Renderer(#[from] RendererError),
}

/// Every attempt for a symbol failed; carries the cause of the last one.
#[derive(Debug, Error)]
#[error("failed to extract price for {symbol} after {attempts} attempt(s): {source}")]
pub struct ExtractionFailed {
    pub symbol: String,
    pub attempts: usize,
    #[source]
    pub source: ExtractError,
}
