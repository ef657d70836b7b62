//! Core business logic abstractions

pub mod config;
pub mod log;
pub mod quote;
pub mod retry;
pub mod symbol;

// Re-export main types for cleaner imports
pub use quote::{InstrumentKind, InstrumentRef, QuoteProvider, QuoteRequest, QuoteResult};
pub use symbol::{QuoteSource, SymbolTrackInfo};
