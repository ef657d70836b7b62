//! File based input and output: symbol descriptors in, per-symbol price files out.

pub mod dist;
pub mod symbols;

pub use dist::DistWriter;
pub use symbols::{load_symbol, load_symbols};
