//! Command implementations and terminal output.

pub mod scrape;
pub mod setup;
pub mod ui;
pub mod update;
