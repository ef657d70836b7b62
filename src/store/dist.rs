use crate::core::{QuoteResult, SymbolTrackInfo};
use anyhow::{Context, Result, anyhow};
use rust_decimal::prelude::ToPrimitive;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Publishes quotes as `<root>/<id>/{price,currency,date,info.json}`.
pub struct DistWriter {
    root: PathBuf,
}

impl DistWriter {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Writes every file for one symbol and returns its directory.
    pub fn write(&self, info: &SymbolTrackInfo, quote: &QuoteResult) -> Result<PathBuf> {
        let dir = self.root.join(&info.id);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;

        let date = quote.date_string();
        write_file(&dir.join("price"), &quote.price.to_string())?;
        write_file(&dir.join("currency"), &info.currency)?;
        write_file(&dir.join("date"), &date)?;

        let record = info_record(info, quote)?;
        let json = serde_json::to_string_pretty(&record)?;
        write_file(&dir.join("info.json"), &json)?;

        debug!("Wrote quote files to {}", dir.display());
        Ok(dir)
    }
}

/// The descriptor as read, plus `price` and `price_date`.
fn info_record(info: &SymbolTrackInfo, quote: &QuoteResult) -> Result<Value> {
    let mut record = serde_json::to_value(info)?;
    let price = quote
        .price
        .to_f64()
        .ok_or_else(|| anyhow!("Price {} does not fit a JSON number", quote.price))?;
    let object = record
        .as_object_mut()
        .ok_or_else(|| anyhow!("Symbol {} did not serialize to an object", info.id))?;
    object.insert("price".to_string(), Value::from(price));
    object.insert("price_date".to_string(), Value::from(quote.date_string()));
    Ok(record)
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))
}
