use crate::core::SymbolTrackInfo;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Reads one descriptor file.
pub fn load_symbol(path: &Path) -> Result<SymbolTrackInfo> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read symbol file: {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse symbol file: {}", path.display()))
}

/// Lists `*.json` files in `dir` and parses each one. Files come back in
/// name order, each with its own result so one bad file does not hide the
/// others.
pub fn load_symbols(dir: &Path) -> Result<Vec<(PathBuf, Result<SymbolTrackInfo>)>> {
    debug!("Reading symbols *.json files in {} ...", dir.display());
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read symbols directory: {}", dir.display()))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to list {}", dir.display()))?
            .path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();

    Ok(paths
        .into_iter()
        .map(|path| {
            let info = load_symbol(&path);
            (path, info)
        })
        .collect())
}
