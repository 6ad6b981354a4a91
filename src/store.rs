use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Context;

pub const DEFAULT_SYMBOLS_FILE: &str = "monthly_stocks.csv";
pub const SYMBOLS_FILE_ENV: &str = "CORP_ACTIONS_SYMBOLS_FILE";

/// Flag beats environment beats the default file name.
pub fn symbols_path(flag: Option<PathBuf>) -> PathBuf {
    resolve_symbols_path(flag, std::env::var_os(SYMBOLS_FILE_ENV))
}

fn resolve_symbols_path(flag: Option<PathBuf>, env_value: Option<OsString>) -> PathBuf {
    flag.or_else(|| env_value.filter(|value| !value.is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SYMBOLS_FILE))
}

/// Splits user text on commas into trimmed, upper-cased tickers.
pub fn parse_symbols(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|symbol| symbol.trim().to_uppercase())
        .filter(|symbol| !symbol.is_empty())
        .collect()
}

/// Reads the single row of the symbol file. A missing or empty file is an
/// empty list.
pub fn load_symbols(path: &Path) -> anyhow::Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .with_context(|| format!("failed to open symbol file {}", path.display()))?;

    let Some(row) = reader.records().next() else {
        return Ok(Vec::new());
    };
    let row = row.with_context(|| format!("failed to read symbol file {}", path.display()))?;

    Ok(row
        .iter()
        .map(|symbol| symbol.trim().to_uppercase())
        .filter(|symbol| !symbol.is_empty())
        .collect())
}

/// Overwrites the symbol file with one row.
pub fn save_symbols(path: &Path, symbols: &[String]) -> anyhow::Result<()> {
    anyhow::ensure!(!symbols.is_empty(), "enter at least one stock symbol");

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .with_context(|| format!("failed to write symbol file {}", path.display()))?;
    writer.write_record(symbols)?;
    writer.flush()?;
    Ok(())
}
