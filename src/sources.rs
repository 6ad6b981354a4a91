use std::path::{Path, PathBuf};

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use crate::models::RawActionRecord;
use crate::table::{ColumnMapping, CsvTableSource};
use crate::yahoo::YahooChartSource;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("source unavailable: {0}")]
    SourceUnavailable(String),
    #[error("parse failure: {0}")]
    ParseFailure(String),
}

/// Records from one source plus the failures that were isolated while
/// producing them (one bad symbol or row does not sink the batch).
#[derive(Debug, Default)]
pub struct SourceBatch {
    pub records: Vec<RawActionRecord>,
    pub errors: Vec<SourceError>,
}

#[async_trait]
pub trait RawSource: Send + Sync {
    fn name(&self) -> &str;

    /// Err only when the whole source is unusable for this run.
    async fn fetch(&self, symbols: &[String]) -> Result<SourceBatch, SourceError>;
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceConfig {
    Yahoo {
        #[serde(default = "default_exchange_suffix")]
        suffix: String,
        #[serde(default = "default_range")]
        range: String,
    },
    Csv {
        name: String,
        path: PathBuf,
        columns: ColumnMapping,
    },
}

fn default_exchange_suffix() -> String {
    ".NS".to_string()
}

fn default_range() -> String {
    "1y".to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        SourceConfig::Yahoo {
            suffix: default_exchange_suffix(),
            range: default_range(),
        }
    }
}

pub fn load_source_configs(path: Option<&Path>) -> anyhow::Result<Vec<SourceConfig>> {
    let Some(path) = path else {
        return Ok(vec![SourceConfig::default()]);
    };

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read sources file {}", path.display()))?;
    let configs: Vec<SourceConfig> = serde_json::from_str(&contents)
        .with_context(|| format!("invalid sources file {}", path.display()))?;
    anyhow::ensure!(!configs.is_empty(), "sources file {} lists no sources", path.display());
    Ok(configs)
}

pub fn build_sources(configs: Vec<SourceConfig>) -> anyhow::Result<Vec<Box<dyn RawSource>>> {
    let mut sources: Vec<Box<dyn RawSource>> = Vec::with_capacity(configs.len());
    for config in configs {
        match config {
            SourceConfig::Yahoo { suffix, range } => {
                sources.push(Box::new(YahooChartSource::new(suffix, range)?));
            }
            SourceConfig::Csv {
                name,
                path,
                columns,
            } => sources.push(Box::new(CsvTableSource::new(name, path, columns))),
        }
    }
    Ok(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_tagged_source_configs() {
        let json = r#"[
            {"kind": "yahoo"},
            {"kind": "yahoo", "suffix": ".BO", "range": "5y"},
            {
                "kind": "csv",
                "name": "portal",
                "path": "actions.csv",
                "columns": {"source_key": "Company", "subject": "Purpose", "ex_date": "Ex-Date"}
            }
        ]"#;
        let configs: Vec<SourceConfig> = serde_json::from_str(json).unwrap();
        assert_eq!(configs[0], SourceConfig::default());
        assert_eq!(
            configs[1],
            SourceConfig::Yahoo {
                suffix: ".BO".to_string(),
                range: "5y".to_string()
            }
        );
        match &configs[2] {
            SourceConfig::Csv { name, columns, .. } => {
                assert_eq!(name, "portal");
                assert_eq!(columns.source_key, "Company");
                assert_eq!(columns.ex_date.as_deref(), Some("Ex-Date"));
                assert_eq!(columns.record_date, None);
            }
            other => panic!("unexpected config {other:?}"),
        }
    }

    #[test]
    fn missing_sources_file_falls_back_to_yahoo() {
        let configs = load_source_configs(None).unwrap();
        assert_eq!(configs, vec![SourceConfig::default()]);
    }

    #[test]
    fn empty_sources_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sources.json");
        std::fs::write(&path, "[]").unwrap();
        assert!(load_source_configs(Some(&path)).is_err());
    }
}
