use std::path::PathBuf;

use async_trait::async_trait;
use csv::StringRecord;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::models::{DateRole, RawActionRecord};
use crate::sources::{RawSource, SourceBatch, SourceError};

/// Which header of a portal table plays which raw-record role.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ColumnMapping {
    pub source_key: String,
    pub subject: String,
    #[serde(default)]
    pub ex_date: Option<String>,
    #[serde(default)]
    pub record_date: Option<String>,
    #[serde(default)]
    pub announcement_date: Option<String>,
    #[serde(default)]
    pub effective_date: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
}

impl ColumnMapping {
    fn date_columns(&self) -> impl Iterator<Item = (DateRole, &str)> {
        [
            (DateRole::ExDate, self.ex_date.as_deref()),
            (DateRole::RecordDate, self.record_date.as_deref()),
            (DateRole::AnnouncementDate, self.announcement_date.as_deref()),
            (DateRole::EffectiveDate, self.effective_date.as_deref()),
        ]
        .into_iter()
        .filter_map(|(role, column)| column.map(|column| (role, column)))
    }
}

#[derive(Debug)]
struct ResolvedColumns {
    source_key: usize,
    subject: usize,
    dates: Vec<(DateRole, usize)>,
    amount: Option<usize>,
}

/// Portal table exported to CSV. Matching against the request list happens
/// downstream, so every row is handed over.
pub struct CsvTableSource {
    name: String,
    path: PathBuf,
    columns: ColumnMapping,
}

impl CsvTableSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>, columns: ColumnMapping) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            columns,
        }
    }

    fn resolve(&self, headers: &StringRecord) -> Result<ResolvedColumns, SourceError> {
        let position = |column: &str| {
            headers
                .iter()
                .position(|header| header.trim().eq_ignore_ascii_case(column.trim()))
                .ok_or_else(|| {
                    SourceError::ParseFailure(format!(
                        "{}: column '{column}' not found in {}",
                        self.name,
                        self.path.display()
                    ))
                })
        };

        let mut dates = Vec::new();
        for (role, column) in self.columns.date_columns() {
            dates.push((role, position(column)?));
        }

        Ok(ResolvedColumns {
            source_key: position(&self.columns.source_key)?,
            subject: position(&self.columns.subject)?,
            dates,
            amount: self.columns.amount.as_deref().map(position).transpose()?,
        })
    }

    fn to_record(&self, row: &StringRecord, columns: &ResolvedColumns) -> Option<RawActionRecord> {
        let cell = |index: usize| row.get(index).map(str::trim).filter(|value| !value.is_empty());

        let mut record = RawActionRecord::new(
            self.name.as_str(),
            cell(columns.source_key)?,
            cell(columns.subject).unwrap_or_default(),
        );
        for (role, index) in &columns.dates {
            if let Some(value) = cell(*index) {
                record = record.with_date(*role, value);
            }
        }
        if let Some(amount) = columns.amount.and_then(cell) {
            record = record.with_amount(amount);
        }
        Some(record)
    }
}

#[async_trait]
impl RawSource for CsvTableSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, _symbols: &[String]) -> Result<SourceBatch, SourceError> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_path(&self.path)
            .map_err(|err| {
                SourceError::SourceUnavailable(format!(
                    "{}: failed to open {}, error({err})",
                    self.name,
                    self.path.display()
                ))
            })?;

        let headers = reader
            .headers()
            .map_err(|err| SourceError::ParseFailure(format!("{}: bad header row, error({err})", self.name)))?
            .clone();
        let columns = self.resolve(&headers)?;
        trace!("resolved columns for {}: {columns:?}", self.name);

        let mut batch = SourceBatch::default();
        for (index, result) in reader.records().enumerate() {
            // header is line 1
            let line = index + 2;
            match result {
                Ok(row) => match self.to_record(&row, &columns) {
                    Some(record) => batch.records.push(record),
                    None => batch.errors.push(SourceError::ParseFailure(format!(
                        "{}: line {line} has no company or symbol",
                        self.name
                    ))),
                },
                Err(err) => batch.errors.push(SourceError::ParseFailure(format!(
                    "{}: line {line} unreadable, error({err})",
                    self.name
                ))),
            }
        }

        debug!(
            "read {} rows from {} ({} rejected)",
            batch.records.len(),
            self.path.display(),
            batch.errors.len()
        );
        Ok(batch)
    }
}
