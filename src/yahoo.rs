use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, trace};

use crate::models::{DateRole, RawActionRecord};
use crate::sources::{RawSource, SourceBatch, SourceError};

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const SOURCE_NAME: &str = "yahoo";

/// Dividend and split events from the Yahoo Finance chart endpoint, one
/// request per symbol with the exchange suffix appended.
pub struct YahooChartSource {
    client: reqwest::Client,
    base_url: String,
    suffix: String,
    range: String,
}

impl YahooChartSource {
    pub fn new(suffix: impl Into<String>, range: impl Into<String>) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .user_agent("Mozilla/5.0 (corporate-actions-tracker)")
            .timeout(Duration::from_secs(20))
            .build()
            .map_err(|err| SourceError::SourceUnavailable(format!("failed to build http client, error({err})")))?;

        Ok(Self {
            client,
            base_url: CHART_URL.to_string(),
            suffix: suffix.into(),
            range: range.into(),
        })
    }

    async fn fetch_symbol(&self, symbol: &str) -> Result<Vec<RawActionRecord>, SourceError> {
        let url = format!(
            "{base}/{symbol}{suffix}?range={range}&interval=1d&events=div%2Csplit",
            base = self.base_url,
            suffix = self.suffix,
            range = self.range,
        );
        trace!("requesting {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|err| {
                SourceError::SourceUnavailable(format!(
                    "failed to fetch Yahoo Finance actions for [{symbol}], error({err})"
                ))
            })?;

        let chart: ChartResponse = response.json().await.map_err(|err| {
            SourceError::ParseFailure(format!(
                "failed to parse Yahoo Finance actions for [{symbol}], error({err})"
            ))
        })?;

        chart_to_records(symbol, chart)
    }
}

#[async_trait]
impl RawSource for YahooChartSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch(&self, symbols: &[String]) -> Result<SourceBatch, SourceError> {
        let mut batch = SourceBatch::default();
        for symbol in symbols {
            match self.fetch_symbol(symbol).await {
                Ok(records) => {
                    debug!("{} Yahoo Finance events for [{symbol}]", records.len());
                    batch.records.extend(records);
                }
                Err(err) => batch.errors.push(err),
            }
        }
        Ok(batch)
    }
}

// deserialization
// ----------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ChartResponse {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: Option<String>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    #[serde(default)]
    events: Option<Events>,
}

#[derive(Debug, Default, Deserialize)]
struct Events {
    #[serde(default)]
    dividends: BTreeMap<String, DividendEvent>,
    #[serde(default)]
    splits: BTreeMap<String, SplitEvent>,
}

#[derive(Debug, Deserialize)]
struct DividendEvent {
    amount: f64,
    date: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SplitEvent {
    date: i64,
    numerator: f64,
    denominator: f64,
    split_ratio: Option<String>,
}

impl SplitEvent {
    fn ratio_text(&self) -> Option<String> {
        if self.denominator > 0.0 {
            Some(format!("{}", self.numerator / self.denominator))
        } else {
            self.split_ratio.clone()
        }
    }
}

fn chart_to_records(symbol: &str, response: ChartResponse) -> Result<Vec<RawActionRecord>, SourceError> {
    if let Some(err) = response.chart.error {
        return Err(SourceError::SourceUnavailable(format!(
            "Yahoo Finance rejected [{symbol}]: {} {}",
            err.code.unwrap_or_default(),
            err.description.unwrap_or_default()
        )));
    }

    let events = response
        .chart
        .result
        .and_then(|results| results.into_iter().next())
        .and_then(|result| result.events)
        .unwrap_or_default();

    let dividends = events.dividends.into_values().map(|event| {
        RawActionRecord::new(SOURCE_NAME, symbol, "Dividend")
            .with_date(DateRole::ExDate, event.date.to_string())
            .with_amount(format!("{}", event.amount))
    });

    let splits = events.splits.into_values().map(|event| {
        let record = RawActionRecord::new(SOURCE_NAME, symbol, "Stock Split")
            .with_date(DateRole::ExDate, event.date.to_string());
        match event.ratio_text() {
            Some(ratio) => record.with_amount(ratio),
            None => record,
        }
    });

    Ok(dividends.chain(splits).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> ChartResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn maps_dividend_and_split_events() {
        let response = parse(
            r#"{"chart": {"result": [{
                "meta": {"symbol": "TRENT.NS"},
                "events": {
                    "dividends": {"1741996800": {"amount": 5.5, "date": 1741996800}},
                    "splits": {"1750000000": {"date": 1750000000, "numerator": 5.0,
                        "denominator": 1.0, "splitRatio": "5:1"}}
                }
            }], "error": null}}"#,
        );
        let records = chart_to_records("TRENT", response).unwrap();
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].source_key, "TRENT");
        assert_eq!(records[0].subject_text, "Dividend");
        assert_eq!(records[0].amount_text.as_deref(), Some("5.5"));
        assert_eq!(
            records[0].date_fields.get(&DateRole::ExDate).map(String::as_str),
            Some("1741996800")
        );

        assert_eq!(records[1].subject_text, "Stock Split");
        assert_eq!(records[1].amount_text.as_deref(), Some("5"));
    }

    #[test]
    fn missing_events_yield_no_records() {
        let response = parse(r#"{"chart": {"result": [{"meta": {}}], "error": null}}"#);
        assert!(chart_to_records("TRENT", response).unwrap().is_empty());
    }

    #[test]
    fn chart_error_is_unavailable() {
        let response = parse(
            r#"{"chart": {"result": null, "error": {"code": "Not Found",
                "description": "No data found, symbol may be delisted"}}}"#,
        );
        let err = chart_to_records("NOPE", response).unwrap_err();
        assert!(matches!(err, SourceError::SourceUnavailable(_)));
    }
}
