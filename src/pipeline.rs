use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{debug, info, warn};

use crate::classify::{build_detail, classify};
use crate::dates::{parse_date, resolve_effective_date};
use crate::matcher::SymbolMatcher;
use crate::models::{
    CanonicalAction, DateRole, Notice, NoticeKind, RawActionRecord, RunReport,
};
use crate::sources::{RawSource, SourceError};

#[derive(Debug, Clone, Copy, Default)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub future_only: bool,
}

impl DateWindow {
    /// `today` is the reporting-zone date, fixed for the whole run.
    pub fn contains(&self, date: NaiveDate, today: NaiveDate) -> bool {
        if self.future_only && date < today {
            return false;
        }
        if self.start.is_some_and(|start| date < start) {
            return false;
        }
        if self.end.is_some_and(|end| date > end) {
            return false;
        }
        true
    }
}

/// One canonical action per requested symbol the record matches. A record
/// without any resolvable date is a parse failure; no match is an empty vec.
pub fn normalize(
    record: &RawActionRecord,
    symbols: &[String],
    matcher: &SymbolMatcher,
) -> Result<Vec<CanonicalAction>, SourceError> {
    let effective_date = resolve_effective_date(&record.date_fields).ok_or_else(|| {
        SourceError::ParseFailure(format!(
            "{}: no usable date for '{}' ({})",
            record.source, record.source_key, record.subject_text
        ))
    })?;

    let matched = matcher.matching_symbols(symbols, &record.source_key);
    if matched.is_empty() {
        return Ok(Vec::new());
    }

    let action_type = classify(&record.subject_text);
    let detail = build_detail(action_type, &record.subject_text, record.amount_text.as_deref());
    let role_date = |role: DateRole| record.date_fields.get(&role).and_then(|raw| parse_date(raw));

    Ok(matched
        .into_iter()
        .map(|symbol| CanonicalAction {
            symbol: symbol.to_string(),
            action_type,
            effective_date,
            detail: detail.clone(),
            raw_subject: record.subject_text.clone(),
            ex_date: role_date(DateRole::ExDate),
            record_date: role_date(DateRole::RecordDate),
            source: record.source.clone(),
        })
        .collect())
}

/// Keeps the first of each (symbol, type, date, detail) tuple.
pub fn dedupe(actions: Vec<CanonicalAction>) -> Vec<CanonicalAction> {
    let mut seen = HashSet::new();
    let mut unique = Vec::with_capacity(actions.len());
    for action in actions {
        if seen.insert(action.dedupe_key()) {
            unique.push(action);
        }
    }
    unique
}

/// Dedupe, stable sort by effective date, then window filter.
pub fn finalize(
    actions: Vec<CanonicalAction>,
    window: &DateWindow,
    today: NaiveDate,
) -> Vec<CanonicalAction> {
    let mut actions = dedupe(actions);
    actions.sort_by_key(|action| action.effective_date);
    actions.retain(|action| window.contains(action.effective_date, today));
    actions
}

fn notice_for(err: &SourceError) -> Notice {
    let kind = match err {
        SourceError::SourceUnavailable(_) => NoticeKind::SourceUnavailable,
        SourceError::ParseFailure(_) => NoticeKind::ParseFailure,
    };
    Notice {
        kind,
        message: err.to_string(),
    }
}

pub struct Pipeline {
    sources: Vec<Box<dyn RawSource>>,
    matcher: SymbolMatcher,
    window: DateWindow,
}

impl Pipeline {
    pub fn new(sources: Vec<Box<dyn RawSource>>, matcher: SymbolMatcher, window: DateWindow) -> Self {
        Self {
            sources,
            matcher,
            window,
        }
    }

    /// Sources are queried one after another. Nothing in here aborts the run:
    /// failures turn into notices and the loop moves on.
    pub async fn run(&self, symbols: &[String], today: NaiveDate) -> RunReport {
        let mut report = RunReport::default();
        let mut collected = Vec::new();
        let mut productive_sources = 0usize;

        for source in &self.sources {
            info!("fetching corporate actions from {} ...", source.name());
            let batch = match source.fetch(symbols).await {
                Ok(batch) => batch,
                Err(err) => {
                    warn!("{} skipped, error({err})", source.name());
                    report.notices.push(notice_for(&err));
                    continue;
                }
            };

            for err in &batch.errors {
                warn!("{err}");
                report.notices.push(notice_for(err));
            }

            let before = collected.len();
            for record in &batch.records {
                match normalize(record, symbols, &self.matcher) {
                    Ok(actions) => collected.extend(actions),
                    Err(err) => {
                        debug!("dropping record, {err}");
                        report.notices.push(notice_for(&err));
                    }
                }
            }

            let produced = collected.len() - before;
            debug!("{} produced {produced} matched actions", source.name());
            if produced > 0 {
                productive_sources += 1;
            }
        }

        report.actions = finalize(collected, &self.window, today);

        if productive_sources == 0 {
            report.notices.push(Notice {
                kind: NoticeKind::NoData,
                message: "no corporate actions found for the requested symbols".to_string(),
            });
        }

        report
    }
}
