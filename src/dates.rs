use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};

use crate::models::DateRole;

/// Effective-date priority: ex-date first, announcement date as last resort.
pub const DATE_PRIORITY: [DateRole; 4] = [
    DateRole::ExDate,
    DateRole::EffectiveDate,
    DateRole::RecordDate,
    DateRole::AnnouncementDate,
];

// Indian Standard Time, UTC+05:30, no daylight saving.
const IST_OFFSET_SECS: i64 = 5 * 3600 + 30 * 60;

// Epoch values above this are taken as milliseconds.
const MILLIS_THRESHOLD: i64 = 100_000_000_000;

/// Calendar date of an instant in the reporting zone (IST). None when the
/// shift leaves chrono's representable range.
pub fn reporting_date(instant: DateTime<Utc>) -> Option<NaiveDate> {
    instant
        .checked_add_signed(Duration::seconds(IST_OFFSET_SECS))
        .map(|shifted| shifted.date_naive())
}

/// Computed once per run and handed to the filters.
pub fn reporting_today(now: DateTime<Utc>) -> NaiveDate {
    reporting_date(now).unwrap_or_else(|| now.date_naive())
}

pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    if let Some(date) = parse_timestamp(value) {
        return Some(date);
    }

    for format in ["%Y-%m-%d", "%d-%m-%Y", "%d-%b-%Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(date);
        }
    }

    DateTime::parse_from_rfc3339(value)
        .ok()
        .and_then(|datetime| reporting_date(datetime.with_timezone(&Utc)))
}

fn parse_timestamp(value: &str) -> Option<NaiveDate> {
    if !value.bytes().all(|byte| byte.is_ascii_digit() || byte == b'.') {
        return None;
    }

    let number: f64 = value.parse().ok()?;
    if !number.is_finite() {
        return None;
    }

    let mut seconds = number.trunc() as i64;
    if seconds > MILLIS_THRESHOLD {
        seconds /= 1000;
    }

    DateTime::from_timestamp(seconds, 0).and_then(reporting_date)
}

/// First present and parseable date in [`DATE_PRIORITY`] order.
pub fn resolve_effective_date(date_fields: &BTreeMap<DateRole, String>) -> Option<NaiveDate> {
    DATE_PRIORITY
        .iter()
        .filter_map(|role| date_fields.get(role))
        .find_map(|raw| parse_date(raw))
}
