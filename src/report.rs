use std::fmt::Write;
use std::io;

use chrono::NaiveDate;

use crate::models::{ActionTypeSummary, CanonicalAction, Notice, RunReport};

pub const EXPORT_HEADER: [&str; 8] = [
    "Symbol",
    "Action Type",
    "Subject",
    "Ex-Date",
    "Record Date",
    "Detail",
    "Effective Date",
    "Source",
];

pub fn summarize_by_type(actions: &[CanonicalAction]) -> Vec<ActionTypeSummary> {
    let mut map: std::collections::BTreeMap<_, (usize, std::collections::BTreeSet<&str>)> =
        std::collections::BTreeMap::new();

    for action in actions {
        let entry = map.entry(action.action_type).or_default();
        entry.0 += 1;
        entry.1.insert(action.symbol.as_str());
    }

    let mut summaries: Vec<ActionTypeSummary> = map
        .into_iter()
        .map(|(action_type, (count, symbols))| ActionTypeSummary {
            action_type,
            count,
            symbol_count: symbols.len(),
        })
        .collect();

    summaries.sort_by(|a, b| b.count.cmp(&a.count));
    summaries
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

pub fn build_table(symbols: &[String], today: NaiveDate, report: &RunReport) -> String {
    let summaries = summarize_by_type(&report.actions);
    let mut output = String::new();

    let _ = writeln!(output, "Corporate actions for {} ({} IST)", symbols.join(", "), today);
    let _ = writeln!(output);

    if report.actions.is_empty() {
        let _ = writeln!(output, "No corporate actions found for the current portfolio.");
    } else {
        for action in report.actions.iter() {
            let _ = writeln!(
                output,
                "- {} {} {}: {}",
                action.effective_date, action.symbol, action.action_type, action.detail
            );
        }

        let _ = writeln!(output);
        let _ = writeln!(output, "By type:");
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {} across {}",
                summary.action_type,
                counted(summary.count, "action"),
                counted(summary.symbol_count, "symbol")
            );
        }
    }

    write_notices(&mut output, &report.notices);
    output
}

fn counted(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

fn write_notices(output: &mut String, notices: &[Notice]) {
    if notices.is_empty() {
        return;
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "Notices:");
    for notice in notices {
        let _ = writeln!(output, "- {}", notice.message);
    }
}

/// One row per action under [`EXPORT_HEADER`].
pub fn write_csv<W: io::Write>(writer: W, actions: &[CanonicalAction]) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(EXPORT_HEADER)?;

    for action in actions {
        writer.write_record([
            action.symbol.clone(),
            action.action_type.label().to_string(),
            action.raw_subject.clone(),
            format_date(action.ex_date),
            format_date(action.record_date),
            action.detail.clone(),
            format_date(Some(action.effective_date)),
            action.source.clone(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

pub fn to_json(report: &RunReport) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ActionType, NoticeKind};

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn sample_action(symbol: &str, action_type: ActionType, detail: &str) -> CanonicalAction {
        CanonicalAction {
            symbol: symbol.to_string(),
            action_type,
            effective_date: ymd(2025, 3, 15),
            detail: detail.to_string(),
            raw_subject: "Final Dividend, Rs 5.50".to_string(),
            ex_date: Some(ymd(2025, 3, 15)),
            record_date: None,
            source: "portal".to_string(),
        }
    }

    #[test]
    fn summaries_count_actions_and_symbols() {
        let actions = vec![
            sample_action("TRENT", ActionType::Dividend, "Amount: 5.50"),
            sample_action("BSE", ActionType::Dividend, "Amount: 2"),
            sample_action("BSE", ActionType::Dividend, "Amount: 3"),
            sample_action("BSE", ActionType::Bonus, "Ratio: 2:1"),
        ];
        let summaries = summarize_by_type(&actions);
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].action_type, ActionType::Dividend);
        assert_eq!(summaries[0].count, 3);
        assert_eq!(summaries[0].symbol_count, 2);
        assert_eq!(summaries[1].count, 1);
    }

    #[test]
    fn csv_export_uses_fixed_header_and_iso_dates() {
        let mut buffer = Vec::new();
        let mut action = sample_action("TRENT", ActionType::Dividend, "Amount: 5.50");
        action.ex_date = Some(ymd(2025, 3, 14));
        action.record_date = Some(ymd(2025, 3, 16));
        write_csv(&mut buffer, &[action]).unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("Symbol,Action Type,Subject,Ex-Date,Record Date,Detail,Effective Date,Source")
        );
        assert_eq!(
            lines.next(),
            Some("TRENT,Dividend,\"Final Dividend, Rs 5.50\",2025-03-14,2025-03-16,Amount: 5.50,2025-03-15,portal")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn table_lists_actions_and_notices() {
        let report = RunReport {
            actions: vec![sample_action("TRENT", ActionType::Dividend, "Amount: 5.50")],
            notices: vec![Notice {
                kind: NoticeKind::SourceUnavailable,
                message: "source unavailable: yahoo".to_string(),
            }],
        };
        let table = build_table(&["TRENT".to_string()], ymd(2025, 3, 1), &report);
        assert!(table.contains("- 2025-03-15 TRENT Dividend: Amount: 5.50"));
        assert!(table.contains("- Dividend: 1 action across 1 symbol"));
        assert!(table.contains("Notices:\n- source unavailable: yahoo"));
    }

    #[test]
    fn summary_lines_pluralize_counts() {
        let report = RunReport {
            actions: vec![
                sample_action("TRENT", ActionType::Dividend, "Amount: 5.50"),
                sample_action("BSE", ActionType::Dividend, "Amount: 2"),
                sample_action("BSE", ActionType::Bonus, "Ratio: 2:1"),
            ],
            notices: Vec::new(),
        };
        let table = build_table(&["TRENT".to_string(), "BSE".to_string()], ymd(2025, 3, 1), &report);
        assert!(table.contains("- Dividend: 2 actions across 2 symbols"));
        assert!(table.contains("- Bonus: 1 action across 1 symbol"));
    }

    #[test]
    fn empty_table_says_so() {
        let table = build_table(&["TRENT".to_string()], ymd(2025, 3, 1), &RunReport::default());
        assert!(table.contains("No corporate actions found"));
        assert!(!table.contains("Notices:"));
    }

    #[test]
    fn json_uses_screaming_action_types() {
        let report = RunReport {
            actions: vec![sample_action("TRENT", ActionType::NameChange, "Renamed")],
            notices: Vec::new(),
        };
        let json = to_json(&report).unwrap();
        assert!(json.contains("\"action_type\": \"NAME_CHANGE\""));
        assert!(json.contains("\"effective_date\": \"2025-03-15\""));
    }
}
