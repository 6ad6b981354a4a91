use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateRole {
    ExDate,
    RecordDate,
    AnnouncementDate,
    EffectiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    Dividend,
    Bonus,
    Split,
    Rights,
    Merger,
    NameChange,
    Other,
}

impl ActionType {
    pub fn label(&self) -> &'static str {
        match self {
            ActionType::Dividend => "Dividend",
            ActionType::Bonus => "Bonus",
            ActionType::Split => "Split",
            ActionType::Rights => "Rights",
            ActionType::Merger => "Merger",
            ActionType::NameChange => "Name Change",
            ActionType::Other => "Other",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One unstructured action as handed over by a source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawActionRecord {
    pub source: String,
    pub source_key: String,
    pub subject_text: String,
    pub date_fields: BTreeMap<DateRole, String>,
    pub amount_text: Option<String>,
}

impl RawActionRecord {
    pub fn new(
        source: impl Into<String>,
        source_key: impl Into<String>,
        subject_text: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            source_key: source_key.into(),
            subject_text: subject_text.into(),
            ..Self::default()
        }
    }

    pub fn with_date(mut self, role: DateRole, value: impl Into<String>) -> Self {
        self.date_fields.insert(role, value.into());
        self
    }

    pub fn with_amount(mut self, amount: impl Into<String>) -> Self {
        self.amount_text = Some(amount.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalAction {
    pub symbol: String,
    pub action_type: ActionType,
    pub effective_date: NaiveDate,
    pub detail: String,
    pub raw_subject: String,
    pub ex_date: Option<NaiveDate>,
    pub record_date: Option<NaiveDate>,
    pub source: String,
}

impl CanonicalAction {
    /// Identity used when collapsing rows reported by overlapping sources.
    pub fn dedupe_key(&self) -> (String, ActionType, NaiveDate, String) {
        (
            self.symbol.clone(),
            self.action_type,
            self.effective_date,
            self.detail.clone(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    SourceUnavailable,
    ParseFailure,
    NoData,
}

/// A non-fatal problem surfaced to the user at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct ActionTypeSummary {
    pub action_type: ActionType,
    pub count: usize,
    pub symbol_count: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub actions: Vec<CanonicalAction>,
    pub notices: Vec<Notice>,
}
