//! Symptom & mood journal: request normalization, storage seam, and the
//! per-user mood/symptom report.
//!
//! Entries are created and deleted, never edited. Storage lives behind
//! [`JournalStore`] so the Supabase backend can be swapped for a fake in
//! tests.

use std::collections::HashMap;
use std::fmt;

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::db::DatabaseError;

/// Days covered by a report when no range is given.
pub const DEFAULT_REPORT_DAYS: i64 = 30;

/// Symptoms listed in a report.
const TOP_SYMPTOMS: usize = 3;

#[derive(Error, Debug, PartialEq)]
pub enum JournalError {
    #[error("Missing required fields.")]
    MissingFields,
    #[error("Invalid date: {0}")]
    InvalidDate(String),
    #[error("Invalid range: {from} is after {to}")]
    InvalidRange { from: NaiveDate, to: NaiveDate },
}

// ═══════════════════════════════════════════
// Types
// ═══════════════════════════════════════════

/// Raw `add` body. Field shapes are loose: lists may arrive as arrays,
/// JSON strings, or delimited text.
#[derive(Debug, Default, Deserialize)]
pub struct JournalEntryRequest {
    pub user_id: Option<Value>,
    pub date: Option<Value>,
    pub mood: Option<Value>,
    pub symptoms: Option<Value>,
    pub medications: Option<Value>,
    pub notes: Option<Value>,
}

/// Normalized row ready for insertion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewJournalEntry {
    pub user_id: String,
    pub date: String,
    pub mood: String,
    pub symptoms: Vec<String>,
    pub medications: Vec<String>,
    pub notes: Option<String>,
}

/// Row identifier: integer or UUID depending on the table definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryId {
    Int(i64),
    Text(String),
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryId::Int(n) => write!(f, "{n}"),
            EntryId::Text(s) => f.write_str(s),
        }
    }
}

/// Stored journal row. Columns the row type does not name are kept in
/// `extra` and written back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: EntryId,
    #[serde(default, deserialize_with = "lenient_text")]
    pub user_id: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient_text")]
    pub mood: String,
    #[serde(default, deserialize_with = "lenient_list")]
    pub symptoms: Vec<String>,
    #[serde(default, deserialize_with = "lenient_list")]
    pub medications: Vec<String>,
    #[serde(default, deserialize_with = "lenient_optional_text")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, Value>,
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(&Value::deserialize(deserializer)?).unwrap_or_default())
}

fn lenient_optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(&Value::deserialize(deserializer)?))
}

/// Null or a non-list loads as empty; list items are kept as text.
fn lenient_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items.iter().filter_map(scalar_text).collect(),
        _ => Vec::new(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mood {
    Terrible,
    Bad,
    Okay,
    Good,
    Great,
}

impl Mood {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "terrible" => Some(Mood::Terrible),
            "bad" => Some(Mood::Bad),
            "okay" => Some(Mood::Okay),
            "good" => Some(Mood::Good),
            "great" => Some(Mood::Great),
            _ => None,
        }
    }

    pub fn score(self) -> u8 {
        match self {
            Mood::Terrible => 1,
            Mood::Bad => 2,
            Mood::Okay => 3,
            Mood::Good => 4,
            Mood::Great => 5,
        }
    }
}

/// Unknown moods score 0.
pub fn mood_score(raw: &str) -> u8 {
    Mood::parse(raw).map(Mood::score).unwrap_or(0)
}

// ═══════════════════════════════════════════
// Normalization
// ═══════════════════════════════════════════

fn value_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(true) => Some("true".into()),
        _ => None,
    }
}

fn stringify_items(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect()
}

/// Coerce a loosely shaped list field into strings. Arrays are kept; a
/// string holding a JSON array is parsed; other strings are split on
/// `separator` with blank pieces dropped; anything else is empty.
pub fn normalize_list(value: Option<&Value>, separator: char) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => stringify_items(items),
        Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw) {
            Ok(Value::Array(items)) => stringify_items(&items),
            _ => raw
                .split(separator)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        },
        _ => Vec::new(),
    }
}

impl JournalEntryRequest {
    /// Validate required fields and normalize the list fields.
    pub fn normalize(&self) -> Result<NewJournalEntry, JournalError> {
        let user_id = value_text(self.user_id.as_ref());
        let date = value_text(self.date.as_ref());
        let mood = value_text(self.mood.as_ref());
        let (Some(user_id), Some(date), Some(mood)) = (user_id, date, mood) else {
            return Err(JournalError::MissingFields);
        };

        let notes = match &self.notes {
            Some(Value::String(s)) => Some(s.clone()),
            Some(Value::Null) | None => None,
            Some(other) => Some(other.to_string()),
        };

        Ok(NewJournalEntry {
            user_id,
            date,
            mood,
            symptoms: normalize_list(self.symptoms.as_ref(), ','),
            medications: normalize_list(self.medications.as_ref(), '\n'),
            notes,
        })
    }
}

// ═══════════════════════════════════════════
// Storage seam
// ═══════════════════════════════════════════

/// Journal persistence (allows mocking).
#[async_trait]
pub trait JournalStore: Send + Sync {
    /// Insert and return the stored row.
    async fn insert(&self, entry: &NewJournalEntry) -> Result<JournalEntry, DatabaseError>;

    /// Rows for one user, newest `date` first.
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<JournalEntry>, DatabaseError>;

    async fn delete(&self, id: &str) -> Result<(), DatabaseError>;
}

// ═══════════════════════════════════════════
// Report
// ═══════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

fn parse_day(raw: &str) -> Result<NaiveDate, JournalError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| JournalError::InvalidDate(raw.to_string()))
}

impl DateRange {
    /// Inclusive range from optional `YYYY-MM-DD` bounds. Defaults to the
    /// last [`DEFAULT_REPORT_DAYS`] days ending `today`.
    pub fn resolve(
        from: Option<&str>,
        to: Option<&str>,
        today: NaiveDate,
    ) -> Result<Self, JournalError> {
        let to = match to.filter(|s| !s.trim().is_empty()) {
            Some(raw) => parse_day(raw)?,
            None => today,
        };
        let from = match from.filter(|s| !s.trim().is_empty()) {
            Some(raw) => parse_day(raw)?,
            None => to - Duration::days(DEFAULT_REPORT_DAYS - 1),
        };
        if from > to {
            return Err(JournalError::InvalidRange { from, to });
        }
        Ok(Self { from, to })
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        day >= self.from && day <= self.to
    }
}

/// Calendar day of an entry: the `YYYY-MM-DD` prefix of its `date`.
pub fn entry_day(date: &str) -> Option<NaiveDate> {
    date.get(..10)
        .and_then(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymptomCount {
    pub symptom: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MoodPoint {
    pub date: String,
    pub mood: String,
    pub score: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JournalReport {
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub total_entries: usize,
    pub avg_mood: f64,
    pub top_symptoms: Vec<SymptomCount>,
    pub mood_series: Vec<MoodPoint>,
}

/// Summarize the entries whose day falls inside `range`.
pub fn build_report(entries: &[JournalEntry], range: DateRange) -> JournalReport {
    let mut in_range: Vec<(NaiveDate, &JournalEntry)> = entries
        .iter()
        .filter_map(|e| entry_day(&e.date).map(|day| (day, e)))
        .filter(|(day, _)| range.contains(*day))
        .collect();
    in_range.sort_by(|a, b| a.1.date.cmp(&b.1.date));

    let total = in_range.len();
    let avg_mood = if total == 0 {
        0.0
    } else {
        let sum: u32 = in_range.iter().map(|(_, e)| u32::from(mood_score(&e.mood))).sum();
        (f64::from(sum) / total as f64 * 100.0).round() / 100.0
    };

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for (_, entry) in &in_range {
        for symptom in &entry.symptoms {
            let symptom = symptom.trim();
            if !symptom.is_empty() {
                *counts.entry(symptom).or_default() += 1;
            }
        }
    }
    let mut top: Vec<SymptomCount> = counts
        .into_iter()
        .map(|(symptom, count)| SymptomCount {
            symptom: symptom.to_string(),
            count,
        })
        .collect();
    top.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.symptom.cmp(&b.symptom)));
    top.truncate(TOP_SYMPTOMS);

    let mood_series = in_range
        .iter()
        .map(|(_, e)| MoodPoint {
            date: e.date.clone(),
            mood: e.mood.clone(),
            score: mood_score(&e.mood),
        })
        .collect();

    JournalReport {
        from: range.from,
        to: range.to,
        total_entries: total,
        avg_mood,
        top_symptoms: top,
        mood_series,
    }
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════
