//! Completed-period history, persisted as `stats.json`.
//!
//! The file is an object keyed by local `YYYY-MM-DD` day-keys, each holding
//! the entries that *started* on that day.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::lenient;
use crate::error::Result;
use crate::stats::classify;
use crate::timer::Phase;

pub const MINUTES_PER_DAY: f64 = 1440.0;
const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// Canonical day-key for a local calendar date.
pub fn day_key(date: NaiveDate) -> String {
    date.format(DAY_KEY_FORMAT).to_string()
}

pub fn parse_day_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key.trim(), DAY_KEY_FORMAT).ok()
}

/// One completed period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawEntry")]
pub struct StatsEntry {
    /// Start of the period in minutes since local midnight.
    pub time_minutes: f64,
    pub duration_minutes: f64,
    /// Free-form label, normally the timer button name.
    #[serde(rename = "type")]
    pub kind: String,
    pub color_hex: String,
    pub is_rest: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEntry {
    #[serde(default, alias = "TimeMinutes")]
    time_minutes: Value,
    #[serde(default, alias = "DurationMinutes")]
    duration_minutes: Value,
    #[serde(default, rename = "type", alias = "Type")]
    kind: Value,
    #[serde(default, alias = "ColorHex")]
    color_hex: Value,
    #[serde(default, alias = "IsRest")]
    is_rest: Value,
}

impl From<RawEntry> for StatsEntry {
    fn from(raw: RawEntry) -> Self {
        let mut entry = Self {
            time_minutes: lenient::float(&raw.time_minutes).unwrap_or(0.0),
            duration_minutes: lenient::float(&raw.duration_minutes).unwrap_or(0.0),
            kind: lenient::string(&raw.kind).unwrap_or_default(),
            color_hex: lenient::string(&raw.color_hex).unwrap_or_default(),
            is_rest: lenient::boolean(&raw.is_rest).unwrap_or(false),
        };
        entry.normalize();
        entry
    }
}

impl StatsEntry {
    pub fn phase(&self) -> Phase {
        Phase::from_rest_flag(classify::is_rest_entry(self))
    }

    /// End of the period for display, clamped to midnight.
    pub fn display_end_minutes(&self) -> f64 {
        (self.time_minutes + self.duration_minutes).min(MINUTES_PER_DAY)
    }

    /// Fold the legacy label rule into the flag and fill a missing color.
    pub(crate) fn normalize(&mut self) {
        self.is_rest = classify::is_rest_entry(self);
        if self.color_hex.trim().is_empty() {
            self.color_hex = classify::default_color(self.phase()).to_string();
        }
        if !(0.0..MINUTES_PER_DAY).contains(&self.time_minutes) {
            self.time_minutes = self.time_minutes.clamp(0.0, MINUTES_PER_DAY - 1.0 / 60.0);
        }
        if self.duration_minutes < 0.0 {
            self.duration_minutes = 0.0;
        }
    }
}

/// Day-key → entries. Owned by one process; written as a whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatsStore {
    days: BTreeMap<String, Vec<StatsEntry>>,
}

impl StatsStore {
    /// Load from `path`, never failing. Legacy entries are normalized on the
    /// way in; unreadable days or entries are dropped individually.
    pub fn load(path: &Path) -> Self {
        let raw: BTreeMap<String, Value> = super::load_or_default(path, "stats");
        let days = raw
            .into_iter()
            .filter_map(|(key, value)| {
                let date = match parse_day_key(&key) {
                    Some(date) => date,
                    None => {
                        tracing::warn!(key = %key, "skipping stats day with malformed key");
                        return None;
                    }
                };
                let items = match value {
                    Value::Array(items) => items,
                    Value::Null => Vec::new(),
                    _ => {
                        tracing::warn!(key = %key, "skipping stats day that is not a list");
                        return None;
                    }
                };
                Some((day_key(date), lenient::records(items, "stats entry")))
            })
            .collect();
        Self { days }
    }

    pub fn save(&self, path: &Path) {
        super::save_best_effort(path, self, "stats");
    }

    pub fn try_save(&self, path: &Path) -> Result<()> {
        super::write_json(path, self)
    }

    /// Entries for `date` in insertion order; empty when the day has no
    /// record.
    pub fn entries(&self, date: NaiveDate) -> &[StatsEntry] {
        self.days
            .get(&day_key(date))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Entries for `date`, creating the day record if needed.
    pub fn day_mut(&mut self, date: NaiveDate) -> &mut Vec<StatsEntry> {
        self.days.entry(day_key(date)).or_default()
    }

    pub fn contains_day(&self, date: NaiveDate) -> bool {
        self.days.contains_key(&day_key(date))
    }

    pub fn push(&mut self, date: NaiveDate, entry: StatsEntry) {
        self.day_mut(date).push(entry);
    }

    /// Every stored day in ascending order.
    pub fn days(&self) -> impl Iterator<Item = (NaiveDate, &[StatsEntry])> {
        self.days
            .iter()
            .filter_map(|(key, entries)| parse_day_key(key).map(|d| (d, entries.as_slice())))
    }

    pub fn is_empty(&self) -> bool {
        self.days.values().all(Vec::is_empty)
    }
}
