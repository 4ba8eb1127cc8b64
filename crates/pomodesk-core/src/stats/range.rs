//! Aggregations across several days: calendar selections, per-type
//! breakdowns and the monthly week rollup.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::classify;
use crate::storage::{StatsEntry, StatsStore};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayTypeSegment {
    #[serde(rename = "type")]
    pub kind: String,
    pub minutes: f64,
    pub color_hex: String,
}

/// One selected day in the multi-day chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
    pub date: NaiveDate,
    pub total_minutes: f64,
    pub segments: Vec<DayTypeSegment>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeTotal {
    #[serde(rename = "type")]
    pub kind: String,
    pub minutes: f64,
    pub color_hex: String,
    pub is_rest: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekTotals {
    pub iso_year: i32,
    pub week: u32,
    pub work_minutes: f64,
    pub rest_minutes: f64,
}

/// Per-type accumulator keeping the first-seen color.
#[derive(Default)]
struct TypeAccumulator {
    order: Vec<String>,
    totals: HashMap<String, TypeTotal>,
}

impl TypeAccumulator {
    fn add(&mut self, entry: &StatsEntry) {
        let label = classify::type_label(entry);
        match self.totals.get_mut(&label) {
            Some(total) => total.minutes += entry.duration_minutes,
            None => {
                self.order.push(label.clone());
                self.totals.insert(
                    label.clone(),
                    TypeTotal {
                        kind: label,
                        minutes: entry.duration_minutes,
                        color_hex: classify::resolve_color(entry).to_string(),
                        is_rest: classify::is_rest_entry(entry),
                    },
                );
            }
        }
    }

    fn into_totals(mut self) -> Vec<TypeTotal> {
        self.order
            .iter()
            .filter_map(|label| self.totals.remove(label))
            .collect()
    }
}

/// Summaries for each selected date, deduplicated and in ascending order.
/// Dates with no record yield an empty summary. Segments are ordered by
/// type label.
pub fn multi_day_summary(store: &StatsStore, dates: &[NaiveDate]) -> Vec<DaySummary> {
    let unique: BTreeSet<NaiveDate> = dates.iter().copied().collect();
    unique
        .into_iter()
        .map(|date| {
            let mut acc = TypeAccumulator::default();
            for entry in store.entries(date) {
                acc.add(entry);
            }
            let mut segments: Vec<DayTypeSegment> = acc
                .into_totals()
                .into_iter()
                .map(|t| DayTypeSegment {
                    kind: t.kind,
                    minutes: t.minutes,
                    color_hex: t.color_hex,
                })
                .collect();
            segments.sort_by(|a, b| a.kind.cmp(&b.kind));
            DaySummary {
                date,
                total_minutes: segments.iter().map(|s| s.minutes).sum(),
                segments,
            }
        })
        .collect()
}

/// Per-type totals merged across `dates`, largest first.
pub fn type_breakdown(store: &StatsStore, dates: &[NaiveDate]) -> Vec<TypeTotal> {
    let unique: BTreeSet<NaiveDate> = dates.iter().copied().collect();
    let mut acc = TypeAccumulator::default();
    for date in unique {
        for entry in store.entries(date) {
            acc.add(entry);
        }
    }
    let mut totals = acc.into_totals();
    totals.sort_by(|a, b| b.minutes.total_cmp(&a.minutes).then_with(|| a.kind.cmp(&b.kind)));
    totals
}

/// Every day of `month` in `year`; empty for an invalid month.
pub fn month_days(year: i32, month: u32) -> Vec<NaiveDate> {
    let Some(first) = NaiveDate::from_ymd_opt(year, month, 1) else {
        return Vec::new();
    };
    first
        .iter_days()
        .take_while(|d| d.month() == month)
        .collect()
}

/// Work and rest sums per ISO week for the month's days that have entries.
/// A month without data yields no weeks.
pub fn weekly_rollup(store: &StatsStore, year: i32, month: u32) -> Vec<WeekTotals> {
    let mut weeks: BTreeMap<(i32, u32), (f64, f64)> = BTreeMap::new();
    for date in month_days(year, month) {
        let entries = store.entries(date);
        if entries.is_empty() {
            continue;
        }
        let iso = date.iso_week();
        let sums = weeks.entry((iso.year(), iso.week())).or_default();
        for entry in entries {
            if classify::is_rest_entry(entry) {
                sums.1 += entry.duration_minutes;
            } else {
                sums.0 += entry.duration_minutes;
            }
        }
    }
    weeks
        .into_iter()
        .map(|((iso_year, week), (work_minutes, rest_minutes))| WeekTotals {
            iso_year,
            week,
            work_minutes,
            rest_minutes,
        })
        .collect()
}
