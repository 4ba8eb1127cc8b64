//! Single-day aggregations and the rolling workday average.

use chrono::{Datelike, NaiveDate, Timelike, Weekday};
use serde::{Deserialize, Serialize};

use super::classify;
use crate::events::CompletedPeriod;
use crate::storage::{StatsEntry, StatsStore};
use crate::timer::Phase;

/// Upper bound on how far back the rolling average walks.
pub const ROLLING_LOOKBACK_DAYS: u32 = 90;

/// Longest window [`recent_days`] reports.
pub const MAX_RECENT_DAYS: u32 = 366;

/// Today's work/rest totals plus the rolling workday average, in minutes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryTotals {
    pub today_work_minutes: f64,
    pub today_rest_minutes: f64,
    pub rolling_average_minutes: f64,
}

impl SummaryTotals {
    /// `HH:MM/HH:MM/HH:MM`, the compact form shown under the timer.
    pub fn display(&self) -> String {
        format!(
            "{}/{}/{}",
            format_hhmm(self.today_work_minutes),
            format_hhmm(self.today_rest_minutes),
            format_hhmm(self.rolling_average_minutes)
        )
    }
}

/// Per-day totals for the recent-days overview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayTotals {
    pub date: NaiveDate,
    pub total_minutes: f64,
    pub work_minutes: f64,
    pub rest_minutes: f64,
    /// Completed work periods.
    pub work_periods: usize,
}

/// Append `period` to the day it started on. Returns that day.
///
/// A period running past midnight stays on its start day, so its
/// `timeMinutes + durationMinutes` may exceed 1440.
pub fn record(store: &mut StatsStore, period: &CompletedPeriod) -> NaiveDate {
    let day = period.started_at.date();
    let time = period.started_at.time();
    let time_minutes = f64::from(time.hour() * 60 + time.minute())
        + f64::from(time.second()) / 60.0;

    let color = period.button_color_hex.trim();
    let entry = StatsEntry {
        time_minutes,
        duration_minutes: period.duration_minutes,
        kind: period.button_name.clone(),
        color_hex: if color.is_empty() {
            classify::default_color(period.phase).to_string()
        } else {
            color.to_string()
        },
        is_rest: period.phase.is_rest(),
    };
    store.push(day, entry);
    day
}

/// The day's entries ordered by start time; equal start times keep their
/// insertion order.
pub fn daily_series(store: &StatsStore, day: NaiveDate) -> Vec<StatsEntry> {
    let mut entries = store.entries(day).to_vec();
    entries.sort_by(|a, b| a.time_minutes.total_cmp(&b.time_minutes));
    entries
}

/// Total minutes of `phase` recorded on `day`.
pub fn sum_by_phase(store: &StatsStore, day: NaiveDate, phase: Phase) -> f64 {
    store
        .entries(day)
        .iter()
        .filter(|e| classify::is_rest_entry(e) == phase.is_rest())
        .map(|e| e.duration_minutes)
        .sum()
}

pub fn is_workday(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Mean work minutes over the last `workdays` weekdays (Mon-Fri) counting
/// back from `today`, including days with nothing recorded. Gives up after
/// [`ROLLING_LOOKBACK_DAYS`] calendar days and averages over the days it
/// actually collected.
pub fn rolling_workday_average(store: &StatsStore, today: NaiveDate, workdays: u32) -> f64 {
    let mut collected = 0u32;
    let mut total = 0.0;
    let mut cursor = today;

    for _ in 0..ROLLING_LOOKBACK_DAYS {
        if collected >= workdays {
            break;
        }
        if is_workday(cursor) {
            total += sum_by_phase(store, cursor, Phase::Work);
            collected += 1;
        }
        cursor = match cursor.pred_opt() {
            Some(previous) => previous,
            None => break,
        };
    }

    if collected == 0 {
        0.0
    } else {
        total / f64::from(collected)
    }
}

pub fn summary_totals(store: &StatsStore, today: NaiveDate, workdays: u32) -> SummaryTotals {
    SummaryTotals {
        today_work_minutes: sum_by_phase(store, today, Phase::Work),
        today_rest_minutes: sum_by_phase(store, today, Phase::Rest),
        rolling_average_minutes: rolling_workday_average(store, today, workdays),
    }
}

/// Totals for the `days` days ending at `today`, oldest first. The window
/// is capped at [`MAX_RECENT_DAYS`] and stops at the earliest
/// representable date.
pub fn recent_days(store: &StatsStore, today: NaiveDate, days: u32) -> Vec<DayTotals> {
    let mut dates: Vec<NaiveDate> =
        std::iter::successors(Some(today), |date| date.pred_opt())
            .take(days.min(MAX_RECENT_DAYS) as usize)
            .collect();
    dates.reverse();

    dates
        .into_iter()
        .map(|date| {
            let entries = store.entries(date);
            let work_minutes = sum_by_phase(store, date, Phase::Work);
            let rest_minutes = sum_by_phase(store, date, Phase::Rest);
            DayTotals {
                date,
                total_minutes: work_minutes + rest_minutes,
                work_minutes,
                rest_minutes,
                work_periods: entries.iter().filter(|e| !classify::is_rest_entry(e)).count(),
            }
        })
        .collect()
}

/// Render minutes as `HH:MM` with hours allowed past 24.
pub fn format_hhmm(minutes: f64) -> String {
    let total = minutes.max(0.0).floor() as u64;
    format!("{:02}:{:02}", total / 60, total % 60)
}
