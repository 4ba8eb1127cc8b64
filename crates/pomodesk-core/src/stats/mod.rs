//! Statistics over the completed-period history.
//!
//! Everything here is a pure function of a [`StatsStore`](crate::storage::StatsStore)
//! except [`record`], the single write path used when the timer completes a
//! period. Work/rest classification for every aggregation goes through
//! [`classify`].

pub mod classify;
mod daily;
mod range;

pub use daily::{
    daily_series, format_hhmm, is_workday, record, recent_days, rolling_workday_average,
    sum_by_phase, summary_totals, DayTotals, SummaryTotals, ROLLING_LOOKBACK_DAYS,
};
pub use range::{
    month_days, multi_day_summary, type_breakdown, weekly_rollup, DaySummary, DayTypeSegment,
    TypeTotal, WeekTotals,
};
