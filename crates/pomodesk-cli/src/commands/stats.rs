use chrono::{Datelike, Local, NaiveDate};
use clap::Subcommand;
use pomodesk_core::stats;
use pomodesk_core::storage::Paths;
use pomodesk_core::{Settings, StatsStore};
use serde_json::json;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's work/rest totals and the rolling workday average
    Today,
    /// Entries of one day, ordered by start time
    Day {
        /// Date (YYYY-MM-DD), today when omitted
        date: Option<NaiveDate>,
    },
    /// Work/rest per ISO week of a month
    Month {
        /// Year, current when omitted
        #[arg(long)]
        year: Option<i32>,
        /// Month (1-12), current when omitted
        #[arg(long)]
        month: Option<u32>,
    },
    /// Per-type breakdown of each selected day
    Range {
        #[arg(required = true)]
        dates: Vec<NaiveDate>,
    },
    /// Per-type totals across the selected days
    Types {
        #[arg(required = true)]
        dates: Vec<NaiveDate>,
    },
    /// Daily totals for the last N days
    Recent {
        #[arg(long, default_value_t = 7)]
        days: u32,
    },
    /// Rolling average of work minutes over the last N workdays
    Average {
        /// Workdays to average, the configured value when omitted
        #[arg(long)]
        days: Option<u32>,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let paths = Paths::resolve()?;
    let store = StatsStore::load(&paths.stats());
    let settings = Settings::load(&paths.settings());
    let today = Local::now().date_naive();

    let output = match action {
        StatsAction::Today => {
            let totals = stats::summary_totals(&store, today, settings.timer.rolling_average_days);
            json!({
                "date": today,
                "totals": totals,
                "display": totals.display(),
            })
        }
        StatsAction::Day { date } => {
            serde_json::to_value(stats::daily_series(&store, date.unwrap_or(today)))?
        }
        StatsAction::Month { year, month } => {
            let year = year.unwrap_or(today.year());
            let month = month.unwrap_or(today.month());
            if !(1..=12).contains(&month) {
                return Err(format!("invalid month: {month}").into());
            }
            serde_json::to_value(stats::weekly_rollup(&store, year, month))?
        }
        StatsAction::Range { dates } => {
            serde_json::to_value(stats::multi_day_summary(&store, &dates))?
        }
        StatsAction::Types { dates } => {
            serde_json::to_value(stats::type_breakdown(&store, &dates))?
        }
        StatsAction::Recent { days } => serde_json::to_value(stats::recent_days(&store, today, days))?,
        StatsAction::Average { days } => {
            let days = days.unwrap_or(settings.timer.rolling_average_days);
            let average = stats::rolling_workday_average(&store, today, days);
            json!({
                "workdays": days,
                "averageMinutes": average,
                "display": stats::format_hhmm(average),
            })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
