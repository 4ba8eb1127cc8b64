use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::timer::{Phase, TimerState};

/// A countdown that ran to zero. Converted into a stats entry by
/// [`crate::stats::record`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletedPeriod {
    /// Local wall-clock start of the period.
    pub started_at: NaiveDateTime,
    /// Configured length of the phase, independent of pauses.
    pub duration_minutes: f64,
    pub phase: Phase,
    pub button_name: String,
    pub button_color_hex: String,
}

/// Every state change in the system produces an Event.
/// Front ends log or render them; the session reacts to completions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        phase: Phase,
        button_id: String,
        duration_secs: u32,
        at: NaiveDateTime,
    },
    TimerResumed {
        remaining_secs: u32,
        at: NaiveDateTime,
    },
    TimerPaused {
        remaining_secs: u32,
        at: NaiveDateTime,
    },
    TimerStopped {
        at: NaiveDateTime,
    },
    ButtonActivated {
        button_id: String,
        phase: Phase,
        at: NaiveDateTime,
    },
    PeriodCompleted {
        period: CompletedPeriod,
        /// A fresh start has been scheduled for the same button.
        auto_continue: bool,
        at: NaiveDateTime,
    },
    PresetSelected {
        name: String,
        work_minutes: u32,
        rest_minutes: u32,
    },
    DayRolledOver {
        previous: NaiveDate,
        current: NaiveDate,
    },
    StateSnapshot {
        state: TimerState,
        phase: Phase,
        button_id: String,
        button_name: String,
        preset_name: String,
        remaining_secs: u32,
        total_secs: u32,
        at: NaiveDateTime,
    },
}
