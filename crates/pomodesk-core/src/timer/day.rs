//! Local calendar-day tracking: which day is "today" for new entries, and
//! which day the history view is looking at.

use chrono::{Duration, NaiveDate};

/// Current-day pointer plus the day shown in the history view.
///
/// Checked once per minute by the scheduler; when the local date changes
/// the current day moves forward, and the viewed day follows only if it was
/// showing the old current day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayTracker {
    current: NaiveDate,
    viewed: NaiveDate,
}

impl DayTracker {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            current: today,
            viewed: today,
        }
    }

    pub fn current(&self) -> NaiveDate {
        self.current
    }

    pub fn viewed(&self) -> NaiveDate {
        self.viewed
    }

    /// Move to `today` if the date changed. Returns the previous day on a
    /// rollover.
    pub fn roll_to(&mut self, today: NaiveDate) -> Option<NaiveDate> {
        if today == self.current {
            return None;
        }
        let previous = self.current;
        if self.viewed == previous {
            self.viewed = today;
        }
        self.current = today;
        Some(previous)
    }

    /// Step the viewed day by `offset` days, never past the current day.
    /// Returns whether the viewed day changed.
    pub fn shift_viewed(&mut self, offset: i64) -> bool {
        if offset == 0 {
            return false;
        }
        let candidate = (self.viewed + Duration::days(offset)).min(self.current);
        if candidate == self.viewed {
            return false;
        }
        self.viewed = candidate;
        true
    }
}
