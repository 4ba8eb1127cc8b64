mod day;
mod engine;
mod phase;

pub use day::DayTracker;
pub use engine::{TimerEngine, TimerState, AUTO_CONTINUE_DELAY_SECS};
pub use phase::Phase;
