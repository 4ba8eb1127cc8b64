//! Timer engine implementation.
//!
//! The timer engine is a second-granular countdown state machine. It does not
//! use internal threads - the caller is responsible for calling `tick()` once
//! per second from the same thread that issues every other command.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> Paused -> Running -> (Finished) -> Idle
//!   ^                                                    |
//!   +------------------------ stop() --------------------+
//! ```
//!
//! `Finished` is never observable as a state: the completing tick returns
//! `Event::PeriodCompleted` and leaves the engine `Idle`.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(preset, button);
//! engine.start();
//! // Once per second:
//! if let Some(Event::PeriodCompleted { period, .. }) = engine.tick() { /* record */ }
//! ```

use chrono::{Duration, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::Phase;
use crate::events::{CompletedPeriod, Event};
use crate::storage::{ButtonSet, Preset, TimerButtonDefinition};

/// Delay between a completion and the automatic restart of the same button.
pub const AUTO_CONTINUE_DELAY_SECS: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
}

/// Core timer engine.
///
/// Wall-clock time only anchors `period_start`; the countdown itself advances
/// one second per `tick()`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEngine {
    state: TimerState,
    preset: Preset,
    active_button: TimerButtonDefinition,
    phase: Phase,
    time_left_secs: u32,
    /// Local wall-clock start of the current period, shifted forward on
    /// resume so that it always reflects elapsed countdown time.
    period_start: Option<NaiveDateTime>,
    auto_continue: bool,
    /// When set, the next tick at or after this instant restarts the timer.
    #[serde(default)]
    auto_start_at: Option<NaiveDateTime>,
}

impl TimerEngine {
    /// Create an idle engine for `preset` with `active_button` selected.
    pub fn new(preset: Preset, active_button: TimerButtonDefinition) -> Self {
        Self {
            state: TimerState::Idle,
            phase: active_button.phase(),
            preset,
            active_button,
            time_left_secs: 0,
            period_start: None,
            auto_continue: false,
            auto_start_at: None,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == TimerState::Running
    }

    /// A countdown is running or paused.
    pub fn has_active_period(&self) -> bool {
        self.time_left_secs > 0 || self.is_running()
    }

    pub fn time_left_secs(&self) -> u32 {
        self.time_left_secs
    }

    pub fn period_start(&self) -> Option<NaiveDateTime> {
        self.period_start
    }

    pub fn preset(&self) -> &Preset {
        &self.preset
    }

    pub fn active_button(&self) -> &TimerButtonDefinition {
        &self.active_button
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn auto_continue(&self) -> bool {
        self.auto_continue
    }

    pub fn pending_auto_start(&self) -> Option<NaiveDateTime> {
        self.auto_start_at
    }

    /// Length of a full period of the current phase, in seconds.
    pub fn total_secs(&self) -> u32 {
        self.minutes_for(self.phase) * 60
    }

    /// Build a full state snapshot event.
    pub fn snapshot(&self) -> Event {
        self.snapshot_at(now())
    }

    pub fn snapshot_at(&self, now: NaiveDateTime) -> Event {
        Event::StateSnapshot {
            state: self.state,
            phase: self.phase,
            button_id: self.active_button.id.clone(),
            button_name: self.active_button.name.clone(),
            preset_name: self.preset.name.clone(),
            remaining_secs: self.time_left_secs,
            total_secs: self.total_secs(),
            at: now,
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn start(&mut self) -> Option<Event> {
        self.start_at(now())
    }

    /// Start a fresh period, or resume a paused one. No-op while running.
    pub fn start_at(&mut self, now: NaiveDateTime) -> Option<Event> {
        if self.state == TimerState::Running {
            return None;
        }
        self.auto_start_at = None;
        self.phase = self.active_button.phase();

        if self.time_left_secs > 0 {
            // Re-anchor the start so that time spent paused (or suspended)
            // does not count towards the period.
            let elapsed = self.total_secs().saturating_sub(self.time_left_secs);
            self.period_start = Some(now - Duration::seconds(i64::from(elapsed)));
            self.state = TimerState::Running;
            tracing::debug!(remaining_secs = self.time_left_secs, "timer resumed");
            return Some(Event::TimerResumed {
                remaining_secs: self.time_left_secs,
                at: now,
            });
        }

        let total = self.total_secs();
        self.time_left_secs = total;
        self.period_start = Some(now);
        self.state = TimerState::Running;
        tracing::debug!(
            button = %self.active_button.name,
            phase = ?self.phase,
            duration_secs = total,
            "timer started"
        );
        Some(Event::TimerStarted {
            phase: self.phase,
            button_id: self.active_button.id.clone(),
            duration_secs: total,
            at: now,
        })
    }

    pub fn pause(&mut self) -> Option<Event> {
        self.pause_at(now())
    }

    /// Freeze the countdown. Only valid while running.
    pub fn pause_at(&mut self, now: NaiveDateTime) -> Option<Event> {
        if self.state != TimerState::Running {
            return None;
        }
        self.state = TimerState::Paused;
        tracing::debug!(remaining_secs = self.time_left_secs, "timer paused");
        Some(Event::TimerPaused {
            remaining_secs: self.time_left_secs,
            at: now,
        })
    }

    pub fn stop(&mut self) -> Event {
        self.stop_at(now())
    }

    /// Abandon the current period from any state. Idempotent.
    pub fn stop_at(&mut self, now: NaiveDateTime) -> Event {
        self.reset_countdown();
        tracing::debug!("timer stopped");
        Event::TimerStopped { at: now }
    }

    pub fn tick(&mut self) -> Option<Event> {
        self.tick_at(now())
    }

    /// Advance the countdown by one second. Returns
    /// `Some(Event::PeriodCompleted)` when the period finishes on this tick,
    /// or the start event of a due auto-continue.
    pub fn tick_at(&mut self, now: NaiveDateTime) -> Option<Event> {
        match self.state {
            TimerState::Running => {
                if self.time_left_secs > 0 {
                    self.time_left_secs -= 1;
                }
                if self.time_left_secs == 0 {
                    return Some(self.complete(now));
                }
                None
            }
            TimerState::Idle => match self.auto_start_at {
                Some(due) if now >= due => self.start_at(now),
                _ => None,
            },
            TimerState::Paused => None,
        }
    }

    pub fn activate(&mut self, button: TimerButtonDefinition, start_immediately: bool) -> Vec<Event> {
        self.activate_at(button, start_immediately, now())
    }

    /// Make `button` active, discarding any running or paused countdown.
    pub fn activate_at(
        &mut self,
        button: TimerButtonDefinition,
        start_immediately: bool,
        now: NaiveDateTime,
    ) -> Vec<Event> {
        self.phase = button.phase();
        self.active_button = button;
        self.reset_countdown();

        let mut events = vec![Event::ButtonActivated {
            button_id: self.active_button.id.clone(),
            phase: self.phase,
            at: now,
        }];
        if start_immediately {
            events.extend(self.start_at(now));
        }
        events
    }

    /// Switch between the first work and the first rest button and start.
    pub fn toggle_rest_at(&mut self, buttons: &ButtonSet, now: NaiveDateTime) -> Vec<Event> {
        let target = if self.active_button.is_rest {
            buttons.first_work()
        } else {
            buttons.first_rest()
        };
        match target {
            Some(button) => self.activate_at(button.clone(), true, now),
            None => Vec::new(),
        }
    }

    /// Force the rest phase and start. Already on a rest button, this only
    /// starts (or resumes) it.
    pub fn activate_rest_at(&mut self, buttons: &ButtonSet, now: NaiveDateTime) -> Vec<Event> {
        if self.active_button.is_rest {
            return self.start_at(now).into_iter().collect();
        }
        match buttons.first_rest() {
            Some(button) => self.activate_at(button.clone(), true, now),
            None => Vec::new(),
        }
    }

    /// Replace the preset. A running countdown keeps its current length.
    pub fn set_preset(&mut self, preset: Preset) {
        self.preset = preset;
    }

    /// Replace the active button definition in place (e.g. after the button
    /// list was edited) without touching the countdown.
    pub fn refresh_active_button(&mut self, button: TimerButtonDefinition) {
        self.active_button = button;
    }

    pub fn set_auto_continue(&mut self, enabled: bool) {
        self.auto_continue = enabled;
        if !enabled {
            self.auto_start_at = None;
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn minutes_for(&self, phase: Phase) -> u32 {
        match phase {
            Phase::Work => self.preset.work_minutes.max(1),
            Phase::Rest => self.preset.rest_minutes.max(1),
        }
    }

    fn reset_countdown(&mut self) {
        self.state = TimerState::Idle;
        self.time_left_secs = 0;
        self.period_start = None;
        self.auto_start_at = None;
    }

    fn complete(&mut self, now: NaiveDateTime) -> Event {
        let phase = self.active_button.phase();
        let duration_minutes = self.minutes_for(phase);
        let started_at = self
            .period_start
            .take()
            .unwrap_or_else(|| now - Duration::minutes(i64::from(duration_minutes)));

        self.state = TimerState::Idle;
        self.time_left_secs = 0;
        self.auto_start_at = self
            .auto_continue
            .then(|| now + Duration::seconds(AUTO_CONTINUE_DELAY_SECS));

        tracing::info!(
            button = %self.active_button.name,
            phase = ?phase,
            duration_minutes,
            "period completed"
        );
        Event::PeriodCompleted {
            period: CompletedPeriod {
                started_at,
                duration_minutes: f64::from(duration_minutes),
                phase,
                button_name: self.active_button.name.clone(),
                button_color_hex: self.active_button.background_color_hex.clone(),
            },
            auto_continue: self.auto_continue,
            at: now,
        }
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn work_engine() -> TimerEngine {
        TimerEngine::new(Preset::new("Default", 25, 5), TimerButtonDefinition::default_work())
    }

    fn run_ticks(engine: &mut TimerEngine, start: NaiveDateTime, ticks: u32) -> Vec<Event> {
        (1..=ticks)
            .filter_map(|i| engine.tick_at(start + Duration::seconds(i64::from(i))))
            .collect()
    }

    #[test]
    fn start_pause_resume() {
        let mut engine = work_engine();
        assert_eq!(engine.state(), TimerState::Idle);

        assert!(engine.start_at(at(9, 0, 0)).is_some());
        assert_eq!(engine.state(), TimerState::Running);
        assert_eq!(engine.time_left_secs(), 25 * 60);

        assert!(engine.pause_at(at(9, 0, 10)).is_some());
        assert_eq!(engine.state(), TimerState::Paused);

        assert!(matches!(engine.start_at(at(9, 5, 0)), Some(Event::TimerResumed { .. })));
        assert_eq!(engine.state(), TimerState::Running);
    }

    #[test]
    fn start_while_running_is_noop() {
        let mut engine = work_engine();
        engine.start_at(at(9, 0, 0));
        run_ticks(&mut engine, at(9, 0, 0), 3);
        assert!(engine.start_at(at(9, 0, 3)).is_none());
        assert_eq!(engine.time_left_secs(), 25 * 60 - 3);
        assert_eq!(engine.period_start(), Some(at(9, 0, 0)));
    }

    #[test]
    fn pause_is_only_valid_while_running() {
        let mut engine = work_engine();
        assert!(engine.pause_at(at(9, 0, 0)).is_none());
        engine.start_at(at(9, 0, 0));
        engine.pause_at(at(9, 0, 1));
        assert!(engine.pause_at(at(9, 0, 2)).is_none());
    }

    #[test]
    fn stop_is_idempotent_from_every_state() {
        let mut idle = work_engine();
        let mut running = work_engine();
        running.start_at(at(9, 0, 0));
        let mut paused = work_engine();
        paused.start_at(at(9, 0, 0));
        paused.tick_at(at(9, 0, 1));
        paused.pause_at(at(9, 0, 1));

        for engine in [&mut idle, &mut running, &mut paused] {
            engine.stop_at(at(9, 1, 0));
            engine.stop_at(at(9, 1, 0));
            assert_eq!(engine.time_left_secs(), 0);
            assert!(!engine.is_running());
            assert!(engine.period_start().is_none());
            assert_eq!(engine.state(), TimerState::Idle);
        }
    }

    #[test]
    fn work_period_completes_on_tick_1500() {
        let mut engine = work_engine();
        engine.start_at(at(9, 0, 0));
        let events = run_ticks(&mut engine, at(9, 0, 0), 1499);
        assert!(events.is_empty());
        assert_eq!(engine.time_left_secs(), 1);

        match engine.tick_at(at(9, 25, 0)) {
            Some(Event::PeriodCompleted { period, auto_continue, .. }) => {
                assert_eq!(period.started_at, at(9, 0, 0));
                assert_eq!(period.duration_minutes, 25.0);
                assert_eq!(period.phase, Phase::Work);
                assert!(!auto_continue);
            }
            other => panic!("Expected PeriodCompleted, got {other:?}"),
        }
        assert_eq!(engine.state(), TimerState::Idle);
        assert!(engine.period_start().is_none());
    }

    #[test]
    fn pause_resume_keeps_configured_duration() {
        let mut engine = work_engine();
        engine.start_at(at(9, 0, 0));
        run_ticks(&mut engine, at(9, 0, 0), 400);
        engine.pause_at(at(9, 6, 40));

        // Two hours away, then resume.
        let resume = at(11, 6, 40);
        engine.start_at(resume);
        assert_eq!(engine.period_start(), Some(resume - Duration::seconds(400)));

        let events = run_ticks(&mut engine, resume, 1100);
        match events.as_slice() {
            [Event::PeriodCompleted { period, .. }] => {
                assert_eq!(period.duration_minutes, 25.0);
                assert_eq!(period.started_at, at(11, 0, 0));
            }
            other => panic!("Expected one completion, got {other:?}"),
        }
    }

    #[test]
    fn missing_period_start_is_back_computed() {
        let mut engine = work_engine();
        engine.start_at(at(9, 0, 0));
        engine.time_left_secs = 1;
        engine.period_start = None;
        match engine.tick_at(at(10, 0, 0)) {
            Some(Event::PeriodCompleted { period, .. }) => {
                assert_eq!(period.started_at, at(9, 35, 0));
            }
            other => panic!("Expected PeriodCompleted, got {other:?}"),
        }
    }

    #[test]
    fn rest_button_uses_rest_minutes() {
        let mut engine = TimerEngine::new(Preset::new("P", 25, 5), TimerButtonDefinition::default_rest());
        engine.start_at(at(12, 0, 0));
        assert_eq!(engine.time_left_secs(), 5 * 60);
        let events = run_ticks(&mut engine, at(12, 0, 0), 300);
        match events.as_slice() {
            [Event::PeriodCompleted { period, .. }] => {
                assert_eq!(period.phase, Phase::Rest);
                assert_eq!(period.duration_minutes, 5.0);
            }
            other => panic!("Expected one completion, got {other:?}"),
        }
    }

    #[test]
    fn auto_continue_restarts_same_button_after_delay() {
        let mut engine = work_engine();
        engine.set_auto_continue(true);
        engine.start_at(at(9, 0, 0));
        run_ticks(&mut engine, at(9, 0, 0), 1500);
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(engine.pending_auto_start(), Some(at(9, 25, 1)));

        // Before the delay nothing happens.
        assert!(engine.tick_at(at(9, 25, 0)).is_none());
        match engine.tick_at(at(9, 25, 1)) {
            Some(Event::TimerStarted { phase, .. }) => assert_eq!(phase, Phase::Work),
            other => panic!("Expected TimerStarted, got {other:?}"),
        }
        assert_eq!(engine.active_button().id, "default-work");
        assert!(engine.pending_auto_start().is_none());
    }

    #[test]
    fn stop_cancels_pending_auto_continue() {
        let mut engine = work_engine();
        engine.set_auto_continue(true);
        engine.start_at(at(9, 0, 0));
        run_ticks(&mut engine, at(9, 0, 0), 1500);
        engine.stop_at(at(9, 25, 0));
        assert!(engine.tick_at(at(9, 30, 0)).is_none());
        assert_eq!(engine.state(), TimerState::Idle);
    }

    #[test]
    fn activate_discards_countdown() {
        let mut engine = work_engine();
        engine.start_at(at(9, 0, 0));
        run_ticks(&mut engine, at(9, 0, 0), 10);

        let events = engine.activate_at(TimerButtonDefinition::default_rest(), false, at(9, 0, 10));
        assert_eq!(events.len(), 1);
        assert_eq!(engine.phase(), Phase::Rest);
        assert_eq!(engine.state(), TimerState::Idle);
        assert_eq!(engine.time_left_secs(), 0);
        assert!(engine.period_start().is_none());

        let events = engine.activate_at(TimerButtonDefinition::default_work(), true, at(9, 0, 11));
        assert_eq!(events.len(), 2);
        assert!(engine.is_running());
        assert_eq!(engine.time_left_secs(), 25 * 60);
    }

    #[test]
    fn toggle_rest_swaps_phase_and_starts() {
        let buttons = ButtonSet::default();
        let mut engine = work_engine();
        engine.toggle_rest_at(&buttons, at(9, 0, 0));
        assert!(engine.active_button().is_rest);
        assert!(engine.is_running());

        engine.toggle_rest_at(&buttons, at(9, 1, 0));
        assert!(!engine.active_button().is_rest);
        assert_eq!(engine.active_button().id, buttons.first_work().unwrap().id);
        assert!(engine.is_running());
    }

    #[test]
    fn activate_rest_keeps_running_rest_period() {
        let buttons = ButtonSet::default();
        let mut engine = work_engine();
        engine.activate_rest_at(&buttons, at(9, 0, 0));
        run_ticks(&mut engine, at(9, 0, 0), 30);
        let events = engine.activate_rest_at(&buttons, at(9, 0, 30));
        assert!(events.is_empty());
        assert_eq!(engine.time_left_secs(), 5 * 60 - 30);
    }

    #[test]
    fn zero_minute_preset_still_runs_one_minute() {
        let mut preset = Preset::default();
        preset.work_minutes = 0;
        let mut engine = TimerEngine::new(preset, TimerButtonDefinition::default_work());
        engine.start_at(at(9, 0, 0));
        assert_eq!(engine.time_left_secs(), 60);
    }

    #[test]
    fn snapshot_returns_valid_event() {
        let engine = work_engine();
        match engine.snapshot_at(at(9, 0, 0)) {
            Event::StateSnapshot {
                state,
                remaining_secs,
                total_secs,
                preset_name,
                ..
            } => {
                assert_eq!(state, TimerState::Idle);
                assert_eq!(remaining_secs, 0);
                assert_eq!(total_secs, 25 * 60);
                assert_eq!(preset_name, "Default");
            }
            _ => panic!("Expected StateSnapshot"),
        }
    }
}
