//! The session: one owner for the timer engine, the persisted stores and
//! the calendar-day pointer.
//!
//! Every front end (the daemon loop, the command router, CLI one-shots)
//! works through a `&mut Session`. Mutations that change persisted state
//! save the affected store immediately; those saves are best-effort, so a
//! failing disk never interrupts the timer.

use chrono::{Local, NaiveDate, NaiveDateTime};

use crate::error::Result;
use crate::events::Event;
use crate::stats::{self, SummaryTotals};
use crate::storage::{
    ButtonSet, Paths, Preset, PresetList, Settings, StatsEntry, StatsStore, TimerButtonDefinition,
};
use crate::timer::{DayTracker, TimerEngine};

#[derive(Debug)]
pub struct Session {
    paths: Paths,
    presets: PresetList,
    buttons: ButtonSet,
    stats: StatsStore,
    settings: Settings,
    engine: TimerEngine,
    days: DayTracker,
}

impl Session {
    /// Load every store from `paths`. Never fails; broken or missing files
    /// fall back to defaults.
    pub fn open(paths: Paths) -> Self {
        Self::open_at(paths, now())
    }

    pub fn open_at(paths: Paths, now: NaiveDateTime) -> Self {
        let presets = PresetList::load(&paths.presets());
        let buttons = ButtonSet::load(&paths.buttons());
        let mut stats = StatsStore::load(&paths.stats());
        let settings = Settings::load(&paths.settings());

        let today = now.date();
        stats.day_mut(today);

        let mut engine = TimerEngine::new(presets.current().clone(), buttons.resolve(None));
        engine.set_auto_continue(settings.timer.auto_continue);

        tracing::info!(
            dir = %paths.dir().display(),
            presets = presets.len(),
            buttons = buttons.as_slice().len(),
            "session opened"
        );

        Self {
            paths,
            presets,
            buttons,
            stats,
            settings,
            engine,
            days: DayTracker::new(today),
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn paths(&self) -> &Paths {
        &self.paths
    }

    pub fn engine(&self) -> &TimerEngine {
        &self.engine
    }

    pub fn presets(&self) -> &PresetList {
        &self.presets
    }

    pub fn buttons(&self) -> &ButtonSet {
        &self.buttons
    }

    pub fn stats(&self) -> &StatsStore {
        &self.stats
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn current_day(&self) -> NaiveDate {
        self.days.current()
    }

    pub fn viewed_day(&self) -> NaiveDate {
        self.days.viewed()
    }

    /// Entries of the viewed day, ordered for the daily chart.
    pub fn viewed_series(&self) -> Vec<StatsEntry> {
        stats::daily_series(&self.stats, self.days.viewed())
    }

    /// Today's work/rest totals and the configured rolling average.
    pub fn summary_totals(&self) -> SummaryTotals {
        stats::summary_totals(
            &self.stats,
            self.days.current(),
            self.settings.timer.rolling_average_days,
        )
    }

    pub fn snapshot_at(&self, now: NaiveDateTime) -> Event {
        self.engine.snapshot_at(now)
    }

    // ── Timer ────────────────────────────────────────────────────────

    pub fn start_at(&mut self, now: NaiveDateTime) -> Option<Event> {
        self.engine.start_at(now)
    }

    pub fn pause_at(&mut self, now: NaiveDateTime) -> Option<Event> {
        self.engine.pause_at(now)
    }

    pub fn stop_at(&mut self, now: NaiveDateTime) -> Event {
        self.engine.stop_at(now)
    }

    /// Start when idle or paused, pause when running.
    pub fn start_or_pause_at(&mut self, now: NaiveDateTime) -> Option<Event> {
        if self.engine.is_running() {
            self.engine.pause_at(now)
        } else {
            self.engine.start_at(now)
        }
    }

    /// One-second heartbeat. Rolls the day over when the date changed and
    /// records a completed period in the stats store.
    pub fn tick_at(&mut self, now: NaiveDateTime) -> Vec<Event> {
        let mut events: Vec<Event> = self.ensure_current_day(now.date()).into_iter().collect();
        if let Some(event) = self.engine.tick_at(now) {
            if let Event::PeriodCompleted { period, .. } = &event {
                let day = stats::record(&mut self.stats, period);
                tracing::debug!(day = %day, "period recorded");
                self.stats.save(&self.paths.stats());
            }
            events.push(event);
        }
        events
    }

    pub fn tick(&mut self) -> Vec<Event> {
        self.tick_at(now())
    }

    /// Activate the button with `id`; unknown ids resolve like a fresh
    /// session does (first button, then the synthesized default).
    pub fn activate_button_at(&mut self, id: &str, start: bool, now: NaiveDateTime) -> Vec<Event> {
        self.reload_buttons();
        let button = self.buttons.resolve(Some(id));
        self.engine.activate_at(button, start, now)
    }

    pub fn toggle_rest_at(&mut self, now: NaiveDateTime) -> Vec<Event> {
        self.reload_buttons();
        self.engine.toggle_rest_at(&self.buttons, now)
    }

    pub fn activate_rest_at(&mut self, now: NaiveDateTime) -> Vec<Event> {
        self.reload_buttons();
        self.engine.activate_rest_at(&self.buttons, now)
    }

    // ── Calendar ─────────────────────────────────────────────────────

    /// Move the current day to `today` if the local date changed, creating
    /// the new day-key. Earlier days are left untouched.
    pub fn ensure_current_day(&mut self, today: NaiveDate) -> Option<Event> {
        let previous = self.days.roll_to(today)?;
        self.stats.day_mut(today);
        tracing::info!(previous = %previous, current = %today, "day rolled over");
        Some(Event::DayRolledOver {
            previous,
            current: today,
        })
    }

    pub fn shift_viewed_day(&mut self, offset: i64) -> bool {
        self.days.shift_viewed(offset)
    }

    // ── Presets ──────────────────────────────────────────────────────

    fn preset_selected(&mut self) -> Event {
        let preset = self.presets.current().clone();
        self.engine.set_preset(preset.clone());
        tracing::info!(preset = %preset.name, "preset selected");
        Event::PresetSelected {
            name: preset.name,
            work_minutes: preset.work_minutes,
            rest_minutes: preset.rest_minutes,
        }
    }

    /// Select by case-insensitive name; `None` when nothing matches. The
    /// list is re-read first so presets added by another process are found.
    pub fn select_preset(&mut self, name: &str) -> Option<Event> {
        self.reload_presets();
        if !self.presets.select_by_name(name) {
            tracing::debug!(name, "no preset with that name");
            return None;
        }
        Some(self.preset_selected())
    }

    pub fn cycle_preset(&mut self, direction: i32) -> Event {
        self.presets.cycle(direction);
        self.preset_selected()
    }

    pub fn add_preset(&mut self, preset: Preset) {
        self.presets.add(preset);
        self.presets.save(&self.paths.presets());
    }

    pub fn update_preset(&mut self, name: &str, preset: Preset) -> Result<()> {
        self.presets.update(name, preset)?;
        self.presets.save(&self.paths.presets());
        self.preset_selected();
        Ok(())
    }

    /// Delete a preset. Refuses to delete the last one; afterwards the first
    /// preset is selected.
    pub fn delete_preset(&mut self, name: &str) -> Result<Preset> {
        let removed = self.presets.remove(name)?;
        self.presets.save(&self.paths.presets());
        self.preset_selected();
        Ok(removed)
    }

    // ── Buttons ──────────────────────────────────────────────────────

    fn buttons_changed(&mut self) {
        self.buttons.save(&self.paths.buttons());
        let active = self.buttons.resolve(Some(&self.engine.active_button().id));
        self.engine.refresh_active_button(active);
    }

    pub fn replace_buttons(&mut self, buttons: Vec<TimerButtonDefinition>) {
        self.buttons.replace(buttons);
        self.buttons_changed();
    }

    pub fn add_button(&mut self, button: TimerButtonDefinition) {
        self.buttons.add(button);
        self.buttons_changed();
    }

    pub fn remove_button(&mut self, id: &str) -> bool {
        let removed = self.buttons.remove(id);
        self.buttons_changed();
        removed
    }

    // ── Reload ───────────────────────────────────────────────────────

    /// Re-read presets and buttons from disk, picking up edits made by the
    /// CLI while this session was running. The selected preset and the
    /// active button are kept by name and id when they still exist.
    pub fn reload_config(&mut self) {
        self.reload_presets();
        self.reload_buttons();
    }

    fn reload_presets(&mut self) {
        let selected = self.presets.current().name.clone();
        self.presets = PresetList::load(&self.paths.presets());
        self.presets.select_by_name(&selected);
        self.engine.set_preset(self.presets.current().clone());
    }

    fn reload_buttons(&mut self) {
        self.buttons = ButtonSet::load(&self.paths.buttons());
        let active = self.buttons.resolve(Some(&self.engine.active_button().id));
        self.engine.refresh_active_button(active);
    }

    // ── Settings ─────────────────────────────────────────────────────

    pub fn set_auto_continue(&mut self, enabled: bool) -> Result<()> {
        self.settings.timer.auto_continue = enabled;
        self.engine.set_auto_continue(enabled);
        self.settings.save(&self.paths.settings())
    }

    /// Flush the history on quit. Presets, buttons and settings are saved as
    /// they are edited, so a running session never overwrites edits made by
    /// another process.
    pub fn shutdown(&mut self) {
        self.stats.save(&self.paths.stats());
        tracing::info!("session saved");
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timer::{Phase, TimerState};
    use tempfile::TempDir;

    fn at(d: u32, h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, d)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    fn open(dir: &TempDir) -> Session {
        Session::open_at(Paths::new(dir.path()), at(4, 9, 0, 0))
    }

    #[test]
    fn fresh_session_uses_seeded_defaults() {
        let dir = TempDir::new().unwrap();
        let session = open(&dir);
        assert_eq!(session.presets().current().name, "Default");
        assert_eq!(session.engine().active_button().id, "work");
        assert_eq!(session.engine().state(), TimerState::Idle);
        assert!(session.stats().contains_day(at(4, 0, 0, 0).date()));
    }

    #[test]
    fn start_or_pause_alternates() {
        let dir = TempDir::new().unwrap();
        let mut session = open(&dir);
        session.start_or_pause_at(at(4, 9, 0, 0));
        assert!(session.engine().is_running());
        session.start_or_pause_at(at(4, 9, 0, 5));
        assert_eq!(session.engine().state(), TimerState::Paused);
    }

    #[test]
    fn completed_period_is_recorded_and_saved() {
        let dir = TempDir::new().unwrap();
        let mut session = open(&dir);
        session.start_at(at(4, 9, 0, 0));
        let completions: Vec<i64> = (1..=1500)
            .filter(|&i| {
                let now = at(4, 9, 0, 0) + chrono::Duration::seconds(i);
                session
                    .tick_at(now)
                    .iter()
                    .any(|e| matches!(e, Event::PeriodCompleted { .. }))
            })
            .collect();
        assert_eq!(completions, [1500]);

        let day = at(4, 0, 0, 0).date();
        assert_eq!(stats::sum_by_phase(session.stats(), day, Phase::Work), 25.0);
        let on_disk = StatsStore::load(&session.paths().stats());
        assert_eq!(on_disk.entries(day).len(), 1);
        assert_eq!(on_disk.entries(day)[0].time_minutes, 540.0);
    }

    #[test]
    fn rollover_creates_new_day_key() {
        let dir = TempDir::new().unwrap();
        let mut session = open(&dir);
        let events = session.tick_at(at(5, 0, 0, 1));
        assert!(matches!(events.as_slice(), [Event::DayRolledOver { .. }]));
        assert_eq!(session.current_day(), at(5, 0, 0, 0).date());
        assert!(session.stats().contains_day(at(5, 0, 0, 0).date()));
        assert!(session.tick_at(at(5, 0, 0, 2)).is_empty());
    }

    #[test]
    fn history_view_follows_today_only_when_on_it() {
        let dir = TempDir::new().unwrap();
        let mut session = open(&dir);
        session.start_at(at(4, 9, 0, 0));
        for i in 1..=1500 {
            session.tick_at(at(4, 9, 0, 0) + chrono::Duration::seconds(i));
        }
        assert_eq!(session.viewed_series().len(), 1);

        assert!(session.shift_viewed_day(-1));
        assert!(session.viewed_series().is_empty());
        session.tick_at(at(5, 0, 0, 0));
        assert_eq!(session.viewed_day(), at(3, 0, 0, 0).date());

        assert!(session.shift_viewed_day(5));
        assert_eq!(session.viewed_day(), session.current_day());
    }

    #[test]
    fn cycling_and_editing_presets() {
        let dir = TempDir::new().unwrap();
        let mut session = open(&dir);
        session.add_preset(Preset::new("B", 40, 8));
        session.cycle_preset(-1);
        assert_eq!(session.presets().current().name, "B");
        session.cycle_preset(1);
        assert_eq!(session.presets().current().name, "Default");

        session.update_preset("default", Preset::new("Default", 30, 6)).unwrap();
        assert_eq!(session.engine().preset().work_minutes, 30);
        match session.snapshot_at(at(4, 9, 0, 0)) {
            Event::StateSnapshot { total_secs, .. } => assert_eq!(total_secs, 30 * 60),
            other => panic!("Expected StateSnapshot, got {other:?}"),
        }
        assert!(session.update_preset("missing", Preset::default()).is_err());
    }

    #[test]
    fn button_edits_are_normalized_and_saved() {
        let dir = TempDir::new().unwrap();
        let mut session = open(&dir);
        session.add_button(TimerButtonDefinition::new("Code", "", false));
        assert_eq!(session.buttons().as_slice().len(), 7);

        session.replace_buttons(vec![TimerButtonDefinition::new("Only", "#000000", false)]);
        let saved = ButtonSet::load(&session.paths().buttons());
        assert_eq!(saved.as_slice().len(), 2);
        assert_eq!(saved.first_rest().unwrap().id, "rest");
        assert_eq!(session.engine().active_button().name, "Only");
    }

    #[test]
    fn preset_saved_by_another_process_can_be_selected() {
        let dir = TempDir::new().unwrap();
        let mut session = open(&dir);

        let mut on_disk = PresetList::load(&session.paths().presets());
        on_disk.add(Preset::new("Deep", 50, 10));
        on_disk.try_save(&session.paths().presets()).unwrap();

        let event = session.select_preset("deep");
        assert!(matches!(event, Some(Event::PresetSelected { work_minutes: 50, .. })));
        assert_eq!(session.engine().preset().work_minutes, 50);
        assert_eq!(session.presets().len(), 2);
    }

    #[test]
    fn reload_keeps_selection_and_picks_up_button_edits() {
        let dir = TempDir::new().unwrap();
        let mut session = open(&dir);
        session.add_preset(Preset::new("Long", 50, 10));
        session.select_preset("Long");

        let mut buttons = ButtonSet::load(&session.paths().buttons());
        buttons.replace(vec![
            TimerButtonDefinition::new("Focus", "#123456", false),
            TimerButtonDefinition::new("Nap", "#654321", true),
        ]);
        buttons.try_save(&session.paths().buttons()).unwrap();

        session.reload_config();
        assert_eq!(session.presets().current().name, "Long");
        assert_eq!(session.engine().preset().work_minutes, 50);
        assert_eq!(session.buttons().as_slice().len(), 2);
        // The active "work" button is gone; the first button takes over.
        assert_eq!(session.engine().active_button().name, "Focus");

        session.activate_rest_at(at(4, 9, 0, 0));
        assert_eq!(session.engine().active_button().name, "Nap");
    }

    #[test]
    fn unknown_preset_is_noop() {
        let dir = TempDir::new().unwrap();
        let mut session = open(&dir);
        assert!(session.select_preset("nope").is_none());
        assert_eq!(session.presets().current().name, "Default");
    }

    #[test]
    fn deleting_last_preset_is_rejected() {
        let dir = TempDir::new().unwrap();
        let mut session = open(&dir);
        assert!(session.delete_preset("Default").is_err());
        assert_eq!(session.presets().len(), 1);
    }

    #[test]
    fn preset_changes_reach_the_engine() {
        let dir = TempDir::new().unwrap();
        let mut session = open(&dir);
        session.add_preset(Preset::new("Long", 50, 10));
        session.select_preset("LONG");
        assert_eq!(session.engine().preset().work_minutes, 50);
        assert_eq!(PresetList::load(&session.paths().presets()).len(), 2);

        session.delete_preset("long").unwrap();
        assert_eq!(session.engine().preset().name, "Default");
    }

    #[test]
    fn removing_active_button_falls_back() {
        let dir = TempDir::new().unwrap();
        let mut session = open(&dir);
        session.activate_button_at("study", false, at(4, 9, 0, 0));
        assert_eq!(session.engine().active_button().id, "study");
        assert!(session.remove_button("study"));
        assert_eq!(session.engine().active_button().id, "work");
        assert!(!session.remove_button("study"));
    }

    #[test]
    fn removing_rest_button_synthesizes_one() {
        let dir = TempDir::new().unwrap();
        let mut session = open(&dir);
        session.remove_button("rest");
        let rest = session.buttons().first_rest().unwrap();
        assert_eq!(rest.name, "Rest");
        assert_eq!(rest.background_color_hex, "#9B59B6");
    }

    #[test]
    fn auto_continue_setting_persists() {
        let dir = TempDir::new().unwrap();
        let mut session = open(&dir);
        session.set_auto_continue(true).unwrap();
        assert!(session.engine().auto_continue());
        let reopened = open(&dir);
        assert!(reopened.engine().auto_continue());
    }
}
