//! Text command protocol.
//!
//! A command is one line: a case-insensitive verb and an optional argument,
//! e.g. `start`, `preset "Deep Work"`. Unknown verbs are ignored.

use std::fmt;

use chrono::NaiveDateTime;

use crate::events::Event;
use crate::session::Session;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Pause,
    /// Swap between the first work and the first rest button and start.
    Toggle,
    /// Force the rest phase and start.
    Rest,
    Show,
    Quit,
    Preset(String),
}

impl Command {
    /// Parse one command line. `None` for blank lines and unknown verbs.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let (verb, arg) = match line.split_once(char::is_whitespace) {
            Some((verb, arg)) => (verb, arg.trim()),
            None => (line, ""),
        };

        let command = match verb.to_lowercase().as_str() {
            "start" => Self::Start,
            "stop" => Self::Stop,
            "pause" => Self::Pause,
            "toggle" => Self::Toggle,
            "rest" => Self::Rest,
            "show" => Self::Show,
            "quit" => Self::Quit,
            "preset" => Self::Preset(arg.trim_matches('"').trim().to_string()),
            other => {
                tracing::debug!(verb = other, "ignoring unknown command");
                return None;
            }
        };
        Some(command)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::Stop => f.write_str("stop"),
            Self::Pause => f.write_str("pause"),
            Self::Toggle => f.write_str("toggle"),
            Self::Rest => f.write_str("rest"),
            Self::Show => f.write_str("show"),
            Self::Quit => f.write_str("quit"),
            Self::Preset(name) => write!(f, "preset \"{name}\""),
        }
    }
}

/// What the front end should do after a command was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Continue,
    /// Bring the window to the front.
    Show,
    /// Persist and exit.
    Quit,
}

/// Outcome of one dispatched command.
#[derive(Debug, Clone, PartialEq)]
pub struct Dispatch {
    pub directive: Directive,
    pub events: Vec<Event>,
}

impl Dispatch {
    fn with(directive: Directive) -> Self {
        Self {
            directive,
            events: Vec::new(),
        }
    }

    fn events(events: impl IntoIterator<Item = Event>) -> Self {
        Self {
            directive: Directive::Continue,
            events: events.into_iter().collect(),
        }
    }
}

/// Applies commands to a session.
pub struct CommandRouter;

impl CommandRouter {
    pub fn dispatch(session: &mut Session, command: Command, now: NaiveDateTime) -> Dispatch {
        tracing::info!(command = %command, "dispatching command");
        match command {
            Command::Start => Dispatch::events(session.start_at(now)),
            Command::Stop => Dispatch::events(Some(session.stop_at(now))),
            Command::Pause => Dispatch::events(session.pause_at(now)),
            Command::Toggle => Dispatch::events(session.toggle_rest_at(now)),
            Command::Rest => Dispatch::events(session.activate_rest_at(now)),
            Command::Show => Dispatch::with(Directive::Show),
            Command::Quit => {
                session.shutdown();
                Dispatch::with(Directive::Quit)
            }
            Command::Preset(name) => Dispatch::events(session.select_preset(&name)),
        }
    }

    /// Parse and dispatch one line; unparseable lines are ignored.
    pub fn dispatch_line(session: &mut Session, line: &str, now: NaiveDateTime) -> Dispatch {
        match Command::parse(line) {
            Some(command) => Self::dispatch(session, command, now),
            None => Dispatch::with(Directive::Continue),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Paths;
    use crate::timer::TimerState;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn at(s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(10, 0, s)
            .unwrap()
    }

    #[test]
    fn parses_verbs_case_insensitively() {
        assert_eq!(Command::parse("START"), Some(Command::Start));
        assert_eq!(Command::parse("  Stop \n"), Some(Command::Stop));
        assert_eq!(Command::parse("toggle"), Some(Command::Toggle));
        assert_eq!(Command::parse("Rest"), Some(Command::Rest));
        assert_eq!(Command::parse("quit"), Some(Command::Quit));
    }

    #[test]
    fn preset_argument_is_unquoted() {
        assert_eq!(
            Command::parse(r#"preset "Deep Work""#),
            Some(Command::Preset("Deep Work".into()))
        );
        assert_eq!(Command::parse("PRESET  short "), Some(Command::Preset("short".into())));
        assert_eq!(Command::parse("preset"), Some(Command::Preset(String::new())));
    }

    #[test]
    fn unknown_and_blank_lines_are_ignored() {
        assert_eq!(Command::parse("launch rockets"), None);
        assert_eq!(Command::parse("   "), None);
    }

    #[test]
    fn display_parses_back() {
        for command in [Command::Start, Command::Preset("Deep Work".into())] {
            assert_eq!(Command::parse(&command.to_string()), Some(command));
        }
    }

    #[test]
    fn router_drives_the_session() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::open_at(Paths::new(dir.path()), at(0));

        let out = CommandRouter::dispatch_line(&mut session, "start", at(0));
        assert_eq!(out.directive, Directive::Continue);
        assert_eq!(out.events.len(), 1);
        assert!(session.engine().is_running());

        CommandRouter::dispatch_line(&mut session, "pause", at(1));
        assert_eq!(session.engine().state(), TimerState::Paused);

        CommandRouter::dispatch_line(&mut session, "rest", at(2));
        assert!(session.engine().active_button().is_rest);
        assert!(session.engine().is_running());

        CommandRouter::dispatch_line(&mut session, "toggle", at(3));
        assert!(!session.engine().active_button().is_rest);

        CommandRouter::dispatch_line(&mut session, "stop", at(4));
        assert_eq!(session.engine().state(), TimerState::Idle);
    }

    #[test]
    fn show_and_quit_directives() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::open_at(Paths::new(dir.path()), at(0));
        assert_eq!(
            CommandRouter::dispatch(&mut session, Command::Show, at(0)).directive,
            Directive::Show
        );
        assert_eq!(
            CommandRouter::dispatch(&mut session, Command::Quit, at(0)).directive,
            Directive::Quit
        );
        assert!(session.paths().stats().exists());
    }

    #[test]
    fn preset_command_matches_by_name() {
        let dir = TempDir::new().unwrap();
        let mut session = Session::open_at(Paths::new(dir.path()), at(0));
        session.add_preset(crate::storage::Preset::new("Deep Work", 50, 10));

        let out = CommandRouter::dispatch_line(&mut session, r#"preset "deep work""#, at(0));
        assert!(matches!(out.events.as_slice(), [Event::PresetSelected { .. }]));
        assert_eq!(session.engine().preset().work_minutes, 50);

        let out = CommandRouter::dispatch_line(&mut session, "preset missing", at(0));
        assert!(out.events.is_empty());
        assert_eq!(session.presets().current().name, "Deep Work");
    }

    #[test]
    fn preset_command_sees_presets_written_after_open() {
        let dir = TempDir::new().unwrap();
        let paths = Paths::new(dir.path());
        let mut session = Session::open_at(paths.clone(), at(0));

        let mut presets = crate::storage::PresetList::load(&paths.presets());
        presets.add(crate::storage::Preset::new("Deep", 50, 10));
        presets.try_save(&paths.presets()).unwrap();

        let out = CommandRouter::dispatch_line(&mut session, r#"preset "Deep""#, at(1));
        assert!(matches!(out.events.as_slice(), [Event::PresetSelected { .. }]));
        assert_eq!(session.engine().preset().work_minutes, 50);
    }
}
