//! # Pomodesk Core Library
//!
//! Business logic for the pomodesk Pomodoro timer. Every operation is
//! available through the `pomodesk` CLI binary; a desktop shell would be a
//! thin layer over the same session API.
//!
//! ## Architecture
//!
//! - **Timer Engine**: a second-granular countdown state machine; the caller
//!   invokes `tick()` once per second
//! - **Storage**: JSON presets, timer buttons and statistics history, plus
//!   TOML settings
//! - **Stats**: pure aggregations over the history (daily series, rolling
//!   workday average, multi-day and weekly rollups)
//! - **Session**: the single owner of the engine and the stores
//! - **Commands/IPC**: the text verb protocol and its loopback transport
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`Session`]: Engine plus persisted state, driven by front ends
//! - [`StatsStore`]: Completed-period history
//! - [`CommandRouter`]: Applies text commands to a session

pub mod command;
pub mod error;
pub mod events;
pub mod ipc;
pub mod session;
pub mod stats;
pub mod storage;
pub mod timer;

pub use command::{Command, CommandRouter, Directive, Dispatch};
pub use error::{ConfigError, CoreError, ValidationError};
pub use events::{CompletedPeriod, Event};
pub use session::Session;
pub use storage::{
    ButtonSet, Paths, Preset, PresetList, Settings, StatsEntry, StatsStore, TimerButtonDefinition,
};
pub use timer::{Phase, TimerEngine, TimerState};
