mod buttons;
mod config;
mod lenient;
mod presets;
mod stats;

pub use buttons::{ButtonSet, TimerButtonDefinition};
pub use config::{IpcConfig, Settings, TimerConfig, WindowConfig};
pub use presets::{Preset, PresetList};
pub use stats::{day_key, parse_day_key, StatsEntry, StatsStore};

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ConfigError, Result};

pub const PRESETS_FILE: &str = "config.json";
pub const BUTTONS_FILE: &str = "timer-buttons.json";
pub const STATS_FILE: &str = "stats.json";
pub const SETTINGS_FILE: &str = "settings.toml";

/// Returns `<config_dir>/pomodesk[-dev]/` based on POMODESK_ENV.
///
/// Set POMODESK_ENV=dev to use the development data directory, or
/// POMODESK_DATA_DIR to point at an explicit directory.
///
/// # Errors
/// Returns an error if no config directory can be determined or if
/// creating the directory fails.
pub fn data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("POMODESK_DATA_DIR") {
        let dir = PathBuf::from(dir);
        std::fs::create_dir_all(&dir)?;
        return Ok(dir);
    }

    let base_dir = dirs::config_dir()
        .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
        .ok_or(ConfigError::NoDataDir)?;

    let env = std::env::var("POMODESK_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("pomodesk-dev")
    } else {
        base_dir.join("pomodesk")
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Locations of every persisted file inside one data directory.
#[derive(Debug, Clone)]
pub struct Paths {
    dir: PathBuf,
}

impl Paths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Paths inside the default [`data_dir`].
    pub fn resolve() -> Result<Self> {
        Ok(Self::new(data_dir()?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn presets(&self) -> PathBuf {
        self.dir.join(PRESETS_FILE)
    }

    pub fn buttons(&self) -> PathBuf {
        self.dir.join(BUTTONS_FILE)
    }

    pub fn stats(&self) -> PathBuf {
        self.dir.join(STATS_FILE)
    }

    pub fn settings(&self) -> PathBuf {
        self.dir.join(SETTINGS_FILE)
    }
}

/// Read and parse a JSON file. `Ok(None)` when the file does not exist.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    // Files written by other tools sometimes carry a UTF-8 BOM.
    let content = content.trim_start_matches('\u{feff}');
    Ok(Some(serde_json::from_str(content)?))
}

/// Pretty-print `value` as JSON into `path`, creating the parent directory.
pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    write_atomic(path, json.as_bytes())?;
    Ok(())
}

/// Replace `path` with `contents` through a temp file in the same
/// directory, so readers see either the old file or the complete new one.
pub(crate) fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut file = tempfile::NamedTempFile::new_in(parent)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Load `path`, falling back to `T::default()` on a missing or broken file.
pub(crate) fn load_or_default<T: DeserializeOwned + Default>(path: &Path, what: &str) -> T {
    match read_json::<T>(path) {
        Ok(Some(value)) => value,
        Ok(None) => {
            tracing::debug!(path = %path.display(), "{what} file missing, using defaults");
            T::default()
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "{what} file unreadable, using defaults");
            T::default()
        }
    }
}

/// Best-effort save: failures are logged and swallowed.
pub(crate) fn save_best_effort<T: Serialize + ?Sized>(path: &Path, value: &T, what: &str) {
    if let Err(e) = write_json(path, value) {
        tracing::warn!(path = %path.display(), error = %e, "failed to save {what}");
    }
}
