//! TOML-based application settings.
//!
//! Stores user preferences that are not presets or buttons:
//! - Timer behavior (auto-continue, restoring the window on finish)
//! - Window behavior (pin when idle)
//! - The local command listener port
//!
//! Settings are stored at `<data_dir>/settings.toml`.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, CoreError, Result};

pub const DEFAULT_IPC_PORT: u16 = 47613;

/// Timer-related settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerConfig {
    /// Restart the active button automatically after a period completes.
    #[serde(default)]
    pub auto_continue: bool,
    #[serde(default = "default_true")]
    pub restore_window_on_finish: bool,
    /// Number of workdays in the rolling work average.
    #[serde(default = "default_rolling_average_days")]
    pub rolling_average_days: u32,
}

/// Window settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default)]
    pub pin_when_idle: bool,
}

/// Local command listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpcConfig {
    #[serde(default = "default_ipc_port")]
    pub port: u16,
}

/// Application settings.
///
/// Serialized to/from TOML at `<data_dir>/settings.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub timer: TimerConfig,
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub ipc: IpcConfig,
}

fn default_true() -> bool {
    true
}
fn default_rolling_average_days() -> u32 {
    3
}
fn default_ipc_port() -> u16 {
    DEFAULT_IPC_PORT
}

impl Default for TimerConfig {
    fn default() -> Self {
        Self {
            auto_continue: false,
            restore_window_on_finish: true,
            rolling_average_days: default_rolling_average_days(),
        }
    }
}

impl Default for IpcConfig {
    fn default() -> Self {
        Self {
            port: default_ipc_port(),
        }
    }
}

impl Settings {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if parts.peek().map_or(true, |p| p.is_empty()) {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .trim()
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => value
                        .trim()
                        .parse::<u64>()
                        .map(|n| serde_json::Value::Number(n.into()))
                        .map_err(|_| invalid(format!("cannot parse '{value}' as number")))?,
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        return Err(unknown());
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Load from `path` or return defaults. Never fails; a broken file is
    /// logged and ignored.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str::<Settings>(&content) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "settings unreadable, using defaults");
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Persist to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings cannot be serialized or written.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        super::write_atomic(path, content.as_bytes()).map_err(|e| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    /// Get a settings value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Object(_) => None,
            other => Some(other.to_string()),
        }
    }

    /// Set a settings value by key in memory. Returns an error if the key is
    /// unknown or the value does not fit the field.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut json = serde_json::to_value(&*self)?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        *self = serde_json::from_value(json).map_err(|e| {
            CoreError::from(ConfigError::InvalidValue {
                key: key.to_string(),
                message: e.to_string(),
            })
        })?;
        Ok(())
    }

    /// Address of the local command listener.
    pub fn command_addr(&self) -> SocketAddr {
        SocketAddr::from((Ipv4Addr::LOCALHOST, self.ipc.port))
    }
}
