//! Work/rest presets, persisted as `config.json`.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::lenient;
use crate::error::{Result, ValidationError};

pub const DEFAULT_WORK_MINUTES: u32 = 25;
pub const DEFAULT_REST_MINUTES: u32 = 5;
const DEFAULT_PRESET_NAME: &str = "Default";
const FALLBACK_PRESET_NAME: &str = "Preset";

/// A named pair of work/rest durations.
///
/// Both minute values are positive once constructed; anything else is
/// coerced to 25/5 during deserialization and by [`Preset::from_input`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawPreset")]
pub struct Preset {
    pub name: String,
    pub work_minutes: u32,
    pub rest_minutes: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPreset {
    #[serde(default, alias = "Name")]
    name: Value,
    #[serde(default, alias = "WorkMinutes")]
    work_minutes: Value,
    #[serde(default, alias = "RestMinutes")]
    rest_minutes: Value,
}

impl From<RawPreset> for Preset {
    fn from(raw: RawPreset) -> Self {
        Preset::normalized(
            lenient::string(&raw.name).unwrap_or_default(),
            lenient::int(&raw.work_minutes),
            lenient::int(&raw.rest_minutes),
        )
    }
}

impl Default for Preset {
    fn default() -> Self {
        Self {
            name: DEFAULT_PRESET_NAME.into(),
            work_minutes: DEFAULT_WORK_MINUTES,
            rest_minutes: DEFAULT_REST_MINUTES,
        }
    }
}

impl Preset {
    pub fn new(name: impl Into<String>, work_minutes: u32, rest_minutes: u32) -> Self {
        Self::normalized(
            name.into(),
            Some(work_minutes as i64),
            Some(rest_minutes as i64),
        )
    }

    /// Build a preset from free-text user input, coercing anything
    /// non-numeric or non-positive to the defaults.
    pub fn from_input(name: &str, work: &str, rest: &str) -> Self {
        Self::normalized(
            name.to_string(),
            work.trim().parse().ok(),
            rest.trim().parse().ok(),
        )
    }

    fn normalized(name: String, work: Option<i64>, rest: Option<i64>) -> Self {
        let name = name.trim();
        Self {
            name: if name.is_empty() {
                FALLBACK_PRESET_NAME.to_string()
            } else {
                name.to_string()
            },
            work_minutes: positive_or(work, DEFAULT_WORK_MINUTES),
            rest_minutes: positive_or(rest, DEFAULT_REST_MINUTES),
        }
    }
}

fn positive_or(value: Option<i64>, default: u32) -> u32 {
    match value {
        Some(v) if v > 0 => u32::try_from(v).unwrap_or(default),
        _ => default,
    }
}

/// Ordered preset collection with a current selection. Never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresetList {
    presets: Vec<Preset>,
    current: usize,
}

impl Default for PresetList {
    fn default() -> Self {
        Self::from_vec(Vec::new())
    }
}

impl PresetList {
    /// Wrap `presets`, seeding the default preset when empty.
    pub fn from_vec(mut presets: Vec<Preset>) -> Self {
        if presets.is_empty() {
            presets.push(Preset::default());
        }
        Self {
            presets,
            current: 0,
        }
    }

    /// Load from `path`, never failing.
    pub fn load(path: &Path) -> Self {
        let items: Vec<Value> = super::load_or_default(path, "presets");
        Self::from_vec(lenient::records(items, "preset"))
    }

    pub fn save(&self, path: &Path) {
        super::save_best_effort(path, &self.presets, "presets");
    }

    pub fn try_save(&self, path: &Path) -> Result<()> {
        super::write_json(path, &self.presets)
    }

    pub fn as_slice(&self) -> &[Preset] {
        &self.presets
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }

    pub fn current(&self) -> &Preset {
        // `presets` is never empty and `current` is kept in range.
        &self.presets[self.current]
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Case-insensitive lookup by name.
    pub fn position(&self, name: &str) -> Option<usize> {
        let name = name.trim();
        self.presets
            .iter()
            .position(|p| p.name.to_lowercase() == name.to_lowercase())
    }

    /// Select by case-insensitive name. Returns `false` (and leaves the
    /// selection alone) when no preset matches.
    pub fn select_by_name(&mut self, name: &str) -> bool {
        match self.position(name) {
            Some(index) => {
                self.current = index;
                true
            }
            None => false,
        }
    }

    /// Move the selection by `direction` steps, wrapping around.
    pub fn cycle(&mut self, direction: i32) {
        let len = self.presets.len() as i64;
        let next = (self.current as i64 + direction as i64).rem_euclid(len);
        self.current = next as usize;
    }

    pub fn add(&mut self, preset: Preset) {
        self.presets.push(preset);
    }

    /// Replace the preset named `name` with `updated`.
    pub fn update(&mut self, name: &str, updated: Preset) -> Result<()> {
        let index = self
            .position(name)
            .ok_or_else(|| ValidationError::PresetNotFound(name.to_string()))?;
        self.presets[index] = updated;
        Ok(())
    }

    /// Delete the preset named `name`. The last remaining preset cannot be
    /// deleted; after a deletion the selection returns to the first preset.
    pub fn remove(&mut self, name: &str) -> Result<Preset> {
        let index = self
            .position(name)
            .ok_or_else(|| ValidationError::PresetNotFound(name.to_string()))?;
        if self.presets.len() <= 1 {
            return Err(ValidationError::LastPreset.into());
        }
        let removed = self.presets.remove(index);
        self.current = 0;
        Ok(removed)
    }
}
