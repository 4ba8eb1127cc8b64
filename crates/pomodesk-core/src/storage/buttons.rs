//! Labeled timer buttons, persisted as `timer-buttons.json`.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::lenient;
use crate::error::Result;
use crate::timer::Phase;

pub const DEFAULT_WORK_BACKGROUND: &str = "#4CAF50";
pub const DEFAULT_REST_BACKGROUND: &str = "#9B59B6";
pub const DEFAULT_TEXT_COLOR: &str = "#FFFFFF";

/// One selectable timer button: a label, its colors, and whether it runs the
/// rest phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawButton")]
pub struct TimerButtonDefinition {
    pub id: String,
    pub name: String,
    pub background_color_hex: String,
    pub text_color_hex: String,
    pub is_rest: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawButton {
    #[serde(default, alias = "Id")]
    id: Value,
    #[serde(default, alias = "Name")]
    name: Value,
    #[serde(default, alias = "BackgroundColorHex")]
    background_color_hex: Value,
    #[serde(default, alias = "TextColorHex")]
    text_color_hex: Value,
    #[serde(default, alias = "IsRest")]
    is_rest: Value,
}

impl From<RawButton> for TimerButtonDefinition {
    fn from(raw: RawButton) -> Self {
        let mut button = Self {
            id: lenient::string(&raw.id).unwrap_or_default(),
            name: lenient::string(&raw.name).unwrap_or_default(),
            background_color_hex: lenient::string(&raw.background_color_hex).unwrap_or_default(),
            text_color_hex: lenient::string(&raw.text_color_hex).unwrap_or_default(),
            is_rest: lenient::boolean(&raw.is_rest).unwrap_or(false),
        };
        button.fill_defaults();
        button
    }
}

impl TimerButtonDefinition {
    pub fn new(name: impl Into<String>, background_color_hex: impl Into<String>, is_rest: bool) -> Self {
        let mut button = Self {
            id: String::new(),
            name: name.into(),
            background_color_hex: background_color_hex.into(),
            text_color_hex: DEFAULT_TEXT_COLOR.into(),
            is_rest,
        };
        button.fill_defaults();
        button
    }

    /// The work button used when nothing else is configured.
    pub fn default_work() -> Self {
        Self {
            id: "default-work".into(),
            name: "Work".into(),
            background_color_hex: DEFAULT_WORK_BACKGROUND.into(),
            text_color_hex: DEFAULT_TEXT_COLOR.into(),
            is_rest: false,
        }
    }

    /// The rest button synthesized when the user removes the last one.
    pub fn default_rest() -> Self {
        Self {
            id: "rest".into(),
            name: "Rest".into(),
            background_color_hex: DEFAULT_REST_BACKGROUND.into(),
            text_color_hex: DEFAULT_TEXT_COLOR.into(),
            is_rest: true,
        }
    }

    pub fn phase(&self) -> Phase {
        Phase::from_rest_flag(self.is_rest)
    }

    fn fill_defaults(&mut self) {
        if self.id.trim().is_empty() {
            self.id = Uuid::new_v4().to_string();
        }
        let name = self.name.trim();
        self.name = if name.is_empty() {
            self.phase().label().to_string()
        } else {
            name.to_string()
        };
        if self.background_color_hex.trim().is_empty() {
            self.background_color_hex = if self.is_rest {
                DEFAULT_REST_BACKGROUND
            } else {
                DEFAULT_WORK_BACKGROUND
            }
            .into();
        }
        if self.text_color_hex.trim().is_empty() {
            self.text_color_hex = DEFAULT_TEXT_COLOR.into();
        }
    }
}

fn seed_buttons() -> Vec<TimerButtonDefinition> {
    let work = [
        ("work", "Work", "#4CAF50"),
        ("study", "Study", "#2196F3"),
        ("reading", "Reading", "#FF9800"),
        ("writing", "Writing", "#00BCD4"),
        ("meeting", "Meeting", "#E91E63"),
    ];
    work.into_iter()
        .map(|(id, name, color)| TimerButtonDefinition {
            id: id.into(),
            name: name.into(),
            background_color_hex: color.into(),
            text_color_hex: DEFAULT_TEXT_COLOR.into(),
            is_rest: false,
        })
        .chain(std::iter::once(TimerButtonDefinition::default_rest()))
        .collect()
}

/// Ordered button collection.
///
/// After construction it always holds at least one work and one rest button,
/// and every id is unique and non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonSet {
    buttons: Vec<TimerButtonDefinition>,
}

impl Default for ButtonSet {
    fn default() -> Self {
        Self {
            buttons: seed_buttons(),
        }
    }
}

impl ButtonSet {
    /// Normalize `buttons`. An empty list is replaced by the six seeded
    /// defaults.
    pub fn from_vec(buttons: Vec<TimerButtonDefinition>) -> Self {
        if buttons.is_empty() {
            return Self::default();
        }
        let mut set = Self { buttons };
        set.normalize();
        set
    }

    /// Load from `path`, never failing.
    pub fn load(path: &Path) -> Self {
        let items: Vec<Value> = super::load_or_default(path, "timer buttons");
        Self::from_vec(lenient::records(items, "timer button"))
    }

    pub fn save(&self, path: &Path) {
        super::save_best_effort(path, &self.buttons, "timer buttons");
    }

    pub fn try_save(&self, path: &Path) -> Result<()> {
        super::write_json(path, &self.buttons)
    }

    pub fn as_slice(&self) -> &[TimerButtonDefinition] {
        &self.buttons
    }

    pub fn get(&self, id: &str) -> Option<&TimerButtonDefinition> {
        self.buttons.iter().find(|b| b.id == id)
    }

    pub fn first_work(&self) -> Option<&TimerButtonDefinition> {
        self.buttons.iter().find(|b| !b.is_rest)
    }

    pub fn first_rest(&self) -> Option<&TimerButtonDefinition> {
        self.buttons.iter().find(|b| b.is_rest)
    }

    /// Resolve the active button: the one with `id`, else the first button,
    /// else the synthesized default work button.
    pub fn resolve(&self, id: Option<&str>) -> TimerButtonDefinition {
        id.and_then(|id| self.get(id))
            .or_else(|| self.buttons.first())
            .cloned()
            .unwrap_or_else(TimerButtonDefinition::default_work)
    }

    /// Replace the whole collection (settings dialog result) and normalize.
    pub fn replace(&mut self, buttons: Vec<TimerButtonDefinition>) {
        *self = Self::from_vec(buttons);
    }

    pub fn add(&mut self, button: TimerButtonDefinition) {
        self.buttons.push(button);
        self.normalize();
    }

    /// Remove the button with `id`. Returns whether anything was removed.
    /// Removing the last rest or work button synthesizes a replacement.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.buttons.len();
        self.buttons.retain(|b| b.id != id);
        let removed = self.buttons.len() != before;
        self.normalize();
        removed
    }

    fn normalize(&mut self) {
        let mut seen = HashSet::new();
        for button in &mut self.buttons {
            button.fill_defaults();
            if !seen.insert(button.id.clone()) {
                button.id = Uuid::new_v4().to_string();
                seen.insert(button.id.clone());
            }
        }
        if !self.buttons.iter().any(|b| !b.is_rest) {
            let mut work = TimerButtonDefinition::default_work();
            if seen.contains(&work.id) {
                work.id = Uuid::new_v4().to_string();
            }
            seen.insert(work.id.clone());
            self.buttons.insert(0, work);
        }
        if !self.buttons.iter().any(|b| b.is_rest) {
            let mut rest = TimerButtonDefinition::default_rest();
            if seen.contains(&rest.id) {
                rest.id = Uuid::new_v4().to_string();
            }
            self.buttons.push(rest);
        }
    }
}
