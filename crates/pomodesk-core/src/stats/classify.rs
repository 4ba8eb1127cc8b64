//! Work/rest classification and color fallbacks for stats entries.
//!
//! The `isRest` flag is the source of truth for everything this crate
//! writes. The label rule exists for history imported from older files,
//! where rest periods were only recognizable by a `"rest"` (or Russian
//! `"отдых"`) type label; [`StatsEntry`] loading folds it into the flag once.

use crate::storage::StatsEntry;
use crate::timer::Phase;

pub const WORK_COLOR: &str = "#5AC85A";
pub const REST_COLOR: &str = "#9B59B6";

const REST_LABELS: [&str; 2] = ["rest", "отдых"];

/// `true` for the legacy rest labels, compared case-insensitively.
pub fn is_rest_label(label: &str) -> bool {
    let label = label.trim().to_lowercase();
    REST_LABELS.contains(&label.as_str())
}

/// Effective rest flag: the explicit flag, or a legacy rest label.
pub fn is_rest_entry(entry: &StatsEntry) -> bool {
    entry.is_rest || is_rest_label(&entry.kind)
}

pub fn default_color(phase: Phase) -> &'static str {
    match phase {
        Phase::Work => WORK_COLOR,
        Phase::Rest => REST_COLOR,
    }
}

/// The entry's own color, or the phase default when it has none.
pub fn resolve_color(entry: &StatsEntry) -> &str {
    let color = entry.color_hex.trim();
    if color.is_empty() {
        default_color(entry.phase())
    } else {
        color
    }
}

/// Display label used for grouping: the trimmed type, or the phase name for
/// unlabeled entries.
pub fn type_label(entry: &StatsEntry) -> String {
    let label = entry.kind.trim();
    if label.is_empty() {
        entry.phase().label().to_string()
    } else {
        label.to_string()
    }
}
