use serde::{Deserialize, Serialize};

/// Behavioral mode of a timer button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Work,
    Rest,
}

impl Phase {
    pub fn from_rest_flag(is_rest: bool) -> Self {
        if is_rest {
            Phase::Rest
        } else {
            Phase::Work
        }
    }

    pub fn is_rest(self) -> bool {
        self == Phase::Rest
    }

    /// Default display label, also used for unnamed buttons.
    pub fn label(self) -> &'static str {
        match self {
            Phase::Work => "Work",
            Phase::Rest => "Rest",
        }
    }
}
