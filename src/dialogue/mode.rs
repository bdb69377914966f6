//! Interaction modes of the face

use serde::{Deserialize, Serialize};

/// The three modes the face can be in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// Waiting for activity to be detected
    #[default]
    Idle,
    /// User is exercising: motivation lines rotate
    Sport,
    /// User is resting: the rest flow runs
    Rest,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::Idle => write!(f, "idle"),
            Mode::Sport => write!(f, "sport"),
            Mode::Rest => write!(f, "rest"),
        }
    }
}
