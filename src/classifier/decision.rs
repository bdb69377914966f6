//! Mapping class probabilities to a mode request

use crate::dialogue::Mode;

use super::backend::Prediction;

/// Which classifier labels count as sport and rest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRules {
    /// Any label containing this (after lowercasing) is sport
    pub sport_contains: String,
    /// Only a label equal to this (after lowercasing) is rest
    pub rest_equals: String,
}

impl Default for LabelRules {
    fn default() -> Self {
        Self {
            sport_contains: "sport".to_string(),
            rest_equals: "rest".to_string(),
        }
    }
}

impl LabelRules {
    pub fn new(sport_contains: &str, rest_equals: &str) -> Self {
        Self {
            sport_contains: sport_contains.to_lowercase(),
            rest_equals: rest_equals.to_lowercase(),
        }
    }

    /// Pull `(p_sport, p_rest)` out of a prediction list
    ///
    /// Missing labels count as 0. When several labels match, the last one
    /// in the list wins.
    pub fn scores(&self, predictions: &[Prediction]) -> (f32, f32) {
        let mut p_sport = 0.0;
        let mut p_rest = 0.0;
        for prediction in predictions {
            let name = prediction.class_name.to_lowercase();
            if name.contains(&self.sport_contains) {
                p_sport = prediction.probability;
            }
            if name == self.rest_equals {
                p_rest = prediction.probability;
            }
        }
        (p_sport, p_rest)
    }
}

/// Decide which mode, if any, to request
///
/// Sport needs `p_sport > threshold` and wins ties with rest. Rest needs
/// `p_rest > threshold` and strictly more than sport. Anything else keeps
/// the current mode.
pub fn decide(p_sport: f32, p_rest: f32, threshold: f32) -> Option<Mode> {
    if p_sport > threshold && p_sport >= p_rest {
        Some(Mode::Sport)
    } else if p_rest > threshold && p_rest > p_sport {
        Some(Mode::Rest)
    } else {
        None
    }
}
