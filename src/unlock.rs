//! Slide-to-unlock gate

use tracing::{debug, info};

/// Tracks the unlock slider; unlocks once and stays unlocked
#[derive(Debug, Clone)]
pub struct UnlockGate {
    threshold: f64,
    unlocked: bool,
}

impl UnlockGate {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            unlocked: false,
        }
    }

    pub fn is_unlocked(&self) -> bool {
        self.unlocked
    }

    /// Feed a slider sample (clamped to 0-100)
    ///
    /// Returns true only for the sample that unlocks.
    pub fn update(&mut self, value: f64) -> bool {
        if self.unlocked {
            return false;
        }

        let value = if value.is_nan() { 0.0 } else { value.clamp(0.0, 100.0) };
        debug!(value, threshold = self.threshold, "unlock slider moved");

        if value >= self.threshold {
            self.unlocked = true;
            info!(value, "unlocked");
            return true;
        }
        false
    }
}
