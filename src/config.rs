//! Configuration loading and management

use std::path::PathBuf;
use std::time::Duration;

/// Errors raised while reading configuration from the environment
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Folder holding the pose model assets
    pub model_dir: PathBuf,

    /// Recorded classifier output replayed by the default backend
    pub replay_path: PathBuf,

    /// A probability must be strictly above this to request a mode
    pub threshold: f32,

    /// Substring that identifies the sport label
    pub sport_label: String,

    /// Exact label for resting
    pub rest_label: String,

    /// Slider value at which the face unlocks
    pub unlock_threshold: f64,

    /// Animation-frame poll period
    pub frame_interval: Duration,

    /// Rotation period of the motivation lines
    pub motivation_interval: Duration,

    /// Square camera frame size in pixels
    pub camera_size: u32,

    /// Mirror the camera image
    pub camera_flip: bool,

    /// Optional JSON-lines event log
    pub event_log: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment and defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let model_dir = PathBuf::from(
            lookup("RESTY_MODEL_DIR").unwrap_or_else(|| "./my_model/".to_string()),
        );
        let replay_path = lookup("RESTY_REPLAY_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| model_dir.join("replay.jsonl"));

        let threshold: f32 = parse_or(&lookup, "RESTY_THRESHOLD", 0.50)?;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(invalid("RESTY_THRESHOLD", "must be between 0 and 1"));
        }

        let sport_label = label_or(&lookup, "RESTY_SPORT_LABEL", "sport")?;
        let rest_label = label_or(&lookup, "RESTY_REST_LABEL", "rest")?;

        let unlock_threshold: f64 = parse_or(&lookup, "RESTY_UNLOCK_THRESHOLD", 95.0)?;
        if !(unlock_threshold > 0.0 && unlock_threshold <= 100.0) {
            return Err(invalid("RESTY_UNLOCK_THRESHOLD", "must be in (0, 100]"));
        }

        let frame_interval = millis_or(&lookup, "RESTY_FRAME_INTERVAL_MS", 16)?;
        let motivation_interval = millis_or(&lookup, "RESTY_MOTIVATION_INTERVAL_MS", 2500)?;

        let camera_size: u32 = parse_or(&lookup, "RESTY_CAMERA_SIZE", 224)?;
        if camera_size == 0 {
            return Err(invalid("RESTY_CAMERA_SIZE", "must be positive"));
        }
        let camera_flip: bool = parse_or(&lookup, "RESTY_CAMERA_FLIP", true)?;

        let event_log = lookup("RESTY_EVENT_LOG")
            .filter(|path| !path.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            model_dir,
            replay_path,
            threshold,
            sport_label,
            rest_label,
            unlock_threshold,
            frame_interval,
            motivation_interval,
            camera_size,
            camera_flip,
            event_log,
        })
    }
}

fn invalid(var: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue(var.to_string(), reason.into())
}

fn parse_or<F, T>(lookup: &F, var: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| invalid(var, e.to_string())),
        None => Ok(default),
    }
}

fn millis_or<F>(lookup: &F, var: &str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let ms: u64 = parse_or(lookup, var, default)?;
    if ms == 0 {
        return Err(invalid(var, "must be at least 1 ms"));
    }
    Ok(Duration::from_millis(ms))
}

// Labels are compared against lowercased classifier output.
fn label_or<F>(lookup: &F, var: &str, default: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let label = lookup(var).unwrap_or_else(|| default.to_string());
    let label = label.trim().to_lowercase();
    if label.is_empty() {
        return Err(invalid(var, "must not be empty"));
    }
    Ok(label)
}
