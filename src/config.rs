use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_TAP_THRESHOLD_PX: f32 = 10.0;
pub const DEFAULT_SWIPE_THRESHOLD_PX: f32 = 50.0;
pub const DEFAULT_PINCH_THRESHOLD: f32 = 0.1;
pub const DEFAULT_ROTATION_THRESHOLD_DEG: f32 = 5.0;
pub const DEFAULT_LONG_PRESS_DELAY_MS: u64 = 500;
pub const DEFAULT_MULTI_TAP_WINDOW_MS: u64 = 300;
pub const DEFAULT_TAP_MAX_DURATION_MS: u64 = 500;

/// Recognition thresholds and timing windows.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GestureConfig {
    /// Max travel from the start point for a tap; also cancels long-press.
    pub tap_threshold_px: f32,
    pub swipe_threshold_px: f32,
    /// Relative distance change, `|d / d0 - 1|`, that starts a pinch.
    pub pinch_threshold: f32,
    pub rotation_threshold_deg: f32,
    pub long_press_delay_ms: u64,
    pub multi_tap_window_ms: u64,
    pub tap_max_duration_ms: u64,
    /// Motion below this radius is held at the last position. 0 disables.
    pub dejitter_radius_px: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            tap_threshold_px: DEFAULT_TAP_THRESHOLD_PX,
            swipe_threshold_px: DEFAULT_SWIPE_THRESHOLD_PX,
            pinch_threshold: DEFAULT_PINCH_THRESHOLD,
            rotation_threshold_deg: DEFAULT_ROTATION_THRESHOLD_DEG,
            long_press_delay_ms: DEFAULT_LONG_PRESS_DELAY_MS,
            multi_tap_window_ms: DEFAULT_MULTI_TAP_WINDOW_MS,
            tap_max_duration_ms: DEFAULT_TAP_MAX_DURATION_MS,
            dejitter_radius_px: 0.0,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse gesture config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize gesture config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    gestures: GestureConfig,
}

impl GestureConfig {
    /// Parses a `[gestures]` table; missing keys keep their defaults.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(input)?;
        file.gestures.validate()?;
        Ok(file.gestures)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let input = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&input)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        let file = ConfigFile { gestures: *self };
        Ok(toml::to_string(&file)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tap_threshold_px.is_finite() || self.tap_threshold_px < 0.0 {
            return invalid("gestures.tap_threshold_px must be >= 0");
        }
        if !self.swipe_threshold_px.is_finite() || self.swipe_threshold_px <= 0.0 {
            return invalid("gestures.swipe_threshold_px must be > 0");
        }
        if self.swipe_threshold_px < self.tap_threshold_px {
            return invalid("gestures.swipe_threshold_px must be >= gestures.tap_threshold_px");
        }
        if !self.pinch_threshold.is_finite() || self.pinch_threshold <= 0.0 {
            return invalid("gestures.pinch_threshold must be > 0");
        }
        if !self.rotation_threshold_deg.is_finite()
            || self.rotation_threshold_deg <= 0.0
            || self.rotation_threshold_deg >= 180.0
        {
            return invalid("gestures.rotation_threshold_deg must be in (0, 180)");
        }
        if self.long_press_delay_ms == 0 {
            return invalid("gestures.long_press_delay_ms must be > 0");
        }
        if self.multi_tap_window_ms == 0 {
            return invalid("gestures.multi_tap_window_ms must be > 0");
        }
        if self.tap_max_duration_ms == 0 {
            return invalid("gestures.tap_max_duration_ms must be > 0");
        }
        if !self.dejitter_radius_px.is_finite() || self.dejitter_radius_px < 0.0 {
            return invalid("gestures.dejitter_radius_px must be >= 0");
        }
        if self.dejitter_radius_px >= self.tap_threshold_px && self.dejitter_radius_px > 0.0 {
            return invalid("gestures.dejitter_radius_px must be < gestures.tap_threshold_px");
        }
        Ok(())
    }
}

fn invalid(message: &str) -> Result<(), ConfigError> {
    Err(ConfigError::Invalid(message.to_string()))
}
