//! TOML-based playback configuration and preset definitions.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::sim::scheduler::DEFAULT_REFRESH_INTERVAL;

/// Clock step sizes offered by interactive hosts, in seconds.
pub const STEP_SIZES: &[u64] = &[1, 10, 60, 600, 3600];

/// Top-level replay configuration parsed from TOML.
///
/// All fields have defaults matching the baseline preset. Load from TOML
/// with [`ReplayConfig::from_toml_file`] or use [`ReplayConfig::baseline`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplayConfig {
    /// Playback pacing.
    #[serde(default)]
    pub playback: PlaybackConfig,
}

/// Playback pacing parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlaybackConfig {
    /// Clock advance per tick when no event is due (must be > 0).
    pub seconds_per_step: u64,
    /// Wall-clock delay between advancing ticks.
    pub step_delay_ms: u64,
    /// Forced notification period while fast-seeking (must be > 0).
    pub refresh_interval: usize,
    /// Speed slider (0–100); overrides `step_delay_ms` when set.
    pub speed_percent: Option<u8>,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            seconds_per_step: 60,
            step_delay_ms: 250,
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            speed_percent: None,
        }
    }
}

impl PlaybackConfig {
    /// Effective delay between advancing ticks.
    pub fn step_delay(&self) -> Duration {
        match self.speed_percent {
            Some(p) => Duration::from_millis(1000 - u64::from(p.min(100)) * 10),
            None => Duration::from_millis(self.step_delay_ms),
        }
    }
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"playback.seconds_per_step"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ReplayConfig {
    /// One-minute steps at a comfortable pace.
    pub fn baseline() -> Self {
        Self::default()
    }

    /// Hour-sized steps for skimming a multi-day log.
    pub fn hourly() -> Self {
        Self {
            playback: PlaybackConfig {
                seconds_per_step: 3600,
                step_delay_ms: 100,
                ..PlaybackConfig::default()
            },
        }
    }

    /// Second-by-second stepping, slowed down.
    pub fn detailed() -> Self {
        Self {
            playback: PlaybackConfig {
                seconds_per_step: 1,
                step_delay_ms: 500,
                ..PlaybackConfig::default()
            },
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = &["baseline", "hourly", "detailed"];

    /// Loads a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "baseline" => Ok(Self::baseline()),
            "hourly" => Ok(Self::hourly()),
            "detailed" => Ok(Self::detailed()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let p = &self.playback;

        if p.seconds_per_step == 0 {
            errors.push(ConfigError {
                field: "playback.seconds_per_step".into(),
                message: "must be > 0".into(),
            });
        }
        if p.refresh_interval == 0 {
            errors.push(ConfigError {
                field: "playback.refresh_interval".into(),
                message: "must be > 0".into(),
            });
        }
        if p.step_delay_ms > 60_000 {
            errors.push(ConfigError {
                field: "playback.step_delay_ms".into(),
                message: "must be <= 60000".into(),
            });
        }
        if let Some(percent) = p.speed_percent {
            if percent > 100 {
                errors.push(ConfigError {
                    field: "playback.speed_percent".into(),
                    message: format!("must be in [0, 100], got {percent}"),
                });
            }
        }

        errors
    }
}
