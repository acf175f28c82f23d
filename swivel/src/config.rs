//! Configuration load/save.
//!
//! Settings live in `~/.swivel/config.json` by default. A missing file is
//! not an error: defaults apply and the file is created on first save.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Device used when nothing is configured and discovery has not run.
pub const DEFAULT_DEVICE: &str = "/dev/video0";

/// Directory holding this crate's persisted state (config and presets).
///
/// `~/.swivel`, falling back to a relative `.swivel` when `HOME` is unset.
pub fn default_dir() -> PathBuf {
    match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home).join(".swivel"),
        Err(_) => PathBuf::from(".swivel"),
    }
}

/// User-tunable movement settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// V4L2 device path commands are issued against.
    pub device: String,
    /// Pan speed magnitude used by the directional helpers.
    pub pan_speed: i32,
    /// Tilt speed magnitude used by the directional helpers.
    pub tilt_speed: i32,
    /// Zoom delta applied per zoom-in/zoom-out step.
    pub zoom_step: i32,
    /// Default hold duration in seconds for directional moves.
    pub move_duration: f64,
    /// Minimum pixel shift for a verified move to count as motion.
    pub shift_threshold: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            device: DEFAULT_DEVICE.to_string(),
            pan_speed: 1,
            tilt_speed: 1,
            zoom_step: 10,
            move_duration: 0.1,
            shift_threshold: crate::verify::DEFAULT_SHIFT_THRESHOLD,
        }
    }
}

impl Config {
    /// Default config file location.
    pub fn default_path() -> PathBuf {
        default_dir().join("config.json")
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Save to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Default hold duration as a [`std::time::Duration`].
    pub fn move_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(self.move_duration.max(0.0))
    }
}
