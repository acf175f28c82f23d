//! High-level PTZ controller.
//!
//! Composes the backend capability, the motion sequencer, configuration,
//! and preset storage into the public movement API. Movement methods block
//! the calling thread for roughly the hold duration and are serialized by
//! the sequencer's lock; management methods (`find_camera`, presets) take
//! `&mut self`.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::backend::{ControlBackend, CTRL_ZOOM_ABSOLUTE};
use crate::config::Config;
use crate::discovery;
use crate::error::Result;
use crate::motion::MotionSequencer;
use crate::position::{PositionEstimate, ZOOM_DEFAULT};
use crate::presets::PresetStore;
use crate::verify::{FrameSource, MotionVerifier};

/// Displacements below this many speed-seconds are not worth a seek move.
const MIN_SEEK: f64 = 0.01;

/// Construction options for [`PtzController`].
#[derive(Debug, Default)]
pub struct ControllerOptions {
    /// Device override; wins over the configured device.
    pub device: Option<String>,
    /// Config file location; defaults to `~/.swivel/config.json`.
    pub config_path: Option<PathBuf>,
    /// Preset file location; defaults to `~/.swivel/presets.json`.
    pub presets_path: Option<PathBuf>,
}

/// High-level controller for a velocity-driven PTZ camera.
pub struct PtzController {
    backend: Arc<dyn ControlBackend>,
    sequencer: MotionSequencer,
    config: Config,
    config_path: PathBuf,
    presets: PresetStore,
}

impl PtzController {
    /// Create a controller with default config/preset locations.
    pub fn new(backend: Arc<dyn ControlBackend>) -> Result<Self> {
        Self::with_options(backend, ControllerOptions::default())
    }

    /// Create a controller with explicit options.
    pub fn with_options(
        backend: Arc<dyn ControlBackend>,
        options: ControllerOptions,
    ) -> Result<Self> {
        let config_path = options.config_path.unwrap_or_else(Config::default_path);
        let config = Config::load(&config_path)?;
        let presets_path = options.presets_path.unwrap_or_else(PresetStore::default_path);
        let presets = PresetStore::load(presets_path)?;

        let device = options.device.unwrap_or_else(|| config.device.clone());
        let sequencer = MotionSequencer::new(backend.clone(), device);

        Ok(Self {
            backend,
            sequencer,
            config,
            config_path,
            presets,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The device commands are issued against.
    pub fn device(&self) -> String {
        self.sequencer.device()
    }

    /// Configured default hold duration for directional moves.
    pub fn default_duration(&self) -> Duration {
        self.config.move_duration()
    }

    /// Snapshot of the current position estimate.
    pub fn position(&self) -> PositionEstimate {
        self.sequencer.position()
    }

    // --- Motion verification ---

    /// Attach a frame source for automatic motion verification.
    ///
    /// Once attached, every pan/tilt command compares frames captured
    /// before and after the move; a move with no detectable shift records
    /// the current estimate as a mechanical limit.
    pub fn attach_video(&self, source: Box<dyn FrameSource>) {
        self.sequencer.attach_verifier(MotionVerifier::with_threshold(
            source,
            self.config.shift_threshold,
        ));
    }

    /// Attach a pre-built verifier.
    pub fn attach_verifier(&self, verifier: MotionVerifier) {
        self.sequencer.attach_verifier(verifier);
    }

    /// Detach the verifier; moves are no longer verified.
    pub fn detach_verifier(&self) {
        self.sequencer.detach_verifier();
    }

    /// Whether a verifier is attached.
    pub fn has_verifier(&self) -> bool {
        self.sequencer.has_verifier()
    }

    // --- Movement ---

    /// Pan left for `duration`. Returns whether the camera moved.
    pub fn pan_left(&self, duration: Duration) -> Result<bool> {
        self.sequencer.pan(-self.config.pan_speed, duration)
    }

    /// Pan right for `duration`. Returns whether the camera moved.
    pub fn pan_right(&self, duration: Duration) -> Result<bool> {
        self.sequencer.pan(self.config.pan_speed, duration)
    }

    /// Tilt up for `duration`. Returns whether the camera moved.
    pub fn tilt_up(&self, duration: Duration) -> Result<bool> {
        self.sequencer.tilt(self.config.tilt_speed, duration)
    }

    /// Tilt down for `duration`. Returns whether the camera moved.
    pub fn tilt_down(&self, duration: Duration) -> Result<bool> {
        self.sequencer.tilt(-self.config.tilt_speed, duration)
    }

    /// Combined pan + tilt move. Returns `(pan_moved, tilt_moved)`.
    pub fn move_by(
        &self,
        pan_dir: i32,
        tilt_dir: i32,
        duration: Duration,
    ) -> Result<(bool, bool)> {
        self.sequencer.combined_move(pan_dir, tilt_dir, duration)
    }

    /// Combined pan + tilt + zoom move. Returns `(pan_moved, tilt_moved)`.
    pub fn move_with_zoom(
        &self,
        pan_dir: i32,
        tilt_dir: i32,
        zoom_target: i32,
        duration: Duration,
    ) -> Result<(bool, bool)> {
        self.sequencer
            .combined_move_with_zoom(pan_dir, tilt_dir, zoom_target, duration)
    }

    /// Set zoom to an absolute value, clamped to the hardware range.
    pub fn zoom_to(&self, value: i32) -> Result<i32> {
        self.sequencer.zoom_absolute(value)
    }

    /// Adjust zoom by a delta from the current estimate.
    pub fn zoom_by(&self, delta: i32) -> Result<i32> {
        self.sequencer.zoom_relative(delta)
    }

    /// Zoom in by the configured step.
    pub fn zoom_in(&self) -> Result<i32> {
        self.sequencer.zoom_relative(self.config.zoom_step)
    }

    /// Zoom out by the configured step.
    pub fn zoom_out(&self) -> Result<i32> {
        self.sequencer.zoom_relative(-self.config.zoom_step)
    }

    /// Return the camera to its estimated origin and default zoom.
    ///
    /// Re-homes by driving the negated pan/tilt totals, then resets the
    /// estimate to the origin. Discovered limits are preserved.
    pub fn reset_position(&self) -> Result<()> {
        let current = self.sequencer.position();
        if current.pan.abs() > MIN_SEEK {
            let direction = if current.pan > 0.0 { -1 } else { 1 };
            self.sequencer
                .pan(direction, Duration::from_secs_f64(current.pan.abs()))?;
        }
        if current.tilt.abs() > MIN_SEEK {
            let direction = if current.tilt > 0.0 { -1 } else { 1 };
            self.sequencer
                .tilt(direction, Duration::from_secs_f64(current.tilt.abs()))?;
        }
        self.sequencer.zoom_absolute(ZOOM_DEFAULT)?;
        self.sequencer.reset_estimate();
        Ok(())
    }

    /// Immediately zero both axis speeds.
    ///
    /// Waits on the sequencer lock, so a command that is mid-hold finishes
    /// its own bracket first; this does not cancel an in-flight hold.
    pub fn stop(&self) -> Result<()> {
        self.sequencer.stop()
    }

    // --- Presets ---

    /// Save the current estimate as a named preset.
    pub fn save_preset(&mut self, name: &str) -> Result<()> {
        let position = self.sequencer.position();
        self.presets.save_preset(name, &position)
    }

    /// Drive the camera toward a named preset.
    ///
    /// Pan and tilt seek the stored estimate via timed unit-speed moves
    /// (the displacement in speed-seconds is the hold duration), then zoom
    /// is applied. Returns `Ok(false)` when the preset does not exist.
    pub fn recall_preset(&mut self, name: &str) -> Result<bool> {
        let Some(record) = self.presets.get(name) else {
            return Ok(false);
        };

        let current = self.sequencer.position();
        let pan_delta = record.pan - current.pan;
        if pan_delta.abs() > MIN_SEEK {
            let direction = if pan_delta > 0.0 { 1 } else { -1 };
            self.sequencer
                .pan(direction, Duration::from_secs_f64(pan_delta.abs()))?;
        }
        let tilt_delta = record.tilt - current.tilt;
        if tilt_delta.abs() > MIN_SEEK {
            let direction = if tilt_delta > 0.0 { 1 } else { -1 };
            self.sequencer
                .tilt(direction, Duration::from_secs_f64(tilt_delta.abs()))?;
        }
        self.sequencer.zoom_absolute(record.zoom)?;
        Ok(true)
    }

    /// Delete a named preset. Returns whether it existed.
    pub fn delete_preset(&mut self, name: &str) -> Result<bool> {
        self.presets.delete(name)
    }

    /// All preset names in sorted order.
    pub fn list_presets(&self) -> Vec<String> {
        self.presets.names()
    }

    // --- Discovery / setup ---

    /// Auto-detect a PTZ-capable device.
    ///
    /// On success the controller switches to the found device and persists
    /// it to the config file.
    pub fn find_camera(&mut self) -> Result<Option<String>> {
        let Some(device) = discovery::find_ptz_device(self.backend.as_ref()) else {
            return Ok(None);
        };
        log::info!("found PTZ-capable device at {device}");
        self.sequencer.set_device(&device);
        self.config.device = device.clone();
        self.config.save(&self.config_path)?;
        Ok(Some(device))
    }

    /// Whether the active device supports the velocity PTZ control set.
    pub fn has_ptz_support(&self) -> bool {
        discovery::has_ptz_support(self.backend.as_ref(), &self.device())
    }

    /// Listing of all video devices on the system.
    pub fn list_devices(&self) -> Result<String> {
        self.backend.list_devices()
    }

    /// Listing of the controls the active device exposes.
    pub fn list_controls(&self) -> Result<String> {
        self.backend.list_controls(&self.device())
    }

    /// Read the current zoom value back from the hardware.
    pub fn get_zoom(&self) -> Result<i64> {
        self.backend
            .get_control(&self.device(), CTRL_ZOOM_ABSOLUTE)
    }
}
