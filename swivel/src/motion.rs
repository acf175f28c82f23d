//! Atomic speed-command sequencing.
//!
//! The actuator only understands "set a signed speed, wait, set the speed
//! back to zero", so every move is a start/hold/stop bracket against the
//! backend. One mutex serializes the whole bracket (before-frame grab,
//! start writes, hold, stop writes, shift measurement, estimate update)
//! so two commands can never interleave and a second command's start is
//! never undone by the first command's delayed stop.

use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use ndarray::Array2;

use crate::backend::{
    ControlBackend, CTRL_PAN_SPEED, CTRL_TILT_SPEED, CTRL_ZOOM_ABSOLUTE,
};
use crate::error::Result;
use crate::position::{PositionEstimate, ZOOM_MAX, ZOOM_MIN};
use crate::verify::{MotionVerifier, ShiftMeasurement};

/// One transient velocity command.
///
/// `None` for an axis means the axis is not commanded at all (its control
/// is not written); `Some(0)` writes an explicit zero speed. Commanded
/// speeds are clamped to {-1, 0, 1} and zoom targets to the hardware range
/// before anything reaches the backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveCommand {
    /// Signed pan speed, positive = right.
    pub pan_speed: Option<i32>,
    /// Signed tilt speed, positive = up.
    pub tilt_speed: Option<i32>,
    /// How long to hold the commanded speeds.
    pub duration: Duration,
    /// Absolute zoom target written alongside the speeds.
    pub zoom_target: Option<i32>,
}

impl MoveCommand {
    /// Pan-only command.
    pub fn pan(direction: i32, duration: Duration) -> Self {
        Self {
            pan_speed: Some(direction),
            tilt_speed: None,
            duration,
            zoom_target: None,
        }
    }

    /// Tilt-only command.
    pub fn tilt(direction: i32, duration: Duration) -> Self {
        Self {
            pan_speed: None,
            tilt_speed: Some(direction),
            duration,
            zoom_target: None,
        }
    }

    /// Simultaneous pan + tilt command.
    pub fn combined(pan_dir: i32, tilt_dir: i32, duration: Duration) -> Self {
        Self {
            pan_speed: Some(pan_dir),
            tilt_speed: Some(tilt_dir),
            duration,
            zoom_target: None,
        }
    }

    /// Simultaneous pan + tilt + zoom command.
    pub fn combined_with_zoom(
        pan_dir: i32,
        tilt_dir: i32,
        zoom_target: i32,
        duration: Duration,
    ) -> Self {
        Self {
            pan_speed: Some(pan_dir),
            tilt_speed: Some(tilt_dir),
            duration,
            zoom_target: Some(zoom_target),
        }
    }
}

fn clamp_speed(value: i32) -> i32 {
    value.clamp(-1, 1)
}

fn clamp_zoom(value: i32) -> i32 {
    value.clamp(ZOOM_MIN, ZOOM_MAX)
}

/// State the sequencer mutates under its lock.
struct SequencerState {
    device: String,
    position: PositionEstimate,
    verifier: Option<MotionVerifier>,
}

/// Executes atomic velocity commands and maintains the position estimate.
///
/// All methods take `&self`; the internal mutex makes the sequencer safe to
/// share across threads, with commands executing strictly one at a time.
/// The hold is a real blocking sleep; callers needing responsiveness must
/// run the sequencer on a dedicated worker thread.
pub struct MotionSequencer {
    backend: Arc<dyn ControlBackend>,
    state: Mutex<SequencerState>,
}

impl MotionSequencer {
    /// Create a sequencer for one device with a fresh position estimate.
    pub fn new(backend: Arc<dyn ControlBackend>, device: impl Into<String>) -> Self {
        Self {
            backend,
            state: Mutex::new(SequencerState {
                device: device.into(),
                position: PositionEstimate::new(),
                verifier: None,
            }),
        }
    }

    /// Attach a verifier; subsequent moves are bracketed with frame grabs
    /// and blocked moves record mechanical limits.
    pub fn attach_verifier(&self, verifier: MotionVerifier) {
        self.state.lock().unwrap().verifier = Some(verifier);
    }

    /// Detach the verifier; moves fall back to optimistic dead reckoning.
    pub fn detach_verifier(&self) {
        self.state.lock().unwrap().verifier = None;
    }

    /// Whether a verifier is currently attached.
    pub fn has_verifier(&self) -> bool {
        self.state.lock().unwrap().verifier.is_some()
    }

    /// Snapshot of the current position estimate.
    pub fn position(&self) -> PositionEstimate {
        self.state.lock().unwrap().position
    }

    /// Reset the estimate to the origin, preserving discovered limits.
    pub fn reset_estimate(&self) {
        self.state.lock().unwrap().position.reset();
    }

    /// Forget all discovered limits.
    pub fn clear_limits(&self) {
        self.state.lock().unwrap().position.clear_limits();
    }

    /// The device commands are currently issued against.
    pub fn device(&self) -> String {
        self.state.lock().unwrap().device.clone()
    }

    /// Point the sequencer at a different device.
    pub fn set_device(&self, device: impl Into<String>) {
        self.state.lock().unwrap().device = device.into();
    }

    /// Pan at `direction` in {-1, 0, 1} for `duration`.
    ///
    /// Returns whether the camera actually moved (always `true` without a
    /// verifier).
    pub fn pan(&self, direction: i32, duration: Duration) -> Result<bool> {
        self.execute(MoveCommand::pan(direction, duration))
            .map(|(pan_moved, _)| pan_moved)
    }

    /// Tilt at `direction` in {-1, 0, 1} for `duration`.
    pub fn tilt(&self, direction: i32, duration: Duration) -> Result<bool> {
        self.execute(MoveCommand::tilt(direction, duration))
            .map(|(_, tilt_moved)| tilt_moved)
    }

    /// Simultaneous pan + tilt. Returns `(pan_moved, tilt_moved)`.
    pub fn combined_move(
        &self,
        pan_dir: i32,
        tilt_dir: i32,
        duration: Duration,
    ) -> Result<(bool, bool)> {
        self.execute(MoveCommand::combined(pan_dir, tilt_dir, duration))
    }

    /// Simultaneous pan + tilt + zoom. Returns `(pan_moved, tilt_moved)`.
    pub fn combined_move_with_zoom(
        &self,
        pan_dir: i32,
        tilt_dir: i32,
        zoom_target: i32,
        duration: Duration,
    ) -> Result<(bool, bool)> {
        self.execute(MoveCommand::combined_with_zoom(
            pan_dir,
            tilt_dir,
            zoom_target,
            duration,
        ))
    }

    /// Set zoom to an absolute value, clamped to the hardware range.
    ///
    /// Zoom has no verification; the write is assumed to succeed whenever
    /// the backend accepts it. Returns the clamped value applied.
    pub fn zoom_absolute(&self, value: i32) -> Result<i32> {
        let mut state = self.state.lock().unwrap();
        let value = clamp_zoom(value);
        self.backend
            .set_control(&state.device, CTRL_ZOOM_ABSOLUTE, i64::from(value))?;
        state.position.update_zoom(value);
        Ok(value)
    }

    /// Adjust zoom by a delta from the current estimate.
    pub fn zoom_relative(&self, delta: i32) -> Result<i32> {
        let mut state = self.state.lock().unwrap();
        let value = clamp_zoom(state.position.zoom + delta);
        self.backend
            .set_control(&state.device, CTRL_ZOOM_ABSOLUTE, i64::from(value))?;
        state.position.update_zoom(value);
        Ok(value)
    }

    /// Zero both axis speeds.
    ///
    /// Takes the same lock as command execution, so a stop issued while a
    /// command is mid-hold lands only after that command's own stop writes.
    /// An in-flight hold is therefore not cancelled; there is no mid-hold
    /// cancellation anywhere in this crate.
    pub fn stop(&self) -> Result<()> {
        let state = self.state.lock().unwrap();
        self.backend
            .set_control(&state.device, CTRL_PAN_SPEED, 0)?;
        self.backend
            .set_control(&state.device, CTRL_TILT_SPEED, 0)?;
        Ok(())
    }

    /// Execute one atomic command: before-frame, start, hold, stop,
    /// measure, update.
    pub fn execute(&self, command: MoveCommand) -> Result<(bool, bool)> {
        let mut state = self.state.lock().unwrap();

        let pan_speed = command.pan_speed.map(clamp_speed);
        let tilt_speed = command.tilt_speed.map(clamp_speed);
        let zoom_target = command.zoom_target.map(clamp_zoom);
        let device = state.device.clone();

        log::debug!(
            "executing move on {device}: pan={pan_speed:?} tilt={tilt_speed:?} \
             zoom={zoom_target:?} hold={:?}",
            command.duration
        );

        let before = Self::capture_before(&mut state);

        let held = self.start_and_hold(&device, pan_speed, tilt_speed, zoom_target, command.duration);

        // The stop writes are the guaranteed release for the speed
        // controls: attempted for every commanded axis even when the start
        // writes or the hold failed.
        let stop_pan =
            pan_speed.map(|_| self.backend.set_control(&device, CTRL_PAN_SPEED, 0));
        let stop_tilt =
            tilt_speed.map(|_| self.backend.set_control(&device, CTRL_TILT_SPEED, 0));

        held?;
        if let Some(result) = stop_pan {
            result?;
        }
        if let Some(result) = stop_tilt {
            result?;
        }

        let shift = Self::measure_after(&mut state, before);
        let pan_moved = shift.map_or(true, |m| m.moved_horizontally());
        let tilt_moved = shift.map_or(true, |m| m.moved_vertically());

        if let Some(speed) = pan_speed {
            state.position.update_pan(speed, command.duration, pan_moved);
            if !pan_moved && speed != 0 {
                log::info!(
                    "pan blocked at {:.2}: limit recorded for direction {speed}",
                    state.position.pan
                );
            }
        }
        if let Some(speed) = tilt_speed {
            state.position.update_tilt(speed, command.duration, tilt_moved);
            if !tilt_moved && speed != 0 {
                log::info!(
                    "tilt blocked at {:.2}: limit recorded for direction {speed}",
                    state.position.tilt
                );
            }
        }
        if let Some(zoom) = zoom_target {
            state.position.update_zoom(zoom);
        }

        Ok((pan_moved, tilt_moved))
    }

    /// Write the commanded speeds/zoom and hold for the duration.
    fn start_and_hold(
        &self,
        device: &str,
        pan_speed: Option<i32>,
        tilt_speed: Option<i32>,
        zoom_target: Option<i32>,
        duration: Duration,
    ) -> Result<()> {
        if let Some(speed) = pan_speed {
            self.backend
                .set_control(device, CTRL_PAN_SPEED, i64::from(speed))?;
        }
        if let Some(speed) = tilt_speed {
            self.backend
                .set_control(device, CTRL_TILT_SPEED, i64::from(speed))?;
        }
        if let Some(zoom) = zoom_target {
            self.backend
                .set_control(device, CTRL_ZOOM_ABSOLUTE, i64::from(zoom))?;
        }
        thread::sleep(duration);
        Ok(())
    }

    /// Grab the pre-move frame, degrading to unverified on failure.
    fn capture_before(state: &mut SequencerState) -> Option<Array2<f64>> {
        let verifier = state.verifier.as_mut()?;
        match verifier.capture_frame() {
            Ok(frame) => Some(frame),
            Err(e) => {
                log::warn!("pre-move frame unavailable, move will not be verified: {e}");
                None
            }
        }
    }

    /// Grab the post-move frame and measure the shift. `None` means the
    /// move could not be verified and must be assumed to have happened.
    fn measure_after(
        state: &mut SequencerState,
        before: Option<Array2<f64>>,
    ) -> Option<ShiftMeasurement> {
        let verifier = state.verifier.as_mut()?;
        let before = before?;
        let after = match verifier.capture_frame() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("post-move frame unavailable, assuming the move happened: {e}");
                return None;
            }
        };
        match verifier.measure(&before, &after) {
            Ok(measurement) => {
                log::debug!(
                    "measured shift dx={:.2} dy={:.2} confidence={:.3}",
                    measurement.dx,
                    measurement.dy,
                    measurement.confidence
                );
                Some(measurement)
            }
            Err(e) => {
                log::warn!("shift measurement failed, assuming the move happened: {e}");
                None
            }
        }
    }
}
