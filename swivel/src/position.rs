//! Dead-reckoned position estimation for velocity-only PTZ actuators.
//!
//! The actuator has no pan/tilt position readback, only speed controls, so
//! position is estimated by accumulating commanded displacement in
//! speed-seconds (signed speed times hold duration). Mechanical range
//! limits are discovered dynamically: the first time a verified move in a
//! direction produces no frame shift, the current estimate is recorded as
//! that direction's limit.

use std::fmt;
use std::time::Duration;

/// Minimum zoom value accepted by the actuator.
pub const ZOOM_MIN: i32 = 100;
/// Maximum zoom value accepted by the actuator.
pub const ZOOM_MAX: i32 = 500;
/// Zoom value a freshly homed camera sits at.
pub const ZOOM_DEFAULT: i32 = ZOOM_MIN;

/// Estimated camera pose plus discovered mechanical limits.
///
/// Pan and tilt are in speed-seconds relative to wherever the camera was
/// pointing when the estimate was created; zoom is the absolute hardware
/// value. Limits start undiscovered and are written exactly once per
/// direction; a later verified move never overwrites them, only
/// [`PositionEstimate::clear_limits`] does.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionEstimate {
    /// Accumulated pan displacement in speed-seconds.
    pub pan: f64,
    /// Accumulated tilt displacement in speed-seconds.
    pub tilt: f64,
    /// Absolute zoom value, always within `ZOOM_MIN..=ZOOM_MAX`.
    pub zoom: i32,
    /// Leftmost reachable pan, if discovered.
    pub pan_min: Option<f64>,
    /// Rightmost reachable pan, if discovered.
    pub pan_max: Option<f64>,
    /// Lowest reachable tilt, if discovered.
    pub tilt_min: Option<f64>,
    /// Highest reachable tilt, if discovered.
    pub tilt_max: Option<f64>,
}

impl Default for PositionEstimate {
    fn default() -> Self {
        Self {
            pan: 0.0,
            tilt: 0.0,
            zoom: ZOOM_DEFAULT,
            pan_min: None,
            pan_max: None,
            tilt_min: None,
            tilt_max: None,
        }
    }
}

impl PositionEstimate {
    /// Estimate at the origin with no limits discovered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update the pan estimate after a move command.
    ///
    /// A `moved = true` update accumulates `speed * duration`. A
    /// `moved = false` update records the current pan as the limit in the
    /// commanded direction instead, leaving the estimate untouched; an
    /// already-discovered limit is never overwritten. Zero-speed updates
    /// record nothing.
    pub fn update_pan(&mut self, speed: i32, duration: Duration, moved: bool) {
        if moved {
            self.pan += f64::from(speed) * duration.as_secs_f64();
        } else if speed < 0 && self.pan_min.is_none() {
            self.pan_min = Some(self.pan);
        } else if speed > 0 && self.pan_max.is_none() {
            self.pan_max = Some(self.pan);
        }
    }

    /// Update the tilt estimate after a move command.
    ///
    /// Same contract as [`PositionEstimate::update_pan`]; positive speed is
    /// up, negative is down.
    pub fn update_tilt(&mut self, speed: i32, duration: Duration, moved: bool) {
        if moved {
            self.tilt += f64::from(speed) * duration.as_secs_f64();
        } else if speed < 0 && self.tilt_min.is_none() {
            self.tilt_min = Some(self.tilt);
        } else if speed > 0 && self.tilt_max.is_none() {
            self.tilt_max = Some(self.tilt);
        }
    }

    /// Set the zoom estimate to an absolute value, clamped to the hardware
    /// range.
    pub fn update_zoom(&mut self, value: i32) {
        self.zoom = value.clamp(ZOOM_MIN, ZOOM_MAX);
    }

    /// True until the left pan limit has been reached.
    pub fn can_pan_left(&self) -> bool {
        self.pan_min.is_none_or(|min| self.pan > min)
    }

    /// True until the right pan limit has been reached.
    pub fn can_pan_right(&self) -> bool {
        self.pan_max.is_none_or(|max| self.pan < max)
    }

    /// True until the upper tilt limit has been reached.
    pub fn can_tilt_up(&self) -> bool {
        self.tilt_max.is_none_or(|max| self.tilt < max)
    }

    /// True until the lower tilt limit has been reached.
    pub fn can_tilt_down(&self) -> bool {
        self.tilt_min.is_none_or(|min| self.tilt > min)
    }

    /// Euclidean pan/tilt distance to another estimate. Zoom is ignored.
    pub fn distance_to(&self, other: &PositionEstimate) -> f64 {
        let dp = self.pan - other.pan;
        let dt = self.tilt - other.tilt;
        (dp * dp + dt * dt).sqrt()
    }

    /// Reset pan/tilt to the origin and zoom to its default. Discovered
    /// limits are preserved.
    pub fn reset(&mut self) {
        self.pan = 0.0;
        self.tilt = 0.0;
        self.zoom = ZOOM_DEFAULT;
    }

    /// Forget all discovered limits.
    pub fn clear_limits(&mut self) {
        self.pan_min = None;
        self.pan_max = None;
        self.tilt_min = None;
        self.tilt_max = None;
    }
}

impl fmt::Display for PositionEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn bound(value: Option<f64>) -> String {
            value.map_or_else(|| "?".to_string(), |v| format!("{v:.1}"))
        }
        write!(
            f,
            "pan={:.1} [{}..{}], tilt={:.1} [{}..{}], zoom={}",
            self.pan,
            bound(self.pan_min),
            bound(self.pan_max),
            self.tilt,
            bound(self.tilt_min),
            bound(self.tilt_max),
            self.zoom
        )
    }
}
