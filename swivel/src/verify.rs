//! Vision-based move verification.
//!
//! Answers "did the camera actually move, and which way?" by comparing
//! grayscale frames captured before and after a command. The raw shift
//! measurement comes from [`shiftmeter::phase_correlate`]; this module adds
//! the camera sign convention and the pixel threshold that turns a raw
//! `(dx, dy)` into per-axis moved/blocked classifications.
//!
//! Sign convention: a camera pan **left** shifts scene content **right**,
//! giving positive `dx`; a camera tilt **up** shifts scene content
//! **down**, giving positive `dy`.

use ndarray::Array2;

use crate::error::Result;

/// Default minimum pixel shift for a move to count as real motion.
pub const DEFAULT_SHIFT_THRESHOLD: f64 = 3.0;

/// Capability for grabbing measurement frames.
///
/// Implementations must return a *fresh* frame: any device-level buffering
/// has to be flushed before the returned frame is read, otherwise the
/// verifier compares the scene against a stale image and reports motion
/// that already happened. Implementations sharing the capture device with
/// other consumers (e.g. a live preview) must serialize their own access.
pub trait FrameSource: Send {
    /// Capture one grayscale frame, erroring when none is available.
    fn grab_grayscale(&mut self) -> Result<Array2<f64>>;
}

/// A classified shift measurement between a before/after frame pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShiftMeasurement {
    /// Horizontal content motion in pixels (positive = camera panned left).
    pub dx: f64,
    /// Vertical content motion in pixels (positive = camera tilted up).
    pub dy: f64,
    /// Correlation peak response in [0, 1].
    pub confidence: f64,
    threshold: f64,
}

impl ShiftMeasurement {
    fn new(shift: shiftmeter::Shift, threshold: f64) -> Self {
        Self {
            dx: shift.dx,
            dy: shift.dy,
            confidence: shift.response,
            threshold,
        }
    }

    /// The camera moved along the pan axis, in either direction.
    pub fn moved_horizontally(&self) -> bool {
        self.dx.abs() > self.threshold
    }

    /// The camera moved along the tilt axis, in either direction.
    pub fn moved_vertically(&self) -> bool {
        self.dy.abs() > self.threshold
    }

    /// The camera moved along either axis.
    pub fn moved(&self) -> bool {
        self.moved_horizontally() || self.moved_vertically()
    }

    /// The camera panned left (scene content shifted right).
    pub fn did_pan_left(&self) -> bool {
        self.dx > self.threshold
    }

    /// The camera panned right (scene content shifted left).
    pub fn did_pan_right(&self) -> bool {
        self.dx < -self.threshold
    }

    /// The camera tilted up (scene content shifted down).
    pub fn did_tilt_up(&self) -> bool {
        self.dy > self.threshold
    }

    /// The camera tilted down (scene content shifted up).
    pub fn did_tilt_down(&self) -> bool {
        self.dy < -self.threshold
    }
}

/// Verifies camera movement by comparing frames around a command.
///
/// The verifier is an optional collaborator of the motion sequencer: when
/// attached, every pan/tilt command is bracketed with frame grabs and the
/// measured shift decides whether the move counted. Capture failures are
/// reported as errors and must be treated by callers as "assume moved",
/// never as a discovered limit.
pub struct MotionVerifier {
    source: Box<dyn FrameSource>,
    shift_threshold: f64,
}

impl MotionVerifier {
    /// Create a verifier with the default shift threshold.
    pub fn new(source: Box<dyn FrameSource>) -> Self {
        Self::with_threshold(source, DEFAULT_SHIFT_THRESHOLD)
    }

    /// Create a verifier with a custom shift threshold in pixels.
    pub fn with_threshold(source: Box<dyn FrameSource>, shift_threshold: f64) -> Self {
        Self {
            source,
            shift_threshold,
        }
    }

    /// The configured minimum pixel shift.
    pub fn shift_threshold(&self) -> f64 {
        self.shift_threshold
    }

    /// Capture a fresh measurement frame.
    pub fn capture_frame(&mut self) -> Result<Array2<f64>> {
        self.source.grab_grayscale()
    }

    /// Measure and classify the shift between two frames.
    pub fn measure(
        &self,
        before: &Array2<f64>,
        after: &Array2<f64>,
    ) -> Result<ShiftMeasurement> {
        let shift = shiftmeter::phase_correlate(before.view(), after.view())?;
        Ok(ShiftMeasurement::new(shift, self.shift_threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn measurement(dx: f64, dy: f64) -> ShiftMeasurement {
        ShiftMeasurement {
            dx,
            dy,
            confidence: 1.0,
            threshold: DEFAULT_SHIFT_THRESHOLD,
        }
    }

    #[test]
    fn test_small_shifts_classify_as_no_motion() {
        let m = measurement(1.5, -2.0);
        assert!(!m.moved_horizontally());
        assert!(!m.moved_vertically());
        assert!(!m.moved());
    }

    #[test]
    fn test_horizontal_shift_classifies_pan_only() {
        let m = measurement(8.0, 0.5);
        assert!(m.moved_horizontally());
        assert!(!m.moved_vertically());
        assert!(m.moved());
    }

    #[test]
    fn test_pan_direction_follows_sign_convention() {
        // Content moved right => camera panned left.
        assert!(measurement(8.0, 0.0).did_pan_left());
        assert!(!measurement(8.0, 0.0).did_pan_right());

        // Content moved left => camera panned right.
        assert!(measurement(-8.0, 0.0).did_pan_right());
        assert!(!measurement(-8.0, 0.0).did_pan_left());
    }

    #[test]
    fn test_tilt_direction_follows_sign_convention() {
        // Content moved down => camera tilted up.
        assert!(measurement(0.0, 6.0).did_tilt_up());
        assert!(!measurement(0.0, 6.0).did_tilt_down());

        assert!(measurement(0.0, -6.0).did_tilt_down());
        assert!(!measurement(0.0, -6.0).did_tilt_up());
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let m = measurement(DEFAULT_SHIFT_THRESHOLD, DEFAULT_SHIFT_THRESHOLD);
        assert!(!m.moved_horizontally());
        assert!(!m.moved_vertically());
    }
}
