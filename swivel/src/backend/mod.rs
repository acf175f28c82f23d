//! Actuator backend capability.
//!
//! Everything the motion layer needs from the hardware is a named-control
//! read/write against a V4L2 device. Two interchangeable implementations
//! are provided: [`ExecBackend`] shells out to `v4l2-ctl`, and
//! [`UvcBackend`] issues the ioctls in-process through the `v4l` crate.
//! The rest of the crate is backend-agnostic; pick one at construction.

pub mod exec;
pub mod uvc;

pub use exec::ExecBackend;
pub use uvc::UvcBackend;

use crate::error::Result;

/// Control name for the signed pan velocity, domain {-1, 0, 1}.
pub const CTRL_PAN_SPEED: &str = "pan_speed";
/// Control name for the signed tilt velocity, domain {-1, 0, 1}.
pub const CTRL_TILT_SPEED: &str = "tilt_speed";
/// Control name for the absolute zoom value.
pub const CTRL_ZOOM_ABSOLUTE: &str = "zoom_absolute";

/// Capability for issuing named-control operations against a video device.
///
/// This is the mockable boundary for testing: the sequencer and controller
/// only ever talk to the hardware through this trait.
pub trait ControlBackend: Send + Sync {
    /// Set a named control to an integer value.
    fn set_control(&self, device: &str, control: &str, value: i64) -> Result<()>;

    /// Read the current value of a named control.
    fn get_control(&self, device: &str, control: &str) -> Result<i64>;

    /// Human-readable listing of the controls a device exposes.
    ///
    /// The listing is only inspected for control-name substrings (see
    /// [`crate::discovery`]); its exact layout is backend-defined.
    fn list_controls(&self, device: &str) -> Result<String>;

    /// Human-readable listing of the video devices present on the system.
    fn list_devices(&self) -> Result<String>;
}
