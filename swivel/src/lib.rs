//! SWIVEL - velocity-only PTZ camera control.
//!
//! Drives pan-tilt-zoom actuators that expose nothing but signed speed
//! controls and report no position. Position is dead-reckoned by
//! accumulating commanded displacement (speed times hold duration), and an
//! optional vision verifier closes the loop: frames captured before and
//! after each command are phase-correlated, a move with no detectable
//! shift records the current estimate as a mechanical limit, and the
//! discovered range persists for the controller's lifetime.
//!
//! The crate is layered bottom-up:
//! - [`backend`]: named-control capability with exec (`v4l2-ctl`) and
//!   in-process (`v4l` ioctl) implementations
//! - [`position`]: the dead-reckoning estimate and limit bookkeeping
//! - [`verify`]: frame capture capability and shift classification
//! - [`motion`]: the atomic start/hold/stop sequencer and its lock
//! - [`controller`]: the public movement API plus config, presets, and
//!   device discovery

pub mod backend;
pub mod capture;
pub mod config;
pub mod controller;
pub mod discovery;
pub mod error;
pub mod motion;
pub mod position;
pub mod presets;
pub mod verify;

pub use crate::backend::{ControlBackend, ExecBackend, UvcBackend};
pub use crate::capture::V4lFrameSource;
pub use crate::config::Config;
pub use crate::controller::{ControllerOptions, PtzController};
pub use crate::error::{Error, Result};
pub use crate::motion::{MotionSequencer, MoveCommand};
pub use crate::position::{PositionEstimate, ZOOM_DEFAULT, ZOOM_MAX, ZOOM_MIN};
pub use crate::presets::{PresetRecord, PresetStore};
pub use crate::verify::{FrameSource, MotionVerifier, ShiftMeasurement};
