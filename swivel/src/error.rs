use thiserror::Error;

/// Errors produced by PTZ control operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Actuator control write/read failed. Fatal to the current command:
    /// the stop write is still attempted, no position update occurs, and
    /// the error propagates to the caller.
    #[error("backend error on {device}: {message}")]
    Backend {
        /// Device the operation targeted.
        device: String,
        /// Underlying failure description.
        message: String,
    },

    /// No usable video frame could be captured for motion verification.
    /// Non-fatal: moves degrade to optimistic "assume moved" handling and
    /// never record a limit from a missing frame.
    #[error("frame unavailable: {0}")]
    FrameUnavailable(String),

    /// Shift measurement between two captured frames failed.
    #[error("shift measurement failed: {0}")]
    Shift(#[from] shiftmeter::ShiftError),

    /// Unexpected output from an external control utility.
    #[error("unexpected control utility output: {0}")]
    Parse(String),

    /// Persistence I/O failure (configuration or presets).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Malformed persisted JSON (configuration or presets).
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Result type for PTZ control operations.
pub type Result<T> = std::result::Result<T, Error>;
