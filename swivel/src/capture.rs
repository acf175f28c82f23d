//! V4L2 frame capture for motion verification.
//!
//! Provides the crate's own [`FrameSource`] implementation over a memory-
//! mapped V4L2 capture stream. Each grab drains a few stale buffers first
//! so the measurement frame reflects the current scene rather than
//! whatever was queued before the move.

use ndarray::Array2;
use v4l::buffer::Type;
use v4l::io::mmap::Stream as MmapStream;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;

use crate::error::{Error, Result};
use crate::verify::FrameSource;

/// Stale buffers drained before each measurement grab.
const FLUSH_FRAMES: usize = 3;

/// Frame source reading grayscale frames from a V4L2 capture device.
pub struct V4lFrameSource {
    device: Device,
    width: usize,
    height: usize,
    fourcc: [u8; 4],
}

impl V4lFrameSource {
    /// Open `path` and record its negotiated capture format.
    pub fn open(path: &str) -> Result<Self> {
        let device = Device::with_path(path)
            .map_err(|e| Error::FrameUnavailable(format!("failed to open {path}: {e}")))?;
        let format = device
            .format()
            .map_err(|e| Error::FrameUnavailable(format!("failed to query format: {e}")))?;

        log::debug!(
            "capture format on {path}: {}x{} {}",
            format.width,
            format.height,
            std::str::from_utf8(&format.fourcc.repr).unwrap_or("????")
        );

        Ok(Self {
            device,
            width: format.width as usize,
            height: format.height as usize,
            fourcc: format.fourcc.repr,
        })
    }
}

impl FrameSource for V4lFrameSource {
    fn grab_grayscale(&mut self) -> Result<Array2<f64>> {
        let mut stream = MmapStream::with_buffers(&self.device, Type::VideoCapture, 4)
            .map_err(|e| Error::FrameUnavailable(format!("failed to start stream: {e}")))?;

        let mut latest: Option<Vec<u8>> = None;
        for _ in 0..=FLUSH_FRAMES {
            let (buf, _meta) = stream
                .next()
                .map_err(|e| Error::FrameUnavailable(format!("capture failed: {e}")))?;
            latest = Some(buf.to_vec());
        }

        let data =
            latest.ok_or_else(|| Error::FrameUnavailable("no frame produced".to_string()))?;
        luma_plane(&data, self.width, self.height, &self.fourcc)
    }
}

/// Extract the luma plane of a raw capture buffer as `f64` pixels.
fn luma_plane(data: &[u8], width: usize, height: usize, fourcc: &[u8; 4]) -> Result<Array2<f64>> {
    let (stride, offset) = match fourcc {
        b"YUYV" => (2, 0),
        b"GREY" => (1, 0),
        other => {
            return Err(Error::FrameUnavailable(format!(
                "unsupported pixel format: {}",
                std::str::from_utf8(other).unwrap_or("????")
            )))
        }
    };

    let needed = width * height * stride;
    if data.len() < needed {
        return Err(Error::FrameUnavailable(format!(
            "short frame: got {} bytes, need {needed}",
            data.len()
        )));
    }

    Ok(Array2::from_shape_fn((height, width), |(row, col)| {
        f64::from(data[(row * width + col) * stride + offset])
    }))
}
