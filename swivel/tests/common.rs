//! Shared test fixtures: a recording mock backend and scripted frame
//! sources.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use ndarray::Array2;
use rand::prelude::*;
use swivel::error::{Error, Result};
use swivel::verify::FrameSource;
use swivel::ControlBackend;

/// One recorded backend call.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlCall {
    pub device: String,
    pub control: String,
    pub value: i64,
}

/// Mock backend recording every control write and serving canned listings.
#[derive(Default)]
pub struct MockBackend {
    pub calls: Mutex<Vec<ControlCall>>,
    values: Mutex<HashMap<String, i64>>,
    /// When set, `set_control` fails on the first write matching
    /// `(control, value)`.
    fail_on: Mutex<Option<(String, i64)>>,
    devices_output: String,
    controls_output: String,
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            devices_output: "Conference Cam (usb-0000:00:14.0-2):\n\t/dev/video9\n".to_string(),
            controls_output: "pan_speed (int): min=-1 max=1 default=0\n\
                              tilt_speed (int): min=-1 max=1 default=0\n\
                              zoom_absolute (int): min=100 max=500 default=100\n"
                .to_string(),
            ..Self::default()
        }
    }

    /// Inject a one-shot failure for the next matching write.
    pub fn fail_on(&self, control: &str, value: i64) {
        *self.fail_on.lock().unwrap() = Some((control.to_string(), value));
    }

    /// Recorded writes against one control, in order.
    pub fn calls_for(&self, control: &str) -> Vec<i64> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| call.control == control)
            .map(|call| call.value)
            .collect()
    }

    /// All recorded writes, in order.
    pub fn all_calls(&self) -> Vec<ControlCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Last value written to a control, if any.
    pub fn last_value(&self, control: &str) -> Option<i64> {
        self.values.lock().unwrap().get(control).copied()
    }
}

impl ControlBackend for MockBackend {
    fn set_control(&self, device: &str, control: &str, value: i64) -> Result<()> {
        self.calls.lock().unwrap().push(ControlCall {
            device: device.to_string(),
            control: control.to_string(),
            value,
        });

        let mut fail_on = self.fail_on.lock().unwrap();
        if let Some((fail_control, fail_value)) = fail_on.as_ref() {
            if fail_control == control && *fail_value == value {
                *fail_on = None;
                return Err(Error::Backend {
                    device: device.to_string(),
                    message: "injected failure".to_string(),
                });
            }
        }

        self.values
            .lock()
            .unwrap()
            .insert(control.to_string(), value);
        Ok(())
    }

    fn get_control(&self, _device: &str, control: &str) -> Result<i64> {
        Ok(self.last_value(control).unwrap_or(0))
    }

    fn list_controls(&self, _device: &str) -> Result<String> {
        Ok(self.controls_output.clone())
    }

    fn list_devices(&self) -> Result<String> {
        Ok(self.devices_output.clone())
    }
}

/// Frame source serving a fixed script of frames, erroring once exhausted.
pub struct ScriptedFrames {
    frames: VecDeque<Array2<f64>>,
}

impl ScriptedFrames {
    pub fn new(frames: Vec<Array2<f64>>) -> Self {
        Self {
            frames: frames.into(),
        }
    }

    /// A source that fails on every grab.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

impl FrameSource for ScriptedFrames {
    fn grab_grayscale(&mut self) -> Result<Array2<f64>> {
        self.frames
            .pop_front()
            .ok_or_else(|| Error::FrameUnavailable("frame script exhausted".to_string()))
    }
}

/// Broadband noise frame, deterministic per seed.
pub fn noise_frame(seed: u64) -> Array2<f64> {
    let mut rng = StdRng::seed_from_u64(seed);
    Array2::from_shape_fn((48, 48), |_| rng.gen_range(0.0..255.0))
}

/// Copy with scene content circularly shifted right by `shift` pixels.
pub fn shifted_right(frame: &Array2<f64>, shift: usize) -> Array2<f64> {
    let (rows, cols) = frame.dim();
    Array2::from_shape_fn((rows, cols), |(r, c)| {
        frame[[r, (c + cols - shift) % cols]]
    })
}

/// Copy with scene content circularly shifted down by `shift` pixels.
pub fn shifted_down(frame: &Array2<f64>, shift: usize) -> Array2<f64> {
    let (rows, cols) = frame.dim();
    Array2::from_shape_fn((rows, cols), |(r, c)| {
        frame[[(r + rows - shift) % rows, c]]
    })
}

/// Unique temp directory for persistence tests.
pub fn temp_dir(tag: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "swivel_test_{tag}_{}",
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}
