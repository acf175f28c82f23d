//! In-process control backend using the `v4l` crate.
//!
//! Devices are opened lazily and kept open for the backend's lifetime; the
//! V4L2 control ids are resolved once per device by querying the driver's
//! control descriptions and normalizing their display names to the
//! underscore form used throughout this crate (`"Pan Speed"` ->
//! `"pan_speed"`).

use std::collections::HashMap;
use std::sync::Mutex;

use v4l::prelude::*;

use crate::backend::ControlBackend;
use crate::error::{Error, Result};

/// An opened device plus its control-name -> control-id map.
struct DeviceEntry {
    device: Device,
    controls: HashMap<String, u32>,
}

/// Backend implementation issuing V4L2 ioctls directly.
#[derive(Default)]
pub struct UvcBackend {
    handles: Mutex<HashMap<String, DeviceEntry>>,
}

/// Normalize a driver control display name to underscore form.
fn control_key(name: &str) -> String {
    name.replace(',', " ")
        .split_whitespace()
        .map(str::to_ascii_lowercase)
        .collect::<Vec<_>>()
        .join("_")
}

impl UvcBackend {
    /// Create a backend with no devices opened yet.
    pub fn new() -> Self {
        Self::default()
    }

    fn backend_err(device: &str, message: impl Into<String>) -> Error {
        Error::Backend {
            device: device.to_string(),
            message: message.into(),
        }
    }

    fn open_entry(device: &str) -> Result<DeviceEntry> {
        let handle = Device::with_path(device)
            .map_err(|e| Self::backend_err(device, format!("failed to open device: {e}")))?;

        let descriptions = handle
            .query_controls()
            .map_err(|e| Self::backend_err(device, format!("failed to query controls: {e}")))?;

        let mut controls = HashMap::new();
        for desc in descriptions {
            controls.insert(control_key(&desc.name), desc.id);
        }

        Ok(DeviceEntry {
            device: handle,
            controls,
        })
    }

    /// Run `op` with the (possibly freshly opened) entry for `device`.
    fn with_entry<T>(
        &self,
        device: &str,
        op: impl FnOnce(&mut DeviceEntry) -> Result<T>,
    ) -> Result<T> {
        use std::collections::hash_map::Entry;

        let mut handles = self.handles.lock().unwrap();
        let entry = match handles.entry(device.to_string()) {
            Entry::Occupied(occupied) => occupied.into_mut(),
            Entry::Vacant(vacant) => vacant.insert(Self::open_entry(device)?),
        };
        op(entry)
    }

    fn control_id(entry: &DeviceEntry, device: &str, control: &str) -> Result<u32> {
        entry
            .controls
            .get(control)
            .copied()
            .ok_or_else(|| Self::backend_err(device, format!("control not found: {control}")))
    }
}

impl ControlBackend for UvcBackend {
    fn set_control(&self, device: &str, control: &str, value: i64) -> Result<()> {
        self.with_entry(device, |entry| {
            let id = Self::control_id(entry, device, control)?;
            let ctrl = v4l::Control {
                id,
                value: v4l::control::Value::Integer(value),
            };
            entry
                .device
                .set_control(ctrl)
                .map_err(|e| Self::backend_err(device, format!("failed to set {control}: {e}")))
        })
    }

    fn get_control(&self, device: &str, control: &str) -> Result<i64> {
        self.with_entry(device, |entry| {
            let id = Self::control_id(entry, device, control)?;
            let ctrl = entry
                .device
                .control(id)
                .map_err(|e| Self::backend_err(device, format!("failed to read {control}: {e}")))?;
            match ctrl.value {
                v4l::control::Value::Integer(v) => Ok(v),
                v4l::control::Value::Boolean(b) => Ok(i64::from(b)),
                other => Err(Self::backend_err(
                    device,
                    format!("control {control} has non-integer value: {other:?}"),
                )),
            }
        })
    }

    fn list_controls(&self, device: &str) -> Result<String> {
        self.with_entry(device, |entry| {
            let descriptions = entry.device.query_controls().map_err(|e| {
                Self::backend_err(device, format!("failed to query controls: {e}"))
            })?;

            let mut out = String::new();
            for desc in descriptions {
                out.push_str(&format!(
                    "{} 0x{:08x} ({:?}): min={} max={} default={}\n",
                    control_key(&desc.name),
                    desc.id,
                    desc.typ,
                    desc.minimum,
                    desc.maximum,
                    desc.default,
                ));
            }
            Ok(out)
        })
    }

    fn list_devices(&self) -> Result<String> {
        let mut out = String::new();
        for node in v4l::context::enum_devices() {
            let name = node.name().unwrap_or_else(|| "unknown".to_string());
            out.push_str(&format!("{}:\n\t{}\n", name, node.path().display()));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_control_key_normalization() {
        assert_eq!(control_key("Pan Speed"), "pan_speed");
        assert_eq!(control_key("Zoom, Absolute"), "zoom_absolute");
        assert_eq!(control_key("  Tilt   Speed "), "tilt_speed");
        assert_eq!(control_key("gain"), "gain");
    }
}
