//! PTZ device discovery.
//!
//! Velocity-driven PTZ cameras are recognized by their control set rather
//! than by model name: a device qualifies when it exposes all three
//! velocity/zoom controls. Candidates come from the backend's device
//! listing, falling back to a `/dev/video*` scan when the listing is
//! unavailable.

use crate::backend::{
    ControlBackend, CTRL_PAN_SPEED, CTRL_TILT_SPEED, CTRL_ZOOM_ABSOLUTE,
};

/// Find the first device exposing the velocity PTZ control set.
pub fn find_ptz_device(backend: &dyn ControlBackend) -> Option<String> {
    let mut candidates = match backend.list_devices() {
        Ok(listing) => device_paths(&listing),
        Err(e) => {
            log::warn!("device listing unavailable ({e}), scanning /dev instead");
            Vec::new()
        }
    };
    if candidates.is_empty() {
        candidates = scan_dev_video();
    }
    candidates.sort();

    candidates
        .into_iter()
        .find(|device| has_ptz_support(backend, device))
}

/// Whether `device` exposes pan/tilt velocity and absolute zoom controls.
pub fn has_ptz_support(backend: &dyn ControlBackend, device: &str) -> bool {
    match backend.list_controls(device) {
        Ok(controls) => [CTRL_PAN_SPEED, CTRL_TILT_SPEED, CTRL_ZOOM_ABSOLUTE]
            .iter()
            .all(|name| controls.contains(name)),
        Err(e) => {
            log::debug!("skipping {device}: {e}");
            false
        }
    }
}

/// Extract `/dev/video*` paths from a device listing.
fn device_paths(listing: &str) -> Vec<String> {
    listing
        .lines()
        .map(str::trim)
        .filter(|line| line.starts_with("/dev/video"))
        .map(str::to_string)
        .collect()
}

/// Enumerate `/dev/video*` nodes directly.
fn scan_dev_video() -> Vec<String> {
    let Ok(entries) = std::fs::read_dir("/dev") else {
        return Vec::new();
    };
    entries
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.starts_with("video"))
        .map(|name| format!("/dev/{name}"))
        .collect()
}
