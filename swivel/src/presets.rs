//! Named position presets.
//!
//! A preset is a flat `{pan, tilt, zoom}` record keyed by name, persisted
//! as JSON in `~/.swivel/presets.json`. The store loads eagerly and writes
//! through on every mutation.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::default_dir;
use crate::error::Result;
use crate::position::PositionEstimate;

/// A saved camera pose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PresetRecord {
    /// Pan estimate in speed-seconds.
    pub pan: f64,
    /// Tilt estimate in speed-seconds.
    pub tilt: f64,
    /// Absolute zoom value.
    pub zoom: i32,
}

impl From<&PositionEstimate> for PresetRecord {
    fn from(position: &PositionEstimate) -> Self {
        Self {
            pan: position.pan,
            tilt: position.tilt,
            zoom: position.zoom,
        }
    }
}

/// JSON-backed named preset storage.
pub struct PresetStore {
    path: PathBuf,
    presets: BTreeMap<String, PresetRecord>,
}

impl PresetStore {
    /// Default preset file location.
    pub fn default_path() -> PathBuf {
        default_dir().join("presets.json")
    }

    /// Open the store at `path`, loading existing presets. A missing file
    /// yields an empty store.
    pub fn load(path: PathBuf) -> Result<Self> {
        let presets = if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            serde_json::from_str(&contents)?
        } else {
            BTreeMap::new()
        };
        Ok(Self { path, presets })
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&self.presets)?)?;
        Ok(())
    }

    /// Save `position` under `name`, overwriting any existing preset.
    pub fn save_preset(&mut self, name: &str, position: &PositionEstimate) -> Result<()> {
        self.presets
            .insert(name.to_string(), PresetRecord::from(position));
        self.persist()
    }

    /// Look up a preset by name.
    pub fn get(&self, name: &str) -> Option<PresetRecord> {
        self.presets.get(name).copied()
    }

    /// Delete a preset. Returns whether it existed.
    pub fn delete(&mut self, name: &str) -> Result<bool> {
        if self.presets.remove(name).is_some() {
            self.persist()?;
            return Ok(true);
        }
        Ok(false)
    }

    /// All preset names in sorted order.
    pub fn names(&self) -> Vec<String> {
        self.presets.keys().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_store(tag: &str) -> (PathBuf, PresetStore) {
        let dir = std::env::temp_dir().join(format!(
            "swivel_presets_test_{tag}_{}",
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        let path = dir.join("presets.json");
        let store = PresetStore::load(path).unwrap();
        (dir, store)
    }

    fn position(pan: f64, tilt: f64, zoom: i32) -> PositionEstimate {
        PositionEstimate {
            pan,
            tilt,
            zoom,
            ..PositionEstimate::new()
        }
    }

    #[test]
    fn test_missing_file_is_empty_store() {
        let (dir, store) = temp_store("empty");
        assert!(store.names().is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let (dir, mut store) = temp_store("roundtrip");

        store
            .save_preset("desk", &position(1.5, -0.5, 300))
            .unwrap();
        store.save_preset("door", &position(-2.0, 0.0, 100)).unwrap();

        let reloaded = PresetStore::load(dir.join("presets.json")).unwrap();
        assert_eq!(reloaded.names(), vec!["desk", "door"]);
        let desk = reloaded.get("desk").unwrap();
        assert_eq!(desk.pan, 1.5);
        assert_eq!(desk.tilt, -0.5);
        assert_eq!(desk.zoom, 300);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_save_overwrites_existing_name() {
        let (dir, mut store) = temp_store("overwrite");
        store.save_preset("spot", &position(1.0, 0.0, 100)).unwrap();
        store.save_preset("spot", &position(2.0, 0.0, 200)).unwrap();

        assert_eq!(store.names().len(), 1);
        assert_eq!(store.get("spot").unwrap().pan, 2.0);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_delete_reports_existence() {
        let (dir, mut store) = temp_store("delete");
        store.save_preset("gone", &position(0.0, 0.0, 100)).unwrap();

        assert!(store.delete("gone").unwrap());
        assert!(!store.delete("gone").unwrap());
        assert!(store.get("gone").is_none());

        std::fs::remove_dir_all(&dir).ok();
    }
}
