//! Persisted user settings
//!
//! This module provides the typed settings surface shared between the
//! monitor core and presentation layers: classifier tuning, camera
//! selection, and calibrated thresholds. Settings live in a JSON file and
//! are read through cheap copy-on-read snapshots so the sampling loop never
//! holds a lock across a tick.

use crate::error::SourceError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Conventional settings file location.
pub const DEFAULT_SETTINGS_PATH: &str = "postured_settings.json";

fn default_sensitivity() -> f64 {
    0.85
}

fn default_dead_zone() -> f64 {
    0.03
}

fn default_camera_index() -> u32 {
    0
}

fn default_dim_when_away() -> bool {
    false
}

fn default_good_posture_y() -> f64 {
    0.4
}

fn default_bad_posture_y() -> f64 {
    0.6
}

fn default_is_calibrated() -> bool {
    false
}

/// Complete persisted settings
///
/// Each field carries its own serde default so a partially written or
/// older settings file still loads, with missing keys filled in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Classification strictness in (0, 1]; lower widens the tolerance band
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,

    /// Extra margin a reading must clear before a Good/Bad flip
    #[serde(default = "default_dead_zone")]
    pub dead_zone: f64,

    /// Camera device index handed to the frame source
    #[serde(default = "default_camera_index")]
    pub camera_index: u32,

    /// Whether the presentation layer should dim the screen while away
    #[serde(default = "default_dim_when_away")]
    pub dim_when_away: bool,

    /// Calibrated head height for upright posture (0 = top of frame)
    #[serde(default = "default_good_posture_y")]
    pub good_posture_y: f64,

    /// Calibrated head height for slouched posture
    #[serde(default = "default_bad_posture_y")]
    pub bad_posture_y: f64,

    /// Whether good/bad thresholds came from a completed calibration
    #[serde(default = "default_is_calibrated")]
    pub is_calibrated: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sensitivity: default_sensitivity(),
            dead_zone: default_dead_zone(),
            camera_index: default_camera_index(),
            dim_when_away: default_dim_when_away(),
            good_posture_y: default_good_posture_y(),
            bad_posture_y: default_bad_posture_y(),
            is_calibrated: default_is_calibrated(),
        }
    }
}

impl Settings {
    /// Load settings from a JSON file
    ///
    /// A missing file is a normal first run and yields defaults quietly;
    /// an unreadable or unparseable file yields defaults with a logged
    /// warning so a corrupt file never blocks startup.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Self {
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(settings) => {
                    log::info!("[Settings] Loaded settings from {:?}", path.as_ref());
                    settings
                }
                Err(err) => {
                    log::warn!(
                        "[Settings] Failed to parse JSON from {:?}: {}. Using defaults.",
                        path.as_ref(),
                        err
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                log::info!(
                    "[Settings] No settings file at {:?}, using defaults",
                    path.as_ref()
                );
                Self::default()
            }
            Err(err) => {
                log::warn!(
                    "[Settings] Failed to read settings file {:?}: {}. Using defaults.",
                    path.as_ref(),
                    err
                );
                Self::default()
            }
        }
    }
}

/// Shared, persistence-backed settings store
///
/// The store is the single mutation point for settings. Readers take
/// `snapshot()` copies; writers go through `update()` and call `sync()` to
/// make the change durable.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    inner: RwLock<Settings>,
}

impl SettingsStore {
    /// Open the store backed by the given JSON file
    ///
    /// Loads existing settings or falls back to defaults; never fails.
    pub fn open<P: Into<PathBuf>>(path: P) -> Self {
        let path = path.into();
        let settings = Settings::load_from_file(&path);
        Self {
            path,
            inner: RwLock::new(settings),
        }
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Copy-on-read snapshot of the current settings
    pub fn snapshot(&self) -> Settings {
        self.inner
            .read()
            .map(|settings| *settings)
            .unwrap_or_else(|err| *err.into_inner())
    }

    /// Apply a mutation under the write lock and return the result
    pub fn update<F>(&self, apply: F) -> Result<Settings, SourceError>
    where
        F: FnOnce(&mut Settings),
    {
        let mut guard = self.inner.write().map_err(|_| SourceError::LockPoisoned {
            component: "SettingsStore".to_string(),
        })?;
        apply(&mut guard);
        Ok(*guard)
    }

    /// Write the current settings to disk
    ///
    /// Creates parent directories as needed. In-memory state is the source
    /// of truth; callers decide whether a failed write is fatal.
    pub fn sync(&self) -> io::Result<()> {
        let settings = self.snapshot();
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(&settings).map_err(io::Error::other)?;
        fs::write(&self.path, json)?;
        log::debug!("[Settings] Synced settings to {:?}", self.path);
        Ok(())
    }
}
