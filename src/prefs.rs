//! Read-only view of the preferences written by the settings surface.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::compositor::BackgroundMode;
use crate::config::{ArgbColor, BackgroundKind, Preferences, Tint};

/// Source of the current background preferences.
///
/// `reload` picks up external edits; the getters answer from the most recent
/// successfully loaded snapshot.
pub trait PreferenceStore: Send + Sync {
    fn reload(&self) -> Result<()>;
    fn mode(&self) -> BackgroundMode;
    fn color(&self) -> ArgbColor;
    fn blur_percent(&self) -> u32;
    fn tint(&self) -> Tint;
}

/// Preferences kept in a YAML file owned by another process.
#[derive(Debug)]
pub struct YamlPreferenceStore {
    path: PathBuf,
    static_image_path: PathBuf,
    current: Mutex<Preferences>,
}

impl YamlPreferenceStore {
    pub fn new(path: impl Into<PathBuf>, static_image_path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            static_image_path: static_image_path.into(),
            current: Mutex::new(Preferences::default()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn snapshot(&self) -> Preferences {
        self.lock().clone()
    }

    fn lock(&self) -> MutexGuard<'_, Preferences> {
        self.current.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn read_preferences(path: &Path) -> Result<Preferences> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Preferences::default()),
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()));
        }
    };
    if text.trim().is_empty() {
        return Ok(Preferences::default());
    }
    let prefs: Preferences = serde_yaml::from_str(&text)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    prefs.validate()?;
    Ok(prefs)
}

impl PreferenceStore for YamlPreferenceStore {
    /// On failure the previous snapshot stays in effect.
    fn reload(&self) -> Result<()> {
        match read_preferences(&self.path) {
            Ok(prefs) => {
                debug!(background = %prefs.background, "preferences reloaded");
                *self.lock() = prefs;
                Ok(())
            }
            Err(err) => {
                warn!(
                    path = %self.path.display(),
                    error = %format!("{err:#}"),
                    "keeping previous preferences"
                );
                Err(err)
            }
        }
    }

    fn mode(&self) -> BackgroundMode {
        let prefs = self.lock();
        match prefs.background {
            BackgroundKind::Default => BackgroundMode::Default,
            BackgroundKind::SolidColor => BackgroundMode::SolidColor(prefs.color),
            BackgroundKind::StaticImage => BackgroundMode::StaticImage(self.static_image_path.clone()),
            BackgroundKind::LiveCapture => BackgroundMode::LiveCapture,
        }
    }

    fn color(&self) -> ArgbColor {
        self.lock().color
    }

    fn blur_percent(&self) -> u32 {
        self.lock().blur_percent
    }

    fn tint(&self) -> Tint {
        self.lock().tint.clone()
    }
}
