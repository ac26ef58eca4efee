use std::path::{Path, PathBuf};

use anyhow::{Context, Result, ensure};
use serde::Deserialize;

pub use backdrop_prefs::{ArgbColor, BackgroundKind, Preferences, Tint};

pub const DEFAULT_STORAGE_DIR: &str = "/var/lib/lockscreen-backdrop";
pub const DEFAULT_PREFERENCES_FILE: &str = "preferences.yaml";

/// Which screen-off condition starts a capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TriggerPolicy {
    /// Screen going off while the keyguard is still unlocked.
    #[default]
    ScreenOff,
    /// As `ScreenOff`, additionally gated on the proximity and readiness
    /// flags reported by the power controller.
    ProximityAware,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Configuration {
    /// Private directory holding the capture slot and the static image.
    pub storage_dir: PathBuf,
    /// Preference file written by the settings surface. Relative paths are
    /// resolved against `storage-dir`.
    pub preferences_path: PathBuf,
    /// Condition that turns a screen-off request into a capture.
    pub trigger_policy: TriggerPolicy,
    /// JPEG quality used when publishing a capture.
    pub capture_quality: u8,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            storage_dir: PathBuf::from(DEFAULT_STORAGE_DIR),
            preferences_path: PathBuf::from(DEFAULT_PREFERENCES_FILE),
            trigger_policy: TriggerPolicy::default(),
            capture_quality: Self::DEFAULT_CAPTURE_QUALITY,
        }
    }
}

impl Configuration {
    pub const DEFAULT_CAPTURE_QUALITY: u8 = 85;

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        Ok(serde_yaml::from_str(&s)?)
    }

    /// Validate runtime invariants that cannot be expressed via serde defaults alone.
    pub fn validated(self) -> Result<Self> {
        ensure!(
            !self.storage_dir.as_os_str().is_empty(),
            "storage-dir must not be empty"
        );
        ensure!(
            !self.preferences_path.as_os_str().is_empty(),
            "preferences-path must not be empty"
        );
        ensure!(
            (1..=100).contains(&self.capture_quality),
            "capture-quality must be between 1 and 100"
        );
        Ok(self)
    }

    pub fn resolved_preferences_path(&self) -> PathBuf {
        if self.preferences_path.is_absolute() {
            self.preferences_path.clone()
        } else {
            self.storage_dir.join(&self.preferences_path)
        }
    }
}
