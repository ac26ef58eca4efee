//! File-backed host collaborators used by the command-line driver.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{ImageFormat, ImageReader, RgbaImage};
use tracing::info;

use crate::events::DisplayRotation;
use crate::platform::host::{BackgroundSink, KeyguardMonitor, ScreenSource};
use crate::processing::resize::resize_rgba;

/// Treats an image file as the current screen content.
#[derive(Debug, Clone)]
pub struct ImageFileScreen {
    path: PathBuf,
}

impl ImageFileScreen {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ScreenSource for ImageFileScreen {
    fn natural_size(&self) -> Result<(u32, u32)> {
        ImageReader::open(&self.path)
            .with_context(|| format!("failed to open {}", self.path.display()))?
            .with_guessed_format()
            .context("failed to guess screen image format")?
            .into_dimensions()
            .with_context(|| format!("failed to read dimensions of {}", self.path.display()))
    }

    fn screenshot(&self, width: u32, height: u32) -> Result<Option<RgbaImage>> {
        let decoded = match image::open(&self.path) {
            Ok(img) => img.to_rgba8(),
            Err(image::ImageError::IoError(err)) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(None);
            }
            Err(err) => {
                return Err(err).with_context(|| format!("failed to decode {}", self.path.display()));
            }
        };
        if decoded.dimensions() == (width, height) {
            Ok(Some(decoded))
        } else {
            resize_rgba(&decoded, width, height).map(Some)
        }
    }
}

/// Keyguard whose state is fixed at construction.
#[derive(Debug, Clone, Copy)]
pub struct FixedKeyguard(pub Option<bool>);

impl KeyguardMonitor for FixedKeyguard {
    fn is_locked(&self) -> Option<bool> {
        self.0
    }
}

/// Writes every background it receives to a PNG file.
#[derive(Debug, Clone)]
pub struct PngFileSink {
    path: PathBuf,
    rotation: DisplayRotation,
}

impl PngFileSink {
    pub fn new(path: impl Into<PathBuf>, rotation: DisplayRotation) -> Self {
        Self {
            path: path.into(),
            rotation,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl BackgroundSink for PngFileSink {
    fn rotation(&self) -> DisplayRotation {
        self.rotation
    }

    fn set_background(&self, image: RgbaImage) -> Result<()> {
        image
            .save_with_format(&self.path, ImageFormat::Png)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        info!(
            path = %self.path.display(),
            width = image.width(),
            height = image.height(),
            "wrote lock-screen background"
        );
        Ok(())
    }
}
