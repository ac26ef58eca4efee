//! Builds the lock-screen background for the current preferences.
//!
//! Pipeline for image modes: cap the source to the blur budget, blur, and for
//! live captures finish with the tint overlay. Rotation for the display is
//! applied by the caller.

use std::path::{Path, PathBuf};

use image::{Rgba, RgbaImage};
use tracing::{debug, warn};

use crate::config::{ArgbColor, Tint};
use crate::error::Error;
use crate::processing::blur::{BlurRadius, apply_blur};
use crate::processing::resize::cap_blur_source;
use crate::processing::tint::apply_tint;
use crate::slot::CaptureSlot;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackgroundMode {
    /// Leave the host background unchanged.
    Default,
    SolidColor(ArgbColor),
    StaticImage(PathBuf),
    LiveCapture,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositorParams {
    pub blur_percent: u32,
    pub tint: Tint,
}

impl Default for CompositorParams {
    fn default() -> Self {
        Self {
            blur_percent: 100,
            tint: Tint::Dark,
        }
    }
}

/// Where the compositor reads its source images from.
pub trait SourceSupplier {
    fn load_static(&self, path: &Path) -> Result<RgbaImage, Error>;
    fn load_capture(&self) -> Result<RgbaImage, Error>;
}

/// Reads the static image from disk and the live capture from the slot.
#[derive(Debug, Clone)]
pub struct SlotSources {
    slot: CaptureSlot,
}

impl SlotSources {
    pub fn new(slot: CaptureSlot) -> Self {
        Self { slot }
    }
}

impl SourceSupplier for SlotSources {
    fn load_static(&self, path: &Path) -> Result<RgbaImage, Error> {
        match image::open(path) {
            Ok(img) => Ok(img.to_rgba8()),
            Err(image::ImageError::IoError(err)) => Err(Error::Io(err)),
            Err(source) => Err(Error::Decode {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn load_capture(&self) -> Result<RgbaImage, Error> {
        self.slot.load()
    }
}

/// Produces the background for `mode`, or `None` when the host should keep
/// its own. Missing or unreadable sources are logged and yield `None`.
pub fn compose(
    mode: &BackgroundMode,
    params: &CompositorParams,
    sources: &dyn SourceSupplier,
) -> Option<RgbaImage> {
    match mode {
        BackgroundMode::Default => None,
        BackgroundMode::SolidColor(color) => Some(RgbaImage::from_pixel(1, 1, Rgba(color.to_rgba()))),
        BackgroundMode::StaticImage(path) => {
            let source = match sources.load_static(path) {
                Ok(img) => img,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "static background unavailable");
                    return None;
                }
            };
            blurred(&source, params)
        }
        BackgroundMode::LiveCapture => {
            let source = match sources.load_capture() {
                Ok(img) => img,
                Err(Error::EmptySlot) => {
                    debug!("no live capture yet");
                    return None;
                }
                Err(err) => {
                    warn!(error = %err, "live capture unreadable");
                    return None;
                }
            };
            let blurred = blurred(&source, params)?;
            Some(apply_tint(&blurred, &params.tint))
        }
    }
}

fn blurred(source: &RgbaImage, params: &CompositorParams) -> Option<RgbaImage> {
    let capped = match cap_blur_source(source) {
        Ok(capped) => capped,
        Err(err) => {
            warn!(error = %format!("{err:#}"), "failed to downscale background source");
            return None;
        }
    };
    let radius = BlurRadius::from_percent(params.blur_percent);
    debug!(
        width = capped.width(),
        height = capped.height(),
        radius = radius.get(),
        "blurring background"
    );
    Some(apply_blur(&capped, radius))
}
