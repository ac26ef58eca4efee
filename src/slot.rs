//! Single-image slot holding the most recent live capture.
//!
//! The slot is a plain file. An empty file means "cleared"; otherwise it holds
//! one complete JPEG. Every write goes through [`atomic_replace`], so a reader
//! in this or any other process never observes a partially written image.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::buffer::ConvertBuffer;
use image::codecs::jpeg::JpegEncoder;
use image::{RgbImage, RgbaImage};
use tracing::debug;

use crate::error::Error;
use crate::storage::atomic_replace;

#[derive(Debug, Clone)]
pub struct CaptureSlot {
    path: PathBuf,
}

impl CaptureSlot {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replaces the slot with an empty file. The file is never left missing.
    pub fn clear(&self) -> Result<(), Error> {
        atomic_replace(&self.path, &[])?;
        debug!(path = %self.path.display(), "cleared capture slot");
        Ok(())
    }

    /// Publishes already-encoded image bytes.
    pub fn publish(&self, bytes: &[u8]) -> Result<(), Error> {
        atomic_replace(&self.path, bytes)?;
        Ok(())
    }

    /// Encodes `image` as JPEG at `quality` and publishes it. Returns the
    /// encoded size in bytes.
    pub fn publish_jpeg(&self, image: &RgbaImage, quality: u8) -> Result<usize, Error> {
        let bytes = encode_jpeg(image, quality)?;
        self.publish(&bytes)?;
        Ok(bytes.len())
    }

    pub fn is_empty(&self) -> bool {
        fs::metadata(&self.path).map_or(true, |meta| meta.len() == 0)
    }

    /// Decodes the current content. A missing or empty file is
    /// [`Error::EmptySlot`].
    pub fn load(&self) -> Result<RgbaImage, Error> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Err(Error::EmptySlot),
            Err(err) => return Err(err.into()),
        };
        if bytes.is_empty() {
            return Err(Error::EmptySlot);
        }
        image::load_from_memory(&bytes)
            .map(|img| img.to_rgba8())
            .map_err(|source| Error::Decode {
                path: self.path.clone(),
                source,
            })
    }
}

pub fn encode_jpeg(image: &RgbaImage, quality: u8) -> Result<Vec<u8>, Error> {
    // JPEG has no alpha channel.
    let rgb: RgbImage = image.convert();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality)
        .encode_image(&rgb)
        .map_err(Error::Encode)?;
    Ok(out)
}
