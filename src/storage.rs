//! Fixed on-disk layout of the backgrounds that need persistence.

use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{Context, Result, ensure};
use image::{DynamicImage, ImageFormat, ImageReader, imageops};
use tracing::info;

use crate::slot::CaptureSlot;

pub const CAPTURE_FILE_NAME: &str = "seethroughimage";
pub const STATIC_IMAGE_FILE_NAME: &str = "lockwallpaper";

#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.root)
            .with_context(|| format!("failed to create storage dir {}", self.root.display()))
    }

    pub fn capture_slot(&self) -> CaptureSlot {
        CaptureSlot::new(self.root.join(CAPTURE_FILE_NAME))
    }

    pub fn static_image_path(&self) -> PathBuf {
        self.root.join(STATIC_IMAGE_FILE_NAME)
    }

    /// Installs `src` as the static background, centre-cropped to `aspect`
    /// when given. The previous image stays in place until the new one is
    /// fully written. Returns the stored dimensions.
    pub fn import_static_image(&self, src: &Path, aspect: Option<(u32, u32)>) -> Result<(u32, u32)> {
        let decoded = ImageReader::open(src)
            .with_context(|| format!("failed to open {}", src.display()))?
            .with_guessed_format()
            .context("failed to guess image format")?
            .decode()
            .with_context(|| format!("failed to decode {}", src.display()))?;

        let image = match aspect {
            Some(aspect) => crop_to_aspect(decoded, aspect)?,
            None => decoded,
        };

        let mut encoded = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut encoded), ImageFormat::Png)
            .context("failed to encode static image")?;

        self.ensure_dir()?;
        let dest = self.static_image_path();
        atomic_replace(&dest, &encoded)
            .with_context(|| format!("failed to install {}", dest.display()))?;
        info!(
            src = %src.display(),
            width = image.width(),
            height = image.height(),
            "installed static background"
        );
        Ok((image.width(), image.height()))
    }
}

fn crop_to_aspect(image: DynamicImage, (aspect_w, aspect_h): (u32, u32)) -> Result<DynamicImage> {
    ensure!(aspect_w > 0 && aspect_h > 0, "crop aspect must be positive");
    let (w, h) = (image.width() as u64, image.height() as u64);
    let (aw, ah) = (aspect_w as u64, aspect_h as u64);

    let (crop_w, crop_h) = if w * ah > h * aw {
        ((h * aw / ah).max(1), h)
    } else {
        (w, (w * ah / aw).max(1))
    };
    if crop_w == w && crop_h == h {
        return Ok(image);
    }

    let x = (w - crop_w) / 2;
    let y = (h - crop_h) / 2;
    let rgba = image.to_rgba8();
    let cropped = imageops::crop_imm(&rgba, x as u32, y as u32, crop_w as u32, crop_h as u32).to_image();
    Ok(DynamicImage::ImageRgba8(cropped))
}

static TMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Writes `bytes` to a private sibling of `path`, syncs it, then renames it
/// over `path`. Readers see either the old file or the new one.
pub(crate) fn atomic_replace(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let name = path.file_name().and_then(|s| s.to_str()).unwrap_or("slot");
    let tmp = dir.join(format!(
        ".{name}.{}.{}.tmp",
        std::process::id(),
        TMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));

    let written = (|| -> std::io::Result<()> {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(bytes)?;
        file.flush()?;
        file.sync_all()
    })();
    if let Err(err) = written.and_then(|()| fs::rename(&tmp, path)) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }
    Ok(())
}
