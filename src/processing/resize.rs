use std::borrow::Cow;

use anyhow::{Context, Result};
use fast_image_resize as fir;
use image::RgbaImage;
use tracing::debug;

use crate::processing::blur::{MAX_BLUR_HEIGHT, MAX_BLUR_WIDTH};

/// Squashes sources wider than the blur budget to exactly
/// `MAX_BLUR_WIDTH x MAX_BLUR_HEIGHT`; anything narrower passes through.
pub fn cap_blur_source(source: &RgbaImage) -> Result<Cow<'_, RgbaImage>> {
    if source.width() <= MAX_BLUR_WIDTH {
        return Ok(Cow::Borrowed(source));
    }
    debug!(
        width = source.width(),
        height = source.height(),
        "downscaling oversized source before blur"
    );
    resize_rgba(source, MAX_BLUR_WIDTH, MAX_BLUR_HEIGHT).map(Cow::Owned)
}

pub fn resize_rgba(source: &RgbaImage, target_w: u32, target_h: u32) -> Result<RgbaImage> {
    if target_w == 0 || target_h == 0 {
        anyhow::bail!("resize dimensions must be positive");
    }
    if source.width() == target_w && source.height() == target_h {
        return Ok(source.clone());
    }

    let src_view = fir::images::ImageRef::new(
        source.width(),
        source.height(),
        source.as_raw(),
        fir::PixelType::U8x4,
    )
    .context("failed to create source view for resize")?;
    let mut dst_image = fir::images::Image::new(target_w, target_h, fir::PixelType::U8x4);
    let options = fir::ResizeOptions::new()
        .resize_alg(fir::ResizeAlg::Convolution(fir::FilterType::Bilinear));
    let mut resizer = fir::Resizer::new();
    resizer
        .resize(&src_view, &mut dst_image, Some(&options))
        .context("resize failed")?;
    let buffer = dst_image.into_vec();
    RgbaImage::from_raw(target_w, target_h, buffer)
        .ok_or_else(|| anyhow::anyhow!("failed to construct resized RGBA image"))
}
