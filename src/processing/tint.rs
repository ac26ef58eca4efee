use image::RgbaImage;

use crate::config::Tint;

/// Draws `image` into a same-size working buffer and blends the tint's flat
/// overlay over every pixel. Unrecognized tints return the copy untouched.
pub fn apply_tint(image: &RgbaImage, tint: &Tint) -> RgbaImage {
    let mut out = image.clone();
    if let Some(overlay) = tint.overlay() {
        for pixel in out.pixels_mut() {
            pixel.0 = blend_over(pixel.0, overlay);
        }
    }
    out
}

/// Source-over blend of a translucent `overlay` on top of `dst`.
fn blend_over(dst: [u8; 4], overlay: [u8; 4]) -> [u8; 4] {
    let sa = overlay[3] as u32;
    let inv = 255 - sa;
    let channel = |d: u8, s: u8| ((s as u32 * sa + d as u32 * inv + 127) / 255) as u8;
    let alpha = sa + (dst[3] as u32 * inv + 127) / 255;
    [
        channel(dst[0], overlay[0]),
        channel(dst[1], overlay[1]),
        channel(dst[2], overlay[2]),
        alpha.min(255) as u8,
    ]
}
