use image::{RgbaImage, imageops};

use crate::events::DisplayRotation;

/// Rotates content opposite to the device rotation so the background stays
/// upright: 90 → -90, 180 → -180, 270 → +90 (clockwise positive).
pub fn rotate_for_display(image: RgbaImage, rotation: DisplayRotation) -> RgbaImage {
    match rotation {
        DisplayRotation::Deg0 => image,
        DisplayRotation::Deg90 => imageops::rotate270(&image),
        DisplayRotation::Deg180 => imageops::rotate180(&image),
        DisplayRotation::Deg270 => imageops::rotate90(&image),
    }
}
