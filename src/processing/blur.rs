use image::{RgbaImage, imageops};

/// Sources wider than this are squashed to `MAX_BLUR_WIDTH x MAX_BLUR_HEIGHT`
/// before blurring.
pub const MAX_BLUR_WIDTH: u32 = 900;
pub const MAX_BLUR_HEIGHT: u32 = 1600;

pub const MAX_BLUR_RADIUS: u32 = 25;

/// Integer blur radius in `1..=MAX_BLUR_RADIUS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlurRadius(u32);

impl BlurRadius {
    /// Maps the 0..=100 slider onto the kernel radius: `max(1, percent / 4)`.
    pub fn from_percent(percent: u32) -> Self {
        let radius = percent.min(100) / 4;
        Self(radius.clamp(1, MAX_BLUR_RADIUS))
    }

    pub fn get(self) -> u32 {
        self.0
    }

    /// Gaussian sigma matching the radius, `0.4 * r + 0.6`.
    pub fn sigma(self) -> f32 {
        0.4 * self.0 as f32 + 0.6
    }
}

/// Gaussian blur of `image` at `radius`. Dimensions are preserved.
pub fn apply_blur(image: &RgbaImage, radius: BlurRadius) -> RgbaImage {
    imageops::blur(image, radius.sigma())
}
