pub mod blur;
pub mod resize;
pub mod rotate;
pub mod tint;
