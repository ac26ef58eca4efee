//! Collaborators the pipeline needs from the host process.

use anyhow::Result;
use image::RgbaImage;

use crate::events::DisplayRotation;

/// Access to the primary display's content, used by the capture worker.
pub trait ScreenSource: Send + Sync {
    /// Natural (unrotated) pixel size of the primary output.
    fn natural_size(&self) -> Result<(u32, u32)>;

    /// Raw screenshot at the requested size. `Ok(None)` means the display
    /// had no content to give.
    fn screenshot(&self, width: u32, height: u32) -> Result<Option<RgbaImage>>;
}

/// Lock state of the keyguard.
pub trait KeyguardMonitor: Send + Sync {
    /// `None` when the state cannot be determined.
    fn is_locked(&self) -> Option<bool>;
}

/// Receiver of the finished lock-screen background.
pub trait BackgroundSink: Send + Sync {
    /// Current rotation of the default display.
    fn rotation(&self) -> DisplayRotation;

    /// Installs `image` as the lock-screen background. An error means the
    /// host still shows its previous background.
    fn set_background(&self, image: RgbaImage) -> Result<()>;
}
