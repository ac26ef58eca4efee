//! Plain data exchanged between the host hooks and the pipeline.

/// Opaque identity of a pending display-power request.
///
/// Two requests are "the same" when their ids match, whatever their contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    Off,
    Dim,
    Bright,
}

/// Snapshot of a display-power request at the moment it is evaluated.
#[derive(Debug, Clone, Copy)]
pub struct PowerRequest {
    pub screen_state: ScreenState,
    pub id: RequestId,
}

impl PowerRequest {
    pub fn new(screen_state: ScreenState, id: RequestId) -> Self {
        Self { screen_state, id }
    }

    /// Identity comparison; the screen state is deliberately ignored.
    pub fn is_same_request(&self, other: &PowerRequest) -> bool {
        self.id == other.id
    }
}

/// Power-controller flags observed alongside a request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PowerFlags {
    pub wait_for_negative_proximity: bool,
    pub pending_wait_for_negative_proximity: bool,
    pub pending_request_changed: bool,
    pub display_ready: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerDecision {
    NoOp,
    StartCapture,
}

/// Measured size of the lock-screen host surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_measured(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}

/// Rotation reported by the default display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayRotation {
    #[default]
    Deg0,
    Deg90,
    Deg180,
    Deg270,
}

impl DisplayRotation {
    pub fn from_degrees(degrees: u32) -> Option<Self> {
        match degrees {
            0 => Some(Self::Deg0),
            90 => Some(Self::Deg90),
            180 => Some(Self::Deg180),
            270 => Some(Self::Deg270),
            _ => None,
        }
    }
}

/// Result of one capture attempt, reported by the worker thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    Stored { width: u32, height: u32, bytes: usize },
    NoContent,
    Failed(String),
}
