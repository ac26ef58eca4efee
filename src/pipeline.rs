//! Entry points invoked by the host's power-management and lock-screen hooks.
//!
//! Neither entry point returns an error: every failure becomes a log line and
//! the "no visual change" outcome, so nothing propagates into the host's own
//! lifecycle.

use std::io;
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use anyhow::Result;
use crossbeam_channel::{Receiver, Sender, bounded};
use image::RgbaImage;
use tracing::{debug, info, warn};

use crate::capture::spawn_capture;
use crate::compositor::{BackgroundMode, CompositorParams, SlotSources, compose};
use crate::config::Configuration;
use crate::detector::TransitionDetector;
use crate::events::{CaptureOutcome, PowerFlags, PowerRequest, SurfaceSize, TriggerDecision};
use crate::platform::host::{BackgroundSink, KeyguardMonitor, ScreenSource};
use crate::prefs::{PreferenceStore, YamlPreferenceStore};
use crate::processing::rotate::rotate_for_display;
use crate::storage::Storage;

const OUTCOME_CHANNEL_CAPACITY: usize = 16;

/// Host-provided collaborators.
#[derive(Clone)]
pub struct HostCollaborators {
    pub screen: Arc<dyn ScreenSource>,
    pub keyguard: Arc<dyn KeyguardMonitor>,
    pub sink: Arc<dyn BackgroundSink>,
}

pub struct Pipeline {
    config: Configuration,
    storage: Storage,
    prefs: Arc<dyn PreferenceStore>,
    host: HostCollaborators,
    detector: TransitionDetector,
    outcomes: Mutex<Option<Sender<CaptureOutcome>>>,
}

impl Pipeline {
    /// Builds a pipeline reading preferences from the YAML file named by
    /// `config`.
    pub fn from_config(config: Configuration, host: HostCollaborators) -> Self {
        let storage = Storage::new(&config.storage_dir);
        let prefs = YamlPreferenceStore::new(
            config.resolved_preferences_path(),
            storage.static_image_path(),
        );
        Self::new(config, Arc::new(prefs), host)
    }

    pub fn new(
        config: Configuration,
        prefs: Arc<dyn PreferenceStore>,
        host: HostCollaborators,
    ) -> Self {
        Self {
            storage: Storage::new(&config.storage_dir),
            detector: TransitionDetector::new(config.trigger_policy),
            config,
            prefs,
            host,
            outcomes: Mutex::new(None),
        }
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub fn detector(&self) -> &TransitionDetector {
        &self.detector
    }

    /// Prepares the storage directory and clears any capture left over from
    /// a previous run.
    pub fn init(&self) -> Result<()> {
        self.storage.ensure_dir()?;
        self.storage.capture_slot().clear()?;
        info!(
            storage = %self.storage.root().display(),
            policy = ?self.config.trigger_policy,
            "lock-screen backdrop pipeline initialised"
        );
        Ok(())
    }

    /// Subscribes to capture results. Each call replaces the previous
    /// subscriber, which then disconnects; the new receiver only sees
    /// attempts started after the call. Reports are best effort.
    pub fn capture_outcomes(&self) -> Receiver<CaptureOutcome> {
        let (tx, rx) = bounded(OUTCOME_CHANNEL_CAPACITY);
        *self.outcomes.lock().unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(tx);
        rx
    }

    /// Called after the power controller evaluated a display request. Starts
    /// a background capture when the screen is about to go dark while the
    /// device is still unlocked. Returns without waiting for the capture.
    pub fn on_display_request_evaluated(
        &self,
        request: PowerRequest,
        flags: PowerFlags,
    ) -> TriggerDecision {
        if let Err(err) = self.prefs.reload() {
            warn!(error = %format!("{err:#}"), "preferences unavailable; skipping capture check");
            return TriggerDecision::NoOp;
        }
        if self.prefs.mode() != BackgroundMode::LiveCapture {
            return TriggerDecision::NoOp;
        }

        let locked = self.host.keyguard.is_locked();
        match self.detector.evaluate(request, flags, locked) {
            TriggerDecision::StartCapture => self.start_capture(),
            TriggerDecision::NoOp => TriggerDecision::NoOp,
        }
    }

    fn start_capture(&self) -> TriggerDecision {
        let observer = self
            .outcomes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone();
        decision_after_spawn(spawn_capture(
            Arc::clone(&self.host.screen),
            self.storage.capture_slot(),
            self.config.capture_quality,
            observer,
        ))
    }

    /// Called when the lock screen is about to draw. Hands the composed
    /// background to the sink and returns it; `None` means the host keeps its
    /// own background.
    pub fn on_lock_screen_about_to_render(&self, surface: SurfaceSize) -> Option<RgbaImage> {
        if !surface.is_measured() {
            debug!(width = surface.width, height = surface.height, "lock screen not laid out yet");
            return None;
        }

        // A failed reload keeps the previous snapshot, which is still usable.
        let _ = self.prefs.reload();
        let mode = self.prefs.mode();
        let params = CompositorParams {
            blur_percent: self.prefs.blur_percent(),
            tint: self.prefs.tint(),
        };

        let sources = SlotSources::new(self.storage.capture_slot());
        let composed = compose(&mode, &params, &sources)?;
        let rotation = self.host.sink.rotation();
        let background = rotate_for_display(composed, rotation);
        debug!(
            ?mode,
            ?rotation,
            width = background.width(),
            height = background.height(),
            "presenting lock-screen background"
        );
        if let Err(err) = self.host.sink.set_background(background.clone()) {
            warn!(error = %format!("{err:#}"), "background sink rejected the image");
            return None;
        }
        Some(background)
    }
}

/// A capture only counts as started once its worker thread exists.
fn decision_after_spawn(spawned: io::Result<JoinHandle<CaptureOutcome>>) -> TriggerDecision {
    match spawned {
        Ok(_) => TriggerDecision::StartCapture,
        Err(err) => {
            warn!(error = %err, "failed to start capture worker");
            TriggerDecision::NoOp
        }
    }
}
