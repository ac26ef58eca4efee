use anyhow::{Result, bail};
use crossbeam_channel::Receiver;
use image::{Rgba, RgbaImage};
use lockscreen_backdrop::config::Configuration;
use lockscreen_backdrop::events::{
    CaptureOutcome, DisplayRotation, PowerFlags, PowerRequest, RequestId, ScreenState, SurfaceSize,
    TriggerDecision,
};
use lockscreen_backdrop::platform::host::{BackgroundSink, KeyguardMonitor, ScreenSource};
use lockscreen_backdrop::{HostCollaborators, Pipeline};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;

struct StubScreen {
    size: (u32, u32),
    color: Rgba<u8>,
    shots: AtomicUsize,
}

impl StubScreen {
    fn new(width: u32, height: u32) -> Self {
        Self {
            size: (width, height),
            color: Rgba([255, 255, 255, 255]),
            shots: AtomicUsize::new(0),
        }
    }
}

impl ScreenSource for StubScreen {
    fn natural_size(&self) -> Result<(u32, u32)> {
        Ok(self.size)
    }

    fn screenshot(&self, width: u32, height: u32) -> Result<Option<RgbaImage>> {
        self.shots.fetch_add(1, Ordering::SeqCst);
        Ok(Some(RgbaImage::from_pixel(width, height, self.color)))
    }
}

struct StubKeyguard(Mutex<Option<bool>>);

impl KeyguardMonitor for StubKeyguard {
    fn is_locked(&self) -> Option<bool> {
        *self.0.lock().unwrap()
    }
}

#[derive(Default)]
struct RecordingSink {
    rotation: Mutex<DisplayRotation>,
    received: Mutex<Vec<RgbaImage>>,
    reject: Mutex<bool>,
}

impl BackgroundSink for RecordingSink {
    fn rotation(&self) -> DisplayRotation {
        *self.rotation.lock().unwrap()
    }

    fn set_background(&self, image: RgbaImage) -> Result<()> {
        if *self.reject.lock().unwrap() {
            bail!("surface gone");
        }
        self.received.lock().unwrap().push(image);
        Ok(())
    }
}

struct Harness {
    pipeline: Pipeline,
    screen: Arc<StubScreen>,
    keyguard: Arc<StubKeyguard>,
    sink: Arc<RecordingSink>,
    outcomes: Receiver<CaptureOutcome>,
}

fn harness(dir: &Path, prefs_yaml: &str) -> Harness {
    fs::write(dir.join("preferences.yaml"), prefs_yaml).unwrap();
    let config = Configuration {
        storage_dir: dir.to_path_buf(),
        ..Configuration::default()
    };
    let screen = Arc::new(StubScreen::new(1080, 1920));
    let keyguard = Arc::new(StubKeyguard(Mutex::new(Some(false))));
    let sink = Arc::new(RecordingSink::default());
    let host = HostCollaborators {
        screen: screen.clone(),
        keyguard: keyguard.clone(),
        sink: sink.clone(),
    };
    let pipeline = Pipeline::from_config(config, host);
    pipeline.init().unwrap();
    let outcomes = pipeline.capture_outcomes();
    Harness { pipeline, screen, keyguard, sink, outcomes }
}

fn off(id: u64) -> PowerRequest {
    PowerRequest::new(ScreenState::Off, RequestId(id))
}

const LIVE_DARK_40: &str = "background: live-capture\nblur-percent: 40\ntint: dark\n";

#[test]
fn freshly_initialised_live_mode_renders_nothing() {
    let tmp = tempdir().unwrap();
    let h = harness(tmp.path(), LIVE_DARK_40);

    assert!(h.pipeline.storage().capture_slot().is_empty());
    assert!(h.pipeline.on_lock_screen_about_to_render(SurfaceSize::new(1080, 1920)).is_none());
    assert!(h.sink.received.lock().unwrap().is_empty());
}

#[test]
fn screen_off_capture_feeds_the_next_render() {
    let tmp = tempdir().unwrap();
    let h = harness(tmp.path(), LIVE_DARK_40);

    let decision = h.pipeline.on_display_request_evaluated(off(1), PowerFlags::default());
    assert_eq!(decision, TriggerDecision::StartCapture);
    let outcome = h.outcomes.recv_timeout(Duration::from_secs(10)).unwrap();
    assert!(matches!(outcome, CaptureOutcome::Stored { width: 1080, height: 1920, .. }));

    let bg = h
        .pipeline
        .on_lock_screen_about_to_render(SurfaceSize::new(1080, 1920))
        .unwrap();
    assert_eq!(bg.dimensions(), (900, 1600));
    let center = bg.get_pixel(450, 800).0;
    for channel in &center[..3] {
        assert!((*channel as i32 - 128).abs() <= 3, "{center:?}");
    }

    let received = h.sink.received.lock().unwrap();
    assert_eq!(received.len(), 1);
    assert_eq!(received[0], bg);
}

#[test]
fn rotated_display_gets_counter_rotated_background() {
    let tmp = tempdir().unwrap();
    let h = harness(tmp.path(), LIVE_DARK_40);
    h.pipeline.on_display_request_evaluated(off(1), PowerFlags::default());
    h.outcomes.recv_timeout(Duration::from_secs(10)).unwrap();

    *h.sink.rotation.lock().unwrap() = DisplayRotation::Deg90;
    let bg = h
        .pipeline
        .on_lock_screen_about_to_render(SurfaceSize::new(1920, 1080))
        .unwrap();
    assert_eq!(bg.dimensions(), (1600, 900));
}

#[test]
fn unmeasured_surface_is_not_ready() {
    let tmp = tempdir().unwrap();
    let h = harness(tmp.path(), "background: solid-color\ncolor: \"#FF102030\"\n");

    assert!(h.pipeline.on_lock_screen_about_to_render(SurfaceSize::new(0, 1920)).is_none());
    assert!(h.pipeline.on_lock_screen_about_to_render(SurfaceSize::new(1080, 0)).is_none());
    assert!(h.sink.received.lock().unwrap().is_empty());

    let bg = h
        .pipeline
        .on_lock_screen_about_to_render(SurfaceSize::new(1080, 1920))
        .unwrap();
    assert_eq!(bg.dimensions(), (1, 1));
    assert_eq!(bg.get_pixel(0, 0).0, [0x10, 0x20, 0x30, 0xFF]);
}

#[test]
fn duplicate_requests_capture_once() {
    let tmp = tempdir().unwrap();
    let h = harness(tmp.path(), LIVE_DARK_40);

    let decisions: Vec<_> = (0..5)
        .map(|_| h.pipeline.on_display_request_evaluated(off(42), PowerFlags::default()))
        .collect();
    assert_eq!(decisions.iter().filter(|d| **d == TriggerDecision::StartCapture).count(), 1);

    h.outcomes.recv_timeout(Duration::from_secs(10)).unwrap();
    assert!(h.outcomes.recv_timeout(Duration::from_millis(200)).is_err());
    assert_eq!(h.screen.shots.load(Ordering::SeqCst), 1);
}

#[test]
fn locked_keyguard_prevents_capture() {
    let tmp = tempdir().unwrap();
    let h = harness(tmp.path(), LIVE_DARK_40);
    *h.keyguard.0.lock().unwrap() = Some(true);

    assert_eq!(
        h.pipeline.on_display_request_evaluated(off(1), PowerFlags::default()),
        TriggerDecision::NoOp
    );
    *h.keyguard.0.lock().unwrap() = None;
    assert_eq!(
        h.pipeline.on_display_request_evaluated(off(2), PowerFlags::default()),
        TriggerDecision::NoOp
    );
    assert_eq!(h.screen.shots.load(Ordering::SeqCst), 0);
}

#[test]
fn other_modes_leave_detector_untouched() {
    let tmp = tempdir().unwrap();
    let h = harness(tmp.path(), "background: static-image\n");

    assert_eq!(
        h.pipeline.on_display_request_evaluated(off(7), PowerFlags::default()),
        TriggerDecision::NoOp
    );
    assert!(h.pipeline.detector().snapshot().last_seen.is_none());

    // Switching to live capture later still sees request 7 as new.
    fs::write(tmp.path().join("preferences.yaml"), LIVE_DARK_40).unwrap();
    assert_eq!(
        h.pipeline.on_display_request_evaluated(off(7), PowerFlags::default()),
        TriggerDecision::StartCapture
    );
    h.outcomes.recv_timeout(Duration::from_secs(10)).unwrap();
}

#[test]
fn static_mode_without_image_keeps_host_background() {
    let tmp = tempdir().unwrap();
    let h = harness(tmp.path(), "background: static-image\n");
    assert!(h.pipeline.on_lock_screen_about_to_render(SurfaceSize::new(1080, 1920)).is_none());

    RgbaImage::from_pixel(120, 200, Rgba([50, 60, 70, 255]))
        .save_with_format(h.pipeline.storage().static_image_path(), image::ImageFormat::Png)
        .unwrap();
    let bg = h
        .pipeline
        .on_lock_screen_about_to_render(SurfaceSize::new(1080, 1920))
        .unwrap();
    assert_eq!(bg.dimensions(), (120, 200));
}

#[test]
fn broken_preferences_skip_capture_but_render_last_good() {
    let tmp = tempdir().unwrap();
    let h = harness(tmp.path(), "background: solid-color\n");
    assert!(h.pipeline.on_lock_screen_about_to_render(SurfaceSize::new(10, 10)).is_some());

    fs::write(tmp.path().join("preferences.yaml"), "background: [oops\n").unwrap();
    assert_eq!(
        h.pipeline.on_display_request_evaluated(off(1), PowerFlags::default()),
        TriggerDecision::NoOp
    );
    let bg = h
        .pipeline
        .on_lock_screen_about_to_render(SurfaceSize::new(10, 10))
        .unwrap();
    assert_eq!(bg.get_pixel(0, 0).0, [0, 0, 0, 0xFF]);
}

#[test]
fn rejected_background_is_not_reported_as_presented() {
    let tmp = tempdir().unwrap();
    let h = harness(tmp.path(), "background: solid-color\n");
    *h.sink.reject.lock().unwrap() = true;

    assert!(h.pipeline.on_lock_screen_about_to_render(SurfaceSize::new(10, 10)).is_none());
    assert!(h.sink.received.lock().unwrap().is_empty());

    *h.sink.reject.lock().unwrap() = false;
    assert!(h.pipeline.on_lock_screen_about_to_render(SurfaceSize::new(10, 10)).is_some());
}

#[test]
fn late_observer_sees_only_fresh_outcomes() {
    let tmp = tempdir().unwrap();
    let h = harness(tmp.path(), LIVE_DARK_40);

    for id in 1..=3 {
        assert_eq!(
            h.pipeline.on_display_request_evaluated(off(id), PowerFlags::default()),
            TriggerDecision::StartCapture
        );
    }
    for _ in 0..3 {
        h.outcomes.recv_timeout(Duration::from_secs(10)).unwrap();
    }

    let late = h.pipeline.capture_outcomes();
    assert!(late.try_recv().is_err());

    h.pipeline.on_display_request_evaluated(off(4), PowerFlags::default());
    let outcome = late.recv_timeout(Duration::from_secs(10)).unwrap();
    assert!(matches!(outcome, CaptureOutcome::Stored { .. }));
    assert!(late.recv_timeout(Duration::from_millis(200)).is_err());
    // The replaced observer gets nothing from the newer attempt.
    assert!(h.outcomes.recv_timeout(Duration::from_millis(200)).is_err());
    assert_eq!(h.screen.shots.load(Ordering::SeqCst), 4);
}
