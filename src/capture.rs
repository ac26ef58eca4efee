//! Background worker that snapshots the screen into the capture slot.

use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use anyhow::Context;
use crossbeam_channel::Sender;
use tracing::{debug, info, warn};

use crate::events::CaptureOutcome;
use crate::platform::host::ScreenSource;
use crate::slot::CaptureSlot;

/// Runs one capture on a dedicated thread so the power-management callback
/// returns immediately. The outcome is returned through the handle and, when
/// an observer is given, offered to it; a full or disconnected channel is not
/// an error.
pub fn spawn_capture(
    source: Arc<dyn ScreenSource>,
    slot: CaptureSlot,
    quality: u8,
    outcomes: Option<Sender<CaptureOutcome>>,
) -> io::Result<JoinHandle<CaptureOutcome>> {
    thread::Builder::new()
        .name("backdrop-capture".into())
        .spawn(move || {
            let outcome = run_capture(source.as_ref(), &slot, quality);
            if let Some(outcomes) = outcomes {
                if outcomes.try_send(outcome.clone()).is_err() {
                    debug!("capture outcome dropped; observer is full or gone");
                }
            }
            outcome
        })
}

/// Captures the screen at its natural size and publishes it. Never panics and
/// never leaves the slot half-written; on any failure the previous content
/// stays.
pub fn run_capture(source: &dyn ScreenSource, slot: &CaptureSlot, quality: u8) -> CaptureOutcome {
    let result = (|| -> anyhow::Result<CaptureOutcome> {
        let (width, height) = source
            .natural_size()
            .context("failed to query display size")?;
        debug!(width, height, "capturing screen");

        let Some(frame) = source
            .screenshot(width, height)
            .context("screenshot failed")?
        else {
            return Ok(CaptureOutcome::NoContent);
        };

        let bytes = slot
            .publish_jpeg(&frame, quality)
            .context("failed to publish capture")?;
        Ok(CaptureOutcome::Stored {
            width: frame.width(),
            height: frame.height(),
            bytes,
        })
    })();

    match result {
        Ok(outcome @ CaptureOutcome::Stored { .. }) => {
            info!(?outcome, path = %slot.path().display(), "stored live capture");
            outcome
        }
        Ok(outcome) => {
            warn!("display returned no content; keeping previous capture");
            outcome
        }
        Err(err) => {
            warn!(error = %format!("{err:#}"), "capture failed; keeping previous capture");
            CaptureOutcome::Failed(format!("{err:#}"))
        }
    }
}
