//! Decides which display-power requests start a live capture.
//!
//! A capture is due when the screen is being turned off while the keyguard is
//! still unlocked, i.e. the last moment the real screen content is visible.
//! Repeated callbacks for the same pending request never trigger twice.

use std::sync::{Mutex, MutexGuard};

use tracing::{debug, trace};

use crate::config::TriggerPolicy;
use crate::events::{PowerFlags, PowerRequest, ScreenState, TriggerDecision};

#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionState {
    pub last_seen: Option<PowerRequest>,
    pub keyguard_locked: bool,
}

#[derive(Debug, Default)]
pub struct TransitionDetector {
    policy: TriggerPolicy,
    state: Mutex<TransitionState>,
}

impl TransitionDetector {
    pub fn new(policy: TriggerPolicy) -> Self {
        Self {
            policy,
            state: Mutex::new(TransitionState::default()),
        }
    }

    pub fn policy(&self) -> TriggerPolicy {
        self.policy
    }

    /// Evaluates `request` and records it as the last seen request, whatever
    /// the decision. An unknown keyguard state counts as locked.
    pub fn evaluate(
        &self,
        request: PowerRequest,
        flags: PowerFlags,
        keyguard_locked: Option<bool>,
    ) -> TriggerDecision {
        let mut state = self.lock_state();
        let is_new = state
            .last_seen
            .is_none_or(|previous| !previous.is_same_request(&request));
        let locked = keyguard_locked.unwrap_or(true);

        state.last_seen = Some(request);
        state.keyguard_locked = locked;
        drop(state);

        let screen_off = request.screen_state == ScreenState::Off;
        let fire = match self.policy {
            TriggerPolicy::ScreenOff => screen_off && !locked && is_new,
            // Novelty gates both policies; a request id captures at most once.
            TriggerPolicy::ProximityAware => {
                screen_off
                    && !locked
                    && is_new
                    && (flags.display_ready || !flags.pending_request_changed)
            }
        };

        trace!(
            id = request.id.0,
            state = ?request.screen_state,
            is_new,
            locked,
            ?flags,
            "evaluated power request"
        );
        if fire {
            debug!(id = request.id.0, "screen going off while unlocked; capture due");
            TriggerDecision::StartCapture
        } else {
            TriggerDecision::NoOp
        }
    }

    pub fn snapshot(&self) -> TransitionState {
        *self.lock_state()
    }

    // The state is a plain value, so a panic elsewhere cannot leave it torn.
    fn lock_state(&self) -> MutexGuard<'_, TransitionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
