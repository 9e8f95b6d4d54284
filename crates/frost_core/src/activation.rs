//! Activation debounce
//!
//! The blur only becomes visible once the caller's "should blur" intent has been held
//! continuously for the activation delay. Any deactivation, even for one frame,
//! discards the pending or captured result and restarts the timer.
//!
//! ```text
//!             intent ↑                      delay elapsed + capture ok
//!   Idle ──────────────▶ PendingCapture ─────────────────────────────▶ Captured
//!    ▲                        │                                            │
//!    └──── intent ↓ ──────────┴──────────────── intent ↓ ──────────────────┘
//! ```

/// Where the effect is in its activation cycle
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum ActivationState {
    /// Not requested
    #[default]
    Idle,
    /// Requested at `activated_at` seconds; waiting out the delay or retrying a capture
    PendingCapture { activated_at: f64 },
    /// Background captured and blurred; reused every frame
    Captured,
}

/// What the renderer has to do this frame
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivationAction {
    None,
    /// Capture and blur the background, then call
    /// [`ActivationStateMachine::mark_captured`] on success
    Capture,
}

/// Frame-to-frame debounce of the caller's blur intent
#[derive(Clone, Debug, Default)]
pub struct ActivationStateMachine {
    state: ActivationState,
    previous_intent: bool,
}

impl ActivationStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ActivationState {
        self.state
    }

    pub fn is_captured(&self) -> bool {
        self.state == ActivationState::Captured
    }

    /// Force `Idle` and forget the previous intent
    ///
    /// Used on resize and device change. An intent that is still held on the next
    /// frame counts as a fresh activation, so the full delay applies again.
    pub fn reset(&mut self) {
        if self.state != ActivationState::Idle {
            tracing::debug!("blur activation reset from {:?}", self.state);
        }
        self.state = ActivationState::Idle;
        self.previous_intent = false;
    }

    /// Advance one frame
    ///
    /// `now` is the host's monotonic clock in seconds. A NaN or negative `delay`
    /// counts as zero.
    pub fn advance(&mut self, intent: bool, now: f64, delay: f64) -> ActivationAction {
        let rising = intent && !self.previous_intent;
        let falling = !intent && self.previous_intent;
        self.previous_intent = intent;

        if falling {
            if self.state != ActivationState::Idle {
                tracing::debug!("blur deactivated from {:?}", self.state);
            }
            self.state = ActivationState::Idle;
            return ActivationAction::None;
        }

        if rising {
            tracing::debug!("blur activated at {:.3}s", now);
            self.state = ActivationState::PendingCapture { activated_at: now };
        }

        match self.state {
            ActivationState::PendingCapture { activated_at }
                if intent && now - activated_at >= sanitize_delay(delay) =>
            {
                ActivationAction::Capture
            }
            _ => ActivationAction::None,
        }
    }

    /// Record a successful capture + blur
    ///
    /// Only moves out of `PendingCapture`. A failed attempt simply skips this call:
    /// the state stays pending with its original timestamp and the capture is retried
    /// on the next frame.
    pub fn mark_captured(&mut self) {
        if let ActivationState::PendingCapture { activated_at } = self.state {
            tracing::debug!("blur captured (activated at {:.3}s)", activated_at);
            self.state = ActivationState::Captured;
        }
    }
}

fn sanitize_delay(delay: f64) -> f64 {
    if delay.is_nan() {
        0.0
    } else {
        delay.max(0.0)
    }
}
