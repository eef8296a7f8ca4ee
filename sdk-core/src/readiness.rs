//! Endpoint readiness probe.
//!
//! The only retry loop the SDK runs on its own. A freshly deployed endpoint
//! answers 503 until it is ready; the probe retries that status a bounded
//! number of times with a fixed delay. Every other status ends the probe.
//!
//! Like the rest of this crate the probe is pure: it consumes observed
//! statuses and returns the next [`ProbeAction`]; the client sleeps and
//! re-sends.

use std::time::Duration;

/// Status the server uses for "not ready yet".
pub const NOT_READY_STATUS: u16 = 503;

/// Default number of attempts, first one included.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default fixed delay between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// What the caller should do after an attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeAction {
    /// Endpoint answered with success.
    Ready,
    /// Still not ready; wait and try again.
    RetryAfter(Duration),
    /// Still not ready and out of attempts.
    GiveUp,
    /// Any other status: stop and report it.
    Fail,
}

/// Bounded, fixed-delay retry state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadinessProbe {
    attempts: u32,
    max_attempts: u32,
    delay: Duration,
}

impl ReadinessProbe {
    /// A probe with the default bounds.
    pub fn new() -> Self {
        Self::with_limits(DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY)
    }

    /// A probe with custom bounds. `max_attempts` is clamped to at least 1.
    pub fn with_limits(max_attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: 0,
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Record the status of one attempt.
    pub fn on_status(&mut self, status: u16) -> ProbeAction {
        self.attempts = self.attempts.saturating_add(1);
        match status {
            200..=299 => ProbeAction::Ready,
            NOT_READY_STATUS if self.attempts < self.max_attempts => {
                ProbeAction::RetryAfter(self.delay)
            }
            NOT_READY_STATUS => ProbeAction::GiveUp,
            _ => ProbeAction::Fail,
        }
    }

    /// Attempts recorded so far.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

impl Default for ReadinessProbe {
    fn default() -> Self {
        Self::new()
    }
}
