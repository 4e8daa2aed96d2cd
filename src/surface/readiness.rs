//! Readiness gate for the content surface.
//!
//! ```text
//! NotReady --(navigated)--> Ready --(load html)--> NotReady
//! ```
//!
//! Only the owner loop holds the [`ReadinessGate`] and mutates the state.
//! Operations hold a [`Readiness`] watcher and poll it on a timer.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{Instant, sleep};
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};

// ============================================================================
// Constants
// ============================================================================

/// Default delay between readiness checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Default number of delays before giving up.
pub const DEFAULT_POLL_ATTEMPTS: u32 = 50;

// ============================================================================
// ReadinessState
// ============================================================================

/// Whether the content surface finished its initial load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadinessState {
    /// Content is loading; scripts must not run.
    #[default]
    NotReady,
    /// Content finished loading and is safe to script.
    Ready,
}

// ============================================================================
// PollPolicy
// ============================================================================

/// Bounded polling schedule used while waiting for readiness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between checks.
    pub interval: Duration,
    /// Maximum number of delays.
    pub max_attempts: u32,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_attempts: DEFAULT_POLL_ATTEMPTS,
        }
    }
}

impl PollPolicy {
    /// Upper bound on time spent polling.
    #[inline]
    #[must_use]
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts
    }

    /// The same schedule with `elapsed` already spent.
    ///
    /// Keeps only the whole intervals that still fit in the budget.
    #[must_use]
    pub fn remaining(&self, elapsed: Duration) -> Self {
        let left = self.budget().saturating_sub(elapsed);
        let max_attempts = if self.interval.is_zero() {
            self.max_attempts
        } else {
            (left.as_nanos() / self.interval.as_nanos()) as u32
        };
        Self {
            interval: self.interval,
            max_attempts,
        }
    }
}

// ============================================================================
// ReadinessGate
// ============================================================================

/// Write side of the readiness state. Owned by the owner loop.
#[derive(Debug)]
pub(crate) struct ReadinessGate {
    tx: watch::Sender<ReadinessState>,
}

impl ReadinessGate {
    /// Creates a gate in the `NotReady` state.
    pub(crate) fn new() -> Self {
        let (tx, _rx) = watch::channel(ReadinessState::NotReady);
        Self { tx }
    }

    /// Returns a watcher for this gate.
    pub(crate) fn watcher(&self) -> Readiness {
        Readiness {
            rx: self.tx.subscribe(),
        }
    }

    /// Re-arms the gate before new content is loaded.
    pub(crate) fn arm(&self) {
        let previous = self.tx.send_replace(ReadinessState::NotReady);
        trace!(?previous, "Readiness re-armed");
    }

    /// Records a completed navigation.
    ///
    /// Returns `true` if the state transitioned to `Ready`.
    pub(crate) fn mark_ready(&self) -> bool {
        self.tx.send_if_modified(|state| {
            if *state == ReadinessState::Ready {
                false
            } else {
                *state = ReadinessState::Ready;
                true
            }
        })
    }
}

// ============================================================================
// Readiness
// ============================================================================

/// Read side of the readiness state.
///
/// Cheap to clone; every clone observes the same gate.
#[derive(Debug, Clone)]
pub struct Readiness {
    rx: watch::Receiver<ReadinessState>,
}

impl Readiness {
    /// Returns the current state.
    #[inline]
    #[must_use]
    pub fn state(&self) -> ReadinessState {
        *self.rx.borrow()
    }

    /// Returns `true` if the surface is ready.
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.state() == ReadinessState::Ready
    }

    /// Waits for the surface to become ready.
    ///
    /// Checks the state, then sleeps `policy.interval` between checks for
    /// at most `policy.max_attempts` sleeps. Sleeping yields to the runtime;
    /// it never blocks the thread.
    ///
    /// # Errors
    ///
    /// - [`Error::WebViewNotReady`] if the surface is still loading after
    ///   the last attempt
    /// - [`Error::SurfaceClosed`] if the owner loop shut down before the
    ///   surface became ready
    pub async fn wait_ready(&self, policy: PollPolicy) -> Result<()> {
        let started = Instant::now();
        let mut attempts = 0;

        while !self.is_ready() && attempts < policy.max_attempts {
            if self.rx.has_changed().is_err() {
                debug!(attempts, "Owner loop gone while waiting for readiness");
                return Err(Error::SurfaceClosed);
            }

            sleep(policy.interval).await;
            attempts += 1;
        }

        if self.is_ready() {
            trace!(attempts, "Surface ready");
            return Ok(());
        }

        let waited_ms = started.elapsed().as_millis() as u64;
        warn!(attempts, waited_ms, "Timed out waiting for surface readiness");
        Err(Error::web_view_not_ready(attempts, waited_ms))
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = PollPolicy::default();
        assert_eq!(policy.interval, Duration::from_millis(100));
        assert_eq!(policy.max_attempts, 50);
        assert_eq!(policy.budget(), Duration::from_secs(5));
    }

    #[test]
    fn test_remaining_budget() {
        let policy = PollPolicy::default();

        assert_eq!(policy.remaining(Duration::ZERO), policy);
        assert_eq!(policy.remaining(Duration::from_millis(1250)).max_attempts, 37);
        assert_eq!(policy.remaining(Duration::from_secs(5)).max_attempts, 0);
        assert_eq!(policy.remaining(Duration::from_secs(60)).max_attempts, 0);
    }

    #[test]
    fn test_transitions() {
        let gate = ReadinessGate::new();
        let readiness = gate.watcher();
        assert_eq!(readiness.state(), ReadinessState::NotReady);

        assert!(gate.mark_ready());
        assert!(readiness.is_ready());

        // Second navigation while ready is not a new transition.
        assert!(!gate.mark_ready());
        assert!(readiness.is_ready());

        gate.arm();
        assert!(!readiness.is_ready());
        assert!(gate.mark_ready());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ready_returns_immediately() {
        let gate = ReadinessGate::new();
        gate.mark_ready();

        let started = Instant::now();
        gate.watcher()
            .wait_ready(PollPolicy::default())
            .await
            .expect("ready");
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_is_bounded() {
        let gate = ReadinessGate::new();
        let readiness = gate.watcher();

        let started = Instant::now();
        let err = readiness
            .wait_ready(PollPolicy::default())
            .await
            .unwrap_err();
        let elapsed = started.elapsed();

        match err {
            Error::WebViewNotReady { attempts, .. } => assert_eq!(attempts, 50),
            other => panic!("unexpected error: {other}"),
        }
        assert!(elapsed >= Duration::from_millis(5000));
        assert!(elapsed <= Duration::from_millis(5500));
        drop(gate);
    }

    #[tokio::test(start_paused = true)]
    async fn test_observes_transition_while_polling() {
        let gate = ReadinessGate::new();
        let readiness = gate.watcher();

        let waiter = tokio::spawn(async move { readiness.wait_ready(PollPolicy::default()).await });

        sleep(Duration::from_millis(1250)).await;
        gate.mark_ready();

        waiter.await.expect("join").expect("ready");
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_gate_fails_fast() {
        let gate = ReadinessGate::new();
        let readiness = gate.watcher();
        drop(gate);

        let err = readiness
            .wait_ready(PollPolicy::default())
            .await
            .unwrap_err();
        assert!(err.is_closed());
    }
}
