//! # Cancellation
//!
//! [`CancellationSignal`] is the one piece of an attempt shared with other
//! tasks. It moves from "none" to a single terminal reason exactly once.
//!
//! The commit deadline lives in the signal itself and is checked whenever
//! the reason is read, so expiry does not depend on another task getting
//! scheduled while the commit loop holds the thread. [`DeadlineTimer`]
//! sets that deadline and clears it when dropped.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::trace;

use crate::error::InterruptReason;

const NONE: u8 = 0;
const NEW_HEAD: u8 = 1;
const RESUBMIT: u8 = 2;
const TIMEOUT: u8 = 3;

const NO_DEADLINE: u64 = u64::MAX;

#[derive(Debug)]
pub struct CancellationSignal {
    state: AtomicU8,
    origin: Instant,
    /// Nanoseconds after `origin`; `NO_DEADLINE` when unarmed.
    deadline: AtomicU64,
}

impl Default for CancellationSignal {
    fn default() -> Self {
        Self {
            state: AtomicU8::new(NONE),
            origin: Instant::now(),
            deadline: AtomicU64::new(NO_DEADLINE),
        }
    }
}

impl CancellationSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the signal. Returns `false` if it was already set; the first
    /// reason sticks.
    pub fn fire(&self, reason: InterruptReason) -> bool {
        let value = match reason {
            InterruptReason::NewHead => NEW_HEAD,
            InterruptReason::Resubmit => RESUBMIT,
            InterruptReason::Timeout => TIMEOUT,
        };
        self.state
            .compare_exchange(NONE, value, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Fire with [`InterruptReason::Timeout`] once `after` has elapsed from
    /// now. Replaces any earlier deadline.
    pub fn set_deadline(&self, after: Duration) {
        let at = self.origin.elapsed().saturating_add(after);
        let nanos = u64::try_from(at.as_nanos()).unwrap_or(NO_DEADLINE - 1);
        self.deadline.store(nanos, Ordering::Release);
    }

    pub fn clear_deadline(&self) {
        self.deadline.store(NO_DEADLINE, Ordering::Release);
    }

    /// The terminal reason, if any. An expired deadline is turned into
    /// [`InterruptReason::Timeout`] here.
    pub fn reason(&self) -> Option<InterruptReason> {
        if self.state.load(Ordering::Acquire) == NONE {
            self.check_deadline();
        }
        match self.state.load(Ordering::Acquire) {
            NEW_HEAD => Some(InterruptReason::NewHead),
            RESUBMIT => Some(InterruptReason::Resubmit),
            TIMEOUT => Some(InterruptReason::Timeout),
            _ => None,
        }
    }

    pub fn is_set(&self) -> bool {
        self.reason().is_some()
    }

    fn check_deadline(&self) {
        let deadline = self.deadline.load(Ordering::Acquire);
        if deadline == NO_DEADLINE {
            return;
        }
        let now = u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(NO_DEADLINE - 1);
        if now >= deadline && self.fire(InterruptReason::Timeout) {
            trace!(late_ns = now - deadline, "Commit deadline reached");
        }
    }
}

/// Arms a commit deadline on a signal for as long as it is held. Needs no
/// runtime: the signal checks the deadline itself on every read.
#[derive(Debug)]
pub struct DeadlineTimer {
    signal: Arc<CancellationSignal>,
}

impl DeadlineTimer {
    pub fn arm(signal: Arc<CancellationSignal>, after: Duration) -> Self {
        signal.set_deadline(after);
        Self { signal }
    }

    /// Disarm by dropping; equivalent to `drop(timer)`. A reason already
    /// fired stays fired.
    pub fn disarm(self) {}
}

impl Drop for DeadlineTimer {
    fn drop(&mut self) {
        self.signal.clear_deadline();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_reason_sticks() {
        let signal = CancellationSignal::new();
        assert!(!signal.is_set());
        assert_eq!(signal.reason(), None);
        assert!(signal.fire(InterruptReason::NewHead));
        assert!(!signal.fire(InterruptReason::Timeout));
        assert_eq!(signal.reason(), Some(InterruptReason::NewHead));
    }

    #[test]
    fn test_deadline_fires_without_runtime() {
        let signal = Arc::new(CancellationSignal::new());
        let _timer = DeadlineTimer::arm(signal.clone(), Duration::from_millis(10));
        assert_eq!(signal.reason(), None);
        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(signal.reason(), Some(InterruptReason::Timeout));
    }

    #[test]
    fn test_dropped_timer_never_fires() {
        let signal = Arc::new(CancellationSignal::new());
        let timer = DeadlineTimer::arm(signal.clone(), Duration::from_millis(10));
        timer.disarm();
        std::thread::sleep(Duration::from_millis(30));
        assert!(!signal.is_set());
    }

    #[test]
    fn test_earlier_reason_wins_over_deadline() {
        let signal = Arc::new(CancellationSignal::new());
        let _timer = DeadlineTimer::arm(signal.clone(), Duration::ZERO);
        assert!(signal.fire(InterruptReason::Resubmit));
        assert_eq!(signal.reason(), Some(InterruptReason::Resubmit));
    }

    #[tokio::test]
    async fn test_deadline_seen_by_blocking_reader() {
        // The reader never yields, so nothing else on this thread runs.
        let signal = Arc::new(CancellationSignal::new());
        let _timer = DeadlineTimer::arm(signal.clone(), Duration::from_millis(10));
        let start = Instant::now();
        while signal.reason().is_none() {
            assert!(start.elapsed() < Duration::from_secs(5));
            std::thread::sleep(Duration::from_millis(1));
        }
        assert_eq!(signal.reason(), Some(InterruptReason::Timeout));
    }
}
