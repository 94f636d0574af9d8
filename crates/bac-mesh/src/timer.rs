//! Deadline timers.
//!
//! A timer is a deadline value the embedding run loop polls; it never
//! wakes anything by itself. Re-arming to an earlier deadline without
//! disturbing a later pending one (`fire_at_if_earlier`) lets a freshly
//! accepted joiner tighten the shared expiry timer without a rescan.

/// A stoppable, re-armable deadline in uptime milliseconds.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    deadline_ms: Option<u64>,
}

impl Timer {
    /// A stopped timer.
    #[must_use]
    pub const fn new() -> Self {
        Self { deadline_ms: None }
    }

    /// Arm (or re-arm) the timer at the given deadline.
    pub const fn fire_at(&mut self, deadline_ms: u64) {
        self.deadline_ms = Some(deadline_ms);
    }

    /// Arm the timer only if stopped or if the new deadline is earlier.
    pub const fn fire_at_if_earlier(&mut self, deadline_ms: u64) {
        match self.deadline_ms {
            Some(current) if current <= deadline_ms => {}
            _ => self.deadline_ms = Some(deadline_ms),
        }
    }

    /// Deactivate with no residual effect.
    pub const fn stop(&mut self) {
        self.deadline_ms = None;
    }

    /// True if a deadline is pending.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.deadline_ms.is_some()
    }

    /// Pending deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<u64> {
        self.deadline_ms
    }

    /// True if armed and the deadline has been reached.
    #[must_use]
    pub const fn is_due(&self, now_ms: u64) -> bool {
        match self.deadline_ms {
            Some(deadline) => deadline <= now_ms,
            None => false,
        }
    }

    /// Consume a due deadline: disarms and returns true if due.
    pub const fn poll(&mut self, now_ms: u64) -> bool {
        if self.is_due(now_ms) {
            self.deadline_ms = None;
            true
        } else {
            false
        }
    }
}

/// Minimum of two optional deadlines.
#[must_use]
pub fn earliest(a: Option<u64>, b: Option<u64>) -> Option<u64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (deadline, None) | (None, deadline) => deadline,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fire_at_if_earlier_only_tightens() {
        let mut timer = Timer::new();
        timer.fire_at_if_earlier(500);
        assert_eq!(timer.deadline(), Some(500));

        timer.fire_at_if_earlier(900);
        assert_eq!(timer.deadline(), Some(500));

        timer.fire_at_if_earlier(100);
        assert_eq!(timer.deadline(), Some(100));
    }

    #[test]
    fn poll_consumes_exactly_once() {
        let mut timer = Timer::new();
        timer.fire_at(100);
        assert!(!timer.poll(99));
        assert!(timer.poll(100));
        assert!(!timer.poll(100));
        assert!(!timer.is_running());
    }

    #[test]
    fn stop_clears_pending_deadline() {
        let mut timer = Timer::new();
        timer.fire_at(100);
        timer.stop();
        assert!(!timer.is_due(1_000));
        assert_eq!(timer.deadline(), None);
    }

    #[test]
    fn earliest_prefers_the_sooner_deadline() {
        assert_eq!(earliest(Some(5), Some(3)), Some(3));
        assert_eq!(earliest(None, Some(3)), Some(3));
        assert_eq!(earliest(Some(5), None), Some(5));
        assert_eq!(earliest(None, None), None);
    }
}
