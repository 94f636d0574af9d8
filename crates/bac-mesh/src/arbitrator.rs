//! Prime-admitter election.
//!
//! The election token is a discoverable service entry in the mesh's
//! network data. Publication succeeding (`EntryAdded`) makes this
//! device a candidate; it then waits a fixed delay before assuming the
//! prime role so that an older advertisement from a competing device
//! can propagate and suppress this device's own entry first. The delay
//! is a race-avoidance window, not an optimization.

use tracing::debug;

use crate::effect::Effect;
use crate::timer::Timer;

/// Election state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbitratorState {
    /// Not participating.
    Stopped,
    /// Election-service publication requested, not yet visible.
    Claiming,
    /// Publication visible; waiting out the race-avoidance delay.
    Candidate,
    /// This device is the mesh-wide prime admitter.
    Prime,
}

/// Network-data publisher event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublisherEvent {
    /// Our election-service entry appeared in network data.
    EntryAdded,
    /// Our election-service entry disappeared from network data.
    EntryRemoved,
}

/// Signal back to the orchestrator after an election event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbitratorSignal {
    /// No role change.
    None,
    /// Candidate delay elapsed; this device is now prime.
    BecamePrime,
    /// The prime role was lost; stop acting as commissioner.
    LostPrime,
}

/// Election state machine.
#[derive(Debug)]
pub struct Arbitrator {
    state: ArbitratorState,
    delay_timer: Timer,
    candidate_delay_ms: u64,
}

impl Arbitrator {
    /// Create a stopped arbitrator.
    #[must_use]
    pub const fn new(candidate_delay_ms: u64) -> Self {
        Self {
            state: ArbitratorState::Stopped,
            delay_timer: Timer::new(),
            candidate_delay_ms,
        }
    }

    /// Current election state.
    #[must_use]
    pub const fn state(&self) -> ArbitratorState {
        self.state
    }

    /// True iff the state is [`ArbitratorState::Prime`].
    #[must_use]
    pub fn is_prime_admitter(&self) -> bool {
        self.state == ArbitratorState::Prime
    }

    /// Begin the election. No-op unless stopped.
    pub fn start(&mut self, out: &mut Vec<Effect>) {
        if self.state != ArbitratorState::Stopped {
            return;
        }
        debug!("arbitrator claiming the election token");
        self.state = ArbitratorState::Claiming;
        out.push(Effect::PublishService);
    }

    /// Withdraw from the election. No-op if already stopped.
    pub fn stop(&mut self, out: &mut Vec<Effect>) {
        if self.state == ArbitratorState::Stopped {
            return;
        }
        debug!(from = ?self.state, "arbitrator stopping");
        self.delay_timer.stop();
        out.push(Effect::UnpublishService);
        self.state = ArbitratorState::Stopped;
    }

    /// React to a publisher event.
    pub fn handle_publisher_event(
        &mut self,
        event: PublisherEvent,
        now_ms: u64,
    ) -> ArbitratorSignal {
        match (event, self.state) {
            (PublisherEvent::EntryAdded, ArbitratorState::Claiming) => {
                debug!(delay_ms = self.candidate_delay_ms, "entry visible, candidate");
                self.state = ArbitratorState::Candidate;
                self.delay_timer
                    .fire_at(now_ms.saturating_add(self.candidate_delay_ms));
                ArbitratorSignal::None
            }
            (PublisherEvent::EntryRemoved, ArbitratorState::Candidate) => {
                debug!("entry reclaimed while candidate, back to claiming");
                self.delay_timer.stop();
                self.state = ArbitratorState::Claiming;
                ArbitratorSignal::None
            }
            (PublisherEvent::EntryRemoved, ArbitratorState::Prime) => {
                debug!("entry removed while prime, role lost");
                self.state = ArbitratorState::Claiming;
                ArbitratorSignal::LostPrime
            }
            _ => ArbitratorSignal::None,
        }
    }

    /// Fire the candidate delay timer if due.
    pub fn handle_timer(&mut self, now_ms: u64) -> ArbitratorSignal {
        if !self.delay_timer.poll(now_ms) {
            return ArbitratorSignal::None;
        }
        if self.state != ArbitratorState::Candidate {
            return ArbitratorSignal::None;
        }
        debug!("candidate delay elapsed, assuming prime role");
        self.state = ArbitratorState::Prime;
        ArbitratorSignal::BecamePrime
    }

    /// Pending delay-timer deadline.
    #[must_use]
    pub const fn next_deadline(&self) -> Option<u64> {
        self.delay_timer.deadline()
    }
}
