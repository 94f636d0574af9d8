//! Border-admission orchestrator.
//!
//! Owns the election arbitrator, the commissioner petitioner, and the
//! enroller registry, and presents the single entry point the run loop
//! drives: inbound events go in through `handle_*` methods, outbound
//! actions come back out of [`Admitter::take_effects`]. Everything is
//! single-threaded; `now_ms` is the caller's monotonic uptime and the
//! only notion of time in here.

use bac_core::{
    AdmitterState, EnrollerMode, EnrollerNotice, EnrollerRequest, EnrollerResponse, JoinerRelayFrame,
    LeaderResponse, LinkError, Liveness, RejectStatus, StatusReport, SteeringData, UdpProxyFrame,
};
use tracing::{debug, info, warn};

use crate::arbitrator::{Arbitrator, ArbitratorSignal, ArbitratorState, PublisherEvent};
use crate::effect::{Effect, TxnId};
use crate::enroller::{EnrollerRecord, RegistryError, SessionId, SessionRegistry};
use crate::petitioner::{CommissionerPetitioner, PetitionerConfig, PetitionerState};
use crate::timer::{Timer, earliest};

/// Orchestrator tunables.
#[derive(Debug, Clone)]
pub struct AdmitterConfig {
    /// Race-avoidance delay between the election entry becoming visible
    /// and assuming the prime role.
    pub candidate_delay_ms: u64,
    /// Lifetime of an unrenewed joiner claim.
    pub joiner_lifetime_ms: u64,
    /// Enroller registration capacity.
    pub max_enrollers: usize,
    /// Joiner claims allowed per enroller.
    pub max_joiners_per_enroller: usize,
    /// Commissioner lease tunables.
    pub petitioner: PetitionerConfig,
}

impl Default for AdmitterConfig {
    fn default() -> Self {
        Self {
            candidate_delay_ms: 30_000,
            joiner_lifetime_ms: 120_000,
            max_enrollers: 8,
            max_joiners_per_enroller: 16,
            petitioner: PetitionerConfig::default(),
        }
    }
}

impl AdmitterConfig {
    /// Override the commissioner identifier presented to the leader.
    #[must_use]
    pub fn with_commissioner_id(mut self, id: impl Into<String>) -> Self {
        self.petitioner.commissioner_id = id.into();
        self
    }

    /// Override the candidate race-avoidance delay.
    #[must_use]
    pub const fn with_candidate_delay_ms(mut self, delay_ms: u64) -> Self {
        self.candidate_delay_ms = delay_ms;
        self
    }

    /// Override the joiner claim lifetime.
    #[must_use]
    pub const fn with_joiner_lifetime_ms(mut self, lifetime_ms: u64) -> Self {
        self.joiner_lifetime_ms = lifetime_ms;
        self
    }
}

/// What the orchestrator needs to know about the surrounding mesh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MeshView {
    /// This device is attached to a mesh partition.
    pub attached: bool,
    /// The mesh's distributed data advertises a commissioner locator
    /// that is not ours.
    pub other_commissioner_present: bool,
}

/// The border-admission subsystem.
#[derive(Debug)]
pub struct Admitter {
    config: AdmitterConfig,
    enabled: bool,
    mesh: MeshView,
    arbitrator: Arbitrator,
    petitioner: CommissionerPetitioner,
    registry: SessionRegistry,
    joiner_timer: Timer,
    last_reported: Option<StatusReport>,
    effects: Vec<Effect>,
}

impl Admitter {
    /// Create a disabled, detached admitter.
    #[must_use]
    pub fn new(config: AdmitterConfig) -> Self {
        let arbitrator = Arbitrator::new(config.candidate_delay_ms);
        let petitioner = CommissionerPetitioner::new(config.petitioner.clone());
        let registry = SessionRegistry::new(config.max_enrollers);
        Self {
            config,
            enabled: false,
            mesh: MeshView::default(),
            arbitrator,
            petitioner,
            registry,
            joiner_timer: Timer::new(),
            last_reported: None,
            effects: Vec::new(),
        }
    }

    // === Lifecycle ======================================================

    /// Enable or disable the subsystem.
    pub fn set_enabled(&mut self, enabled: bool, now_ms: u64) {
        if self.enabled == enabled {
            return;
        }
        info!(enabled, "admission subsystem toggled");
        self.enabled = enabled;
        self.effects.push(Effect::CapabilityFlagChanged { enabled });
        self.evaluate(now_ms);
    }

    /// Adopt a new snapshot of the surrounding mesh.
    pub fn handle_mesh_change(&mut self, mesh: MeshView, now_ms: u64) {
        if self.mesh == mesh {
            return;
        }
        self.mesh = mesh;
        self.petitioner.handle_net_data_change(
            mesh.other_commissioner_present,
            now_ms,
            &mut self.effects,
        );
        self.evaluate(now_ms);
    }

    // === Election and leader plumbing ===================================

    /// React to our election-service entry appearing or disappearing.
    pub fn handle_publisher_event(&mut self, event: PublisherEvent, now_ms: u64) {
        let signal = self.arbitrator.handle_publisher_event(event, now_ms);
        self.apply_signal(signal, now_ms);
        self.maybe_report(now_ms);
    }

    /// Correlate a leader response or transport failure.
    pub fn handle_leader_response(
        &mut self,
        txn: TxnId,
        outcome: Result<LeaderResponse, LinkError>,
        now_ms: u64,
    ) {
        if self
            .petitioner
            .handle_leader_response(txn, outcome, now_ms, &mut self.effects)
        {
            self.maybe_report(now_ms);
        }
    }

    /// Advance every due timer.
    pub fn handle_timer(&mut self, now_ms: u64) {
        let signal = self.arbitrator.handle_timer(now_ms);
        self.apply_signal(signal, now_ms);

        self.petitioner.handle_retry_timer(now_ms, &mut self.effects);
        self.petitioner
            .handle_keepalive_timer(now_ms, &mut self.effects);

        if self.joiner_timer.poll(now_ms) {
            let (removed, next) = self.registry.sweep_expired(now_ms);
            if removed > 0 {
                debug!(removed, "expired joiner claims swept");
            }
            self.rearm_joiner_timer(next);
        }

        self.maybe_report(now_ms);
    }

    /// Earliest deadline across every internal timer; the run loop
    /// calls [`Admitter::handle_timer`] no later than this.
    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        earliest(
            earliest(self.arbitrator.next_deadline(), self.petitioner.next_deadline()),
            self.joiner_timer.deadline(),
        )
    }

    // === Session surface ================================================

    /// Track a newly connected enroller session.
    pub fn session_connected(&mut self, session: SessionId, now_ms: u64) {
        debug!(session = session.0, "session connected");
        self.registry.session_connected(session, now_ms);
    }

    /// Drop a closed session; its registration and joiner claims go
    /// with it.
    pub fn session_closed(&mut self, session: SessionId, now_ms: u64) {
        debug!(session = session.0, "session closed");
        if self.registry.session_closed(session) {
            self.refresh_steering(now_ms);
            let (_, next) = self.registry.sweep_expired(now_ms);
            self.rearm_joiner_timer(next);
            self.evaluate(now_ms);
        }
    }

    /// Handle a confirmable request from an enroller session.
    pub fn handle_enroller_request(
        &mut self,
        session: SessionId,
        request: EnrollerRequest,
        now_ms: u64,
    ) -> EnrollerResponse {
        let response = match request {
            EnrollerRequest::Register {
                enroller_id,
                mode,
                steering,
            } => self.handle_register(session, enroller_id, mode, steering, now_ms),
            EnrollerRequest::KeepAlive {
                liveness,
                mode,
                steering,
            } => self.handle_keep_alive(session, liveness, mode, steering, now_ms),
            EnrollerRequest::JoinerAccept { iid } => self.handle_joiner_accept(session, iid, now_ms),
            EnrollerRequest::JoinerRelease { iid } => {
                self.handle_joiner_release(session, iid, now_ms)
            }
        };
        self.maybe_report(now_ms);
        response
    }

    fn handle_register(
        &mut self,
        session: SessionId,
        enroller_id: String,
        mode: u8,
        steering: Vec<u8>,
        now_ms: u64,
    ) -> EnrollerResponse {
        if !self.enabled {
            return EnrollerResponse::Rejected(RejectStatus::NotActive);
        }
        let Some((mode, steering)) = validate_registration(&enroller_id, mode, &steering) else {
            // A bad update does not leave a prior registration standing.
            warn!(session = session.0, "invalid registration payload");
            self.resign_session(session, now_ms);
            return EnrollerResponse::Rejected(RejectStatus::InvalidPayload);
        };

        let record = EnrollerRecord::new(enroller_id, mode, steering, now_ms);
        match self.registry.register(session, record) {
            Ok(()) => {
                debug!(session = session.0, "enroller registered");
                self.refresh_steering(now_ms);
                self.evaluate(now_ms);
                EnrollerResponse::Accepted(self.status_report())
            }
            Err(RegistryError::EnrollerCapacity { limit }) => {
                warn!(session = session.0, limit, "enroller capacity reached");
                EnrollerResponse::Rejected(RejectStatus::NoResources)
            }
            Err(err) => {
                warn!(session = session.0, %err, "registration refused");
                EnrollerResponse::Rejected(RejectStatus::NotActive)
            }
        }
    }

    fn handle_keep_alive(
        &mut self,
        session: SessionId,
        liveness: Liveness,
        mode: Option<u8>,
        steering: Option<Vec<u8>>,
        now_ms: u64,
    ) -> EnrollerResponse {
        if self.registry.enroller(session).is_none() {
            return EnrollerResponse::Rejected(RejectStatus::NotActive);
        }

        if liveness == Liveness::Reject {
            debug!(session = session.0, "enroller resigned");
            self.resign_session(session, now_ms);
            return EnrollerResponse::Accepted(self.status_report());
        }

        let mode = match mode.map(EnrollerMode::from_bits) {
            Some(None) => {
                warn!(session = session.0, "invalid mode bits in keep-alive");
                self.resign_session(session, now_ms);
                return EnrollerResponse::Rejected(RejectStatus::InvalidPayload);
            }
            Some(Some(mode)) => Some(mode),
            None => None,
        };
        let steering = match steering.map(|bytes| SteeringData::from_bytes(&bytes)) {
            Some(Err(err)) => {
                warn!(session = session.0, %err, "invalid steering in keep-alive");
                self.resign_session(session, now_ms);
                return EnrollerResponse::Rejected(RejectStatus::InvalidPayload);
            }
            Some(Ok(steering)) => Some(steering),
            None => None,
        };

        let Some(record) = self.registry.enroller_mut(session) else {
            return EnrollerResponse::Rejected(RejectStatus::NotActive);
        };
        record.registered_at_ms = now_ms;
        if let Some(mode) = mode {
            record.mode = mode;
        }
        let mut steering_changed = false;
        if let Some(steering) = steering {
            steering_changed = record.steering != steering;
            record.steering = steering;
        }
        if steering_changed {
            self.refresh_steering(now_ms);
        }
        EnrollerResponse::Accepted(self.status_report())
    }

    fn handle_joiner_accept(
        &mut self,
        session: SessionId,
        iid: bac_core::JoinerIid,
        now_ms: u64,
    ) -> EnrollerResponse {
        if self.registry.enroller(session).is_none() {
            return EnrollerResponse::Rejected(RejectStatus::NotActive);
        }
        if self.derive_state() != AdmitterState::Active {
            return EnrollerResponse::Rejected(RejectStatus::NotActive);
        }
        if let Some(claimant) = self.registry.find_claimant(iid)
            && claimant != session
        {
            warn!(session = session.0, %iid, "joiner already claimed elsewhere");
            return EnrollerResponse::Rejected(RejectStatus::Conflict);
        }

        let lifetime = self.config.joiner_lifetime_ms;
        let max_joiners = self.config.max_joiners_per_enroller;
        let Some(record) = self.registry.enroller_mut(session) else {
            return EnrollerResponse::Rejected(RejectStatus::NotActive);
        };
        match record.accept_joiner(iid, now_ms, lifetime, max_joiners) {
            Ok(expires_at_ms) => {
                debug!(session = session.0, %iid, expires_at_ms, "joiner claimed");
                self.joiner_timer.fire_at_if_earlier(expires_at_ms);
                EnrollerResponse::Accepted(self.status_report())
            }
            Err(err) => {
                warn!(session = session.0, %iid, %err, "joiner claim refused");
                EnrollerResponse::Rejected(RejectStatus::NoResources)
            }
        }
    }

    fn handle_joiner_release(
        &mut self,
        session: SessionId,
        iid: Option<bac_core::JoinerIid>,
        now_ms: u64,
    ) -> EnrollerResponse {
        let Some(record) = self.registry.enroller_mut(session) else {
            return EnrollerResponse::Rejected(RejectStatus::NotActive);
        };
        match iid {
            Some(iid) => {
                if !record.release_joiner(iid) {
                    return EnrollerResponse::Rejected(RejectStatus::InvalidPayload);
                }
                debug!(session = session.0, %iid, "joiner released");
            }
            None => {
                let released = record.release_all_joiners();
                debug!(session = session.0, released, "all joiners released");
            }
        }
        let (_, next) = self.registry.sweep_expired(now_ms);
        self.rearm_joiner_timer(next);
        EnrollerResponse::Accepted(self.status_report())
    }

    // === Relay surface ==================================================

    /// Forward a joiner-relay frame to its claimant, or to every
    /// relay-mode enroller when no claim exists yet. Returns how many
    /// sessions were notified.
    pub fn forward_joiner_relay(&mut self, frame: JoinerRelayFrame) -> usize {
        if self.derive_state() != AdmitterState::Active {
            return 0;
        }
        if let Some(session) = self.registry.find_claimant(frame.iid) {
            let forwards = self
                .registry
                .enroller(session)
                .is_some_and(|record| record.mode.contains(EnrollerMode::FORWARD_JOINER_RELAY));
            if !forwards {
                return 0;
            }
            self.effects.push(Effect::Notify {
                session,
                notice: EnrollerNotice::JoinerRelay(frame),
            });
            return 1;
        }
        self.broadcast(EnrollerMode::FORWARD_JOINER_RELAY, |frame| {
            EnrollerNotice::JoinerRelay(frame)
        }, frame)
    }

    /// Forward a UDP-proxy frame to every proxy-mode enroller. Returns
    /// how many sessions were notified.
    pub fn forward_udp_proxy(&mut self, frame: UdpProxyFrame) -> usize {
        if self.derive_state() != AdmitterState::Active {
            return 0;
        }
        self.broadcast(EnrollerMode::FORWARD_UDP_PROXY, |frame| {
            EnrollerNotice::UdpProxy(frame)
        }, frame)
    }

    fn broadcast<F, T>(&mut self, wanted: EnrollerMode, wrap: F, frame: T) -> usize
    where
        F: Fn(T) -> EnrollerNotice,
        T: Clone,
    {
        let mut targets: Vec<SessionId> = self
            .registry
            .enrollers()
            .filter(|(_, record)| record.mode.contains(wanted))
            .map(|(id, _)| id)
            .collect();
        targets.sort_unstable();
        let count = targets.len();
        for session in targets {
            self.effects.push(Effect::Notify {
                session,
                notice: wrap(frame.clone()),
            });
        }
        count
    }

    // === Introspection ==================================================

    /// Aggregate subsystem state.
    #[must_use]
    pub fn state(&self) -> AdmitterState {
        self.derive_state()
    }

    /// True once the candidate delay has elapsed with our election
    /// entry still standing.
    #[must_use]
    pub fn is_prime_admitter(&self) -> bool {
        self.arbitrator.is_prime_admitter()
    }

    /// True while the commissioner lease is held.
    #[must_use]
    pub const fn is_active_commissioner(&self) -> bool {
        self.petitioner.is_active_commissioner()
    }

    /// Leader-granted commissioner session identifier, while held.
    #[must_use]
    pub const fn commissioner_session_id(&self) -> Option<u16> {
        self.petitioner.commissioner_session_id()
    }

    /// Number of registered enrollers.
    #[must_use]
    pub fn enroller_count(&self) -> usize {
        self.registry.enroller_count()
    }

    /// Total claimed joiners across all enrollers.
    #[must_use]
    pub fn joiner_count(&self) -> usize {
        self.registry.joiner_count()
    }

    /// Update the joiner UDP port override advertised to the leader.
    pub fn set_joiner_udp_port(&mut self, port: u16, now_ms: u64) {
        self.petitioner.set_joiner_udp_port(port, now_ms);
        self.maybe_report(now_ms);
    }

    /// Drain the queued effects for execution by the run loop.
    #[must_use]
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    // === Internals ======================================================

    /// Re-entrant reconciliation: runs after every event that could
    /// change overall readiness, and is idempotent (sub-machine starts
    /// and stops early-exit on state equality).
    fn evaluate(&mut self, now_ms: u64) {
        let should_run = self.enabled && self.mesh.attached;
        if should_run {
            if self.arbitrator.state() == ArbitratorState::Stopped {
                self.arbitrator.start(&mut self.effects);
            }
            // The lease is only worth holding while at least one
            // enroller is delegating admissions through us.
            if self.arbitrator.is_prime_admitter() && self.registry.enroller_count() > 0 {
                if self.petitioner.state() == PetitionerState::Stopped {
                    let steering = self.merged_steering();
                    self.petitioner.update_steering(steering, now_ms);
                    self.petitioner.start(
                        self.mesh.other_commissioner_present,
                        now_ms,
                        &mut self.effects,
                    );
                }
            } else {
                self.petitioner.stop(&mut self.effects);
            }
        } else {
            self.petitioner.stop(&mut self.effects);
            if self.arbitrator.state() != ArbitratorState::Stopped {
                self.arbitrator.stop(&mut self.effects);
            }
        }
        self.maybe_report(now_ms);
    }

    fn apply_signal(&mut self, signal: ArbitratorSignal, now_ms: u64) {
        match signal {
            ArbitratorSignal::None => {}
            ArbitratorSignal::BecamePrime => {
                info!("prime admitter role assumed");
                self.evaluate(now_ms);
            }
            ArbitratorSignal::LostPrime => {
                warn!("prime admitter role lost");
                // Evaluation stops the petitioner; the Unavailable
                // report then forcibly resigns every enroller.
                self.evaluate(now_ms);
            }
        }
    }

    fn force_resign_all(&mut self, now_ms: u64) {
        for session in self.registry.resign_all() {
            self.effects.push(Effect::Notify {
                session,
                notice: EnrollerNotice::Resigned,
            });
        }
        self.joiner_timer.stop();
        self.refresh_steering(now_ms);
    }

    fn resign_session(&mut self, session: SessionId, now_ms: u64) {
        if self.registry.resign(session) {
            self.refresh_steering(now_ms);
            let (_, next) = self.registry.sweep_expired(now_ms);
            self.rearm_joiner_timer(next);
            self.evaluate(now_ms);
        }
    }

    fn merged_steering(&self) -> SteeringData {
        SteeringData::merge(self.registry.enrollers().map(|(_, record)| &record.steering))
    }

    fn refresh_steering(&mut self, now_ms: u64) {
        let merged = self.merged_steering();
        self.petitioner.update_steering(merged, now_ms);
    }

    fn rearm_joiner_timer(&mut self, next: Option<u64>) {
        match next {
            Some(deadline) => self.joiner_timer.fire_at(deadline),
            None => self.joiner_timer.stop(),
        }
    }

    fn derive_state(&self) -> AdmitterState {
        if !self.enabled || !self.mesh.attached || !self.arbitrator.is_prime_admitter() {
            return AdmitterState::Unavailable;
        }
        if self.petitioner.is_active_commissioner() {
            return AdmitterState::Active;
        }
        if self.petitioner.state() == PetitionerState::Rejected {
            return AdmitterState::ConflictError;
        }
        AdmitterState::Ready
    }

    fn status_report(&self) -> StatusReport {
        let state = self.derive_state();
        let active = state == AdmitterState::Active;
        let port = self.petitioner.joiner_udp_port();
        StatusReport {
            state,
            commissioner_session_id: if active {
                self.petitioner.commissioner_session_id()
            } else {
                None
            },
            joiner_udp_port: (active && port != 0).then_some(port),
        }
    }

    /// Push the aggregate status to every enroller when it changed
    /// since the last push. An `Unavailable` report also clears every
    /// registration, with a final `Resigned` notice per enroller.
    fn maybe_report(&mut self, now_ms: u64) {
        let report = self.status_report();
        if self.last_reported.as_ref() == Some(&report) {
            return;
        }
        debug!(state = %report.state, "status changed");
        self.last_reported = Some(report);

        let mut targets: Vec<SessionId> =
            self.registry.enrollers().map(|(id, _)| id).collect();
        targets.sort_unstable();
        for session in targets {
            self.effects.push(Effect::Notify {
                session,
                notice: EnrollerNotice::StateReport(report),
            });
        }

        if report.state == AdmitterState::Unavailable {
            self.force_resign_all(now_ms);
        }
    }
}

fn validate_registration(
    enroller_id: &str,
    mode: u8,
    steering: &[u8],
) -> Option<(EnrollerMode, SteeringData)> {
    if enroller_id.is_empty() {
        return None;
    }
    let mode = EnrollerMode::from_bits(mode)?;
    let steering = SteeringData::from_bytes(steering).ok()?;
    Some((mode, steering))
}

#[cfg(test)]
mod tests {
    use super::*;
    use bac_core::{JoinerIid, LeaderRequest};
    use pretty_assertions::assert_eq;

    fn iid(byte: u8) -> JoinerIid {
        JoinerIid::from_bytes([byte; 8])
    }

    fn no_jitter_config() -> AdmitterConfig {
        let mut config = AdmitterConfig::default();
        config.petitioner.retry_jitter_ms = 0;
        config.petitioner.keepalive_jitter_ms = 0;
        config
    }

    fn ready_admitter(now_ms: u64) -> Admitter {
        let mut admitter = Admitter::new(no_jitter_config());
        admitter.set_enabled(true, now_ms);
        admitter.handle_mesh_change(
            MeshView {
                attached: true,
                other_commissioner_present: false,
            },
            now_ms,
        );
        admitter
    }

    fn register_request(id: &str) -> EnrollerRequest {
        EnrollerRequest::Register {
            enroller_id: id.to_string(),
            mode: EnrollerMode::FORWARD_JOINER_RELAY.bits(),
            steering: vec![0xFF],
        }
    }

    #[test]
    fn disabled_admitter_is_unavailable_and_idle() {
        let mut admitter = Admitter::new(no_jitter_config());
        assert_eq!(admitter.state(), AdmitterState::Unavailable);
        assert!(admitter.take_effects().is_empty());
        assert_eq!(admitter.next_deadline(), None);
    }

    fn prime_admitter() -> Admitter {
        let mut admitter = ready_admitter(0);
        admitter.handle_publisher_event(PublisherEvent::EntryAdded, 0);
        admitter.handle_timer(30_000);
        assert!(admitter.is_prime_admitter());
        admitter
    }

    #[test]
    fn enabling_while_attached_starts_the_election() {
        let mut admitter = ready_admitter(0);
        let effects = admitter.take_effects();
        assert!(effects.contains(&Effect::CapabilityFlagChanged { enabled: true }));
        assert!(effects.contains(&Effect::PublishService));
        // No authority until the election is won.
        assert_eq!(admitter.state(), AdmitterState::Unavailable);
    }

    #[test]
    fn not_prime_reports_unavailable() {
        let mut admitter = ready_admitter(0);
        assert_eq!(admitter.state(), AdmitterState::Unavailable);

        admitter.handle_publisher_event(PublisherEvent::EntryAdded, 0);
        // Candidate, still waiting out the race-avoidance delay.
        assert_eq!(admitter.state(), AdmitterState::Unavailable);

        admitter.handle_timer(30_000);
        assert_eq!(admitter.state(), AdmitterState::Ready);
    }

    #[test]
    fn no_petition_without_registered_enrollers() {
        let mut admitter = prime_admitter();
        let effects = admitter.take_effects();
        assert!(!effects.iter().any(|e| matches!(e, Effect::SendToLeader { .. })));

        // The first registration starts the lease acquisition.
        admitter.session_connected(SessionId(1), 31_000);
        admitter.handle_enroller_request(SessionId(1), register_request("app"), 31_000);
        let effects = admitter.take_effects();
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::SendToLeader {
                request: LeaderRequest::Petition { .. },
                ..
            }
        )));
    }

    #[test]
    fn detaching_stops_election_and_resigns_enrollers() {
        let mut admitter = prime_admitter();
        admitter.session_connected(SessionId(1), 30_000);
        let response =
            admitter.handle_enroller_request(SessionId(1), register_request("app"), 30_000);
        assert!(matches!(response, EnrollerResponse::Accepted(_)));
        admitter.take_effects();

        admitter.handle_mesh_change(MeshView::default(), 30_010);
        assert_eq!(admitter.state(), AdmitterState::Unavailable);
        let effects = admitter.take_effects();
        assert!(effects.contains(&Effect::UnpublishService));
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::Notify {
                session: SessionId(1),
                notice: EnrollerNotice::Resigned,
            }
        )));
        assert_eq!(admitter.enroller_count(), 0);
    }

    #[test]
    fn registration_requires_enablement() {
        let mut admitter = Admitter::new(no_jitter_config());
        admitter.session_connected(SessionId(1), 0);
        let response = admitter.handle_enroller_request(SessionId(1), register_request("app"), 0);
        assert_eq!(response, EnrollerResponse::Rejected(RejectStatus::NotActive));
    }

    #[test]
    fn invalid_registration_clears_a_prior_one() {
        let mut admitter = ready_admitter(0);
        admitter.session_connected(SessionId(1), 0);
        admitter.handle_enroller_request(SessionId(1), register_request("app"), 0);
        assert_eq!(admitter.enroller_count(), 1);

        let bad = EnrollerRequest::Register {
            enroller_id: "app".to_string(),
            mode: 0b1000_0000,
            steering: vec![0xFF],
        };
        let response = admitter.handle_enroller_request(SessionId(1), bad, 1);
        assert_eq!(
            response,
            EnrollerResponse::Rejected(RejectStatus::InvalidPayload)
        );
        assert_eq!(admitter.enroller_count(), 0);
    }

    #[test]
    fn keep_alive_reject_resigns_gracefully() {
        let mut admitter = ready_admitter(0);
        admitter.session_connected(SessionId(1), 0);
        admitter.handle_enroller_request(SessionId(1), register_request("app"), 0);

        let response = admitter.handle_enroller_request(
            SessionId(1),
            EnrollerRequest::KeepAlive {
                liveness: Liveness::Reject,
                mode: None,
                steering: None,
            },
            5,
        );
        assert!(matches!(response, EnrollerResponse::Accepted(_)));
        assert_eq!(admitter.enroller_count(), 0);
    }

    #[test]
    fn keep_alive_without_registration_is_not_active() {
        let mut admitter = ready_admitter(0);
        admitter.session_connected(SessionId(1), 0);
        let response = admitter.handle_enroller_request(
            SessionId(1),
            EnrollerRequest::KeepAlive {
                liveness: Liveness::Accept,
                mode: None,
                steering: None,
            },
            0,
        );
        assert_eq!(response, EnrollerResponse::Rejected(RejectStatus::NotActive));
    }

    #[test]
    fn enroller_capacity_is_enforced() {
        let mut config = no_jitter_config();
        config.max_enrollers = 1;
        let mut admitter = Admitter::new(config);
        admitter.set_enabled(true, 0);
        admitter.handle_mesh_change(
            MeshView {
                attached: true,
                other_commissioner_present: false,
            },
            0,
        );
        admitter.session_connected(SessionId(1), 0);
        admitter.session_connected(SessionId(2), 0);
        admitter.handle_enroller_request(SessionId(1), register_request("a"), 0);
        let response = admitter.handle_enroller_request(SessionId(2), register_request("b"), 0);
        assert_eq!(
            response,
            EnrollerResponse::Rejected(RejectStatus::NoResources)
        );
    }

    #[test]
    fn joiner_claims_require_active_state() {
        let mut admitter = ready_admitter(0);
        admitter.session_connected(SessionId(1), 0);
        admitter.handle_enroller_request(SessionId(1), register_request("app"), 0);

        let response = admitter.handle_enroller_request(
            SessionId(1),
            EnrollerRequest::JoinerAccept { iid: iid(1) },
            0,
        );
        assert_eq!(response, EnrollerResponse::Rejected(RejectStatus::NotActive));
    }

    #[test]
    fn relays_are_dropped_unless_active() {
        let mut admitter = ready_admitter(0);
        admitter.session_connected(SessionId(1), 0);
        admitter.handle_enroller_request(SessionId(1), register_request("app"), 0);
        let delivered = admitter.forward_joiner_relay(JoinerRelayFrame {
            iid: iid(1),
            payload: bytes::Bytes::from_static(b"hello"),
        });
        assert_eq!(delivered, 0);
    }

    #[test]
    fn status_report_is_debounced() {
        let mut admitter = ready_admitter(0);
        admitter.session_connected(SessionId(1), 0);
        admitter.handle_enroller_request(SessionId(1), register_request("app"), 0);
        admitter.take_effects();

        // No state change: a second identical keep-alive produces no
        // report notices.
        admitter.handle_enroller_request(
            SessionId(1),
            EnrollerRequest::KeepAlive {
                liveness: Liveness::Accept,
                mode: None,
                steering: None,
            },
            10,
        );
        let effects = admitter.take_effects();
        assert!(!effects.iter().any(|e| matches!(
            e,
            Effect::Notify {
                notice: EnrollerNotice::StateReport(_),
                ..
            }
        )));
    }
}
