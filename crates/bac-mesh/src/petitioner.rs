//! Commissioner lease acquisition and renewal.
//!
//! On behalf of a prime arbitrator, petitions the mesh leader for the
//! single commissioner role, pushes the current steering policy into
//! the held lease, and renews it with keep-alives at roughly half the
//! leader's lease timeout. All retry delays are a fixed base plus a
//! uniform random jitter window so that multiple border devices never
//! retry in lockstep.

use bac_core::{LeaderRequest, LeaderResponse, LinkError, SteeringData};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::effect::{Effect, TxnId};
use crate::timer::{Timer, earliest};

/// Lease state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PetitionerState {
    /// Not petitioning.
    Stopped,
    /// A petition needs to be (re)sent.
    ToPetition,
    /// Petition in flight.
    Petitioning,
    /// Lease held; dataset sync needs to be (re)sent.
    AcceptedToSyncData,
    /// Lease held; dataset sync in flight.
    AcceptedSyncingData,
    /// Lease held; dataset applied by the leader.
    AcceptedDataSynced,
    /// Leader explicitly rejected the petition. Re-attempted on retry
    /// or on a network-data change.
    Rejected,
}

/// Petitioner tunables.
#[derive(Debug, Clone)]
pub struct PetitionerConfig {
    /// Commissioner identifier presented to the leader.
    pub commissioner_id: String,
    /// Base retry delay for petitions and dataset syncs.
    pub retry_base_ms: u64,
    /// Uniform jitter window added to retry delays.
    pub retry_jitter_ms: u64,
    /// Base keep-alive period (about half the leader lease timeout).
    pub keepalive_base_ms: u64,
    /// Uniform jitter window added to the keep-alive period.
    pub keepalive_jitter_ms: u64,
}

impl Default for PetitionerConfig {
    fn default() -> Self {
        Self {
            commissioner_id: "border-admitter".to_string(),
            retry_base_ms: 5_000,
            retry_jitter_ms: 2_500,
            keepalive_base_ms: 55_000,
            keepalive_jitter_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExchangeKind {
    Petition,
    KeepAlive,
    DatasetSync,
}

/// Commissioner lease state machine.
#[derive(Debug)]
pub struct CommissionerPetitioner {
    state: PetitionerState,
    config: PetitionerConfig,
    steering: SteeringData,
    joiner_udp_port: u16,
    session_id: Option<u16>,
    retry_timer: Timer,
    keepalive_timer: Timer,
    pending: Option<(TxnId, ExchangeKind)>,
    next_txn: u64,
}

impl CommissionerPetitioner {
    /// Create a stopped petitioner.
    #[must_use]
    pub fn new(config: PetitionerConfig) -> Self {
        Self {
            state: PetitionerState::Stopped,
            config,
            steering: SteeringData::default(),
            joiner_udp_port: 0,
            session_id: None,
            retry_timer: Timer::new(),
            keepalive_timer: Timer::new(),
            pending: None,
            next_txn: 0,
        }
    }

    /// Current lease state.
    #[must_use]
    pub const fn state(&self) -> PetitionerState {
        self.state
    }

    /// True while any accepted lease is held (synced or syncing).
    #[must_use]
    pub const fn is_active_commissioner(&self) -> bool {
        matches!(
            self.state,
            PetitionerState::AcceptedToSyncData
                | PetitionerState::AcceptedSyncingData
                | PetitionerState::AcceptedDataSynced
        )
    }

    /// Leader-granted commissioner session identifier, while held.
    #[must_use]
    pub const fn commissioner_session_id(&self) -> Option<u16> {
        self.session_id
    }

    /// Current joiner UDP port override (0 = unspecified).
    #[must_use]
    pub const fn joiner_udp_port(&self) -> u16 {
        self.joiner_udp_port
    }

    /// Earliest pending timer deadline.
    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        earliest(self.retry_timer.deadline(), self.keepalive_timer.deadline())
    }

    /// Begin petitioning. Only meaningful from `Stopped`.
    ///
    /// When the mesh's distributed data already lists another device as
    /// commissioner locator, the petition is known futile and the state
    /// goes straight to `Rejected`; a later network-data change retries.
    pub fn start(&mut self, other_commissioner_present: bool, now_ms: u64, out: &mut Vec<Effect>) {
        if self.state != PetitionerState::Stopped {
            return;
        }
        if other_commissioner_present {
            debug!("another commissioner is advertised, skipping petition");
            self.state = PetitionerState::Rejected;
            return;
        }
        self.state = PetitionerState::ToPetition;
        self.send_petition(now_ms, out);
    }

    /// Stop and, if a lease is held, resign it.
    ///
    /// Pairs the locator-address removal and the best-effort reject
    /// keep-alive with every exit from an accepted state, not only the
    /// graceful one.
    pub fn stop(&mut self, out: &mut Vec<Effect>) {
        if self.state == PetitionerState::Stopped {
            return;
        }
        debug!(from = ?self.state, "petitioner stopping");
        self.retry_timer.stop();
        self.keepalive_timer.stop();
        if let Some((txn, _)) = self.pending.take() {
            out.push(Effect::AbortLeaderTxn { txn });
        }
        if self.is_active_commissioner() {
            out.push(Effect::RemoveLocatorAddress);
            if let Some(session_id) = self.session_id {
                let txn = self.alloc_txn();
                out.push(Effect::SendToLeader {
                    txn,
                    request: LeaderRequest::KeepAlive {
                        accept: false,
                        session_id,
                    },
                });
            }
        }
        self.session_id = None;
        self.state = PetitionerState::Stopped;
    }

    /// Update the joiner UDP port override; an active commissioner
    /// schedules a zero-delay dataset resync.
    pub fn set_joiner_udp_port(&mut self, port: u16, now_ms: u64) {
        if self.joiner_udp_port == port {
            return;
        }
        self.joiner_udp_port = port;
        self.resync_dataset(now_ms);
    }

    /// Adopt a recomputed steering snapshot; a change while a lease is
    /// held schedules a zero-delay dataset resync.
    pub fn update_steering(&mut self, steering: SteeringData, now_ms: u64) {
        if self.steering == steering {
            return;
        }
        self.steering = steering;
        self.resync_dataset(now_ms);
    }

    /// React to a network-data change: a blocked petition is retried
    /// once the prior commissioner's advertisement is gone.
    ///
    /// Returns true if the state changed.
    pub fn handle_net_data_change(
        &mut self,
        other_commissioner_present: bool,
        now_ms: u64,
        out: &mut Vec<Effect>,
    ) -> bool {
        if self.state == PetitionerState::Rejected && !other_commissioner_present {
            debug!("blocking commissioner departed, retrying petition");
            self.state = PetitionerState::ToPetition;
            self.send_petition(now_ms, out);
            return true;
        }
        false
    }

    /// Correlate a leader response or transport failure.
    ///
    /// Responses for unknown or superseded transactions are ignored.
    /// Returns true if the state changed.
    pub fn handle_leader_response(
        &mut self,
        txn: TxnId,
        outcome: Result<LeaderResponse, LinkError>,
        now_ms: u64,
        out: &mut Vec<Effect>,
    ) -> bool {
        let Some((pending_txn, kind)) = self.pending else {
            return false;
        };
        if pending_txn != txn {
            return false;
        }
        self.pending = None;

        let before = self.state;
        match kind {
            ExchangeKind::Petition => self.on_petition_response(outcome, now_ms, out),
            ExchangeKind::DatasetSync => self.on_dataset_response(outcome, now_ms),
            ExchangeKind::KeepAlive => self.on_keepalive_response(outcome, now_ms, out),
        }
        self.state != before
    }

    /// Fire the retry timer if due. Returns true if the state changed.
    pub fn handle_retry_timer(&mut self, now_ms: u64, out: &mut Vec<Effect>) -> bool {
        if !self.retry_timer.poll(now_ms) {
            return false;
        }
        let before = self.state;
        match self.state {
            PetitionerState::ToPetition | PetitionerState::Rejected => {
                self.send_petition(now_ms, out);
            }
            PetitionerState::AcceptedToSyncData => self.send_dataset(now_ms, out),
            _ => {}
        }
        self.state != before
    }

    /// Fire the keep-alive timer if due.
    pub fn handle_keepalive_timer(&mut self, now_ms: u64, out: &mut Vec<Effect>) {
        if !self.keepalive_timer.poll(now_ms) {
            return;
        }
        if !self.is_active_commissioner() {
            return;
        }
        let Some(session_id) = self.session_id else {
            return;
        };
        // One leader exchange in flight at a time.
        if self.pending.is_some() {
            self.keepalive_timer
                .fire_at(now_ms.saturating_add(self.config.retry_base_ms));
            return;
        }
        let txn = self.alloc_txn();
        self.pending = Some((txn, ExchangeKind::KeepAlive));
        out.push(Effect::SendToLeader {
            txn,
            request: LeaderRequest::KeepAlive {
                accept: true,
                session_id,
            },
        });
        self.schedule_keepalive(now_ms);
    }

    fn on_petition_response(
        &mut self,
        outcome: Result<LeaderResponse, LinkError>,
        now_ms: u64,
        out: &mut Vec<Effect>,
    ) {
        match outcome {
            Ok(LeaderResponse::Petition {
                accepted: true,
                session_id: Some(session_id),
            }) => {
                info!(session_id, "commissioner petition accepted");
                self.session_id = Some(session_id);
                self.state = PetitionerState::AcceptedToSyncData;
                out.push(Effect::AddLocatorAddress);
                self.send_dataset(now_ms, out);
                self.schedule_keepalive(now_ms);
            }
            Ok(LeaderResponse::Petition {
                accepted: false, ..
            }) => {
                info!("commissioner petition rejected by leader");
                self.state = PetitionerState::Rejected;
                self.schedule_retry(now_ms);
            }
            Ok(_) => {
                warn!("malformed petition response");
                self.state = PetitionerState::ToPetition;
                self.schedule_retry(now_ms);
            }
            Err(err) => {
                warn!(%err, "petition transport failure");
                self.state = PetitionerState::ToPetition;
                self.schedule_retry(now_ms);
            }
        }
    }

    fn on_dataset_response(&mut self, outcome: Result<LeaderResponse, LinkError>, now_ms: u64) {
        if self.state != PetitionerState::AcceptedSyncingData {
            return;
        }
        match outcome {
            Ok(LeaderResponse::DatasetSync { accepted: true }) => {
                debug!("dataset sync applied");
                self.state = PetitionerState::AcceptedDataSynced;
            }
            Ok(_) | Err(_) => {
                warn!("dataset sync failed, rescheduling");
                self.state = PetitionerState::AcceptedToSyncData;
                self.schedule_retry(now_ms);
            }
        }
    }

    fn on_keepalive_response(
        &mut self,
        outcome: Result<LeaderResponse, LinkError>,
        now_ms: u64,
        out: &mut Vec<Effect>,
    ) {
        match outcome {
            Ok(LeaderResponse::KeepAlive { accepted: true }) => {}
            Ok(LeaderResponse::KeepAlive { accepted: false }) => {
                warn!("commissioner lease lost on keep-alive");
                self.keepalive_timer.stop();
                self.session_id = None;
                if self.is_active_commissioner() {
                    out.push(Effect::RemoveLocatorAddress);
                }
                self.state = PetitionerState::ToPetition;
                self.schedule_retry(now_ms);
            }
            Ok(_) | Err(_) => {
                // Retried sooner than the regular period, with jitter.
                warn!("keep-alive failed, retrying sooner");
                self.keepalive_timer.fire_at(now_ms.saturating_add(
                    self.jittered(self.config.retry_base_ms, self.config.retry_jitter_ms),
                ));
            }
        }
    }

    fn resync_dataset(&mut self, now_ms: u64) {
        if self.is_active_commissioner() {
            self.state = PetitionerState::AcceptedToSyncData;
            self.retry_timer.fire_at(now_ms);
        }
    }

    fn send_petition(&mut self, now_ms: u64, out: &mut Vec<Effect>) {
        if self.pending.is_some() {
            self.schedule_retry(now_ms);
            return;
        }
        let txn = self.alloc_txn();
        self.pending = Some((txn, ExchangeKind::Petition));
        self.state = PetitionerState::Petitioning;
        debug!(%txn, "sending commissioner petition");
        out.push(Effect::SendToLeader {
            txn,
            request: LeaderRequest::Petition {
                commissioner_id: self.config.commissioner_id.clone(),
            },
        });
    }

    fn send_dataset(&mut self, now_ms: u64, out: &mut Vec<Effect>) {
        let Some(session_id) = self.session_id else {
            return;
        };
        if self.pending.is_some() {
            self.retry_timer
                .fire_at_if_earlier(now_ms.saturating_add(self.config.retry_base_ms));
            return;
        }
        let txn = self.alloc_txn();
        self.pending = Some((txn, ExchangeKind::DatasetSync));
        self.state = PetitionerState::AcceptedSyncingData;
        debug!(%txn, "sending commissioner dataset");
        out.push(Effect::SendToLeader {
            txn,
            request: LeaderRequest::DatasetSync {
                session_id,
                steering: self.steering.clone(),
                joiner_udp_port: (self.joiner_udp_port != 0).then_some(self.joiner_udp_port),
            },
        });
    }

    fn schedule_retry(&mut self, now_ms: u64) {
        let delay = self.jittered(self.config.retry_base_ms, self.config.retry_jitter_ms);
        self.retry_timer.fire_at(now_ms.saturating_add(delay));
    }

    fn schedule_keepalive(&mut self, now_ms: u64) {
        let delay = self.jittered(self.config.keepalive_base_ms, self.config.keepalive_jitter_ms);
        self.keepalive_timer.fire_at(now_ms.saturating_add(delay));
    }

    fn jittered(&self, base_ms: u64, window_ms: u64) -> u64 {
        if window_ms == 0 {
            base_ms
        } else {
            base_ms.saturating_add(rand::thread_rng().gen_range(0..window_ms))
        }
    }

    fn alloc_txn(&mut self) -> TxnId {
        self.next_txn += 1;
        TxnId(self.next_txn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bac_core::SteeringData;

    fn no_jitter_config() -> PetitionerConfig {
        PetitionerConfig {
            retry_jitter_ms: 0,
            keepalive_jitter_ms: 0,
            ..PetitionerConfig::default()
        }
    }

    fn last_sent(out: &[Effect]) -> (TxnId, LeaderRequest) {
        out.iter()
            .rev()
            .find_map(|e| match e {
                Effect::SendToLeader { txn, request } => Some((*txn, request.clone())),
                _ => None,
            })
            .expect("a leader send effect")
    }

    fn accepted_petitioner(now_ms: u64) -> (CommissionerPetitioner, Vec<Effect>) {
        let mut p = CommissionerPetitioner::new(no_jitter_config());
        let mut out = Vec::new();
        p.start(false, now_ms, &mut out);
        let (txn, _) = last_sent(&out);
        p.handle_leader_response(
            txn,
            Ok(LeaderResponse::Petition {
                accepted: true,
                session_id: Some(0x1234),
            }),
            now_ms,
            &mut out,
        );
        (p, out)
    }

    #[test]
    fn start_skips_petition_when_commissioner_known() {
        let mut p = CommissionerPetitioner::new(no_jitter_config());
        let mut out = Vec::new();
        p.start(true, 0, &mut out);
        assert_eq!(p.state(), PetitionerState::Rejected);
        assert!(out.is_empty());
    }

    #[test]
    fn start_twice_is_a_no_op() {
        let mut p = CommissionerPetitioner::new(no_jitter_config());
        let mut out = Vec::new();
        p.start(false, 0, &mut out);
        assert_eq!(out.len(), 1);
        p.start(false, 0, &mut out);
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn accepted_petition_assigns_locator_and_syncs() {
        let (p, out) = accepted_petitioner(100);

        assert_eq!(p.state(), PetitionerState::AcceptedSyncingData);
        assert!(p.is_active_commissioner());
        assert_eq!(p.commissioner_session_id(), Some(0x1234));
        assert!(out.contains(&Effect::AddLocatorAddress));
        let (_, request) = last_sent(&out);
        assert!(matches!(
            request,
            LeaderRequest::DatasetSync {
                session_id: 0x1234,
                ..
            }
        ));
        // Keep-alive armed at the jitter-free base period.
        assert_eq!(p.next_deadline(), Some(100 + 55_000));
    }

    #[test]
    fn rejected_petition_schedules_retry_and_retries() {
        let mut p = CommissionerPetitioner::new(no_jitter_config());
        let mut out = Vec::new();
        p.start(false, 0, &mut out);
        let (txn, _) = last_sent(&out);
        p.handle_leader_response(
            txn,
            Ok(LeaderResponse::Petition {
                accepted: false,
                session_id: None,
            }),
            0,
            &mut out,
        );
        assert_eq!(p.state(), PetitionerState::Rejected);
        assert_eq!(p.next_deadline(), Some(5_000));

        out.clear();
        assert!(p.handle_retry_timer(5_000, &mut out));
        assert_eq!(p.state(), PetitionerState::Petitioning);
        assert!(matches!(
            last_sent(&out).1,
            LeaderRequest::Petition { .. }
        ));
    }

    #[test]
    fn transport_error_retries_from_to_petition() {
        let mut p = CommissionerPetitioner::new(no_jitter_config());
        let mut out = Vec::new();
        p.start(false, 0, &mut out);
        let (txn, _) = last_sent(&out);
        p.handle_leader_response(txn, Err(LinkError::Timeout), 0, &mut out);
        assert_eq!(p.state(), PetitionerState::ToPetition);
        assert_eq!(p.next_deadline(), Some(5_000));
    }

    #[test]
    fn malformed_petition_response_is_not_a_rejection() {
        let mut p = CommissionerPetitioner::new(no_jitter_config());
        let mut out = Vec::new();
        p.start(false, 0, &mut out);
        let (txn, _) = last_sent(&out);
        // Accepted but no session id.
        p.handle_leader_response(
            txn,
            Ok(LeaderResponse::Petition {
                accepted: true,
                session_id: None,
            }),
            0,
            &mut out,
        );
        assert_eq!(p.state(), PetitionerState::ToPetition);
    }

    #[test]
    fn dataset_reject_returns_to_sync_stage() {
        let (mut p, mut out) = accepted_petitioner(0);
        let (txn, _) = last_sent(&out);
        out.clear();
        p.handle_leader_response(
            txn,
            Ok(LeaderResponse::DatasetSync { accepted: false }),
            0,
            &mut out,
        );
        assert_eq!(p.state(), PetitionerState::AcceptedToSyncData);
        assert!(p.is_active_commissioner());

        out.clear();
        p.handle_retry_timer(5_000, &mut out);
        assert_eq!(p.state(), PetitionerState::AcceptedSyncingData);
    }

    #[test]
    fn dataset_accept_reaches_synced() {
        let (mut p, mut out) = accepted_petitioner(0);
        let (txn, _) = last_sent(&out);
        p.handle_leader_response(
            txn,
            Ok(LeaderResponse::DatasetSync { accepted: true }),
            0,
            &mut out,
        );
        assert_eq!(p.state(), PetitionerState::AcceptedDataSynced);
    }

    #[test]
    fn keepalive_reject_releases_lease() {
        let (mut p, mut out) = accepted_petitioner(0);
        let (txn, _) = last_sent(&out);
        p.handle_leader_response(
            txn,
            Ok(LeaderResponse::DatasetSync { accepted: true }),
            0,
            &mut out,
        );

        out.clear();
        p.handle_keepalive_timer(55_000, &mut out);
        let (ka_txn, request) = last_sent(&out);
        assert!(matches!(
            request,
            LeaderRequest::KeepAlive {
                accept: true,
                session_id: 0x1234,
            }
        ));

        out.clear();
        let changed = p.handle_leader_response(
            ka_txn,
            Ok(LeaderResponse::KeepAlive { accepted: false }),
            56_000,
            &mut out,
        );
        assert!(changed);
        assert_eq!(p.state(), PetitionerState::ToPetition);
        assert!(!p.is_active_commissioner());
        assert_eq!(p.commissioner_session_id(), None);
        assert!(out.contains(&Effect::RemoveLocatorAddress));
        assert_eq!(p.next_deadline(), Some(56_000 + 5_000));
    }

    #[test]
    fn keepalive_transport_error_retries_sooner() {
        let (mut p, mut out) = accepted_petitioner(0);
        let (txn, _) = last_sent(&out);
        p.handle_leader_response(
            txn,
            Ok(LeaderResponse::DatasetSync { accepted: true }),
            0,
            &mut out,
        );

        out.clear();
        p.handle_keepalive_timer(55_000, &mut out);
        let (ka_txn, _) = last_sent(&out);
        p.handle_leader_response(ka_txn, Err(LinkError::Timeout), 56_000, &mut out);

        assert_eq!(p.state(), PetitionerState::AcceptedDataSynced);
        // Sooner than the regular keep-alive period.
        assert_eq!(p.next_deadline(), Some(56_000 + 5_000));
    }

    #[test]
    fn stop_from_accepted_resigns_and_releases_locator() {
        let (mut p, mut out) = accepted_petitioner(0);
        out.clear();
        p.stop(&mut out);

        assert_eq!(p.state(), PetitionerState::Stopped);
        assert_eq!(p.commissioner_session_id(), None);
        assert_eq!(p.next_deadline(), None);
        assert!(out.iter().any(|e| matches!(e, Effect::AbortLeaderTxn { .. })));
        assert!(out.contains(&Effect::RemoveLocatorAddress));
        assert!(out.iter().any(|e| matches!(
            e,
            Effect::SendToLeader {
                request: LeaderRequest::KeepAlive {
                    accept: false,
                    session_id: 0x1234,
                },
                ..
            }
        )));
    }

    #[test]
    fn port_change_triggers_zero_delay_resync() {
        let (mut p, mut out) = accepted_petitioner(0);
        let (txn, _) = last_sent(&out);
        p.handle_leader_response(
            txn,
            Ok(LeaderResponse::DatasetSync { accepted: true }),
            0,
            &mut out,
        );

        p.set_joiner_udp_port(4_000, 10);
        assert_eq!(p.state(), PetitionerState::AcceptedToSyncData);
        assert_eq!(p.next_deadline(), Some(10));

        out.clear();
        p.handle_retry_timer(10, &mut out);
        assert!(matches!(
            last_sent(&out).1,
            LeaderRequest::DatasetSync {
                joiner_udp_port: Some(4_000),
                ..
            }
        ));
    }

    #[test]
    fn unchanged_steering_does_not_resync() {
        let (mut p, mut out) = accepted_petitioner(0);
        let (txn, _) = last_sent(&out);
        p.handle_leader_response(
            txn,
            Ok(LeaderResponse::DatasetSync { accepted: true }),
            0,
            &mut out,
        );

        p.update_steering(SteeringData::default(), 10);
        assert_eq!(p.state(), PetitionerState::AcceptedDataSynced);

        p.update_steering(SteeringData::permit_all(), 10);
        assert_eq!(p.state(), PetitionerState::AcceptedToSyncData);
    }

    #[test]
    fn net_data_change_retries_a_rejected_petition() {
        let mut p = CommissionerPetitioner::new(no_jitter_config());
        let mut out = Vec::new();
        p.start(true, 0, &mut out);
        assert_eq!(p.state(), PetitionerState::Rejected);

        // Still blocked: no retry.
        assert!(!p.handle_net_data_change(true, 10, &mut out));
        assert!(out.is_empty());

        assert!(p.handle_net_data_change(false, 20, &mut out));
        assert_eq!(p.state(), PetitionerState::Petitioning);
    }

    #[test]
    fn stale_transaction_is_ignored() {
        let mut p = CommissionerPetitioner::new(no_jitter_config());
        let mut out = Vec::new();
        p.start(false, 0, &mut out);
        let changed = p.handle_leader_response(
            TxnId(999),
            Ok(LeaderResponse::Petition {
                accepted: true,
                session_id: Some(1),
            }),
            0,
            &mut out,
        );
        assert!(!changed);
        assert_eq!(p.state(), PetitionerState::Petitioning);
    }

    #[test]
    fn default_config_jitter_stays_in_window() {
        let config = PetitionerConfig::default();
        for _ in 0..64 {
            let mut p = CommissionerPetitioner::new(config.clone());
            let mut out = Vec::new();
            p.start(false, 0, &mut out);
            let (txn, _) = last_sent(&out);
            p.handle_leader_response(txn, Err(LinkError::Timeout), 1_000, &mut out);
            let deadline = p.next_deadline().expect("retry armed");
            assert!(deadline >= 1_000 + config.retry_base_ms);
            assert!(deadline < 1_000 + config.retry_base_ms + config.retry_jitter_ms);
        }
    }
}
