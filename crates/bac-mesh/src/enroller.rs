//! Enroller and joiner registry.
//!
//! Each live secure session owns at most one [`EnrollerRecord`];
//! resignation is clearing that slot. Joiner records live inside the
//! enroller that accepted them, and a device may be claimed by only one
//! enroller at a time across the whole registry.

use std::collections::HashMap;

use bac_core::{EnrollerMode, JoinerIid, SteeringData};
use thiserror::Error;

use crate::timer::earliest;

/// Opaque handle for a live secure session, assigned by the session
/// layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "session-{}", self.0)
    }
}

/// Registry errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The session is not connected.
    #[error("{0} is not connected")]
    UnknownSession(SessionId),

    /// Enroller capacity reached.
    #[error("enroller capacity reached ({limit})")]
    EnrollerCapacity {
        /// Configured maximum.
        limit: usize,
    },

    /// Per-enroller joiner capacity reached.
    #[error("joiner capacity reached ({limit})")]
    JoinerCapacity {
        /// Configured maximum.
        limit: usize,
    },
}

/// One accepted joiner, owned by the enroller that vetted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinerRecord {
    /// Interface identifier of the device.
    pub iid: JoinerIid,
    /// Uptime at acceptance (latest refresh).
    pub accepted_at_ms: u64,
    /// Expiry deadline on the shared joiner timer.
    pub expires_at_ms: u64,
}

/// Per-session admission-delegate state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollerRecord {
    /// Identity string supplied at registration.
    pub enroller_id: String,
    /// Forwarding mode.
    pub mode: EnrollerMode,
    /// This enroller's steering data contribution.
    pub steering: SteeringData,
    /// Uptime of registration (refreshed by keep-alives).
    pub registered_at_ms: u64,
    joiners: Vec<JoinerRecord>,
}

impl EnrollerRecord {
    /// Create a fresh record with no joiners.
    #[must_use]
    pub const fn new(
        enroller_id: String,
        mode: EnrollerMode,
        steering: SteeringData,
        registered_at_ms: u64,
    ) -> Self {
        Self {
            enroller_id,
            mode,
            steering,
            registered_at_ms,
            joiners: Vec::new(),
        }
    }

    /// Joiners currently claimed by this enroller.
    #[must_use]
    pub fn joiners(&self) -> &[JoinerRecord] {
        &self.joiners
    }

    /// Find a claimed joiner by interface identifier.
    #[must_use]
    pub fn find_joiner(&self, iid: JoinerIid) -> Option<&JoinerRecord> {
        self.joiners.iter().find(|j| j.iid == iid)
    }

    /// Claim a joiner or refresh an existing claim's expiry.
    ///
    /// Returns the record's expiry deadline.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::JoinerCapacity`] when a new claim would
    /// exceed `max_joiners`.
    pub fn accept_joiner(
        &mut self,
        iid: JoinerIid,
        now_ms: u64,
        lifetime_ms: u64,
        max_joiners: usize,
    ) -> Result<u64, RegistryError> {
        let expires_at_ms = now_ms.saturating_add(lifetime_ms);
        if let Some(existing) = self.joiners.iter_mut().find(|j| j.iid == iid) {
            existing.accepted_at_ms = now_ms;
            existing.expires_at_ms = expires_at_ms;
            return Ok(expires_at_ms);
        }

        if self.joiners.len() >= max_joiners {
            return Err(RegistryError::JoinerCapacity { limit: max_joiners });
        }

        self.joiners.push(JoinerRecord {
            iid,
            accepted_at_ms: now_ms,
            expires_at_ms,
        });
        Ok(expires_at_ms)
    }

    /// Release one claimed joiner. Returns true if a record existed.
    pub fn release_joiner(&mut self, iid: JoinerIid) -> bool {
        let before = self.joiners.len();
        self.joiners.retain(|j| j.iid != iid);
        self.joiners.len() != before
    }

    /// Release every claimed joiner. Returns how many were removed.
    pub fn release_all_joiners(&mut self) -> usize {
        let removed = self.joiners.len();
        self.joiners.clear();
        removed
    }

    /// Drop joiners whose expiry is at or before `now_ms`.
    pub fn remove_expired(&mut self, now_ms: u64) -> usize {
        let before = self.joiners.len();
        self.joiners.retain(|j| j.expires_at_ms > now_ms);
        before - self.joiners.len()
    }

    /// Earliest expiry among this enroller's joiners.
    #[must_use]
    pub fn next_expiry(&self) -> Option<u64> {
        self.joiners.iter().map(|j| j.expires_at_ms).min()
    }
}

#[derive(Debug)]
struct SessionSlot {
    connected_at_ms: u64,
    enroller: Option<EnrollerRecord>,
}

/// The live session set and the enroller records it owns.
#[derive(Debug)]
pub struct SessionRegistry {
    slots: HashMap<SessionId, SessionSlot>,
    max_enrollers: usize,
}

impl SessionRegistry {
    /// Create a registry with the given enroller capacity.
    #[must_use]
    pub fn new(max_enrollers: usize) -> Self {
        Self {
            slots: HashMap::new(),
            max_enrollers,
        }
    }

    /// Track a newly connected session.
    pub fn session_connected(&mut self, session: SessionId, now_ms: u64) {
        self.slots.entry(session).or_insert(SessionSlot {
            connected_at_ms: now_ms,
            enroller: None,
        });
    }

    /// Drop a closed session and its enroller record, if any.
    ///
    /// Returns true if the session owned an enroller.
    pub fn session_closed(&mut self, session: SessionId) -> bool {
        self.slots
            .remove(&session)
            .is_some_and(|slot| slot.enroller.is_some())
    }

    /// Uptime at which the session connected.
    #[must_use]
    pub fn connected_at(&self, session: SessionId) -> Option<u64> {
        self.slots.get(&session).map(|slot| slot.connected_at_ms)
    }

    /// Attach an enroller record to a connected session, replacing any
    /// prior registration on the same session.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::UnknownSession`] for an untracked
    /// session and [`RegistryError::EnrollerCapacity`] when a new
    /// registration would exceed the configured capacity.
    pub fn register(
        &mut self,
        session: SessionId,
        record: EnrollerRecord,
    ) -> Result<(), RegistryError> {
        let occupied = self.enroller_count();
        let slot = self
            .slots
            .get_mut(&session)
            .ok_or(RegistryError::UnknownSession(session))?;
        if slot.enroller.is_none() && occupied >= self.max_enrollers {
            return Err(RegistryError::EnrollerCapacity {
                limit: self.max_enrollers,
            });
        }
        slot.enroller = Some(record);
        Ok(())
    }

    /// Clear a session's enroller record. Returns true if one existed.
    pub fn resign(&mut self, session: SessionId) -> bool {
        self.slots
            .get_mut(&session)
            .is_some_and(|slot| slot.enroller.take().is_some())
    }

    /// Clear every enroller record; returns the sessions that held one.
    pub fn resign_all(&mut self) -> Vec<SessionId> {
        let mut resigned: Vec<SessionId> = self
            .slots
            .iter_mut()
            .filter_map(|(id, slot)| slot.enroller.take().map(|_| *id))
            .collect();
        resigned.sort_unstable();
        resigned
    }

    /// Borrow a session's enroller record.
    #[must_use]
    pub fn enroller(&self, session: SessionId) -> Option<&EnrollerRecord> {
        self.slots.get(&session)?.enroller.as_ref()
    }

    /// Mutably borrow a session's enroller record.
    pub fn enroller_mut(&mut self, session: SessionId) -> Option<&mut EnrollerRecord> {
        self.slots.get_mut(&session)?.enroller.as_mut()
    }

    /// Traverse the live session set, filtered to sessions that
    /// currently own an enroller record.
    pub fn enrollers(&self) -> impl Iterator<Item = (SessionId, &EnrollerRecord)> {
        self.slots
            .iter()
            .filter_map(|(id, slot)| slot.enroller.as_ref().map(|record| (*id, record)))
    }

    /// Number of registered enrollers.
    #[must_use]
    pub fn enroller_count(&self) -> usize {
        self.slots
            .values()
            .filter(|slot| slot.enroller.is_some())
            .count()
    }

    /// Total joiner records across all enrollers.
    #[must_use]
    pub fn joiner_count(&self) -> usize {
        self.enrollers().map(|(_, e)| e.joiners().len()).sum()
    }

    /// Which enroller session, if any, has claimed this device.
    #[must_use]
    pub fn find_claimant(&self, iid: JoinerIid) -> Option<SessionId> {
        self.enrollers()
            .find(|(_, record)| record.find_joiner(iid).is_some())
            .map(|(id, _)| id)
    }

    /// Drop expired joiners everywhere.
    ///
    /// Returns the number removed and the earliest remaining expiry
    /// across all enrollers.
    pub fn sweep_expired(&mut self, now_ms: u64) -> (usize, Option<u64>) {
        let mut removed = 0;
        let mut next: Option<u64> = None;
        for slot in self.slots.values_mut() {
            if let Some(record) = slot.enroller.as_mut() {
                removed += record.remove_expired(now_ms);
                next = earliest(next, record.next_expiry());
            }
        }
        (removed, next)
    }
}
