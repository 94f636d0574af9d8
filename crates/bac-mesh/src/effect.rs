//! Outbound command set.
//!
//! State machines never perform IO; every externally visible action is
//! queued as an [`Effect`] the embedding run loop drains and executes
//! against the real transports (service publisher, leader-request
//! layer, session layer, address table).

use bac_core::{EnrollerNotice, LeaderRequest};

use crate::enroller::SessionId;

/// Correlation id for one confirmable exchange with the mesh leader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxnId(pub u64);

impl std::fmt::Display for TxnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "txn-{}", self.0)
    }
}

/// An action for the embedding run loop to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Publish this device's election-service entry in network data.
    PublishService,
    /// Withdraw the election-service entry.
    UnpublishService,
    /// Send a confirmable request to the mesh leader; the response (or
    /// transport error) re-enters via `handle_leader_response`.
    SendToLeader {
        /// Correlation id for the response.
        txn: TxnId,
        /// Request payload.
        request: LeaderRequest,
    },
    /// Abort an in-flight leader exchange.
    AbortLeaderTxn {
        /// The exchange to abort.
        txn: TxnId,
    },
    /// Assign the commissioner locator address and attach its inbound
    /// listener.
    AddLocatorAddress,
    /// Remove the commissioner locator address and detach its listener.
    RemoveLocatorAddress,
    /// Push an unsolicited notification to one enroller session.
    Notify {
        /// Target session.
        session: SessionId,
        /// Notification payload.
        notice: EnrollerNotice,
    },
    /// The subsystem's enablement changed; the capability advertiser
    /// should refresh its feature flags.
    CapabilityFlagChanged {
        /// New enablement.
        enabled: bool,
    },
}
