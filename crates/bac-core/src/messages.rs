//! Typed request/response/notification surfaces.
//!
//! The wire TLV codec lives outside this subsystem; the session and
//! leader transports decode frames into these types and encode them
//! back. Register and keep-alive payloads carry their mode bits and
//! steering bytes raw so the protocol handlers own validation.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::joiner_id::JoinerIid;
use crate::status::{AdmitterState, RejectStatus};
use crate::steering::SteeringData;

bitflags::bitflags! {
    /// Per-enroller forwarding mode.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EnrollerMode: u8 {
        /// Forward joiner-relay traffic to this enroller.
        const FORWARD_JOINER_RELAY = 0b0000_0001;
        /// Forward UDP-proxy traffic to this enroller.
        const FORWARD_UDP_PROXY = 0b0000_0010;
    }
}

/// Liveness verdict carried in an enroller keep-alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Liveness {
    /// Stay registered.
    Accept,
    /// Resign voluntarily.
    Reject,
}

/// Confirmable request from an enroller session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollerRequest {
    /// Register this session as an admission delegate.
    Register {
        /// Enroller identity string.
        enroller_id: String,
        /// Raw forwarding-mode bits; unknown bits are a validation
        /// failure.
        mode: u8,
        /// Raw steering-data bytes; length is validated against the
        /// whitelist.
        steering: Vec<u8>,
    },
    /// Refresh liveness, optionally updating mode or steering data.
    KeepAlive {
        /// Stay registered or resign.
        liveness: Liveness,
        /// Replacement mode bits, if any.
        mode: Option<u8>,
        /// Replacement steering bytes, if any.
        steering: Option<Vec<u8>>,
    },
    /// Claim a vetted joiner for this enroller.
    JoinerAccept {
        /// Interface identifier of the vetted device.
        iid: JoinerIid,
    },
    /// Release one claimed joiner, or all of them.
    JoinerRelease {
        /// `None` releases every joiner claimed by this enroller.
        iid: Option<JoinerIid>,
    },
}

/// Status payload pushed to enrollers and echoed in responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusReport {
    /// Aggregate subsystem state.
    pub state: AdmitterState,
    /// Leader-granted commissioner session identifier, when active.
    pub commissioner_session_id: Option<u16>,
    /// Joiner UDP port override, when active and non-zero.
    pub joiner_udp_port: Option<u16>,
}

/// Response to an [`EnrollerRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollerResponse {
    /// Request honored; current aggregate status attached.
    Accepted(StatusReport),
    /// Request denied with one of the closed reject statuses.
    Rejected(RejectStatus),
}

/// Joiner-relay frame lifted off the native admission protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinerRelayFrame {
    /// Interface identifier embedded in the relayed message.
    pub iid: JoinerIid,
    /// Opaque relayed payload.
    pub payload: Bytes,
}

/// UDP-proxy frame lifted off the native admission protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UdpProxyFrame {
    /// Opaque relayed payload.
    pub payload: Bytes,
}

/// Unsolicited notification pushed to an enroller session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollerNotice {
    /// Aggregate state changed.
    StateReport(StatusReport),
    /// Forwarded joiner-relay traffic.
    JoinerRelay(JoinerRelayFrame),
    /// Forwarded UDP-proxy traffic.
    UdpProxy(UdpProxyFrame),
    /// The subsystem lost authority; the registration was cleared.
    Resigned,
}

/// Confirmable request sent to the mesh leader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderRequest {
    /// Petition for the commissioner role.
    Petition {
        /// Human-readable commissioner identifier.
        commissioner_id: String,
    },
    /// Renew (accept) or voluntarily release (reject) the held lease.
    KeepAlive {
        /// `true` renews, `false` resigns.
        accept: bool,
        /// The held commissioner session identifier.
        session_id: u16,
    },
    /// Push the current steering policy into the held lease.
    DatasetSync {
        /// The held commissioner session identifier.
        session_id: u16,
        /// Steering data snapshot.
        steering: SteeringData,
        /// Joiner UDP port override, when non-zero.
        joiner_udp_port: Option<u16>,
    },
}

/// Response payload from the mesh leader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderResponse {
    /// Petition verdict.
    Petition {
        /// Whether the role was granted.
        accepted: bool,
        /// Granted session identifier (present iff accepted).
        session_id: Option<u16>,
    },
    /// Keep-alive verdict; a rejection means the lease was lost.
    KeepAlive {
        /// Whether the lease still stands.
        accepted: bool,
    },
    /// Dataset sync verdict.
    DatasetSync {
        /// Whether the dataset was applied.
        accepted: bool,
    },
}
