//! Externally visible status codes.
//!
//! The aggregate admitter state is derived from the election and lease
//! state machines; the reject-status set is the closed taxonomy every
//! failed enroller request resolves to, so enrollers can distinguish
//! "try later" from "permanently denied for this request".

use serde::{Deserialize, Serialize};

/// Aggregate state of the border-admission subsystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmitterState {
    /// Not the prime admitter (or disabled / detached).
    Unavailable,
    /// Prime admitter, commissioner role not yet held.
    Ready,
    /// Prime admitter holding an accepted commissioner lease.
    Active,
    /// Prime admitter but the leader rejected the petition (another
    /// commissioner holds the role).
    ConflictError,
}

impl std::fmt::Display for AdmitterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Unavailable => "unavailable",
            Self::Ready => "ready",
            Self::Active => "active",
            Self::ConflictError => "conflict_error",
        };
        f.write_str(label)
    }
}

/// Reject status for enroller requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectStatus {
    /// Malformed request, bad steering-data length, or a missing
    /// required field. Never retried.
    InvalidPayload,
    /// No capacity for a new enroller or joiner record.
    NoResources,
    /// The joiner is already claimed by a different enroller.
    Conflict,
    /// The request requires an active commissioner lease.
    NotActive,
    /// Transient condition; retry later.
    TryLater,
}

impl RejectStatus {
    /// True if the requester may usefully retry the same request later.
    #[must_use]
    pub const fn is_retryable(self) -> bool {
        matches!(self, Self::NoResources | Self::NotActive | Self::TryLater)
    }

    /// Numeric status code reported to enrollers.
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::InvalidPayload => 0x01,
            Self::NoResources => 0x02,
            Self::Conflict => 0x03,
            Self::NotActive => 0x04,
            Self::TryLater => 0x05,
        }
    }
}

impl std::fmt::Display for RejectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::InvalidPayload => "invalid_payload",
            Self::NoResources => "no_resources",
            Self::Conflict => "conflict",
            Self::NotActive => "not_active",
            Self::TryLater => "try_later",
        };
        f.write_str(label)
    }
}
