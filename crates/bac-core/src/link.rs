//! Error taxonomy for the leader-request layer.

use thiserror::Error;

/// Failure of a confirmable exchange with the mesh leader.
///
/// Every variant is recoverable: the requesting state machine retries
/// from its current logical stage with a jittered delay. Explicit
/// protocol-level rejection is not a `LinkError`; it arrives as a
/// regular response payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LinkError {
    /// No response arrived within the transport's retransmit budget.
    #[error("leader request timed out")]
    Timeout,

    /// The request could not be sent or the transport failed mid-flight.
    #[error("leader transport failure: {reason}")]
    Transport {
        /// Transport-provided failure description.
        reason: String,
    },

    /// A response arrived but did not parse as the expected payload.
    #[error("malformed response from leader")]
    MalformedResponse,
}
