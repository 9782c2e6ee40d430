//! Error types for the core library.

use crate::node::PeerRef;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core library.
///
/// Routing failures are not errors: they come back as
/// [`Lookup::Failed`](crate::ring::Lookup::Failed) and the caller decides the
/// fallback.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Configuration value out of range.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    /// The seed never resolved our successor within the attempt budget.
    #[error("join via {seed} failed after {attempts} attempts")]
    JoinFailed { seed: PeerRef, attempts: u32 },
}

/// Failure of a single outbound peer call.
///
/// Every variant is handled the same way by the ring: the peer is treated as
/// unreachable and the per-operation fallback kicks in.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("peer {peer} unreachable: {reason}")]
    Unreachable { peer: PeerRef, reason: String },
    #[error("call to {peer} timed out")]
    Timeout { peer: PeerRef },
    /// The peer answered with something that does not fit the operation.
    #[error("malformed response from {peer}: {reason}")]
    Malformed { peer: PeerRef, reason: String },
    /// The peer refused the request.
    #[error("peer {peer} rejected request: {reason}")]
    Rejected { peer: PeerRef, reason: String },
}

impl TransportError {
    pub fn unreachable(peer: &PeerRef, reason: impl Into<String>) -> Self {
        TransportError::Unreachable {
            peer: peer.clone(),
            reason: reason.into(),
        }
    }

    /// The peer the failed call was addressed to.
    pub fn peer(&self) -> &PeerRef {
        match self {
            TransportError::Unreachable { peer, .. }
            | TransportError::Timeout { peer }
            | TransportError::Malformed { peer, .. }
            | TransportError::Rejected { peer, .. } => peer,
        }
    }
}
