//! Error types for the wire layer.

use corelib::{PeerRef, TransportError};

pub type Result<T> = std::result::Result<T, WireError>;

#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),
    #[error("frame of {len} bytes exceeds limit of {max}")]
    FrameTooLarge { len: usize, max: usize },
    #[error("unexpected response to {request}")]
    Unexpected { request: &'static str },
    /// The other side sent nothing, or stopped reading, for a whole deadline.
    #[error("connection idle for {0:?}")]
    Deadline(std::time::Duration),
    /// The remote answered with an error message.
    #[error("remote error: {0}")]
    Remote(String),
}

impl WireError {
    /// Fold into the failure the ring layer understands.
    pub fn into_transport(self, peer: &PeerRef) -> TransportError {
        let peer = peer.clone();
        match self {
            WireError::Io(err) => TransportError::Unreachable {
                peer,
                reason: err.to_string(),
            },
            WireError::Remote(reason) => TransportError::Rejected { peer, reason },
            other => TransportError::Malformed {
                peer,
                reason: other.to_string(),
            },
        }
    }
}
