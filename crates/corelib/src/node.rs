//! Peer handles.
//!
//! A [`PeerRef`] names a ring member by address and port. Its identifier is
//! derived from those two when built through [`PeerRef::new`] and never
//! changes afterwards; to point somewhere else, replace the handle.

use crate::keyspace::{Identifier, KeySpace};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Immutable handle to a ring member.
///
/// Keep this struct small and cheap to clone; it is copied into finger
/// tables, successor lists and every routing answer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PeerRef {
    address: String,
    port: u16,
    id: Identifier,
}

impl PeerRef {
    /// Handle whose identifier is hashed from `address` and `port`.
    pub fn new(address: impl Into<String>, port: u16, keyspace: &KeySpace) -> Self {
        let address = address.into();
        let id = keyspace.peer_identifier(&address, port);
        Self { address, port, id }
    }

    /// Handle with an explicit identifier, for peers whose identifier was
    /// reported over the wire or pinned by a test.
    pub fn with_identifier(address: impl Into<String>, port: u16, id: Identifier) -> Self {
        Self {
            address: address.into(),
            port,
            id,
        }
    }

    #[inline]
    pub fn id(&self) -> Identifier {
        self.id
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// `address:port`, suitable for socket connects.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// Same ring position as `other`.
    #[inline]
    pub fn same_id(&self, other: &PeerRef) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for PeerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}:{}, {})", self.address, self.port, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_is_derived() {
        let ks = KeySpace::new(3).unwrap();
        let peer = PeerRef::new("127.0.0.1", 5001, &ks);
        assert_eq!(peer.id(), Identifier(318));
        assert_eq!(peer.endpoint(), "127.0.0.1:5001");
        assert_eq!(peer, PeerRef::new("127.0.0.1", 5001, &ks));
    }

    #[test]
    fn test_display() {
        let peer = PeerRef::with_identifier("10.0.0.7", 80, Identifier(42));
        assert_eq!(peer.to_string(), "(10.0.0.7:80, 42)");
    }
}
