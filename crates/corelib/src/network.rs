//! Transport-agnostic RPC contract between ring members.
//!
//! The ring only ever talks to other peers through [`PeerTransport`]. How a
//! call is framed and carried is the implementor's business; every failure
//! comes back as a [`TransportError`] and is treated as "peer unreachable".

use async_trait::async_trait;

use crate::error::TransportError;
use crate::keyspace::Identifier;
use crate::node::PeerRef;
use crate::ring::Lookup;

/// Outbound half of the ring's peer operations.
///
/// Implementations must bound every call with a timeout; the ring never
/// cancels an in-flight call itself.
#[async_trait]
pub trait PeerTransport: Send + Sync + 'static {
    /// `GetSuccessor`. Also serves as the liveness probe.
    async fn get_successor(&self, to: &PeerRef) -> Result<Option<PeerRef>, TransportError>;

    /// `GetPredecessor`.
    async fn get_predecessor(&self, to: &PeerRef) -> Result<Option<PeerRef>, TransportError>;

    /// `FindSuccessor`: ask `to` to resolve the owner of `key`.
    async fn find_successor(
        &self,
        to: &PeerRef,
        key: Identifier,
        origin: Identifier,
        hops: u32,
    ) -> Result<Lookup, TransportError>;

    /// `Notify`: offer `candidate` as `to`'s predecessor.
    async fn notify(&self, to: &PeerRef, candidate: &PeerRef) -> Result<(), TransportError>;

    /// `ClosestFinger`: `to`'s best routing shortcut towards `key`.
    async fn closest_finger(&self, to: &PeerRef, key: Identifier)
        -> Result<PeerRef, TransportError>;
}
