//! Lookup outcomes and the forwarding loop guard.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::keyspace::Identifier;
use crate::node::PeerRef;

/// Answer to a `find_successor` request.
///
/// A failed lookup is an ordinary outcome, not an error: the caller falls
/// back to the slow path or retries later.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lookup {
    Found {
        peer: PeerRef,
        route: Route,
        hops: u32,
    },
    Failed {
        reason: LookupFailure,
        hops: u32,
    },
}

impl Lookup {
    pub fn found(peer: PeerRef, route: Route, hops: u32) -> Self {
        Lookup::Found { peer, route, hops }
    }

    pub fn failed(reason: LookupFailure, hops: u32) -> Self {
        Lookup::Failed { reason, hops }
    }

    pub fn peer(&self) -> Option<&PeerRef> {
        match self {
            Lookup::Found { peer, .. } => Some(peer),
            Lookup::Failed { .. } => None,
        }
    }

    pub fn hops(&self) -> u32 {
        match self {
            Lookup::Found { hops, .. } | Lookup::Failed { hops, .. } => *hops,
        }
    }
}

/// How the answering node decided.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Route {
    /// Key falls between the answering node and its successor.
    SuccessorInterval,
    /// Key falls between the answering node's predecessor and itself.
    LocalOwner,
    /// Node lost every successor mid-lookup and now owns the whole ring.
    Singleton,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::SuccessorInterval => write!(f, "self successor"),
            Route::LocalOwner => write!(f, "self predecessor"),
            Route::Singleton => write!(f, "singleton"),
        }
    }
}

/// Why a lookup did not produce an owner.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum LookupFailure {
    #[error("start key {origin} same as last request key")]
    LoopDetected { origin: Identifier },
    #[error("finger table returned own key")]
    FingerSelf,
    #[error("peer {peer} unreachable")]
    Unreachable { peer: PeerRef },
    #[error("hop limit {limit} reached")]
    HopLimit { limit: u32 },
    #[error("no reachable successor left")]
    SuccessorsExhausted,
}

/// Remembers which lookups this node already forwarded through its fingers.
///
/// A repeat of the last key, or of any origin seen since the window was
/// cleared, is taken as a routing cycle. This is a heuristic: a quick retry
/// from the same origin trips it too, which only costs a slow-path detour.
#[derive(Debug, Default)]
pub(crate) struct LookupGuard {
    last_key: Option<Identifier>,
    origins: HashSet<Identifier>,
}

impl LookupGuard {
    /// Record the lookup and return `true`, or `false` if it is a repeat.
    pub(crate) fn admit(&mut self, key: Identifier, origin: Identifier) -> bool {
        if self.last_key == Some(key) || self.origins.contains(&origin) {
            return false;
        }
        self.last_key = Some(key);
        self.origins.insert(origin);
        true
    }

    pub(crate) fn clear(&mut self) {
        self.last_key = None;
        self.origins.clear();
    }
}
