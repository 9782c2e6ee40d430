//! Finger table: `O(log N)` routing shortcuts into the ring.
//!
//! Entry `i` starts at `(self + 2^i) mod M` and best-effort points at the
//! successor of that start. Starts are fixed at construction; peers are
//! filled in lazily by stabilization and fix-fingers and may be stale.

use crate::keyspace::{Identifier, KeySpace};
use crate::node::PeerRef;

#[derive(Clone, Debug)]
pub struct FingerTable {
    owner: Identifier,
    keys: Vec<Identifier>,
    fingers: Vec<Option<PeerRef>>,
}

impl FingerTable {
    /// Build the table for a node at `owner`, with `K + 1` empty entries.
    pub fn new(owner: Identifier, keyspace: &KeySpace) -> Self {
        let keys: Vec<Identifier> = (0..=keyspace.max_finger())
            .map(|i| keyspace.finger_start(owner, i))
            .collect();
        let fingers = vec![None; keys.len()];
        Self {
            owner,
            keys,
            fingers,
        }
    }

    /// Number of entries, `K + 1`.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Index of the last entry, `K`.
    pub fn max_index(&self) -> usize {
        self.keys.len() - 1
    }

    pub fn key(&self, i: usize) -> Identifier {
        self.keys[i]
    }

    pub fn keys(&self) -> &[Identifier] {
        &self.keys
    }

    pub fn finger(&self, i: usize) -> Option<&PeerRef> {
        self.fingers.get(i).and_then(Option::as_ref)
    }

    pub fn fingers(&self) -> &[Option<PeerRef>] {
        &self.fingers
    }

    /// Overwrite entry `i`. The caller vouches that `peer` succeeds `key(i)`.
    pub fn update(&mut self, i: usize, peer: PeerRef) {
        self.fingers[i] = Some(peer);
    }

    /// Clear every entry pointing at `peer`. Fix-fingers refills them.
    pub fn forget(&mut self, peer: &PeerRef) {
        for slot in self.fingers.iter_mut() {
            if slot.as_ref().is_some_and(|f| f.same_id(peer)) {
                *slot = None;
            }
        }
    }

    /// Farthest known finger that still lies before `target`.
    ///
    /// Scans from the last entry down and returns the first populated finger
    /// whose peer sits in `(owner, target]`, skipping entries that point back
    /// at the owner. `None` when nothing qualifies.
    pub fn closest_preceding_finger(
        &self,
        target: Identifier,
        keyspace: &KeySpace,
    ) -> Option<&PeerRef> {
        self.fingers.iter().rev().flatten().find(|peer| {
            peer.id() != self.owner && keyspace.in_interval(self.owner, target, peer.id())
        })
    }
}
