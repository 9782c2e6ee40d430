//! Local ring membership state.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use tracing::{debug, info};

use super::lookup::LookupGuard;
use crate::config::RingConfig;
use crate::error::{Error, Result};
use crate::finger::FingerTable;
use crate::keyspace::{Identifier, KeySpace};
use crate::network::PeerTransport;
use crate::node::PeerRef;

/// A ring member: its pointers into the ring and the algorithms over them.
///
/// All mutable state sits behind one lock. The lock is never held across an
/// outbound call, so inbound requests can be served while this node waits
/// on a peer (including requests that loop back to itself).
pub struct RingNode {
    pub(crate) local: PeerRef,
    pub(crate) keyspace: KeySpace,
    pub(crate) config: RingConfig,
    pub(crate) transport: Arc<dyn PeerTransport>,
    pub(crate) state: Mutex<RingState>,
}

pub(crate) struct RingState {
    pub(crate) successor: PeerRef,
    pub(crate) predecessor: Option<PeerRef>,
    pub(crate) successor_list: VecDeque<PeerRef>,
    pub(crate) fingers: FingerTable,
    pub(crate) guard: LookupGuard,
    /// Next finger slot fix-fingers refreshes.
    pub(crate) next_finger: usize,
}

impl RingState {
    /// Replace the successor and keep finger 0 in step with it.
    pub(crate) fn set_successor(&mut self, successor: PeerRef) {
        self.fingers.update(0, successor.clone());
        self.successor = successor;
    }
}

/// Point-in-time copy of a node's ring pointers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RingSnapshot {
    pub local: PeerRef,
    pub successor: PeerRef,
    pub predecessor: Option<PeerRef>,
    pub successor_list: Vec<PeerRef>,
    pub fingers: Vec<Option<PeerRef>>,
}

impl RingNode {
    /// Create an unjoined node: a ring of one, its own successor.
    pub fn new(
        local: PeerRef,
        config: RingConfig,
        transport: Arc<dyn PeerTransport>,
    ) -> Result<Self> {
        let keyspace = config.validate()?;
        if local.id().value() >= keyspace.modulus() {
            return Err(Error::InvalidConfig(format!(
                "identifier {} outside ring of size {}",
                local.id(),
                keyspace.modulus()
            )));
        }

        let mut fingers = FingerTable::new(local.id(), &keyspace);
        fingers.update(0, local.clone());
        let state = RingState {
            successor: local.clone(),
            predecessor: None,
            successor_list: VecDeque::new(),
            fingers,
            guard: LookupGuard::default(),
            next_finger: 0,
        };

        Ok(Self {
            local,
            keyspace,
            config,
            transport,
            state: Mutex::new(state),
        })
    }

    pub fn local(&self) -> &PeerRef {
        &self.local
    }

    pub fn id(&self) -> Identifier {
        self.local.id()
    }

    pub fn keyspace(&self) -> &KeySpace {
        &self.keyspace
    }

    pub fn config(&self) -> &RingConfig {
        &self.config
    }

    pub fn successor(&self) -> PeerRef {
        self.state.lock().successor.clone()
    }

    pub fn predecessor(&self) -> Option<PeerRef> {
        self.state.lock().predecessor.clone()
    }

    pub fn successor_list(&self) -> Vec<PeerRef> {
        self.state.lock().successor_list.iter().cloned().collect()
    }

    pub fn finger_table(&self) -> FingerTable {
        self.state.lock().fingers.clone()
    }

    /// Finger slot the next `fix_fingers` call refreshes.
    pub fn next_finger(&self) -> usize {
        self.state.lock().next_finger
    }

    pub fn snapshot(&self) -> RingSnapshot {
        let state = self.state.lock();
        RingSnapshot {
            local: self.local.clone(),
            successor: state.successor.clone(),
            predecessor: state.predecessor.clone(),
            successor_list: state.successor_list.iter().cloned().collect(),
            fingers: state.fingers.fingers().to_vec(),
        }
    }

    /// True while this node is its own successor.
    pub fn is_singleton(&self) -> bool {
        self.state.lock().successor.same_id(&self.local)
    }

    /// True if `key` falls in `(predecessor, self]`.
    ///
    /// A singleton owns every key. A member that has lost its predecessor
    /// cannot tell and answers `false`.
    pub fn owns(&self, key: Identifier) -> bool {
        let state = self.state.lock();
        if state.successor.same_id(&self.local) {
            return true;
        }
        state
            .predecessor
            .as_ref()
            .is_some_and(|pred| self.keyspace.in_interval(pred.id(), self.local.id(), key))
    }

    /// Accept `candidate` as predecessor if there is none or it sits between
    /// the current predecessor and us.
    pub fn notify(&self, candidate: &PeerRef) {
        let mut state = self.state.lock();
        let adopt = match &state.predecessor {
            None => true,
            Some(pred) => self
                .keyspace
                .in_interval(pred.id(), self.local.id(), candidate.id()),
        };
        if adopt && state.predecessor.as_ref() != Some(candidate) {
            debug!(node = %self.local, predecessor = %candidate, "adopting predecessor");
            state.predecessor = Some(candidate.clone());
        }
    }

    /// Promote the first successor-list entry to successor.
    ///
    /// With the list exhausted the node falls back to a ring of one.
    pub fn set_new_successor(&self) {
        metrics::counter!("chord_successor_failovers_total").increment(1);
        let mut state = self.state.lock();
        match state.successor_list.pop_front() {
            Some(next) => {
                info!(node = %self.local, old = %state.successor, new = %next, "promoting next successor");
                state.set_successor(next);
            }
            None => {
                info!(node = %self.local, "successor list exhausted, continuing as singleton");
                self.reset_to_singleton(&mut state);
            }
        }
    }

    /// Leave the ring abruptly. Records are not handed off.
    pub fn leave(&self) {
        let mut state = self.state.lock();
        info!(node = %self.local, "leaving ring");
        self.reset_to_singleton(&mut state);
    }

    fn reset_to_singleton(&self, state: &mut RingState) {
        state.set_successor(self.local.clone());
        state.predecessor = None;
        state.successor_list.clear();
    }
}

impl std::fmt::Debug for RingNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("RingNode")
            .field("local", &self.local)
            .field("successor", &state.successor)
            .field("predecessor", &state.predecessor)
            .field("successor_list", &state.successor_list)
            .finish()
    }
}
