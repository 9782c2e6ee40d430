//! Successor lookup.

use metrics::counter;
use tracing::{debug, trace, warn};

use super::lookup::{Lookup, LookupFailure, Route};
use super::node::RingNode;
use crate::keyspace::Identifier;
use crate::node::PeerRef;

/// What to do with a lookup after inspecting local state.
enum Plan {
    Answer(Lookup),
    Forward(PeerRef),
    Slow(LookupFailure),
}

impl RingNode {
    /// Resolve the node owning `key`.
    ///
    /// `origin` identifies the node that started the lookup and feeds the
    /// loop guard; `hops` counts the forwards so far. The answer is never this
    /// node unless it knows it owns `key`.
    pub async fn find_successor(&self, key: Identifier, origin: Identifier, hops: u32) -> Lookup {
        let fallback_reason = match self.plan(key, origin, hops) {
            Plan::Answer(lookup) => {
                counter!("chord_lookups_answered_total").increment(1);
                return lookup;
            }
            Plan::Slow(reason) => reason,
            Plan::Forward(finger) => {
                trace!(node = %self.local, %key, finger = %finger, hops, "forwarding lookup via finger");
                match self
                    .transport
                    .find_successor(&finger, key, origin, hops + 1)
                    .await
                {
                    Ok(found @ Lookup::Found { .. }) => return found,
                    Ok(Lookup::Failed { reason, .. }) => reason,
                    Err(err) => {
                        debug!(node = %self.local, error = %err, "finger unreachable, dropping it");
                        self.state.lock().fingers.forget(&finger);
                        counter!("chord_fingers_evicted_total").increment(1);
                        LookupFailure::Unreachable { peer: finger }
                    }
                }
            }
        };

        debug!(node = %self.local, %key, reason = %fallback_reason, "falling back to slow path");
        counter!("chord_lookups_slow_path_total").increment(1);
        self.slow_successor(key, origin, hops).await
    }

    fn plan(&self, key: Identifier, origin: Identifier, hops: u32) -> Plan {
        let mut state = self.state.lock();
        let local_id = self.local.id();

        if self.keyspace.in_interval(local_id, state.successor.id(), key) {
            return Plan::Answer(Lookup::found(
                state.successor.clone(),
                Route::SuccessorInterval,
                hops,
            ));
        }
        if let Some(pred) = &state.predecessor {
            if self.keyspace.in_interval(pred.id(), local_id, key) {
                return Plan::Answer(Lookup::found(self.local.clone(), Route::LocalOwner, hops));
            }
        }
        if hops >= self.config.max_hops {
            return Plan::Answer(Lookup::failed(
                LookupFailure::HopLimit {
                    limit: self.config.max_hops,
                },
                hops,
            ));
        }
        if !state.guard.admit(key, origin) {
            return Plan::Slow(LookupFailure::LoopDetected { origin });
        }
        match state.fingers.closest_preceding_finger(key, &self.keyspace) {
            Some(finger) => Plan::Forward(finger.clone()),
            None => Plan::Slow(LookupFailure::FingerSelf),
        }
    }

    /// Walk the lookup one step along the successor pointer.
    ///
    /// An unreachable successor is replaced from the successor list and the
    /// step retried, at most `successor_list_size + 1` times.
    async fn slow_successor(&self, key: Identifier, origin: Identifier, hops: u32) -> Lookup {
        for _ in 0..=self.config.successor_list_size {
            let successor = self.successor();
            if successor.same_id(&self.local) {
                // every successor is gone; a ring of one owns every key
                return Lookup::found(self.local.clone(), Route::Singleton, hops);
            }
            match self
                .transport
                .find_successor(&successor, key, origin, hops + 1)
                .await
            {
                Ok(lookup) => return lookup,
                Err(err) => {
                    warn!(node = %self.local, successor = %successor, error = %err, "successor unreachable during lookup");
                    self.set_new_successor();
                }
            }
        }
        Lookup::failed(LookupFailure::SuccessorsExhausted, hops)
    }

    /// Best finger towards `key`, or this node when none qualifies.
    pub fn closest_preceding_finger(&self, key: Identifier) -> PeerRef {
        let state = self.state.lock();
        match state.fingers.closest_preceding_finger(key, &self.keyspace) {
            Some(finger) => finger.clone(),
            None => self.local.clone(),
        }
    }
}
