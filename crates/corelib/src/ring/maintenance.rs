//! Periodic ring maintenance and membership changes.
//!
//! Every step here tolerates unreachable peers: a failed call triggers the
//! step's local fallback and the step returns normally.

use rand::Rng;
use tracing::{debug, info, trace, warn};

use super::lookup::Lookup;
use super::node::RingNode;
use crate::error::{Error, Result};
use crate::node::PeerRef;

impl RingNode {
    /// Join the ring that `seed` belongs to.
    ///
    /// Retries the seed with a fixed delay until it resolves our successor,
    /// up to `join_max_attempts` if configured. Returns the new successor.
    pub async fn join(&self, seed: &PeerRef) -> Result<PeerRef> {
        self.state.lock().predecessor = None;

        let local_id = self.local.id();
        let mut attempts = 0u32;
        let successor = loop {
            attempts += 1;
            info!(node = %self.local, seed = %seed, attempt = attempts, "joining ring");
            match self
                .transport
                .find_successor(seed, local_id, local_id, 0)
                .await
            {
                Ok(Lookup::Found { peer, .. }) => break peer,
                Ok(Lookup::Failed { reason, .. }) => {
                    warn!(node = %self.local, seed = %seed, %reason, "seed could not resolve our successor");
                }
                Err(err) => {
                    warn!(node = %self.local, seed = %seed, error = %err, "seed unreachable");
                }
            }
            if self
                .config
                .join_max_attempts
                .is_some_and(|max| attempts >= max)
            {
                return Err(Error::JoinFailed {
                    seed: seed.clone(),
                    attempts,
                });
            }
            tokio::time::sleep(self.config.join_retry_delay()).await;
        };

        {
            let mut state = self.state.lock();
            state.set_successor(successor.clone());
            state.successor_list.clear();
        }
        info!(node = %self.local, successor = %successor, "joined ring");

        self.stabilize().await;
        Ok(successor)
    }

    /// Verify our successor and tell it about us.
    ///
    /// Adopts the successor's predecessor when it sits between us and the
    /// successor. A singleton adopts its own predecessor as successor, if it
    /// has learned one. Also clears the lookup loop-guard window.
    pub async fn stabilize(&self) {
        let local_id = self.local.id();
        let successor = {
            let mut state = self.state.lock();
            state.guard.clear();
            state.successor.clone()
        };

        if successor.same_id(&self.local) {
            let mut state = self.state.lock();
            // (self, self] is the whole ring, so any other predecessor qualifies
            if let Some(pred) = state.predecessor.clone() {
                if !pred.same_id(&self.local) {
                    info!(node = %self.local, successor = %pred, "singleton adopting predecessor as successor");
                    state.set_successor(pred);
                }
            }
        } else {
            match self.transport.get_predecessor(&successor).await {
                Ok(Some(candidate)) => {
                    let mut state = self.state.lock();
                    if !candidate.same_id(&self.local)
                        && self
                            .keyspace
                            .in_interval(local_id, state.successor.id(), candidate.id())
                    {
                        debug!(node = %self.local, old = %state.successor, new = %candidate, "adopting closer successor");
                        state.set_successor(candidate);
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    warn!(node = %self.local, successor = %successor, error = %err, "successor unreachable during stabilize");
                    self.set_new_successor();
                }
            }
        }

        let successor = self.successor();
        if successor.same_id(&self.local) {
            self.notify(&self.local);
        } else if let Err(err) = self.transport.notify(&successor, &self.local).await {
            debug!(node = %self.local, successor = %successor, error = %err, "notify failed");
        }

        let mut state = self.state.lock();
        let current = state.successor.clone();
        state.fingers.update(0, current);
    }

    /// Rebuild the successor list by walking forward from the successor.
    ///
    /// If the immediate successor is down it is replaced and the walk
    /// restarts from the replacement.
    pub async fn update_successor_list(&self) {
        let limit = self.config.successor_list_size;
        let mut list: Vec<PeerRef> = Vec::with_capacity(limit);
        let mut cursor = self.successor();
        let mut restarts = 0usize;

        while list.len() < limit && !cursor.same_id(&self.local) {
            match self.transport.get_successor(&cursor).await {
                Ok(Some(next)) => {
                    if next.same_id(&self.local) || list.iter().any(|p| p.same_id(&next)) {
                        break;
                    }
                    list.push(next.clone());
                    cursor = next;
                }
                Ok(None) => break,
                Err(err) if list.is_empty() && restarts < limit => {
                    warn!(node = %self.local, successor = %cursor, error = %err, "successor unreachable, restarting successor walk");
                    self.set_new_successor();
                    restarts += 1;
                    cursor = self.successor();
                }
                Err(err) => {
                    debug!(node = %self.local, peer = %cursor, error = %err, "successor walk cut short");
                    break;
                }
            }
        }

        trace!(node = %self.local, len = list.len(), "successor list refreshed");
        self.state.lock().successor_list = list.into();
    }

    /// Probe the predecessor; forget it if it does not answer.
    pub async fn check_predecessor(&self) {
        let Some(pred) = self.predecessor() else {
            return;
        };
        if pred.same_id(&self.local) {
            return;
        }
        if let Err(err) = self.transport.get_successor(&pred).await {
            let mut state = self.state.lock();
            if state.predecessor.as_ref() == Some(&pred) {
                info!(node = %self.local, predecessor = %pred, error = %err, "predecessor unreachable, clearing it");
                state.predecessor = None;
            }
        }
    }

    /// Refresh one finger slot and move the cursor.
    ///
    /// On success the cursor advances. On failure it advances only with
    /// probability `finger_skip_probability`, so a slot is neither retried
    /// forever nor abandoned after one bad round.
    pub async fn fix_fingers(&self) {
        let (index, start) = {
            let state = self.state.lock();
            (state.next_finger, state.fingers.key(state.next_finger))
        };

        let advance = match self.find_successor(start, self.local.id(), 0).await {
            Lookup::Found { peer, .. } => {
                trace!(node = %self.local, index, finger = %peer, "finger fixed");
                self.state.lock().fingers.update(index, peer);
                true
            }
            Lookup::Failed { reason, .. } => {
                debug!(node = %self.local, index, %reason, "finger lookup failed");
                self.skip_failed_finger()
            }
        };

        if advance {
            let mut state = self.state.lock();
            state.next_finger = if index >= state.fingers.max_index() {
                0
            } else {
                index + 1
            };
        }
    }

    fn skip_failed_finger(&self) -> bool {
        rand::thread_rng().gen_bool(self.config.finger_skip_probability)
    }

    /// One pass of every ring maintenance step, in protocol order.
    pub async fn maintenance_round(&self) {
        self.stabilize().await;
        self.update_successor_list().await;
        self.check_predecessor().await;
        self.fix_fingers().await;
    }
}
