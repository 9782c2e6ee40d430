//! In-process network of full peers, speaking both ring and record
//! operations. Peers can be marked down to simulate crashes.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};

use corelib::{Identifier, Lookup, PeerRef, PeerTransport, RingConfig, TransportError};
use replication::{
    BackupPoll, DeviceReader, MaintenanceConfig, Peer, PeerBuilder, RecordTransport, Timestamp,
};

#[derive(Default)]
pub struct MemoryNetwork {
    peers: RwLock<HashMap<String, Weak<Peer>>>,
    down: RwLock<HashSet<String>>,
}

impl MemoryNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn builder(id: u64) -> PeerBuilder {
        let local = PeerRef::with_identifier("10.0.0.1", 5000 + id as u16, Identifier(id));
        PeerBuilder::new(local)
            .ring_config(RingConfig::test_config())
            .maintenance(MaintenanceConfig::test_config())
    }

    pub fn add_peer(self: &Arc<Self>, id: u64) -> Arc<Peer> {
        self.register(Self::builder(id))
    }

    pub fn add_peer_with_device(
        self: &Arc<Self>,
        id: u64,
        device: Arc<dyn DeviceReader>,
    ) -> Arc<Peer> {
        self.register(Self::builder(id).device(device))
    }

    pub fn register(self: &Arc<Self>, builder: PeerBuilder) -> Arc<Peer> {
        let peer = Arc::new(builder.build(self.clone()).unwrap());
        self.peers
            .write()
            .insert(peer.local().endpoint(), Arc::downgrade(&peer));
        peer
    }

    pub fn set_down(&self, peer: &PeerRef) {
        self.down.write().insert(peer.endpoint());
    }

    fn resolve(&self, to: &PeerRef) -> Result<Arc<Peer>, TransportError> {
        if self.down.read().contains(&to.endpoint()) {
            return Err(TransportError::unreachable(to, "marked down"));
        }
        self.peers
            .read()
            .get(&to.endpoint())
            .and_then(Weak::upgrade)
            .ok_or_else(|| TransportError::unreachable(to, "no such peer"))
    }
}

#[async_trait]
impl PeerTransport for MemoryNetwork {
    async fn get_successor(&self, to: &PeerRef) -> Result<Option<PeerRef>, TransportError> {
        Ok(Some(self.resolve(to)?.ring().successor()))
    }

    async fn get_predecessor(&self, to: &PeerRef) -> Result<Option<PeerRef>, TransportError> {
        Ok(self.resolve(to)?.ring().predecessor())
    }

    async fn find_successor(
        &self,
        to: &PeerRef,
        key: Identifier,
        origin: Identifier,
        hops: u32,
    ) -> Result<Lookup, TransportError> {
        let peer = self.resolve(to)?;
        Ok(peer.ring().find_successor(key, origin, hops).await)
    }

    async fn notify(&self, to: &PeerRef, candidate: &PeerRef) -> Result<(), TransportError> {
        self.resolve(to)?.ring().notify(candidate);
        Ok(())
    }

    async fn closest_finger(
        &self,
        to: &PeerRef,
        key: Identifier,
    ) -> Result<PeerRef, TransportError> {
        Ok(self.resolve(to)?.ring().closest_preceding_finger(key))
    }
}

#[async_trait]
impl RecordTransport for MemoryNetwork {
    async fn add_record(&self, to: &PeerRef, record_id: &str) -> Result<(), TransportError> {
        self.resolve(to)?.ledger().add_record(record_id);
        Ok(())
    }

    async fn transfer_records(
        &self,
        to: &PeerRef,
        boundary: Identifier,
    ) -> Result<Vec<String>, TransportError> {
        Ok(self.resolve(to)?.ledger().transfer_records(boundary))
    }

    async fn add_backup(
        &self,
        to: &PeerRef,
        master: &PeerRef,
        record_id: &str,
    ) -> Result<(), TransportError> {
        self.resolve(to)?
            .ledger()
            .add_backup(master.clone(), record_id);
        Ok(())
    }

    async fn poll_backup_data(
        &self,
        to: &PeerRef,
        key: Identifier,
        since: Timestamp,
        requester: Identifier,
    ) -> Result<BackupPoll, TransportError> {
        Ok(self.resolve(to)?.ledger().latest_data(key, since, requester))
    }
}

/// Owner of `key` among `ids`: the first id at or after it, wrapping.
pub fn expected_owner(ids: &[u64], key: u64) -> u64 {
    let mut sorted = ids.to_vec();
    sorted.sort_unstable();
    sorted
        .iter()
        .copied()
        .find(|&id| id >= key)
        .unwrap_or(sorted[0])
}

pub async fn stabilize_all(peers: &[Arc<Peer>], rounds: usize) {
    for _ in 0..rounds {
        for peer in peers {
            peer.ring().stabilize().await;
        }
    }
}

pub async fn run_rounds(peers: &[Arc<Peer>], rounds: usize) {
    for _ in 0..rounds {
        for peer in peers {
            peer.maintenance_round().await;
        }
    }
}

/// Join every peer after the first through the first, then stabilize.
pub async fn build_ring(network: &Arc<MemoryNetwork>, ids: &[u64]) -> Vec<Arc<Peer>> {
    let peers: Vec<Arc<Peer>> = ids.iter().map(|&id| network.add_peer(id)).collect();
    let seed = peers[0].local().clone();
    for peer in &peers[1..] {
        peer.join(&seed).await.unwrap();
    }
    stabilize_all(&peers, 2 * peers.len()).await;
    peers
}

/// `(record id, holder id)` for every owned record across `peers`, sorted.
pub fn placement(peers: &[Arc<Peer>]) -> Vec<(String, u64)> {
    let mut all: Vec<(String, u64)> = peers
        .iter()
        .flat_map(|peer| {
            let holder = peer.ring().id().value();
            peer.ledger()
                .record_ids()
                .into_iter()
                .map(move |id| (id, holder))
        })
        .collect();
    all.sort();
    all
}
