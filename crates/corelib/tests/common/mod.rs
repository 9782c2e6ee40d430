//! In-process network for multi-node ring tests.
//!
//! Every node registers under its endpoint; calls are plain async method
//! calls on the target `RingNode`. Peers can be marked down to simulate
//! crashes.

#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Weak};

use corelib::{
    Identifier, Lookup, PeerRef, PeerTransport, RingConfig, RingNode, TransportError,
};

#[derive(Default)]
pub struct MemoryNetwork {
    nodes: RwLock<HashMap<String, Weak<RingNode>>>,
    down: RwLock<HashSet<String>>,
}

impl MemoryNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Create and register a node with a pinned identifier.
    pub fn add_node(self: &Arc<Self>, id: u64) -> Arc<RingNode> {
        self.add_node_with(id, RingConfig::test_config())
    }

    pub fn add_node_with(self: &Arc<Self>, id: u64, config: RingConfig) -> Arc<RingNode> {
        let peer = PeerRef::with_identifier("10.0.0.1", 5000 + id as u16, Identifier(id));
        let transport: Arc<dyn PeerTransport> = self.clone();
        let node = Arc::new(RingNode::new(peer.clone(), config, transport).unwrap());
        self.nodes
            .write()
            .insert(peer.endpoint(), Arc::downgrade(&node));
        node
    }

    pub fn set_down(&self, peer: &PeerRef) {
        self.down.write().insert(peer.endpoint());
    }

    fn resolve(&self, to: &PeerRef) -> Result<Arc<RingNode>, TransportError> {
        if self.down.read().contains(&to.endpoint()) {
            return Err(TransportError::unreachable(to, "marked down"));
        }
        self.nodes
            .read()
            .get(&to.endpoint())
            .and_then(Weak::upgrade)
            .ok_or_else(|| TransportError::unreachable(to, "no such node"))
    }
}

#[async_trait]
impl PeerTransport for MemoryNetwork {
    async fn get_successor(&self, to: &PeerRef) -> Result<Option<PeerRef>, TransportError> {
        Ok(Some(self.resolve(to)?.successor()))
    }

    async fn get_predecessor(&self, to: &PeerRef) -> Result<Option<PeerRef>, TransportError> {
        Ok(self.resolve(to)?.predecessor())
    }

    async fn find_successor(
        &self,
        to: &PeerRef,
        key: Identifier,
        origin: Identifier,
        hops: u32,
    ) -> Result<Lookup, TransportError> {
        let node = self.resolve(to)?;
        Ok(node.find_successor(key, origin, hops).await)
    }

    async fn notify(&self, to: &PeerRef, candidate: &PeerRef) -> Result<(), TransportError> {
        self.resolve(to)?.notify(candidate);
        Ok(())
    }

    async fn closest_finger(
        &self,
        to: &PeerRef,
        key: Identifier,
    ) -> Result<PeerRef, TransportError> {
        Ok(self.resolve(to)?.closest_preceding_finger(key))
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

/// True if successor pointers form one cycle over exactly `nodes`, with each
/// successor's predecessor pointing back.
pub fn is_consistent_cycle(nodes: &[Arc<RingNode>]) -> bool {
    let by_id: HashMap<Identifier, &Arc<RingNode>> =
        nodes.iter().map(|n| (n.id(), n)).collect();
    let start = nodes[0].id();
    let mut current = start;
    let mut visited = HashSet::new();
    for _ in 0..nodes.len() {
        if !visited.insert(current) {
            return false;
        }
        let node = by_id[&current];
        let next = node.successor().id();
        let Some(next_node) = by_id.get(&next) else {
            return false;
        };
        if next_node.predecessor().map(|p| p.id()) != Some(current) {
            return false;
        }
        current = next;
    }
    current == start && visited.len() == nodes.len()
}

pub async fn stabilize_all(nodes: &[Arc<RingNode>], rounds: usize) {
    for _ in 0..rounds {
        for node in nodes {
            node.stabilize().await;
        }
    }
}

/// Join every node after the first through the first, then stabilize.
pub async fn build_ring(network: &Arc<MemoryNetwork>, ids: &[u64]) -> Vec<Arc<RingNode>> {
    let nodes: Vec<Arc<RingNode>> = ids.iter().map(|&id| network.add_node(id)).collect();
    let seed = nodes[0].local().clone();
    for node in &nodes[1..] {
        node.join(&seed).await.unwrap();
    }
    stabilize_all(&nodes, 2 * nodes.len()).await;
    nodes
}
