//! Core library for the Chord ring.
//!
//! This crate provides the ring-membership and routing engine:
//! - Identifier key space and the ring interval predicate
//! - Peer handles
//! - Finger tables
//! - Ring nodes: lookup routing, join/leave and periodic stabilization
//! - The transport contract ring members talk through

pub mod config;
pub mod error;
pub mod finger;
pub mod keyspace;
pub mod network;
pub mod node;
pub mod ring;

pub use config::RingConfig;
pub use error::{Error, Result, TransportError};
pub use finger::FingerTable;
pub use keyspace::{Identifier, KeySpace};
pub use network::PeerTransport;
pub use node::PeerRef;
pub use ring::{Lookup, LookupFailure, RingNode, RingSnapshot, Route};
