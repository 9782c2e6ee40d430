//! Wire transport for ring and record operations.
//!
//! This crate provides:
//! - The request/response messages for every peer operation
//! - Length-prefixed bincode framing
//! - A TCP client implementing both transport contracts
//! - A TCP server dispatching inbound requests to a local [`Peer`](replication::Peer)

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod protocol;
pub mod server;

pub use client::TcpTransport;
pub use config::TransportConfig;
pub use error::WireError;
pub use protocol::{Request, Response};
pub use server::Server;
