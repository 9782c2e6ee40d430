//! `chord-node`: run a ring peer or query one.
//!
//! Provides commands for:
//! - Starting a peer, optionally joining an existing ring
//! - Resolving the owner of a key through any peer
//! - Inspecting a peer's neighbors

pub mod commands;
pub mod config;

pub use commands::{Command, CommandResult};
pub use config::{CliConfig, NodeConfig};
