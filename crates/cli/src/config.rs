//! Node configuration file and command-line argument definitions.
//!
//! Settings resolve in three layers: built-in defaults, then the optional
//! JSON file given with `--config`, then individual flags.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use corelib::{KeySpace, PeerRef, RingConfig};
use replication::MaintenanceConfig;
use transport::TransportConfig;

/// Contents of the `--config` file. Every section is optional.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub ring: RingConfig,
    pub maintenance: MaintenanceConfig,
    pub transport: TransportConfig,
    /// `tracing` filter directive; `RUST_LOG` wins when set.
    pub log_level: Option<String>,
}

impl NodeConfig {
    /// Read `path`, or fall back to defaults when no file is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::from_json(&raw).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.ring.validate()?;
        config.maintenance.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Parser)]
#[command(name = "chord-node", version, about = "Chord ring peer with replicated records")]
pub struct CliConfig {
    /// Path to a JSON config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter, e.g. `info` or `corelib=debug`.
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run a peer until interrupted.
    Start {
        /// Listen address, `HOST:PORT`.
        #[arg(short, long)]
        bind: String,

        /// Host other peers reach us at. Defaults to the bind host.
        #[arg(long)]
        advertise: Option<String>,

        /// Any ring member to join through, `HOST:PORT`.
        #[arg(short, long)]
        join: Option<String>,

        /// Record to place on the ring after startup. Repeatable.
        #[arg(short, long = "record")]
        records: Vec<String>,

        /// Decimal digits per identifier.
        #[arg(long)]
        digits: Option<u32>,

        /// Successor list size.
        #[arg(long)]
        successors: Option<usize>,
    },

    /// Ask a peer which node owns a key.
    Lookup {
        /// Peer to ask, `HOST:PORT`.
        #[arg(short, long)]
        peer: String,

        /// Record id or any other string; hashed onto the ring.
        #[arg(short, long)]
        key: String,
    },

    /// Show a peer's successor and predecessor.
    Neighbors {
        /// Peer to ask, `HOST:PORT`.
        #[arg(short, long)]
        peer: String,
    },
}

impl CliConfig {
    /// Load the config file and apply flag overrides.
    pub fn resolve(&self) -> Result<NodeConfig> {
        let mut config = NodeConfig::load(self.config.as_deref())?;
        if let Some(level) = &self.log_level {
            config.log_level = Some(level.clone());
        }
        if let Command::Start {
            digits, successors, ..
        } = &self.command
        {
            if let Some(digits) = digits {
                config.ring.interval_digits = *digits;
            }
            if let Some(successors) = successors {
                config.ring.successor_list_size = *successors;
            }
        }
        config.ring.validate()?;
        Ok(config)
    }
}

/// Split `HOST:PORT`.
pub fn parse_endpoint(endpoint: &str) -> Result<(String, u16)> {
    let (host, port) = endpoint
        .rsplit_once(':')
        .ok_or_else(|| anyhow!("expected HOST:PORT, got {endpoint:?}"))?;
    if host.is_empty() {
        return Err(anyhow!("missing host in {endpoint:?}"));
    }
    let port = port
        .parse()
        .with_context(|| format!("invalid port in {endpoint:?}"))?;
    Ok((host.to_string(), port))
}

/// Handle for a remote peer given as `HOST:PORT`.
pub fn parse_peer(endpoint: &str, keyspace: &KeySpace) -> Result<PeerRef> {
    let (host, port) = parse_endpoint(endpoint)?;
    Ok(PeerRef::new(host, port, keyspace))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        CliConfig::command().debug_assert();
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = NodeConfig::from_json(
            r#"{ "ring": { "successor_list_size": 5 }, "log_level": "debug" }"#,
        )
        .unwrap();
        assert_eq!(config.ring.successor_list_size, 5);
        assert_eq!(config.ring.interval_digits, 3);
        assert_eq!(config.transport, TransportConfig::default());
        assert_eq!(config.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_invalid_json_values_rejected() {
        assert!(NodeConfig::from_json(r#"{ "ring": { "interval_digits": 40 } }"#).is_err());
        assert!(NodeConfig::from_json(
            r#"{ "maintenance": { "min_interval_ms": 9, "max_interval_ms": 1 } }"#
        )
        .is_err());
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = CliConfig::try_parse_from([
            "chord-node",
            "start",
            "--bind",
            "127.0.0.1:5000",
            "--digits",
            "4",
            "--successors",
            "2",
            "--record",
            "photon-1",
            "--record",
            "photon-2",
        ])
        .unwrap();
        let config = cli.resolve().unwrap();
        assert_eq!(config.ring.interval_digits, 4);
        assert_eq!(config.ring.successor_list_size, 2);
        match cli.command {
            Command::Start { records, join, .. } => {
                assert_eq!(records, vec!["photon-1", "photon-2"]);
                assert_eq!(join, None);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_endpoint() {
        assert_eq!(
            parse_endpoint("127.0.0.1:5000").unwrap(),
            ("127.0.0.1".to_string(), 5000)
        );
        assert!(parse_endpoint("127.0.0.1").is_err());
        assert!(parse_endpoint(":5000").is_err());
        assert!(parse_endpoint("host:99999").is_err());
    }

    #[test]
    fn test_parse_peer_hashes_identifier() {
        let keyspace = KeySpace::new(3).unwrap();
        let peer = parse_peer("127.0.0.1:5000", &keyspace).unwrap();
        assert_eq!(peer.id().value(), 383);
    }
}
