//! Command implementations.

use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

use corelib::{Identifier, Lookup, PeerRef, PeerTransport};
use replication::PeerBuilder;
use transport::{Server, TcpTransport};

use crate::config::{parse_endpoint, parse_peer, NodeConfig};

pub use crate::config::Command;

/// Printable outcome of a one-shot command.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandResult {
    Lookup {
        key: String,
        identifier: Identifier,
        asked: PeerRef,
        answer: Lookup,
        closest_finger: PeerRef,
    },
    Neighbors {
        peer: PeerRef,
        successor: Option<PeerRef>,
        predecessor: Option<PeerRef>,
    },
}

impl Command {
    pub async fn run(self, config: NodeConfig) -> Result<Option<CommandResult>> {
        match self {
            Command::Start {
                bind,
                advertise,
                join,
                records,
                ..
            } => {
                start(config, &bind, advertise, join, records).await?;
                Ok(None)
            }
            Command::Lookup { peer, key } => lookup(&config, &peer, &key).await.map(Some),
            Command::Neighbors { peer } => neighbors(&config, &peer).await.map(Some),
        }
    }
}

/// Serve a peer, join, place records and run maintenance until Ctrl-C.
pub async fn start(
    config: NodeConfig,
    bind: &str,
    advertise: Option<String>,
    join: Option<String>,
    records: Vec<String>,
) -> Result<()> {
    let keyspace = config.ring.validate()?;
    let server = Server::bind(bind, config.transport.clone())
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    let port = server.local_addr()?.port();
    let host = match advertise {
        Some(host) => host,
        None => parse_endpoint(bind)?.0,
    };
    let local = PeerRef::new(host, port, &keyspace);
    info!(node = %local, digits = keyspace.digits(), "starting peer");

    let transport = Arc::new(TcpTransport::new(config.transport.clone()));
    let peer = Arc::new(
        PeerBuilder::new(local)
            .ring_config(config.ring.clone())
            .maintenance(config.maintenance.clone())
            .build(transport)?,
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let server_task = tokio::spawn(server.serve(peer.clone(), shutdown_rx.clone()));

    if let Some(seed) = join {
        let seed = parse_peer(&seed, &keyspace)?;
        peer.join(&seed)
            .await
            .with_context(|| format!("failed to join via {seed}"))?;
    }

    for record_id in records {
        match peer.ledger().request_add(&record_id).await {
            Ok(owner) => info!(record_id, owner = %owner, "record placed"),
            Err(err) => warn!(record_id, error = %err, "record not placed"),
        }
    }

    let maintenance = peer.clone().spawn_maintenance(shutdown_rx);

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for ctrl-c")?;
    info!(node = %peer.local(), "shutting down");

    shutdown_tx.send_replace(true);
    maintenance.await?;
    server_task.await??;
    peer.leave();
    Ok(())
}

pub async fn lookup(config: &NodeConfig, endpoint: &str, key: &str) -> Result<CommandResult> {
    let keyspace = config.ring.validate()?;
    let asked = parse_peer(endpoint, &keyspace)?;
    let identifier = keyspace.hash_str(key);
    let client = TcpTransport::new(config.transport.clone());

    let answer = client
        .find_successor(&asked, identifier, identifier, 0)
        .await
        .with_context(|| format!("FindSuccessor on {endpoint} failed"))?;
    let closest_finger = client
        .closest_finger(&asked, identifier)
        .await
        .with_context(|| format!("ClosestFinger on {endpoint} failed"))?;

    Ok(CommandResult::Lookup {
        key: key.to_string(),
        identifier,
        asked,
        answer,
        closest_finger,
    })
}

pub async fn neighbors(config: &NodeConfig, endpoint: &str) -> Result<CommandResult> {
    let keyspace = config.ring.validate()?;
    let peer = parse_peer(endpoint, &keyspace)?;
    let client = TcpTransport::new(config.transport.clone());

    let successor = client
        .get_successor(&peer)
        .await
        .with_context(|| format!("GetSuccessor on {endpoint} failed"))?;
    let predecessor = client
        .get_predecessor(&peer)
        .await
        .with_context(|| format!("GetPredecessor on {endpoint} failed"))?;

    Ok(CommandResult::Neighbors {
        peer,
        successor,
        predecessor,
    })
}
