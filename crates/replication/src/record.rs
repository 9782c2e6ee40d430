//! Records ("photons") and the bookkeeping attached to them.

use corelib::{Identifier, KeySpace, PeerRef};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Milliseconds since the Unix epoch.
pub type Timestamp = u64;

pub fn now_millis() -> Timestamp {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as Timestamp)
        .unwrap_or_default()
}

/// A device record owned by this node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    /// Ring position, the hash of `id`.
    pub key: Identifier,
    /// Identifier of the peer currently holding our backup, if any.
    pub backup: Option<Identifier>,
}

impl Record {
    pub fn new(id: impl Into<String>, keyspace: &KeySpace) -> Self {
        let id = id.into();
        let key = keyspace.hash_str(&id);
        Self {
            id,
            key,
            backup: None,
        }
    }
}

/// A record this node replicates on behalf of its owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BackupEntry {
    pub record: Record,
    pub master: PeerRef,
    /// Newest timestamp already copied from the master.
    pub last_poll: Timestamp,
}

/// One measurement in a record's time series.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub timestamp: Timestamp,
    pub value: f64,
}

/// Answer to a backup poll.
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct BackupPoll {
    pub rows: Vec<Row>,
    /// Whether the master still counts the requester as this record's backup.
    pub is_still_backup: bool,
}
