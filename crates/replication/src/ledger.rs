//! Record ownership and single-backup replication.
//!
//! Each record lives at the ring node owning its key. The owner registers
//! its current successor as the record's backup; the backup polls the owner
//! for new rows. All cross-node steps are single best-effort calls that can
//! be repeated safely.

use metrics::counter;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use corelib::{Identifier, Lookup, PeerRef, RingNode};

use crate::device::{DeviceReader, Reading};
use crate::error::{ReplicationError, Result};
use crate::log::MeasurementLog;
use crate::record::{now_millis, BackupEntry, BackupPoll, Record, Timestamp};
use crate::transport::RecordTransport;

pub struct Ledger {
    ring: Arc<RingNode>,
    transport: Arc<dyn RecordTransport>,
    log: Arc<dyn MeasurementLog>,
    device: Arc<dyn DeviceReader>,
    state: Mutex<LedgerState>,
}

#[derive(Default)]
struct LedgerState {
    /// Records this node owns, by record id.
    records: BTreeMap<String, Record>,
    /// Records this node backs up for their owner, by record id.
    backups: BTreeMap<String, BackupEntry>,
}

impl Ledger {
    pub fn new(
        ring: Arc<RingNode>,
        transport: Arc<dyn RecordTransport>,
        log: Arc<dyn MeasurementLog>,
        device: Arc<dyn DeviceReader>,
    ) -> Self {
        Self {
            ring,
            transport,
            log,
            device,
            state: Mutex::new(LedgerState::default()),
        }
    }

    pub fn records(&self) -> Vec<Record> {
        self.state.lock().records.values().cloned().collect()
    }

    pub fn record_ids(&self) -> Vec<String> {
        self.state.lock().records.keys().cloned().collect()
    }

    pub fn backups(&self) -> Vec<BackupEntry> {
        self.state.lock().backups.values().cloned().collect()
    }

    pub fn log(&self) -> &Arc<dyn MeasurementLog> {
        &self.log
    }

    /// Place `record_id` at its owner, which may be this node.
    pub async fn request_add(&self, record_id: &str) -> Result<PeerRef> {
        let local = self.ring.local().clone();
        let key = self.ring.keyspace().hash_str(record_id);

        let owner = match self.ring.find_successor(key, local.id(), 0).await {
            Lookup::Found { peer, .. } => peer,
            Lookup::Failed { reason, .. } => {
                warn!(record_id, %key, %reason, "no owner found for record");
                return Err(ReplicationError::Unresolved {
                    record_id: record_id.to_string(),
                    reason,
                });
            }
        };

        if owner.same_id(&local) {
            self.add_record(record_id);
        } else {
            debug!(record_id, owner = %owner, "forwarding record to owner");
            self.transport.add_record(&owner, record_id).await?;
        }
        Ok(owner)
    }

    /// Store a record locally. Returns `false` if it was already here.
    pub fn add_record(&self, record_id: &str) -> bool {
        let mut state = self.state.lock();
        if state.records.contains_key(record_id) {
            return false;
        }
        let record = Record::new(record_id, self.ring.keyspace());
        info!(record_id, key = %record.key, "adding record");
        state.records.insert(record.id.clone(), record);
        true
    }

    /// Remove and return every record in `(self, boundary]`.
    ///
    /// Called by a peer that just joined with identifier `boundary`
    /// between our predecessor and us.
    pub fn transfer_records(&self, boundary: Identifier) -> Vec<String> {
        let local_id = self.ring.id();
        let keyspace = *self.ring.keyspace();
        let mut state = self.state.lock();

        let moving: Vec<String> = state
            .records
            .values()
            .filter(|r| keyspace.in_interval(local_id, boundary, r.key))
            .map(|r| r.id.clone())
            .collect();
        for id in &moving {
            state.records.remove(id);
        }
        if !moving.is_empty() {
            counter!("chord_records_transferred_total").increment(moving.len() as u64);
            info!(%boundary, count = moving.len(), remaining = state.records.len(), "handing records to new owner");
        }
        moving
    }

    /// Pull the records we now own from our successor, with their history.
    ///
    /// Run once right after joining. Returns the number of records taken.
    pub async fn take_over_from_successor(&self) -> Result<usize> {
        let local = self.ring.local().clone();
        let successor = self.ring.successor();
        if successor.same_id(&local) {
            return Ok(0);
        }

        let ids = self
            .transport
            .transfer_records(&successor, local.id())
            .await?;
        let taken: Vec<Record> = {
            let mut state = self.state.lock();
            ids.iter()
                .map(|id| {
                    let record = Record::new(id.as_str(), self.ring.keyspace());
                    state.records.insert(record.id.clone(), record.clone());
                    record
                })
                .collect()
        };
        info!(from = %successor, count = taken.len(), "took over records from successor");

        // the successor mastered these until now, so it holds the history
        for record in &taken {
            match self
                .transport
                .poll_backup_data(&successor, record.key, 0, local.id())
                .await
            {
                Ok(poll) => {
                    for row in &poll.rows {
                        self.log.append(record.key, row.timestamp, row.value);
                    }
                }
                Err(err) => {
                    warn!(record_id = %record.id, error = %err, "could not pull record history");
                }
            }
        }
        Ok(taken.len())
    }

    /// Make sure every owned record is backed up at the current successor.
    pub async fn check_backups(&self) {
        let local = self.ring.local().clone();
        let successor = self.ring.successor();

        if successor.same_id(&local) {
            // nobody to back up to
            for record in self.state.lock().records.values_mut() {
                record.backup = None;
            }
            return;
        }

        let pending: Vec<String> = self
            .state
            .lock()
            .records
            .values()
            .filter(|r| r.backup != Some(successor.id()))
            .map(|r| r.id.clone())
            .collect();

        for record_id in pending {
            let marker = match self
                .transport
                .add_backup(&successor, &local, &record_id)
                .await
            {
                Ok(()) => {
                    debug!(record_id, backup = %successor, "backup registered");
                    Some(successor.id())
                }
                Err(err) => {
                    debug!(record_id, backup = %successor, error = %err, "backup registration failed");
                    None
                }
            };
            if let Some(record) = self.state.lock().records.get_mut(&record_id) {
                record.backup = marker;
            }
        }
    }

    /// Accept the obligation to replicate `record_id` for `master`.
    pub fn add_backup(&self, master: PeerRef, record_id: &str) {
        let mut state = self.state.lock();
        match state.backups.get_mut(record_id) {
            Some(entry) => entry.master = master,
            None => {
                info!(record_id, master = %master, "accepting backup obligation");
                let entry = BackupEntry {
                    record: Record::new(record_id, self.ring.keyspace()),
                    master,
                    last_poll: 0,
                };
                state.backups.insert(record_id.to_string(), entry);
            }
        }
    }

    /// Copy new rows from every master we back up.
    ///
    /// Drops entries whose master no longer lists us as backup. An
    /// unreachable master's entry is promoted to an owned record once the
    /// key falls into our own interval, and kept for the next round
    /// otherwise.
    pub async fn poll_backups(&self) {
        let local_id = self.ring.id();
        let entries = self.backups();

        for entry in entries {
            let key = entry.record.key;
            match self
                .transport
                .poll_backup_data(&entry.master, key, entry.last_poll, local_id)
                .await
            {
                Ok(poll) if !poll.is_still_backup => {
                    info!(record_id = %entry.record.id, master = %entry.master, "no longer backup, dropping entry");
                    self.state.lock().backups.remove(&entry.record.id);
                }
                Ok(poll) => {
                    let newest = self.append_rows(key, &poll, entry.last_poll);
                    if let Some(held) = self.state.lock().backups.get_mut(&entry.record.id) {
                        held.last_poll = held.last_poll.max(newest);
                    }
                }
                Err(err) => {
                    if self.ring.owns(key) {
                        self.promote(&entry);
                    } else {
                        debug!(record_id = %entry.record.id, master = %entry.master, error = %err, "backup poll failed");
                    }
                }
            }
        }
    }

    fn append_rows(&self, key: Identifier, poll: &BackupPoll, since: Timestamp) -> Timestamp {
        counter!("chord_backup_rows_copied_total").increment(poll.rows.len() as u64);
        poll.rows.iter().fold(since, |newest, row| {
            self.log.append(key, row.timestamp, row.value);
            newest.max(row.timestamp)
        })
    }

    fn promote(&self, entry: &BackupEntry) {
        let mut state = self.state.lock();
        if state.backups.remove(&entry.record.id).is_none() {
            return;
        }
        warn!(record_id = %entry.record.id, master = %entry.master, "master gone, promoting backup to owned record");
        counter!("chord_backups_promoted_total").increment(1);
        let record = Record {
            backup: None,
            ..entry.record.clone()
        };
        state.records.entry(record.id.clone()).or_insert(record);
    }

    /// Rows of `key` newer than `since`, and whether `requester` is still
    /// the backup for it.
    pub fn latest_data(&self, key: Identifier, since: Timestamp, requester: Identifier) -> BackupPoll {
        let rows = self.log.newer_than(key, since);
        let is_backup = requester == self.ring.successor().id();
        let is_still_backup = is_backup && self.state.lock().records.values().any(|r| r.key == key);
        BackupPoll {
            rows,
            is_still_backup,
        }
    }

    /// Pull a fresh reading for every owned record.
    pub async fn sample_records(&self) {
        let records = self.records();
        for record in records {
            match self.device.pull(&record.id).await {
                Reading::Value(value) => self.log.append(record.key, now_millis(), value),
                Reading::Unavailable => {
                    debug!(record_id = %record.id, "device reading unavailable");
                }
            }
        }
    }

    /// Replication steps of one maintenance round.
    pub async fn maintenance_round(&self) {
        self.check_backups().await;
        self.poll_backups().await;
        self.sample_records().await;
    }
}
