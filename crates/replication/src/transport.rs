//! Record operations a peer issues to other peers.

use async_trait::async_trait;
use corelib::{Identifier, PeerRef, TransportError};

use crate::record::{BackupPoll, Timestamp};

/// Outbound half of the record RPCs. Same failure contract as
/// [`corelib::PeerTransport`]: every error means "peer unreachable".
#[async_trait]
pub trait RecordTransport: Send + Sync + 'static {
    /// `AddRecord`: store `record_id` at `to`, which owns it.
    async fn add_record(&self, to: &PeerRef, record_id: &str) -> Result<(), TransportError>;

    /// `TransferRecords`: hand over every record of `to` in `(to, boundary]`.
    async fn transfer_records(
        &self,
        to: &PeerRef,
        boundary: Identifier,
    ) -> Result<Vec<String>, TransportError>;

    /// `AddBackupObligation`: ask `to` to replicate `record_id` for `master`.
    async fn add_backup(
        &self,
        to: &PeerRef,
        master: &PeerRef,
        record_id: &str,
    ) -> Result<(), TransportError>;

    /// `PollBackupData`: rows of `key` newer than `since`.
    async fn poll_backup_data(
        &self,
        to: &PeerRef,
        key: Identifier,
        since: Timestamp,
        requester: Identifier,
    ) -> Result<BackupPoll, TransportError>;
}
