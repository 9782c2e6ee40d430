//! Record placement and primary/backup replication on top of the ring.
//!
//! This crate provides:
//! - The [`Ledger`]: owned records, backup obligations and polling
//! - The [`RecordTransport`] contract for record RPCs
//! - The measurement log and device reader collaborators
//! - [`Peer`]: a ring node and its ledger, with the background maintenance
//!   task that drives both

pub mod config;
pub mod device;
pub mod error;
pub mod ledger;
pub mod log;
pub mod peer;
pub mod record;
pub mod transport;

pub use config::MaintenanceConfig;
pub use device::{DeviceReader, FixedReader, NoDevice, Reading};
pub use error::{ReplicationError, Result};
pub use ledger::Ledger;
pub use log::{MeasurementLog, MemoryLog};
pub use peer::{Peer, PeerBuilder};
pub use record::{now_millis, BackupEntry, BackupPoll, Record, Row, Timestamp};
pub use transport::RecordTransport;
